//! Shared fixtures for the engine's unit tests.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::models::{FactRow, Item, Rating, User};
use crate::services::joiner::join;

const PROVIDERS: [&str; 3] = ["coursera", "edx", "udacity"];
const DIFFICULTIES: [&str; 3] = ["Beginner", "Intermediate", "Advanced"];

pub fn scenario_users() -> Vec<User> {
    vec![
        User::new("u1", "alice"),
        User::new("u2", "bob"),
        User::new("u3", "carol"),
    ]
}

pub fn scenario_items() -> Vec<Item> {
    let mut a = Item::new("A", "An Introduction to Interactive Programming in Python");
    a.provider = Some("coursera".to_string());
    a.university = Some("Rice".to_string());
    a.difficulty = Some("Beginner".to_string());
    a.avg_rating = Some(4.8);

    let mut b = Item::new("B", "6.00x: Introduction to Computer Science and Programming");
    b.provider = Some("edx".to_string());
    b.university = Some("MIT".to_string());
    b.difficulty = Some("Intermediate".to_string());

    let mut c = Item::new("C", "Jazz Improvisation");
    c.provider = Some("coursera".to_string());
    c.university = Some("Berklee".to_string());
    c.avg_rating = Some(3.9);

    vec![a, b, c]
}

pub fn scenario_ratings() -> Vec<Rating> {
    vec![
        Rating::new("u1", "A", 5.0),
        Rating::new("u1", "B", 4.0),
        Rating::new("u2", "A", 3.0),
        Rating::new("u2", "C", 2.0),
        Rating::new("u3", "A", 4.0),
        Rating::new("u3", "B", 5.0),
    ]
}

/// Three users, three courses, six ratings
pub fn scenario_facts() -> Vec<FactRow> {
    join(&scenario_users(), &scenario_items(), &scenario_ratings()).rows
}

pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Copy of `rows` in a random order
pub fn shuffled<T: Clone>(rows: &[T], rng: &mut ChaCha8Rng) -> Vec<T> {
    let mut out = rows.to_vec();
    out.shuffle(rng);
    out
}

/// Random catalog of up to 8 users and 6 courses, joined into fact rows
///
/// Catalog attributes are null about a fifth of the time. Ratings are
/// arbitrary floats in `[1, 5]`, so sums depend on addition order unless
/// the engine fixes it.
pub fn random_facts(rng: &mut ChaCha8Rng) -> Vec<FactRow> {
    let users: Vec<User> = (0..rng.gen_range(1..=8))
        .map(|i| User::new(&format!("u{}", i), &format!("user{}", i)))
        .collect();

    let items: Vec<Item> = (0..rng.gen_range(1..=6))
        .map(|i| {
            let mut item = Item::new(&format!("I{}", i), &format!("Course {}", i));
            if rng.gen_bool(0.8) {
                item.provider = PROVIDERS.choose(rng).map(|p| p.to_string());
            }
            if rng.gen_bool(0.8) {
                item.difficulty = DIFFICULTIES.choose(rng).map(|d| d.to_string());
            }
            if rng.gen_bool(0.8) {
                item.avg_rating = Some(rng.gen_range(1.0..=5.0));
            }
            item
        })
        .collect();

    let mut ratings = Vec::new();
    for user in &users {
        for item in &items {
            if rng.gen_bool(0.5) {
                ratings.push(Rating {
                    user_id: user.user_id.clone(),
                    item_id: item.item_id.clone(),
                    value: rng.gen_range(1.0..=5.0),
                });
            }
        }
    }

    join(&users, &items, &ratings).rows
}

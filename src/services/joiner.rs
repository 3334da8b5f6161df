use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{FactRow, Item, ItemId, Rating, User, UserId};

/// Bookkeeping of a join, so referential-integrity problems reach the caller
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinReport {
    pub input_ratings: usize,
    pub joined: usize,
    pub dropped_unknown_item: usize,
    pub dropped_unknown_user: usize,
}

impl JoinReport {
    /// Ratings that did not survive the join
    pub fn dropped(&self) -> usize {
        self.dropped_unknown_item + self.dropped_unknown_user
    }

    pub fn is_complete(&self) -> bool {
        self.dropped() == 0
    }
}

/// Fact table plus the report of how it was built
#[derive(Debug, Clone)]
pub struct Joined {
    pub rows: Vec<FactRow>,
    pub report: JoinReport,
}

/// Joins ratings with their items and users into a fact table
///
/// Inner join on `item_id`, then on `user_id`. A rating whose item or user
/// does not exist is dropped and counted in the report; a rating missing
/// both is counted once, as an unknown item. Row order is not meaningful.
pub fn join(users: &[User], items: &[Item], ratings: &[Rating]) -> Joined {
    let items_by_id: HashMap<&ItemId, &Item> =
        items.iter().map(|item| (&item.item_id, item)).collect();
    let users_by_id: HashMap<&UserId, &User> =
        users.iter().map(|user| (&user.user_id, user)).collect();

    let mut report = JoinReport {
        input_ratings: ratings.len(),
        ..JoinReport::default()
    };
    let mut rows = Vec::with_capacity(ratings.len());

    for rating in ratings {
        let Some(item) = items_by_id.get(&rating.item_id) else {
            report.dropped_unknown_item += 1;
            continue;
        };
        let Some(user) = users_by_id.get(&rating.user_id) else {
            report.dropped_unknown_user += 1;
            continue;
        };
        rows.push(FactRow::new(rating, item, user));
    }

    report.joined = rows.len();

    if report.is_complete() {
        tracing::debug!(rows = report.joined, "Joined ratings into fact table");
    } else {
        tracing::warn!(
            input_ratings = report.input_ratings,
            joined = report.joined,
            dropped_unknown_item = report.dropped_unknown_item,
            dropped_unknown_user = report.dropped_unknown_user,
            "Ratings reference unknown items or users and were dropped"
        );
    }

    Joined { rows, report }
}

use serde::{Deserialize, Serialize};

use super::{ItemId, UserId};

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
}

/// A rated item together with its catalog attributes
///
/// Everything past the title is optional: the source catalog has gaps in
/// workload, difficulty and the like, and those gaps must survive as nulls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub item_id: ItemId,
    pub title: String,
    #[serde(default)]
    pub university: Option<String>,
    /// Catalog-wide average rating published by the provider
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub workload: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// A single user's rating of an item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub value: f64,
}

impl User {
    pub fn new(user_id: &str, username: &str) -> Self {
        Self {
            user_id: UserId::from(user_id),
            username: username.to_string(),
        }
    }
}

impl Item {
    /// Creates an item with only a title; catalog attributes start out null
    pub fn new(item_id: &str, title: &str) -> Self {
        Self {
            item_id: ItemId::from(item_id),
            title: title.to_string(),
            university: None,
            avg_rating: None,
            workload: None,
            difficulty: None,
            provider: None,
        }
    }
}

impl Rating {
    pub fn new(user_id: &str, item_id: &str, value: f64) -> Self {
        Self {
            user_id: UserId::from(user_id),
            item_id: ItemId::from(item_id),
            value,
        }
    }
}

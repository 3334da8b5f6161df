use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod fact;
pub mod relations;

pub use fact::{Column, FactRow, GroupKey, KeyValue};
pub use relations::{Item, Rating, User};

/// Identifier of a user in the ratings dataset
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Identifier of a rated item (a course in the CourseTalk data)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId(id.to_string())
    }
}

/// One group of a grouped aggregation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateRow {
    pub group_key: GroupKey,
    /// Name of the statistic in `value` (e.g. "mean", "count")
    pub statistic: String,
    pub value: f64,
    /// Number of fact rows that contributed to `value`
    pub support_count: usize,
}

/// Affinity of `other_item` to `reference_item`, measured by shared raters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AffinityRow {
    pub reference_item: ItemId,
    pub other_item: ItemId,
    /// Raters of the reference item who also rated `other_item`
    pub co_raters: usize,
    /// Distinct raters of the reference item
    pub reference_raters: usize,
    pub score: f64,
}

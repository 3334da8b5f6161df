use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use super::{Item, ItemId, Rating, User, UserId};
use crate::error::EngineError;

/// One rating joined with the attributes of its user and item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactRow {
    pub user_id: UserId,
    pub username: String,
    pub item_id: ItemId,
    pub title: String,
    pub university: Option<String>,
    pub avg_rating: Option<f64>,
    pub workload: Option<String>,
    pub difficulty: Option<String>,
    pub provider: Option<String>,
    pub rating: f64,
}

impl FactRow {
    /// Builds a fact row from a rating and the rows it references
    pub fn new(rating: &Rating, item: &Item, user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            username: user.username.clone(),
            item_id: item.item_id.clone(),
            title: item.title.clone(),
            university: item.university.clone(),
            avg_rating: item.avg_rating,
            workload: item.workload.clone(),
            difficulty: item.difficulty.clone(),
            provider: item.provider.clone(),
            rating: rating.value,
        }
    }

    /// Value of `column` as a grouping key component, `None` when null
    pub fn key(&self, column: Column) -> Option<KeyValue> {
        let text = |value: &str| Some(KeyValue::Text(value.to_string()));
        match column {
            Column::UserId => text(&self.user_id.0),
            Column::Username => text(&self.username),
            Column::ItemId => text(&self.item_id.0),
            Column::Title => text(&self.title),
            Column::University => self.university.as_deref().and_then(text),
            Column::AvgRating => self.avg_rating.map(KeyValue::number),
            Column::Workload => self.workload.as_deref().and_then(text),
            Column::Difficulty => self.difficulty.as_deref().and_then(text),
            Column::Provider => self.provider.as_deref().and_then(text),
            Column::Rating => Some(KeyValue::number(self.rating)),
        }
    }

    /// Numeric value of `column`; `None` for nulls and for text columns
    pub fn number(&self, column: Column) -> Option<f64> {
        match column {
            Column::AvgRating => self.avg_rating,
            Column::Rating => Some(self.rating),
            _ => None,
        }
    }

    pub fn is_present(&self, column: Column) -> bool {
        match column {
            Column::University => self.university.is_some(),
            Column::AvgRating => self.avg_rating.is_some(),
            Column::Workload => self.workload.is_some(),
            Column::Difficulty => self.difficulty.is_some(),
            Column::Provider => self.provider.is_some(),
            _ => true,
        }
    }
}

/// Columns of the fact table that can be addressed by name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    UserId,
    Username,
    ItemId,
    Title,
    University,
    AvgRating,
    Workload,
    Difficulty,
    Provider,
    Rating,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::UserId,
        Column::Username,
        Column::ItemId,
        Column::Title,
        Column::University,
        Column::AvgRating,
        Column::Workload,
        Column::Difficulty,
        Column::Provider,
        Column::Rating,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::UserId => "user_id",
            Column::Username => "username",
            Column::ItemId => "item_id",
            Column::Title => "title",
            Column::University => "university",
            Column::AvgRating => "avg_rating",
            Column::Workload => "workload",
            Column::Difficulty => "difficulty",
            Column::Provider => "provider",
            Column::Rating => "rating",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::AvgRating | Column::Rating)
    }

    /// Parses a list of column names, failing on the first unknown one
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Column>, EngineError> {
        names.iter().map(|name| name.as_ref().parse()).collect()
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Column {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|column| column.name() == s)
            .ok_or_else(|| EngineError::UnknownColumn(s.to_string()))
    }
}

/// One component of a grouping key
///
/// Numbers order before text; numbers compare by IEEE total order so that
/// equality, hashing and ordering all agree. Keys taken from fact rows go
/// through [`KeyValue::number`], so `-0.0` and `0.0` land in one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Number(f64),
    Text(String),
}

impl KeyValue {
    /// Numeric key with negative zero folded into zero
    pub fn number(value: f64) -> Self {
        KeyValue::Number(if value == 0.0 { 0.0 } else { value })
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyValue {}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyValue::Number(a), KeyValue::Number(b)) => a.total_cmp(b),
            (KeyValue::Text(a), KeyValue::Text(b)) => a.cmp(b),
            (KeyValue::Number(_), KeyValue::Text(_)) => Ordering::Less,
            (KeyValue::Text(_), KeyValue::Number(_)) => Ordering::Greater,
        }
    }
}

impl Hash for KeyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            KeyValue::Number(n) => {
                0u8.hash(state);
                n.to_bits().hash(state);
            }
            KeyValue::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyValue::Number(n) => write!(f, "{}", n),
            KeyValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Text(value.to_string())
    }
}

/// Ordered tuple of key values identifying a group
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(pub Vec<KeyValue>);

impl GroupKey {
    /// Extracts the key of `row` over `columns`; `None` if any component is null
    pub fn of(row: &FactRow, columns: &[Column]) -> Option<Self> {
        columns
            .iter()
            .map(|column| row.key(*column))
            .collect::<Option<Vec<_>>>()
            .map(GroupKey)
    }
}

impl Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

impl<const N: usize> From<[&str; N]> for GroupKey {
    fn from(values: [&str; N]) -> Self {
        GroupKey(values.into_iter().map(KeyValue::from).collect())
    }
}

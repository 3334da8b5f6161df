use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::EngineResult,
    models::{Column, FactRow, ItemId, KeyValue, UserId},
    services::aggregator::{aggregate, AggregateFn},
};

/// Sparse user x item matrix of rating values
///
/// Indexed both ways so that "who rated X" and "what did U rate" are set
/// lookups. A user who rated the same item more than once holds the mean.
#[derive(Debug, Clone, Default)]
pub struct RatingMatrix {
    by_item: BTreeMap<ItemId, BTreeMap<UserId, f64>>,
    by_user: BTreeMap<UserId, BTreeSet<ItemId>>,
}

impl RatingMatrix {
    pub fn from_facts(facts: &[FactRow]) -> Self {
        let mut sums: BTreeMap<(&ItemId, &UserId), (f64, usize)> = BTreeMap::new();
        for row in facts {
            let entry = sums.entry((&row.item_id, &row.user_id)).or_insert((0.0, 0));
            entry.0 += row.rating;
            entry.1 += 1;
        }

        let mut matrix = RatingMatrix::default();
        for ((item_id, user_id), (sum, count)) in sums {
            matrix
                .by_item
                .entry(item_id.clone())
                .or_default()
                .insert(user_id.clone(), sum / count as f64);
            matrix
                .by_user
                .entry(user_id.clone())
                .or_default()
                .insert(item_id.clone());
        }
        matrix
    }

    /// Users who rated `item_id`, in id order
    pub fn raters(&self, item_id: &ItemId) -> impl Iterator<Item = &UserId> {
        self.by_item.get(item_id).into_iter().flat_map(|users| users.keys())
    }

    pub fn rater_count(&self, item_id: &ItemId) -> usize {
        self.by_item.get(item_id).map_or(0, BTreeMap::len)
    }

    pub fn items_rated_by(&self, user_id: &UserId) -> Option<&BTreeSet<ItemId>> {
        self.by_user.get(user_id)
    }

    pub fn value(&self, user_id: &UserId, item_id: &ItemId) -> Option<f64> {
        self.by_item.get(item_id)?.get(user_id).copied()
    }

    pub fn num_users(&self) -> usize {
        self.by_user.len()
    }

    pub fn num_items(&self) -> usize {
        self.by_item.len()
    }

    /// Number of filled cells
    pub fn num_ratings(&self) -> usize {
        self.by_item.values().map(BTreeMap::len).sum()
    }

    /// Share of filled cells, 0 for an empty matrix
    pub fn density(&self) -> f64 {
        let cells = self.num_users() * self.num_items();
        if cells == 0 {
            0.0
        } else {
            self.num_ratings() as f64 / cells as f64
        }
    }
}

/// One populated cell of a cross tabulation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrossTabCell {
    pub row: KeyValue,
    pub column: KeyValue,
    pub mean: f64,
    pub support_count: usize,
}

/// Mean of a value column for every (row key, column key) pair that has data
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTab {
    pub row_column: Column,
    pub col_column: Column,
    pub value_column: Column,
    by_column: BTreeMap<KeyValue, BTreeMap<KeyValue, CrossTabCell>>,
}

impl CrossTab {
    /// Mean for a cell, `None` where no row had both keys
    pub fn get(&self, row: &KeyValue, column: &KeyValue) -> Option<f64> {
        self.by_column.get(column)?.get(row).map(|cell| cell.mean)
    }

    /// Populated rows of one column, best mean first, then by row key
    pub fn column(&self, column: &KeyValue) -> Vec<&CrossTabCell> {
        let mut cells: Vec<&CrossTabCell> = self
            .by_column
            .get(column)
            .map(|rows| rows.values().collect())
            .unwrap_or_default();
        cells.sort_by(|a, b| b.mean.total_cmp(&a.mean).then_with(|| a.row.cmp(&b.row)));
        cells
    }

    pub fn column_keys(&self) -> impl Iterator<Item = &KeyValue> {
        self.by_column.keys()
    }

    pub fn row_keys(&self) -> BTreeSet<&KeyValue> {
        self.by_column.values().flat_map(|rows| rows.keys()).collect()
    }

    /// All populated cells, ordered by row key then column key
    pub fn cells(&self) -> Vec<&CrossTabCell> {
        let mut cells: Vec<&CrossTabCell> =
            self.by_column.values().flat_map(|rows| rows.values()).collect();
        cells.sort_by(|a, b| a.row.cmp(&b.row).then_with(|| a.column.cmp(&b.column)));
        cells
    }

    pub fn is_empty(&self) -> bool {
        self.by_column.is_empty()
    }
}

/// Pivots the fact table into a `row_column` x `col_column` table of means
///
/// Rows null in any of the three columns are dropped first; empty cells stay
/// absent rather than reading as zero.
pub fn cross_tab(
    facts: &[FactRow],
    row_column: Column,
    col_column: Column,
    value_column: Column,
) -> EngineResult<CrossTab> {
    let aggregates = aggregate(
        facts,
        &[row_column, col_column],
        value_column,
        AggregateFn::Mean,
        true,
    )?;

    let mut by_column: BTreeMap<KeyValue, BTreeMap<KeyValue, CrossTabCell>> = BTreeMap::new();
    for aggregate in aggregates {
        let mut parts = aggregate.group_key.0.into_iter();
        let (Some(row), Some(column)) = (parts.next(), parts.next()) else {
            continue;
        };
        by_column.entry(column.clone()).or_default().insert(
            row.clone(),
            CrossTabCell {
                row,
                column,
                mean: aggregate.value,
                support_count: aggregate.support_count,
            },
        );
    }

    Ok(CrossTab {
        row_column,
        col_column,
        value_column,
        by_column,
    })
}

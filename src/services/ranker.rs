use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::{
    error::{EngineError, EngineResult},
    models::AggregateRow,
};

/// Field of an `AggregateRow` used as the primary sort key
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Value,
    SupportCount,
}

impl FromStr for SortKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(SortKey::Value),
            "support_count" => Ok(SortKey::SupportCount),
            _ => Err(EngineError::UnknownSortKey(s.to_string())),
        }
    }
}

fn compare(a: &AggregateRow, b: &AggregateRow, sort_by: SortKey) -> Ordering {
    match sort_by {
        SortKey::Value => a.value.total_cmp(&b.value),
        SortKey::SupportCount => a.support_count.cmp(&b.support_count),
    }
}

/// Filters aggregates by minimum support and orders them
///
/// Rows with `support_count < min_support` are dropped; a threshold of 0
/// keeps everything. Equal primary keys fall back to ascending group key in
/// both directions, so the order never depends on how the input was laid out.
pub fn rank(
    rows: &[AggregateRow],
    min_support: i64,
    sort_by: SortKey,
    descending: bool,
) -> EngineResult<Vec<AggregateRow>> {
    if min_support < 0 {
        return Err(EngineError::InvalidThreshold { min_support });
    }
    let threshold = min_support as u64;

    let mut ranked: Vec<AggregateRow> = rows
        .iter()
        .filter(|row| row.support_count as u64 >= threshold)
        .cloned()
        .collect();

    ranked.sort_by(|a, b| {
        let primary = compare(a, b, sort_by);
        let primary = if descending { primary.reverse() } else { primary };
        primary.then_with(|| a.group_key.cmp(&b.group_key))
    });

    tracing::debug!(
        input = rows.len(),
        kept = ranked.len(),
        min_support,
        "Ranked aggregates"
    );

    Ok(ranked)
}

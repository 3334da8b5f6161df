use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::{
    error::{EngineError, EngineResult},
    models::{AggregateRow, Column, FactRow, GroupKey},
};

/// Aggregation applied to the value column of each group
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    Mean,
    Count,
    Sum,
}

impl AggregateFn {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFn::Mean => "mean",
            AggregateFn::Count => "count",
            AggregateFn::Sum => "sum",
        }
    }

    fn needs_numeric(&self) -> bool {
        !matches!(self, AggregateFn::Count)
    }
}

impl Display for AggregateFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AggregateFn {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(AggregateFn::Mean),
            "count" => Ok(AggregateFn::Count),
            "sum" => Ok(AggregateFn::Sum),
            _ => Err(EngineError::UnknownFunction(s.to_string())),
        }
    }
}

/// Groups fact rows by `group_keys`, keeping only rows accepted by `keep`
///
/// Rows with a null in any grouping column belong to no group. The map is
/// ordered by key, which makes every consumer independent of input order.
pub(crate) fn group_rows<'a, F>(
    facts: &'a [FactRow],
    group_keys: &[Column],
    keep: F,
) -> EngineResult<BTreeMap<GroupKey, Vec<&'a FactRow>>>
where
    F: Fn(&FactRow) -> bool,
{
    if group_keys.is_empty() {
        return Err(EngineError::NoGroupKeys);
    }

    let mut groups: BTreeMap<GroupKey, Vec<&FactRow>> = BTreeMap::new();
    for row in facts.iter().filter(|&row| keep(row)) {
        if let Some(key) = GroupKey::of(row, group_keys) {
            groups.entry(key).or_default().push(row);
        }
    }
    Ok(groups)
}

/// Numeric values of `column` across `rows`, sorted ascending
///
/// Returns `None` if any row is null in `column`. Sorting first makes sums
/// bit-identical however the input was ordered.
pub(crate) fn sorted_values(rows: &[&FactRow], column: Column) -> Option<Vec<f64>> {
    let mut values = rows
        .iter()
        .map(|row| row.number(column))
        .collect::<Option<Vec<f64>>>()?;
    values.sort_by(f64::total_cmp);
    Some(values)
}

fn reduce(func: AggregateFn, group_key: &GroupKey, values: &[f64]) -> EngineResult<f64> {
    if values.is_empty() {
        return Err(EngineError::EmptyGroup {
            group_key: group_key.clone(),
        });
    }

    let sum: f64 = values.iter().sum();
    Ok(match func {
        AggregateFn::Mean => sum / values.len() as f64,
        AggregateFn::Sum => sum,
        AggregateFn::Count => values.len() as f64,
    })
}

/// Computes one aggregate per distinct combination of `group_keys`
///
/// With `drop_missing`, rows whose `value_column` is null are removed before
/// grouping, so they count toward neither the value nor the support. Without
/// it, MEAN and SUM refuse to run over a null with `MissingValue`.
pub fn aggregate(
    facts: &[FactRow],
    group_keys: &[Column],
    value_column: Column,
    func: AggregateFn,
    drop_missing: bool,
) -> EngineResult<Vec<AggregateRow>> {
    if func.needs_numeric() && !value_column.is_numeric() {
        return Err(EngineError::NonNumericColumn(value_column));
    }

    let groups = group_rows(facts, group_keys, |row| {
        !drop_missing || row.is_present(value_column)
    })?;

    let mut result = Vec::with_capacity(groups.len());
    for (group_key, rows) in groups {
        let value = if func.needs_numeric() {
            let values =
                sorted_values(&rows, value_column).ok_or_else(|| EngineError::MissingValue {
                    column: value_column,
                    group_key: group_key.clone(),
                })?;
            reduce(func, &group_key, &values)?
        } else {
            rows.len() as f64
        };

        result.push(AggregateRow {
            group_key,
            statistic: func.name().to_string(),
            value,
            support_count: rows.len(),
        });
    }

    tracing::debug!(
        input_rows = facts.len(),
        groups = result.len(),
        function = %func,
        column = %value_column,
        "Aggregated fact table"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{random_facts, scenario_facts, seeded_rng, shuffled};

    fn find<'a>(rows: &'a [AggregateRow], key: &[&str]) -> Option<&'a AggregateRow> {
        rows.iter().find(|row| {
            row.group_key.0.len() == key.len()
                && row
                    .group_key
                    .0
                    .iter()
                    .zip(key)
                    .all(|(value, expected)| value.to_string() == *expected)
        })
    }

    #[test]
    fn test_mean_rating_by_item() {
        let rows = aggregate(
            &scenario_facts(),
            &[Column::ItemId],
            Column::Rating,
            AggregateFn::Mean,
            true,
        )
        .unwrap();

        assert_eq!(rows.len(), 3);
        let a = find(&rows, &["A"]).unwrap();
        assert_eq!(a.value, 4.0);
        assert_eq!(a.support_count, 3);
        assert_eq!(a.statistic, "mean");
        let b = find(&rows, &["B"]).unwrap();
        assert_eq!(b.value, 4.5);
        assert_eq!(b.support_count, 2);
        let c = find(&rows, &["C"]).unwrap();
        assert_eq!(c.value, 2.0);
        assert_eq!(c.support_count, 1);
    }

    #[test]
    fn test_count_equals_support() {
        let rows = aggregate(
            &scenario_facts(),
            &[Column::Provider],
            Column::Rating,
            AggregateFn::Count,
            false,
        )
        .unwrap();

        for row in &rows {
            assert_eq!(row.value, row.support_count as f64);
        }
        assert_eq!(find(&rows, &["coursera"]).unwrap().support_count, 4);
        assert_eq!(find(&rows, &["edx"]).unwrap().support_count, 2);
    }

    #[test]
    fn test_sum_by_user() {
        let rows = aggregate(
            &scenario_facts(),
            &[Column::UserId],
            Column::Rating,
            AggregateFn::Sum,
            true,
        )
        .unwrap();

        assert_eq!(find(&rows, &["u1"]).unwrap().value, 9.0);
        assert_eq!(find(&rows, &["u2"]).unwrap().value, 5.0);
        assert_eq!(find(&rows, &["u3"]).unwrap().value, 9.0);
    }

    #[test]
    fn test_aggregation_is_independent_of_row_order() {
        let groupings: [&[Column]; 3] = [
            &[Column::ItemId],
            &[Column::Provider, Column::Difficulty],
            &[Column::UserId, Column::Provider],
        ];

        for seed in 0..64 {
            let mut rng = seeded_rng(seed);
            let facts = random_facts(&mut rng);

            for group_keys in groupings {
                for value_column in [Column::Rating, Column::AvgRating] {
                    for func in [AggregateFn::Mean, AggregateFn::Sum, AggregateFn::Count] {
                        for drop_missing in [true, false] {
                            let baseline =
                                aggregate(&facts, group_keys, value_column, func, drop_missing);

                            for _ in 0..4 {
                                let reordered = aggregate(
                                    &shuffled(&facts, &mut rng),
                                    group_keys,
                                    value_column,
                                    func,
                                    drop_missing,
                                );
                                assert_eq!(reordered, baseline, "seed {}", seed);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_signed_zero_ratings_form_one_group() {
        use crate::models::{Item, Rating, User};
        use crate::services::joiner::join;

        let users = vec![User::new("u1", "alice"), User::new("u2", "bob")];
        let items = vec![Item::new("A", "Cryptography")];
        let ratings = vec![Rating::new("u1", "A", 0.0), Rating::new("u2", "A", -0.0)];
        let facts = join(&users, &items, &ratings).rows;

        let rows = aggregate(&facts, &[Column::Rating], Column::Rating, AggregateFn::Count, true)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].support_count, 2);
    }

    #[test]
    fn test_group_with_only_missing_values_is_absent() {
        // Item B has no catalog average rating.
        let rows = aggregate(
            &scenario_facts(),
            &[Column::ItemId],
            Column::AvgRating,
            AggregateFn::Mean,
            true,
        )
        .unwrap();

        assert!(find(&rows, &["B"]).is_none());
        assert!((find(&rows, &["A"]).unwrap().value - 4.8).abs() < 1e-9);
        assert_eq!(find(&rows, &["C"]).unwrap().support_count, 1);
    }

    #[test]
    fn test_missing_values_are_never_coerced() {
        let result = aggregate(
            &scenario_facts(),
            &[Column::ItemId],
            Column::AvgRating,
            AggregateFn::Sum,
            false,
        );

        assert_eq!(
            result,
            Err(EngineError::MissingValue {
                column: Column::AvgRating,
                group_key: GroupKey::from(["B"]),
            })
        );
    }

    #[test]
    fn test_missing_values_excluded_from_support() {
        let rows = aggregate(
            &scenario_facts(),
            &[Column::Provider],
            Column::AvgRating,
            AggregateFn::Count,
            true,
        )
        .unwrap();

        assert_eq!(find(&rows, &["coursera"]).unwrap().support_count, 4);
        assert!(find(&rows, &["edx"]).is_none());
    }

    #[test]
    fn test_composite_key_skips_null_key_components() {
        // Course C has no difficulty, so its rating belongs to no group.
        let rows = aggregate(
            &scenario_facts(),
            &[Column::University, Column::Difficulty],
            Column::Rating,
            AggregateFn::Mean,
            true,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(find(&rows, &["MIT", "Intermediate"]).unwrap().value, 4.5);
        assert_eq!(find(&rows, &["Rice", "Beginner"]).unwrap().value, 4.0);
    }

    #[test]
    fn test_mean_over_text_column_is_rejected() {
        let result = aggregate(
            &scenario_facts(),
            &[Column::ItemId],
            Column::Title,
            AggregateFn::Mean,
            true,
        );
        assert_eq!(result, Err(EngineError::NonNumericColumn(Column::Title)));
    }

    #[test]
    fn test_no_group_keys_is_rejected() {
        let result = aggregate(&scenario_facts(), &[], Column::Rating, AggregateFn::Count, true);
        assert_eq!(result, Err(EngineError::NoGroupKeys));
    }

    #[test]
    fn test_reduce_empty_group_fails() {
        let key = GroupKey::from(["A"]);
        assert_eq!(
            reduce(AggregateFn::Mean, &key, &[]),
            Err(EngineError::EmptyGroup { group_key: key })
        );
    }

    #[test]
    fn test_aggregate_fn_from_str() {
        assert_eq!("MEAN".parse::<AggregateFn>().unwrap(), AggregateFn::Mean);
        assert_eq!("count".parse::<AggregateFn>().unwrap(), AggregateFn::Count);
        assert!(matches!(
            "median".parse::<AggregateFn>(),
            Err(EngineError::UnknownFunction(_))
        ));
    }
}

use serde::{Deserialize, Serialize};

use crate::{
    error::{EngineError, EngineResult},
    models::{AggregateRow, Column, FactRow, GroupKey},
    services::aggregator::{group_rows, sorted_values},
};

/// Summary statistics of one group's values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupSummary {
    pub group_key: GroupKey,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined for a single value
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// How many of a group's values reach a threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShareRow {
    pub group_key: GroupKey,
    pub total: usize,
    pub at_least: usize,
    pub ratio: f64,
}

impl From<ShareRow> for AggregateRow {
    fn from(row: ShareRow) -> Self {
        AggregateRow {
            group_key: row.group_key,
            statistic: "share_at_least".to_string(),
            value: row.ratio,
            support_count: row.total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width bucket counts of a numeric column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Histogram {
    pub column: Column,
    pub total: usize,
    pub bins: Vec<HistogramBin>,
}

fn require_numeric(column: Column) -> EngineResult<()> {
    if column.is_numeric() {
        Ok(())
    } else {
        Err(EngineError::NonNumericColumn(column))
    }
}

/// Linear interpolation between the closest ranks of sorted `values`
fn quantile(values: &[f64], q: f64) -> f64 {
    let position = q * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    values[lower] + (values[upper] - values[lower]) * (position - lower as f64)
}

fn summarize(group_key: GroupKey, values: &[f64]) -> GroupSummary {
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (squares / (count - 1) as f64).sqrt()
    });

    GroupSummary {
        group_key,
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(values, 0.25),
        median: quantile(values, 0.5),
        q75: quantile(values, 0.75),
        max: values[count - 1],
    }
}

/// Count, mean, spread and quartiles of `value_column` per group
///
/// Null values are dropped before grouping.
pub fn describe(
    facts: &[FactRow],
    group_keys: &[Column],
    value_column: Column,
) -> EngineResult<Vec<GroupSummary>> {
    require_numeric(value_column)?;

    let groups = group_rows(facts, group_keys, |row| row.is_present(value_column))?;

    let mut summaries = Vec::with_capacity(groups.len());
    for (group_key, rows) in groups {
        let values =
            sorted_values(&rows, value_column).ok_or_else(|| EngineError::MissingValue {
                column: value_column,
                group_key: group_key.clone(),
            })?;
        if values.is_empty() {
            return Err(EngineError::EmptyGroup { group_key });
        }
        summaries.push(summarize(group_key, &values));
    }

    Ok(summaries)
}

/// Share of each group's values that are `>= threshold`
///
/// The comparison is exact; a value a hair below the threshold does not
/// count. Null values are dropped before counting.
pub fn share_at_least(
    facts: &[FactRow],
    group_keys: &[Column],
    value_column: Column,
    threshold: f64,
) -> EngineResult<Vec<ShareRow>> {
    require_numeric(value_column)?;

    let groups = group_rows(facts, group_keys, |row| row.is_present(value_column))?;

    Ok(groups
        .into_iter()
        .map(|(group_key, rows)| {
            let total = rows.len();
            let at_least = rows
                .iter()
                .filter_map(|row| row.number(value_column))
                .filter(|value| *value >= threshold)
                .count();
            ShareRow {
                group_key,
                total,
                at_least,
                ratio: at_least as f64 / total as f64,
            }
        })
        .collect())
}

/// Most buckets a histogram may be asked for; every bucket is allocated up front
pub const MAX_HISTOGRAM_BINS: usize = 10_000;

/// Buckets the non-null values of `column` into `bins` equal-width bins
///
/// Bins span `[min, max]`; the last bin is closed on the right. When every
/// value is equal the range is widened by 0.5 on each side. `bins` must lie
/// in `1..=MAX_HISTOGRAM_BINS`.
pub fn histogram(facts: &[FactRow], column: Column, bins: usize) -> EngineResult<Histogram> {
    require_numeric(column)?;
    if !(1..=MAX_HISTOGRAM_BINS).contains(&bins) {
        return Err(EngineError::InvalidBins {
            bins,
            max: MAX_HISTOGRAM_BINS,
        });
    }

    let values: Vec<f64> = facts.iter().filter_map(|row| row.number(column)).collect();
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Ok(Histogram {
            column,
            total: 0,
            bins: Vec::new(),
        });
    };

    let (lower, upper) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (upper - lower) / bins as f64;

    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lower + width * i as f64,
            upper: if i + 1 == bins {
                upper
            } else {
                lower + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for value in &values {
        let index = (((value - lower) / width).floor() as usize).min(bins - 1);
        result[index].count += 1;
    }

    Ok(Histogram {
        column,
        total: values.len(),
        bins: result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, Rating, User};
    use crate::services::joiner::join;
    use crate::services::test_support::scenario_facts;

    #[test]
    fn test_describe_by_item() {
        let summaries = describe(&scenario_facts(), &[Column::ItemId], Column::Rating).unwrap();
        assert_eq!(summaries.len(), 3);

        // A: 3, 4, 5
        let a = &summaries[0];
        assert_eq!(a.group_key, GroupKey::from(["A"]));
        assert_eq!(a.count, 3);
        assert_eq!(a.mean, 4.0);
        assert!((a.std.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(a.min, 3.0);
        assert_eq!(a.q25, 3.5);
        assert_eq!(a.median, 4.0);
        assert_eq!(a.q75, 4.5);
        assert_eq!(a.max, 5.0);

        // C has a single rating
        let c = &summaries[2];
        assert_eq!(c.count, 1);
        assert_eq!(c.std, None);
        assert_eq!(c.median, 2.0);
    }

    #[test]
    fn test_describe_drops_nulls() {
        let summaries =
            describe(&scenario_facts(), &[Column::Provider], Column::AvgRating).unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].group_key, GroupKey::from(["coursera"]));
        assert_eq!(summaries[0].count, 4);
    }

    #[test]
    fn test_describe_rejects_text_column() {
        assert_eq!(
            describe(&scenario_facts(), &[Column::ItemId], Column::Provider),
            Err(EngineError::NonNumericColumn(Column::Provider))
        );
    }

    #[test]
    fn test_share_at_least_four() {
        let rows = share_at_least(&scenario_facts(), &[Column::ItemId], Column::Rating, 4.0)
            .unwrap();

        let a = &rows[0];
        assert_eq!((a.total, a.at_least), (3, 2));
        assert!((a.ratio - 2.0 / 3.0).abs() < 1e-12);

        let b = &rows[1];
        assert_eq!((b.total, b.at_least), (2, 2));
        assert_eq!(b.ratio, 1.0);

        let c = &rows[2];
        assert_eq!((c.total, c.at_least), (1, 0));
        assert_eq!(c.ratio, 0.0);
    }

    #[test]
    fn test_share_threshold_is_exact() {
        let users = vec![User::new("u1", "alice"), User::new("u2", "bob")];
        let items = vec![Item::new("A", "Cryptography")];
        let ratings = vec![
            Rating::new("u1", "A", 4.0),
            Rating::new("u2", "A", 4.0 - f64::EPSILON * 4.0),
        ];
        let facts = join(&users, &items, &ratings).rows;

        let rows = share_at_least(&facts, &[Column::ItemId], Column::Rating, 4.0).unwrap();
        assert_eq!(rows[0].at_least, 1);
    }

    #[test]
    fn test_share_row_into_aggregate() {
        let rows = share_at_least(&scenario_facts(), &[Column::ItemId], Column::Rating, 4.0)
            .unwrap();
        let aggregate: AggregateRow = rows[1].clone().into();

        assert_eq!(aggregate.statistic, "share_at_least");
        assert_eq!(aggregate.value, 1.0);
        assert_eq!(aggregate.support_count, 2);
    }

    #[test]
    fn test_histogram_of_ratings() {
        let histogram = histogram(&scenario_facts(), Column::Rating, 3).unwrap();

        // Ratings 2, 3, 4, 4, 5, 5 over [2, 5] in width-1 bins
        assert_eq!(histogram.total, 6);
        let counts: Vec<usize> = histogram.bins.iter().map(|bin| bin.count).collect();
        assert_eq!(counts, vec![1, 1, 4]);
        assert_eq!(histogram.bins[0].lower, 2.0);
        assert_eq!(histogram.bins[2].upper, 5.0);
    }

    #[test]
    fn test_histogram_with_constant_values() {
        let users = vec![User::new("u1", "alice")];
        let items = vec![Item::new("A", "Cryptography")];
        let facts = join(&users, &items, &[Rating::new("u1", "A", 4.0)]).rows;

        let histogram = histogram(&facts, Column::Rating, 2).unwrap();
        assert_eq!(histogram.bins.len(), 2);
        assert_eq!(histogram.bins[0].lower, 3.5);
        assert_eq!(histogram.bins[1].upper, 4.5);
        assert_eq!(histogram.bins[1].count, 1);
    }

    #[test]
    fn test_histogram_edge_cases() {
        assert_eq!(
            histogram(&scenario_facts(), Column::Rating, 0),
            Err(EngineError::InvalidBins {
                bins: 0,
                max: MAX_HISTOGRAM_BINS,
            })
        );

        let empty = histogram(&[], Column::Rating, 5).unwrap();
        assert_eq!(empty.total, 0);
        assert!(empty.bins.is_empty());
    }

    #[test]
    fn test_histogram_rejects_oversized_bin_counts() {
        let facts = scenario_facts();
        for bins in [MAX_HISTOGRAM_BINS + 1, usize::MAX] {
            assert_eq!(
                histogram(&facts, Column::Rating, bins),
                Err(EngineError::InvalidBins {
                    bins,
                    max: MAX_HISTOGRAM_BINS,
                })
            );
        }

        let widest = histogram(&facts, Column::Rating, MAX_HISTOGRAM_BINS).unwrap();
        assert_eq!(widest.bins.len(), MAX_HISTOGRAM_BINS);
        assert_eq!(widest.bins.iter().map(|bin| bin.count).sum::<usize>(), 6);
    }
}

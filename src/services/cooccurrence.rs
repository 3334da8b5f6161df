use std::collections::BTreeMap;

use crate::{
    error::{EngineError, EngineResult},
    models::{AffinityRow, FactRow, ItemId},
    services::pivot::RatingMatrix,
};

/// Scores every item against `reference_item` by shared raters
///
/// Builds the rating matrix from `facts` first; callers that score many
/// reference items over one dataset should build the matrix once and use
/// [`score_with_matrix`].
pub fn score(
    facts: &[FactRow],
    reference_item: &ItemId,
    smoothing: u32,
) -> EngineResult<Vec<AffinityRow>> {
    score_with_matrix(&RatingMatrix::from_facts(facts), reference_item, smoothing)
}

/// Co-occurrence scores of all items rated alongside `reference_item`
///
/// For the set `R` of users who rated the reference item, each other item
/// scores `(co_raters + smoothing) / (|R| + smoothing)`, where `co_raters`
/// counts the members of `R` who also rated it. The reference item itself is
/// never part of the output. Ordered by score, then `co_raters`, both
/// descending, then by item id.
pub fn score_with_matrix(
    matrix: &RatingMatrix,
    reference_item: &ItemId,
    smoothing: u32,
) -> EngineResult<Vec<AffinityRow>> {
    let reference_raters = matrix.rater_count(reference_item);
    if reference_raters == 0 {
        return Err(EngineError::UnknownItem {
            item_id: reference_item.clone(),
        });
    }

    // Each rater holds a set of items, so every user adds at most one per item.
    let mut co_raters: BTreeMap<&ItemId, usize> = BTreeMap::new();
    for user_id in matrix.raters(reference_item) {
        let Some(items) = matrix.items_rated_by(user_id) else {
            continue;
        };
        for item_id in items.iter().filter(|item_id| *item_id != reference_item) {
            *co_raters.entry(item_id).or_insert(0) += 1;
        }
    }

    let pseudocount = f64::from(smoothing);
    let denominator = reference_raters as f64 + pseudocount;

    let mut rows: Vec<AffinityRow> = co_raters
        .into_iter()
        .map(|(other_item, co_raters)| AffinityRow {
            reference_item: reference_item.clone(),
            other_item: other_item.clone(),
            co_raters,
            reference_raters,
            score: (co_raters as f64 + pseudocount) / denominator,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.co_raters.cmp(&a.co_raters))
            .then_with(|| a.other_item.cmp(&b.other_item))
    });

    tracing::debug!(
        reference_item = %reference_item,
        reference_raters,
        candidates = rows.len(),
        smoothing,
        "Scored co-occurring items"
    );

    Ok(rows)
}

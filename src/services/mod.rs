pub mod aggregator;
pub mod cooccurrence;
pub mod dataset;
pub mod joiner;
pub mod pivot;
pub mod ranker;
pub mod statistics;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::{aggregate, AggregateFn};
pub use cooccurrence::{score, score_with_matrix};
pub use dataset::{Dataset, DatasetSummary};
pub use joiner::{join, JoinReport, Joined};
pub use pivot::{cross_tab, CrossTab, CrossTabCell, RatingMatrix};
pub use ranker::{rank, SortKey};
pub use statistics::{
    describe, histogram, share_at_least, GroupSummary, Histogram, ShareRow, MAX_HISTOGRAM_BINS,
};

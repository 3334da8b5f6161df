use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::{FactRow, Item, Rating, User},
    services::{
        joiner::{join, JoinReport},
        pivot::RatingMatrix,
    },
};

/// Immutable snapshot of a ratings dataset and everything derived from it
///
/// The fact table and rating matrix are computed once at construction and
/// never change afterwards, so a snapshot can be shared between any number
/// of concurrent readers.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub users: Vec<User>,
    pub items: Vec<Item>,
    pub ratings: Vec<Rating>,
    pub facts: Vec<FactRow>,
    pub matrix: RatingMatrix,
    pub join_report: JoinReport,
}

/// Headline numbers of a dataset snapshot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatasetSummary {
    pub id: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub users: usize,
    pub items: usize,
    pub ratings: usize,
    pub fact_rows: usize,
    pub join_report: JoinReport,
    /// Filled share of the user x item rating matrix
    pub density: f64,
}

impl Dataset {
    pub fn build(users: Vec<User>, items: Vec<Item>, ratings: Vec<Rating>) -> Self {
        let joined = join(&users, &items, &ratings);
        let matrix = RatingMatrix::from_facts(&joined.rows);

        let dataset = Self {
            id: Uuid::new_v4(),
            loaded_at: Utc::now(),
            users,
            items,
            ratings,
            facts: joined.rows,
            matrix,
            join_report: joined.report,
        };

        tracing::info!(
            dataset_id = %dataset.id,
            users = dataset.users.len(),
            items = dataset.items.len(),
            fact_rows = dataset.facts.len(),
            dropped = dataset.join_report.dropped(),
            "Dataset snapshot built"
        );

        dataset
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            id: self.id,
            loaded_at: self.loaded_at,
            users: self.users.len(),
            items: self.items.len(),
            ratings: self.ratings.len(),
            fact_rows: self.facts.len(),
            join_report: self.join_report,
            density: self.matrix.density(),
        }
    }
}

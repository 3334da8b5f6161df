use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{Item, Rating, User};
use crate::services::{Dataset, DatasetSummary};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub config: Arc<Config>,
}

/// Inner state that can be replaced
pub struct AppStateInner {
    /// Current snapshot; replaced wholesale on every upload
    pub dataset: Option<Arc<Dataset>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl AppState {
    /// Creates application state with no dataset loaded
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppStateInner { dataset: None })),
            config: Arc::new(config),
        }
    }

    /// Builds a snapshot from the given relations and makes it current
    pub async fn load(
        &self,
        users: Vec<User>,
        items: Vec<Item>,
        ratings: Vec<Rating>,
    ) -> DatasetSummary {
        let dataset = Arc::new(Dataset::build(users, items, ratings));
        let summary = dataset.summary();

        let mut inner = self.inner.write().await;
        inner.dataset = Some(dataset);

        summary
    }

    /// Current snapshot; the lock is released before the caller computes on it
    pub async fn dataset(&self) -> AppResult<Arc<Dataset>> {
        let inner = self.inner.read().await;
        inner.dataset.clone().ok_or(AppError::NoDataset)
    }
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::AppResult;
use crate::middleware::RequestId;
use crate::models::{
    AffinityRow, AggregateRow, Column, FactRow, GroupKey, Item, ItemId, Rating, User,
};
use crate::services::{
    aggregate, cross_tab, describe, histogram, rank, score_with_matrix, share_at_least,
    AggregateFn, CrossTabCell, DatasetSummary, GroupSummary, Histogram, ShareRow, SortKey,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct LoadDatasetRequest {
    pub users: Vec<User>,
    pub items: Vec<Item>,
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Deserialize)]
pub struct AggregateRequest {
    pub group_by: Vec<String>,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    #[serde(default = "default_function")]
    pub function: String,
    #[serde(default = "default_true")]
    pub drop_missing: bool,
}

#[derive(Debug, Deserialize)]
pub struct PopularityRequest {
    #[serde(flatten)]
    pub aggregate: AggregateRequest,
    pub min_support: Option<i64>,
    pub sort_by: Option<String>,
    #[serde(default = "default_true")]
    pub descending: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DescribeRequest {
    pub group_by: Vec<String>,
    #[serde(default = "default_value_column")]
    pub value_column: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub group_by: Vec<String>,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    pub threshold: f64,
    pub min_support: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CrossTabRequest {
    pub row: String,
    pub column: String,
    #[serde(default = "default_value_column")]
    pub value_column: String,
}

#[derive(Debug, Serialize)]
pub struct CrossTabResponse {
    pub row: Column,
    pub column: Column,
    pub value_column: Column,
    pub cells: Vec<CrossTabCell>,
}

#[derive(Debug, Deserialize)]
pub struct HistogramQuery {
    #[serde(default = "default_value_column")]
    pub column: String,
    #[serde(default = "default_bins")]
    pub bins: usize,
}

#[derive(Debug, Deserialize)]
pub struct AffinityQuery {
    pub smoothing: Option<u32>,
    pub limit: Option<usize>,
}

fn default_value_column() -> String {
    Column::Rating.name().to_string()
}

fn default_function() -> String {
    AggregateFn::Mean.name().to_string()
}

fn default_true() -> bool {
    true
}

fn default_bins() -> usize {
    10
}

impl AggregateRequest {
    fn run(&self, facts: &[FactRow]) -> AppResult<Vec<AggregateRow>> {
        let group_keys = Column::parse_all(&self.group_by)?;
        let value_column: Column = self.value_column.parse()?;
        let function: AggregateFn = self.function.parse()?;

        Ok(aggregate(
            facts,
            &group_keys,
            value_column,
            function,
            self.drop_missing,
        )?)
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Replace the current dataset with a new snapshot
pub async fn load_dataset(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<LoadDatasetRequest>,
) -> (StatusCode, Json<DatasetSummary>) {
    tracing::info!(
        request_id = %request_id,
        users = request.users.len(),
        items = request.items.len(),
        ratings = request.ratings.len(),
        "Loading dataset"
    );

    let summary = state
        .load(request.users, request.items, request.ratings)
        .await;

    (StatusCode::CREATED, Json(summary))
}

/// Summary of the current dataset
pub async fn get_dataset(State(state): State<AppState>) -> AppResult<Json<DatasetSummary>> {
    let dataset = state.dataset().await?;
    Ok(Json(dataset.summary()))
}

/// Grouped aggregate over the fact table, in group-key order
pub async fn aggregate_facts(
    State(state): State<AppState>,
    Json(request): Json<AggregateRequest>,
) -> AppResult<Json<Vec<AggregateRow>>> {
    let dataset = state.dataset().await?;
    let rows = request.run(&dataset.facts)?;
    Ok(Json(rows))
}

/// Aggregate, filter by minimum support and rank
pub async fn popularity(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<PopularityRequest>,
) -> AppResult<Json<Vec<AggregateRow>>> {
    let dataset = state.dataset().await?;

    let min_support = request
        .min_support
        .unwrap_or(state.config.default_min_support);
    let sort_by = match &request.sort_by {
        Some(key) => key.parse()?,
        None => SortKey::default(),
    };

    let aggregates = request.aggregate.run(&dataset.facts)?;
    let mut ranked = rank(&aggregates, min_support, sort_by, request.descending)?;
    ranked.truncate(state.config.limit(request.limit));

    tracing::info!(
        request_id = %request_id,
        groups = aggregates.len(),
        returned = ranked.len(),
        min_support,
        "Popularity ranking computed"
    );

    Ok(Json(ranked))
}

/// Descriptive statistics per group
pub async fn describe_groups(
    State(state): State<AppState>,
    Json(request): Json<DescribeRequest>,
) -> AppResult<Json<Vec<GroupSummary>>> {
    let dataset = state.dataset().await?;
    let group_keys = Column::parse_all(&request.group_by)?;
    let value_column: Column = request.value_column.parse()?;

    Ok(Json(describe(&dataset.facts, &group_keys, value_column)?))
}

/// Share of ratings at or above a threshold per group, best share first
pub async fn share(
    State(state): State<AppState>,
    Json(request): Json<ShareRequest>,
) -> AppResult<Json<Vec<ShareRow>>> {
    let dataset = state.dataset().await?;
    let group_keys = Column::parse_all(&request.group_by)?;
    let value_column: Column = request.value_column.parse()?;
    let min_support = request
        .min_support
        .unwrap_or(state.config.default_min_support);

    let rows = share_at_least(&dataset.facts, &group_keys, value_column, request.threshold)?;
    let aggregates: Vec<AggregateRow> = rows.iter().cloned().map(AggregateRow::from).collect();
    let ranked = rank(&aggregates, min_support, SortKey::Value, true)?;

    let mut by_key: HashMap<GroupKey, ShareRow> = rows
        .into_iter()
        .map(|row| (row.group_key.clone(), row))
        .collect();
    let ordered: Vec<ShareRow> = ranked
        .iter()
        .filter_map(|aggregate| by_key.remove(&aggregate.group_key))
        .take(state.config.limit(request.limit))
        .collect();

    Ok(Json(ordered))
}

/// Two-way table of mean values
pub async fn cross_tabulate(
    State(state): State<AppState>,
    Json(request): Json<CrossTabRequest>,
) -> AppResult<Json<CrossTabResponse>> {
    let dataset = state.dataset().await?;
    let row: Column = request.row.parse()?;
    let column: Column = request.column.parse()?;
    let value_column: Column = request.value_column.parse()?;

    let tab = cross_tab(&dataset.facts, row, column, value_column)?;

    Ok(Json(CrossTabResponse {
        row,
        column,
        value_column,
        cells: tab.cells().into_iter().cloned().collect(),
    }))
}

/// Histogram of a numeric column
pub async fn rating_histogram(
    State(state): State<AppState>,
    Query(params): Query<HistogramQuery>,
) -> AppResult<Json<Histogram>> {
    let dataset = state.dataset().await?;
    let column: Column = params.column.parse()?;
    Ok(Json(histogram(&dataset.facts, column, params.bins)?))
}

/// Items most often rated together with the given item
pub async fn item_affinity(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(item_id): Path<String>,
    Query(params): Query<AffinityQuery>,
) -> AppResult<Json<Vec<AffinityRow>>> {
    let dataset = state.dataset().await?;
    let reference_item = ItemId(item_id);
    let smoothing = params.smoothing.unwrap_or(state.config.default_smoothing);

    let mut rows = score_with_matrix(&dataset.matrix, &reference_item, smoothing)?;
    rows.truncate(state.config.limit(params.limit));

    tracing::info!(
        request_id = %request_id,
        reference_item = %reference_item,
        smoothing,
        returned = rows.len(),
        "Affinity scores computed"
    );

    Ok(Json(rows))
}

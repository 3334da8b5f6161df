use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::{Column, GroupKey, ItemId};

/// Errors raised by the aggregation and scoring engine
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Group {group_key} has no contributing rows")]
    EmptyGroup { group_key: GroupKey },

    #[error("Invalid minimum support threshold: {min_support}")]
    InvalidThreshold { min_support: i64 },

    #[error("Item {item_id} has no recorded ratings")]
    UnknownItem { item_id: ItemId },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column {0} is not numeric")]
    NonNumericColumn(Column),

    #[error("Missing value in column {column} for group {group_key}")]
    MissingValue { column: Column, group_key: GroupKey },

    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),

    #[error("Unknown aggregate function: {0}")]
    UnknownFunction(String),

    #[error("At least one grouping column is required")]
    NoGroupKeys,

    #[error("Histogram needs between 1 and {max} bins, got {bins}")]
    InvalidBins { bins: usize, max: usize },
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("No dataset loaded")]
    NoDataset,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Engine(EngineError::UnknownItem { .. }) => StatusCode::NOT_FOUND,
            AppError::Engine(EngineError::EmptyGroup { .. })
            | AppError::Engine(EngineError::MissingValue { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Engine(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NoDataset => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

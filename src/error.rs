use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::model::Id;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failures of the variant endpoints and the reconciler behind them
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Id },

    #[error("{count} price combinations exceed the limit of {limit}")]
    TooManyCombinations { count: usize, limit: usize },

    #[error("invalid variant update: {0}")]
    Validation(String),

    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn not_found(kind: &'static str, id: Id) -> Self {
        CatalogError::NotFound { kind, id }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
            CatalogError::TooManyCombinations { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::debug!("request rejected: {}", self);
        }
        (status, Json(ErrorResponse::new(&self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_error_names_count_and_limit() {
        let err = CatalogError::TooManyCombinations { count: 6, limit: 5 };
        assert_eq!(err.to_string(), "6 price combinations exceed the limit of 5");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_storage_error_keeps_context_chain() {
        use anyhow::Context;
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("connection reset"));
        let err = CatalogError::from(err.context("Failed to delete rate").unwrap_err());
        assert_eq!(
            err.to_string(),
            "storage failure: Failed to delete rate: connection reset"
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = CatalogError::not_found("property", 9);
        assert_eq!(err.to_string(), "property 9 not found");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}

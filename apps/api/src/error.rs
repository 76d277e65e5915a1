//! # API Errors
//!
//! What HTTP clients see when a request fails.
//!
//! ```text
//! ┌──────────────────────────────────────────┬────────┬──────────────────────┐
//! │ Source                                   │ Status │ code                 │
//! ├──────────────────────────────────────────┼────────┼──────────────────────┤
//! │ ValidationError (any layer)              │  400   │ validation_error     │
//! │ CoreError::InsufficientStock             │  400   │ insufficient_stock   │
//! │ CoreError::InsufficientLoaned            │  400   │ insufficient_loaned  │
//! │ Malformed JSON body                      │  400   │ invalid_body         │
//! │ DbError::UniqueViolation                 │  400   │ duplicate            │
//! │ DbError::NotFound                        │  404   │ not_found            │
//! │ DbError::ForeignKeyViolation             │  409   │ protected            │
//! │ Everything else                          │  500   │ internal_error       │
//! └──────────────────────────────────────────┴────────┴──────────────────────┘
//! ```
//!
//! Body: `{"code": ..., "detail": ..., "field": ...}` with `field` only for
//! errors tied to one input field.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use stockroom_core::{CoreError, ValidationError};
use stockroom_db::DbError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Borrow/Return refused by the stock rules.
    #[error("{0}")]
    Stock(CoreError),

    #[error("{0}")]
    InvalidBody(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::Stock(_)
            | ApiError::InvalidBody(_)
            | ApiError::Duplicate(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Stock(CoreError::InsufficientLoaned { .. }) => "insufficient_loaned",
            ApiError::Stock(_) => "insufficient_stock",
            ApiError::InvalidBody(_) => "invalid_body",
            ApiError::Duplicate(_) => "duplicate",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict(_) => "protected",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ApiError::Validation(e),
            stock => ApiError::Stock(stock),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Rejected(core) => core.into(),
            DbError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            DbError::UniqueViolation { field, .. } => {
                ApiError::Duplicate(format!("A record with this {field} already exists."))
            }
            DbError::ForeignKeyViolation { .. } => ApiError::Conflict(
                "The record is still referenced by other records.".to_string(),
            ),
            other => {
                error!(error = %other, "Database failure");
                ApiError::Internal("Internal server error.".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let field = match &self {
            ApiError::Validation(e) => Some(e.field().to_string()),
            _ => None,
        };
        let body = ErrorBody {
            code: self.code(),
            detail: self.to_string(),
            field,
        };

        (self.status(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

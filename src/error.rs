// src/error.rs

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Boxed cause carried by the wrapping error variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Account,
    Author,
    Test,
    TestResult,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Account => "account",
            Entity::Author => "author",
            Entity::Test => "test",
            Entity::TestResult => "result",
        };
        f.write_str(name)
    }
}

/// Every failure a service operation can report.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing record by key. Admin login also reports a non-admin account this way.
    #[error("{entity} not found: {key}")]
    NotFound { entity: Entity, key: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("failed to create {entity}")]
    CreateFailed {
        entity: Entity,
        #[source]
        source: BoxError,
    },

    #[error("failed to update {entity} {key}")]
    UpdateFailed {
        entity: Entity,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to fetch dashboard statistics")]
    AggregationFailed(#[source] BoxError),

    #[error("failed to fetch {entity}")]
    FetchFailed {
        entity: Entity,
        #[source]
        source: BoxError,
    },
}

impl ServiceError {
    pub fn not_found(entity: Entity, key: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn fetch_failed(entity: Entity, source: impl Into<BoxError>) -> Self {
        ServiceError::FetchFailed {
            entity,
            source: source.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::CreateFailed { .. }
            | ServiceError::UpdateFailed { .. }
            | ServiceError::AggregationFailed(_)
            | ServiceError::FetchFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Converts the error into a JSON response with appropriate HTTP status code.
/// Internal causes are logged and never sent to the client.
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = if status.is_server_error() {
            tracing::error!(error = ?self, "Internal Server Error: {}", self);
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Exactly one row was expected and the database disagreed.
    #[error("Data integrity violation: {0}")]
    Integrity(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Request is missing mandatory top-level keys or uses the wrong verb.
    #[error("Not acceptable")]
    NotAcceptable,

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Not logged in")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Notification relay error: {0}")]
    Notification(String),

    #[error("Compute job error: {0}")]
    ComputeJob(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::Database(e) => {
                tracing::error!("Database error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            Self::Integrity(msg) => {
                tracing::error!("Data integrity violation: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            Self::UnknownAction(action) => {
                tracing::warn!(action = %action, "Rejected unknown action");
                (StatusCode::BAD_REQUEST, format!("Unknown action: {action}"))
            }
            // Callers of the peripheral endpoints only look at the status here
            Self::NotAcceptable => return StatusCode::NOT_ACCEPTABLE.into_response(),
            Self::NotImplemented(what) => {
                tracing::warn!(what = %what, "Not implemented");
                return (StatusCode::NOT_IMPLEMENTED, Json(json!({}))).into_response();
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Not logged in".to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            Self::Notification(msg) => {
                tracing::error!("Notification relay error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Notification relay error: {msg}"),
                )
            }
            Self::ComputeJob(msg) => {
                tracing::error!("Compute job error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Compute job failed".to_string(),
                )
            }
            Self::Json(e) => {
                tracing::error!("Serialization error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            Self::Io(e) => {
                tracing::error!("I/O error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            Self::Config(e) => {
                tracing::error!("Config error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

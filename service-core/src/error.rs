use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A domain failure that carries its own stable, caller-visible code.
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        code: &'static str,
        message: String,
    },

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Rejected { status, .. } => *status,
            AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorBody {
        match self {
            AppError::Rejected { code, message, .. } => ErrorBody {
                error: message,
                code,
                details: None,
            },
            // Internal details stay in the logs, never in the response.
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal error");
                ErrorBody {
                    error: "Internal server error".to_string(),
                    code: "internal_error",
                    details: None,
                }
            }
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error");
                ErrorBody {
                    error: "Database error".to_string(),
                    code: "storage_error",
                    details: None,
                }
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                ErrorBody {
                    error: "Configuration error".to_string(),
                    code: "configuration_error",
                    details: None,
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}

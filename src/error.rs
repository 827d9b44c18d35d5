use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum NotebookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Directory {} is not writable: {source}", .path.display())]
    NotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid credential: {0}")]
    InvalidCredential(&'static str),

    #[error("Administrator not found: {0}")]
    AdminNotFound(String),

    #[error("An administrator was created concurrently by another process")]
    SeedConflict,
}

#[cfg(test)]
impl NotebookError {
    /// True when SQLite rejected a write because of a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            NotebookError::DatabaseError(SqlxError::Database(db)) if db.is_unique_violation()
        )
    }
}

impl IntoResponse for NotebookError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            NotebookError::AdminNotFound(_) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: "Administrator not found.".to_string(),
                },
            ),
            NotebookError::InvalidCredential(reason) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "INVALID_CREDENTIAL".to_string(),
                    message: reason.to_string(),
                },
            ),
            NotebookError::DatabaseError(_)
            | NotebookError::Io(_)
            | NotebookError::NotWritable { .. }
            | NotebookError::Config(_)
            | NotebookError::PasswordHash(_)
            | NotebookError::SeedConflict
            | NotebookError::Join(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                },
            ),
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Fatal startup failures. Each aborts the process with its own exit code.
#[derive(Debug, ThisError)]
pub enum StartupError {
    #[error("storage unavailable at {}: {source}", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: NotebookError,
    },

    #[error("administrator bootstrap failed: {0}")]
    BootstrapFailed(#[source] NotebookError),

    #[error("failed to listen on {addr}: {source}")]
    ListenFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

impl StartupError {
    pub fn stage(&self) -> &'static str {
        match self {
            StartupError::StorageUnavailable { .. } => "storage",
            StartupError::BootstrapFailed(_) => "bootstrap",
            StartupError::ListenFailed { .. } => "listen",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::StorageUnavailable { .. } => 2,
            StartupError::BootstrapFailed(_) => 3,
            StartupError::ListenFailed { .. } => 4,
        }
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

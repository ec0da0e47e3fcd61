use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quire_common::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::catalog::CatalogError;
use crate::encryption::EncryptionError;
use crate::pipeline::PipelineError;
use crate::registry::RegistryError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `INTEGRITY_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be 1-256 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    /// Catalog and blob store disagree. Contains the operator-facing detail.
    Integrity(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Integrity(detail) => {
                tracing::error!("Integrity error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTEGRITY_ERROR",
                        message: "Content metadata exists but its stored bytes are missing"
                            .into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidId(msg) => {
                AppError::Validation(format!("Invalid content id: {msg}"))
            }
            StorageError::NotFound(id) => AppError::NotFound(format!("Blob '{id}' not found")),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => AppError::NotFound(format!("Content '{id}' not found")),
            RegistryError::Integrity(_) => AppError::Integrity(err.to_string()),
            RegistryError::Source { .. } => AppError::Validation(err.to_string()),
            RegistryError::Storage(e) => e.into(),
            RegistryError::Catalog(e) => e.into(),
        }
    }
}

impl From<EncryptionError> for AppError {
    fn from(err: EncryptionError) -> Self {
        AppError::Internal(format!("encryption failed: {err}"))
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => AppError::Validation(msg),
            PipelineError::NotFound(msg) => AppError::NotFound(msg),
            PipelineError::Encryption(e) => e.into(),
            PipelineError::Registry(e) => e.into(),
            PipelineError::Catalog(e) => e.into(),
            PipelineError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}

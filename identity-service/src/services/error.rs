use service_core::axum::http::StatusCode;
use service_core::error::AppError;
use thiserror::Error;

use super::store::{StoreError, UniqueKey};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("An account with this email already exists")]
    EmailConflict,

    #[error("Tenant slug already taken")]
    SlugConflict,

    #[error("Could not generate a unique tenant slug after {attempts} attempts")]
    SlugExhausted { attempts: u32 },

    #[error("Magic link not found")]
    MagicLinkNotFound,

    #[error("Magic link has expired")]
    MagicLinkExpired,

    #[error("Magic link has already been used")]
    MagicLinkUsed,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid assertion: {0}")]
    InvalidAssertion(String),

    #[error("Storage error: {0}")]
    Storage(anyhow::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Signing error: {0}")]
    Signing(String),
}

/// Stable, caller-visible error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    UniqueConflict,
    NotFound,
    Expired,
    AlreadyUsed,
    InvalidCredential,
    StorageError,
    ConfigurationError,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::UniqueConflict => "unique_conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Expired => "expired",
            ErrorKind::AlreadyUsed => "already_used",
            ErrorKind::InvalidCredential => "invalid_credential",
            ErrorKind::StorageError => "storage_error",
            ErrorKind::ConfigurationError => "configuration_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::UniqueConflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Expired | ErrorKind::AlreadyUsed | ErrorKind::InvalidCredential => {
                StatusCode::UNAUTHORIZED
            }
            ErrorKind::StorageError | ErrorKind::ConfigurationError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidInput(_) => ErrorKind::InvalidInput,
            ServiceError::EmailConflict
            | ServiceError::SlugConflict
            | ServiceError::SlugExhausted { .. } => ErrorKind::UniqueConflict,
            ServiceError::MagicLinkNotFound => ErrorKind::NotFound,
            ServiceError::MagicLinkExpired => ErrorKind::Expired,
            ServiceError::MagicLinkUsed => ErrorKind::AlreadyUsed,
            ServiceError::InvalidApiKey | ServiceError::InvalidAssertion(_) => {
                ErrorKind::InvalidCredential
            }
            ServiceError::Storage(_) => ErrorKind::StorageError,
            ServiceError::Configuration(_) | ServiceError::Signing(_) => {
                ErrorKind::ConfigurationError
            }
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(UniqueKey::AccountEmail) => ServiceError::EmailConflict,
            StoreError::UniqueViolation(UniqueKey::TenantSlug) => ServiceError::SlugConflict,
            StoreError::UniqueViolation(UniqueKey::MagicLinkTokenHash) => {
                ServiceError::Storage(anyhow::anyhow!("magic link token hash collision"))
            }
            StoreError::Backend(e) => ServiceError::Storage(e),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Storage(e) => AppError::DatabaseError(e),
            ServiceError::Configuration(e) | ServiceError::Signing(e) => {
                AppError::ConfigError(anyhow::anyhow!(e))
            }
            other => {
                let kind = other.kind();
                AppError::Rejected {
                    status: kind.status(),
                    code: kind.code(),
                    message: other.to_string(),
                }
            }
        }
    }
}

//! Shared error types for the services crate.

use thiserror::Error;

use mentornet_core::model::BackendSettingsError;

/// Failure to obtain any HTTP response at all.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("response body is not valid JSON: {0}")]
    Decode(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Why a single candidate endpoint did not yield usable data.
///
/// Every variant is recoverable: the caller moves on to the next candidate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CandidateMissReason {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("non-success status {0}")]
    HttpStatus(u16),
    #[error("success response without a body")]
    EmptyBody,
    #[error("response shape not recognized")]
    UnrecognizedShape,
    #[error("no item carried a usable id")]
    NoUsableItems,
    #[error("response body is not an object")]
    NotAnObject,
    #[error("no entry matched the course id")]
    NoMatchingEntry,
    #[error("response carried no count")]
    MissingCount,
}

impl From<TransportError> for CandidateMissReason {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Errors emitted while building the HTTP transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(transparent)]
    Settings(#[from] BackendSettingsError),
    #[error("invalid credential header: {0}")]
    InvalidCredential(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while assembling app-facing services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] storage::sqlite::SqliteInitError),
}

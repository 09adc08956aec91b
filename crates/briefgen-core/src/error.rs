//! Error types for the brief client core
//!
//! Transport failures are converted into [`TransferError`] at the transfer
//! boundary; the session never sees a raw `reqwest` error.

use thiserror::Error;

/// Misuse of the selection API (UI-contract violation, not a data error)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("index {index} is out of bounds for a selection of {len} file(s)")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Failures from the two exchanges with the brief service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Submit failed: network error or non-2xx status. Fatal to the attempt.
    #[error("{reason}")]
    SubmissionFailed {
        reason: String,
        status: Option<u16>,
    },

    /// Artifact fetch failed. Not fatal: the structured results still stand.
    #[error("artifact '{reference}' unavailable: {reason}")]
    ArtifactUnavailable { reference: String, reason: String },
}

impl TransferError {
    pub fn submission(reason: impl Into<String>, status: Option<u16>) -> Self {
        TransferError::SubmissionFailed {
            reason: reason.into(),
            status,
        }
    }

    pub fn artifact(reference: &str, reason: impl Into<String>) -> Self {
        TransferError::ArtifactUnavailable {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}

/// Config load/save failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid service URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

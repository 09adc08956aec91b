//! UI-agnostic session state types
//!
//! These are read by every front end; only [`crate::session::Session`]
//! changes them.

use crate::artifact::ArtifactHandle;
use crate::normalize::BriefResult;

/// Lifecycle of the current submission
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Submitting,
    Succeeded {
        result: BriefResult,
        /// Absent when the document could not be fetched
        artifact: Option<ArtifactHandle>,
    },
    Failed {
        message: String,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Submitting => "submitting",
            SessionState::Succeeded { .. } => "succeeded",
            SessionState::Failed { .. } => "failed",
        }
    }

    pub fn result(&self) -> Option<&BriefResult> {
        match self {
            SessionState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn artifact(&self) -> Option<ArtifactHandle> {
        match self {
            SessionState::Succeeded { artifact, .. } => *artifact,
            _ => None,
        }
    }
}

/// Short user-facing status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Submitting,
    Succeeded,
    SucceededWithoutArtifact,
    Failed(String),
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusMessage::Submitting => write!(f, "Uploading..."),
            StatusMessage::Succeeded => write!(f, "Brief generated!"),
            StatusMessage::SucceededWithoutArtifact => write!(
                f,
                "Brief generated, but the document download is unavailable"
            ),
            StatusMessage::Failed(reason) => write!(f, "Error: {}", reason),
        }
    }
}

//! Transfer client: the two exchanges with the brief service
//!
//! `submit` uploads the selection and returns the raw JSON payload;
//! `fetch_artifact` downloads the generated document by reference. Neither
//! holds session state, so both can be re-invoked freely.

pub mod http;

use async_trait::async_trait;

use crate::error::TransferError;
use crate::language::OutputLanguage;
use crate::selection::{PendingFile, Selection};

pub use http::HttpBriefClient;

/// Untyped JSON body of a successful submit
pub type RawBriefPayload = serde_json::Value;

/// One submission: every selected file plus the output language.
/// Built fresh for each attempt.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub files: Vec<PendingFile>,
    pub language: OutputLanguage,
}

impl SubmissionRequest {
    pub fn from_selection(selection: &Selection, language: OutputLanguage) -> Self {
        Self {
            files: selection.files().to_vec(),
            language,
        }
    }
}

/// Generated document returned by the artifact fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryArtifact {
    pub reference: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait BriefService: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> Result<RawBriefPayload, TransferError>;

    async fn fetch_artifact(&self, reference: &str) -> Result<BinaryArtifact, TransferError>;
}

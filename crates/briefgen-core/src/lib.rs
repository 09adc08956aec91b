pub mod artifact;
pub mod config;
pub mod error;
pub mod language;
pub mod normalize;
pub mod selection;
pub mod session;
pub mod state;
pub mod transfer;

// Re-export main types for convenience
pub use artifact::{ArtifactHandle, ArtifactStore};
pub use config::Config;
pub use error::{ConfigError, SelectionError, TransferError};
pub use language::OutputLanguage;
pub use normalize::{
    normalize, ActionItem, Assignee, Attendee, BriefResult, DeadlineUrgency, Meeting, PriorityTier,
    SummaryCounts,
};
pub use selection::{FileKind, PendingFile, Selection};
pub use session::{run_submission, Session, SubmissionOutcome, SubmissionTicket};
pub use state::{SessionState, StatusMessage};
pub use transfer::{BinaryArtifact, BriefService, HttpBriefClient, RawBriefPayload, SubmissionRequest};

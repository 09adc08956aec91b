//! Session state machine
//!
//! Owns the selection, the lifecycle state, and the artifact store. A
//! submission runs in three steps so a front end can keep its event loop
//! responsive:
//!
//! 1. [`Session::begin_submission`] moves `Idle`/`Succeeded`/`Failed` to
//!    `Submitting` and hands out a [`SubmissionTicket`].
//! 2. [`run_submission`] performs submit then artifact fetch without
//!    borrowing the session (safe to `tokio::spawn`).
//! 3. [`Session::complete_submission`] applies the outcome.
//!
//! [`Session::submit`] chains all three for callers that can simply await.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::artifact::{ArtifactHandle, ArtifactStore};
use crate::config::Config;
use crate::error::{SelectionError, TransferError};
use crate::language::OutputLanguage;
use crate::normalize::{normalize, BriefResult};
use crate::selection::{PendingFile, Selection};
use crate::state::{SessionState, StatusMessage};
use crate::transfer::{BinaryArtifact, BriefService, SubmissionRequest};

const ARTIFACT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Permission to run one submission, issued by `begin_submission`
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    generation: u64,
    selection_revision: u64,
    artifact_retries: u32,
    pub request: SubmissionRequest,
}

impl SubmissionTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Successful submit, with or without the document
#[derive(Debug, Clone)]
pub struct SubmitSuccess {
    pub result: BriefResult,
    pub artifact: Result<BinaryArtifact, TransferError>,
}

/// Result of [`run_submission`], fed back through `complete_submission`
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    generation: u64,
    selection_revision: u64,
    pub outcome: Result<SubmitSuccess, TransferError>,
}

impl SubmissionOutcome {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Submit, normalize, then fetch the artifact. Artifact failure is carried
/// inside the success value rather than failing the submission.
pub async fn run_submission(service: &dyn BriefService, ticket: SubmissionTicket) -> SubmissionOutcome {
    let generation = ticket.generation;
    let selection_revision = ticket.selection_revision;

    let payload = match service.submit(&ticket.request).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(generation, "Submission failed: {}", e);
            return SubmissionOutcome {
                generation,
                selection_revision,
                outcome: Err(e),
            };
        }
    };

    let result = normalize(&payload);

    let artifact = match result.artifact_reference.as_deref() {
        Some(reference) => fetch_with_retry(service, reference, ticket.artifact_retries).await,
        None => Err(TransferError::artifact("", "response carried no artifact reference")),
    };

    if let Err(e) = &artifact {
        warn!(generation, "Continuing without artifact: {}", e);
    }

    SubmissionOutcome {
        generation,
        selection_revision,
        outcome: Ok(SubmitSuccess { result, artifact }),
    }
}

async fn fetch_with_retry(
    service: &dyn BriefService,
    reference: &str,
    retries: u32,
) -> Result<BinaryArtifact, TransferError> {
    let mut attempt = 0;
    loop {
        match service.fetch_artifact(reference).await {
            Ok(artifact) => return Ok(artifact),
            Err(e) if attempt < retries => {
                attempt += 1;
                debug!("Artifact fetch attempt {} failed ({}), retrying", attempt, e);
                tokio::time::sleep(ARTIFACT_RETRY_DELAY * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    selection: Selection,
    language: OutputLanguage,
    state: SessionState,
    status: Option<StatusMessage>,
    artifacts: ArtifactStore,
    generation: u64,
    artifact_retries: u32,
}

impl Session {
    pub fn new(language: OutputLanguage) -> Self {
        Self {
            language,
            ..Default::default()
        }
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            language: config.language,
            artifact_retries: config.artifact_retries,
            ..Default::default()
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn language(&self) -> OutputLanguage {
        self.language
    }

    pub fn set_language(&mut self, language: OutputLanguage) {
        self.language = language;
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, SessionState::Submitting)
    }

    pub fn result(&self) -> Option<&BriefResult> {
        self.state.result()
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Bytes of the current document, if one was fetched
    pub fn artifact_bytes(&self) -> Option<&[u8]> {
        self.state
            .artifact()
            .and_then(|h| self.artifacts.get(h))
            .map(|a| a.bytes.as_slice())
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Append files. Clears the status line; an in-flight submission is
    /// unaffected.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = PendingFile>) {
        self.selection.add(files);
        self.status = None;
        debug!(files = self.selection.len(), "Selection updated");
    }

    pub fn remove_file(&mut self, index: usize) -> Result<PendingFile, SelectionError> {
        let removed = self.selection.remove_at(index)?;
        debug!("Removed {} from selection", removed.name());
        if self.selection.is_empty() {
            self.on_selection_emptied();
        }
        Ok(removed)
    }

    pub fn clear_files(&mut self) {
        self.selection.clear();
        self.on_selection_emptied();
    }

    fn on_selection_emptied(&mut self) {
        match self.state {
            SessionState::Succeeded { .. } | SessionState::Failed { .. } => self.reset(),
            // complete_submission discards the in-flight outcome
            SessionState::Submitting => {}
            SessionState::Idle => self.status = None,
        }
    }

    /// Release any artifact handle and return to `Idle`
    pub fn reset(&mut self) {
        self.teardown();
        self.state = SessionState::Idle;
        self.status = None;
        info!("Session reset");
    }

    fn teardown(&mut self) {
        if let Some(handle) = self.state.artifact() {
            self.artifacts.release(handle);
        }
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Start a submission. Returns `None` (and changes nothing) when the
    /// selection is empty or a submission is already in flight.
    pub fn begin_submission(&mut self) -> Option<SubmissionTicket> {
        if self.is_submitting() {
            debug!("Ignoring submission request: already submitting");
            return None;
        }
        if self.selection.is_empty() {
            debug!("Ignoring submission request: nothing selected");
            return None;
        }

        self.teardown();
        self.generation += 1;
        self.state = SessionState::Submitting;
        self.status = Some(StatusMessage::Submitting);

        info!(
            generation = self.generation,
            files = self.selection.len(),
            language = self.language.as_str(),
            "Submission started"
        );

        Some(SubmissionTicket {
            generation: self.generation,
            selection_revision: self.selection.revision(),
            artifact_retries: self.artifact_retries,
            request: SubmissionRequest::from_selection(&self.selection, self.language),
        })
    }

    /// Apply an outcome from [`run_submission`]. Returns false when the
    /// outcome was stale or discarded.
    ///
    /// An outcome is discarded (back to `Idle`) when any submitted file left
    /// the selection during the flight, including a clear followed by new
    /// additions. Files only appended during the flight keep the result.
    pub fn complete_submission(&mut self, outcome: SubmissionOutcome) -> bool {
        if !self.is_submitting() || outcome.generation != self.generation {
            warn!(
                generation = outcome.generation,
                current = self.generation,
                "Ignoring stale submission outcome"
            );
            return false;
        }

        if self.selection.is_empty() || self.selection.trimmed_since(outcome.selection_revision) {
            info!(
                files = self.selection.len(),
                "Selection changed while submitting; discarding outcome"
            );
            self.state = SessionState::Idle;
            self.status = None;
            return false;
        }

        match outcome.outcome {
            Ok(success) => {
                let artifact = success.artifact.ok().map(|a| self.artifacts.allocate(a));
                self.status = Some(if artifact.is_some() {
                    StatusMessage::Succeeded
                } else {
                    StatusMessage::SucceededWithoutArtifact
                });
                info!(
                    meetings = success.result.meetings.len(),
                    actions = success.result.actions.len(),
                    has_artifact = artifact.is_some(),
                    "Submission succeeded"
                );
                self.state = SessionState::Succeeded {
                    result: success.result,
                    artifact,
                };
            }
            Err(e) => {
                let message = e.to_string();
                self.status = Some(StatusMessage::Failed(message.clone()));
                self.state = SessionState::Failed { message };
            }
        }
        true
    }

    /// Run a whole submission in place
    pub async fn submit(&mut self, service: &dyn BriefService) -> &SessionState {
        if let Some(ticket) = self.begin_submission() {
            let outcome = run_submission(service, ticket).await;
            self.complete_submission(outcome);
        }
        &self.state
    }

    /// Save the current document into `dir`
    pub async fn save_artifact(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let handle: ArtifactHandle = self.state.artifact().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no document available")
        })?;
        self.artifacts.save_to_dir(handle, dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::RawBriefPayload;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted service: records calls and replays canned responses
    struct FakeService {
        submit_response: Result<RawBriefPayload, TransferError>,
        artifact_failures: Mutex<u32>,
        calls: Mutex<Vec<String>>,
        last_request: Mutex<Option<SubmissionRequest>>,
    }

    impl FakeService {
        fn ok(payload: RawBriefPayload) -> Self {
            Self {
                submit_response: Ok(payload),
                artifact_failures: Mutex::new(0),
                calls: Mutex::new(Vec::new()),
                last_request: Mutex::new(None),
            }
        }

        fn failing_submit(reason: &str, status: u16) -> Self {
            Self {
                submit_response: Err(TransferError::submission(reason, Some(status))),
                ..Self::ok(json!({}))
            }
        }

        fn with_artifact_failures(self, n: u32) -> Self {
            *self.artifact_failures.lock().unwrap() = n;
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BriefService for FakeService {
        async fn submit(&self, request: &SubmissionRequest) -> Result<RawBriefPayload, TransferError> {
            self.calls.lock().unwrap().push("submit".to_string());
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.submit_response.clone()
        }

        async fn fetch_artifact(&self, reference: &str) -> Result<BinaryArtifact, TransferError> {
            self.calls.lock().unwrap().push(format!("fetch:{}", reference));
            let mut failures = self.artifact_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(TransferError::artifact(reference, "status 404 Not Found"));
            }
            Ok(BinaryArtifact {
                reference: reference.to_string(),
                bytes: b"%PDF".to_vec(),
                content_type: None,
            })
        }
    }

    fn payload() -> RawBriefPayload {
        json!({
            "artifact_reference": "r1",
            "meetings": [],
            "actions": [{ "task": "Write copy", "priority": "high", "deadline": "1_day" }]
        })
    }

    fn session_with(names: &[&str]) -> Session {
        let mut session = Session::new(OutputLanguage::French);
        session.add_files(names.iter().map(|n| PendingFile::new(*n, vec![1, 2, 3])));
        session
    }

    #[tokio::test]
    async fn test_submit_then_fetch_in_order() {
        let service = FakeService::ok(payload());
        let mut session = session_with(&["A.pdf", "B.txt"]);

        session.submit(&service).await;

        assert_eq!(service.calls(), vec!["submit", "fetch:r1"]);
        let request = service.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.language, OutputLanguage::French);
        let names: Vec<&str> = request.files.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["A.pdf", "B.txt"]);

        assert!(session.state().artifact().is_some());
        assert_eq!(session.status(), Some(&StatusMessage::Succeeded));
        assert_eq!(session.artifact_bytes(), Some(&b"%PDF"[..]));
    }

    #[tokio::test]
    async fn test_empty_selection_does_not_start() {
        let service = FakeService::ok(payload());
        let mut session = Session::new(OutputLanguage::English);

        assert!(session.begin_submission().is_none());
        session.submit(&service).await;

        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.status(), None);
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_begin_is_noop() {
        let service = FakeService::ok(payload());
        let mut session = session_with(&["A.pdf"]);

        let ticket = session.begin_submission().unwrap();
        assert!(session.begin_submission().is_none());
        assert_eq!(session.state(), &SessionState::Submitting);

        let outcome = run_submission(&service, ticket).await;
        assert!(session.complete_submission(outcome));
        assert_eq!(service.calls(), vec!["submit", "fetch:r1"]);
    }

    #[tokio::test]
    async fn test_missing_reference_skips_fetch() {
        let service = FakeService::ok(json!({ "meetings": [{ "title": "Kickoff" }] }));
        let mut session = session_with(&["A.pdf"]);

        session.submit(&service).await;

        assert_eq!(service.calls(), vec!["submit"]);
        assert_eq!(session.status(), Some(&StatusMessage::SucceededWithoutArtifact));
        assert_eq!(session.result().unwrap().meetings.len(), 1);
    }

    #[tokio::test]
    async fn test_artifact_retry() {
        let service = FakeService::ok(payload()).with_artifact_failures(1);
        let mut session = session_with(&["A.pdf"]);
        session.artifact_retries = 1;

        session.submit(&service).await;

        assert_eq!(service.calls(), vec!["submit", "fetch:r1", "fetch:r1"]);
        assert!(session.state().artifact().is_some());
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let service = FakeService::ok(payload()).with_artifact_failures(1);
        let mut session = session_with(&["A.pdf"]);

        session.submit(&service).await;

        assert_eq!(service.calls(), vec!["submit", "fetch:r1"]);
        assert!(session.state().artifact().is_none());
        assert_eq!(session.result().unwrap().actions.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_selection_and_message() {
        let service = FakeService::failing_submit("Brief generation failed", 500);
        let mut session = session_with(&["A.pdf", "B.txt"]);

        session.submit(&service).await;

        assert_eq!(
            session.state(),
            &SessionState::Failed {
                message: "Brief generation failed".to_string()
            }
        );
        assert_eq!(session.selection().len(), 2);
        assert!(session.result().is_none());
        assert_eq!(
            session.status().unwrap().to_string(),
            "Error: Brief generation failed"
        );
        assert_eq!(service.calls(), vec!["submit"]);
    }

    #[tokio::test]
    async fn test_resubmission_releases_previous_handle() {
        let service = FakeService::ok(payload());
        let mut session = session_with(&["A.pdf"]);

        session.submit(&service).await;
        let first = session.state().artifact().unwrap();

        session.add_files(vec![PendingFile::new("C.png", vec![9])]);
        session.submit(&service).await;
        let second = session.state().artifact().unwrap();

        assert_ne!(first, second);
        assert!(!session.artifacts().is_live(first));
        assert_eq!(session.artifacts().live_count(), 1);
        assert_eq!(session.artifacts().released(), 1);
    }

    #[tokio::test]
    async fn test_add_clears_status_but_keeps_result() {
        let service = FakeService::ok(payload());
        let mut session = session_with(&["A.pdf"]);
        session.submit(&service).await;

        session.add_files(vec![PendingFile::new("B.pdf", vec![])]);

        assert_eq!(session.status(), None);
        assert!(session.result().is_some());
    }

    #[tokio::test]
    async fn test_clear_after_failure_resets() {
        let service = FakeService::failing_submit("Brief generation failed", 500);
        let mut session = session_with(&["A.pdf"]);
        session.submit(&service).await;

        session.clear_files();

        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.status(), None);
    }

    #[tokio::test]
    async fn test_selection_emptied_while_submitting_discards_outcome() {
        let service = FakeService::ok(payload());
        let mut session = session_with(&["A.pdf"]);

        let ticket = session.begin_submission().unwrap();
        session.remove_file(0).unwrap();
        assert!(session.is_submitting());

        let outcome = run_submission(&service, ticket).await;
        assert!(!session.complete_submission(outcome));

        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.artifacts().allocated(), 0);
    }

    #[tokio::test]
    async fn test_clear_then_add_while_submitting_discards_outcome() {
        let service = FakeService::ok(payload());
        let mut session = session_with(&["OLD.pdf"]);

        let ticket = session.begin_submission().unwrap();
        session.clear_files();
        session.add_files(vec![PendingFile::new("NEW.pdf", vec![4])]);
        assert!(session.is_submitting());

        let outcome = run_submission(&service, ticket).await;
        assert!(!session.complete_submission(outcome));

        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.result().is_none());
        assert_eq!(session.artifacts().allocated(), 0);
        assert_eq!(session.selection().get(0).unwrap().name(), "NEW.pdf");

        // The new selection can be submitted normally
        session.submit(&service).await;
        assert!(session.result().is_some());
    }

    #[tokio::test]
    async fn test_partial_remove_while_submitting_discards_outcome() {
        let service = FakeService::ok(payload());
        let mut session = session_with(&["A.pdf", "B.pdf"]);

        let ticket = session.begin_submission().unwrap();
        session.remove_file(1).unwrap();

        let outcome = run_submission(&service, ticket).await;
        assert!(!session.complete_submission(outcome));
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[tokio::test]
    async fn test_append_while_submitting_keeps_outcome() {
        let service = FakeService::ok(payload());
        let mut session = session_with(&["A.pdf"]);

        let ticket = session.begin_submission().unwrap();
        session.add_files(vec![PendingFile::new("B.pdf", vec![])]);

        let outcome = run_submission(&service, ticket).await;
        assert!(session.complete_submission(outcome));
        assert!(session.result().is_some());
    }

    #[tokio::test]
    async fn test_stale_outcome_ignored() {
        let service = FakeService::ok(payload());
        let mut session = session_with(&["A.pdf"]);

        let first = session.begin_submission().unwrap();
        let first_outcome = run_submission(&service, first).await;
        assert!(session.complete_submission(first_outcome.clone()));

        let second = session.begin_submission().unwrap();
        assert!(!session.complete_submission(first_outcome));
        assert!(session.is_submitting());

        let second_outcome = run_submission(&service, second).await;
        assert!(session.complete_submission(second_outcome));
    }

    #[test]
    fn test_remove_out_of_bounds_leaves_state() {
        let mut session = session_with(&["A.pdf"]);
        assert!(session.remove_file(1).is_err());
        assert_eq!(session.selection().len(), 1);
        assert_eq!(session.state(), &SessionState::Idle);
    }
}

//! End-to-end submission flows against an in-process brief service

mod helpers;

use std::sync::Arc;

use serde_json::{json, Value};

use briefgen_core::{
    run_submission, BriefService, HttpBriefClient, OutputLanguage, PendingFile, Session,
    SessionState, StatusMessage, SummaryCounts,
};
use helpers::{MockBriefService, ARTIFACT_BYTES};

fn scenario_payload() -> Value {
    json!({
        "artifact_reference": "r1",
        "meetings": [],
        "actions": [{ "task": "Write copy", "priority": "high", "deadline": "1_day" }],
        "team_used": ["Jessica Rodriguez"],
        "file_info": [{ "name": "A.pdf" }, { "name": "B.txt" }]
    })
}

fn french_session_with_a_and_b() -> Session {
    let mut session = Session::new(OutputLanguage::French);
    session.add_files(vec![
        PendingFile::new("A.pdf", b"%PDF-1.4 source".to_vec()),
        PendingFile::new("B.txt", b"Launch eco-friendly notebooks".to_vec()),
    ]);
    session
}

#[tokio::test]
async fn test_two_files_submit_and_fetch_succeeds() {
    let server = MockBriefService::start(200, scenario_payload(), 200).await;
    let client = HttpBriefClient::new(&server.config());
    let mut session = french_session_with_a_and_b();

    session.submit(&client).await;

    let result = session.result().expect("result after success");
    assert!(result.meetings.is_empty());
    assert_eq!(result.actions[0].task, "Write copy");
    assert_eq!(
        result.summary_counts(),
        SummaryCounts { high: 1, medium: 0, low: 0 }
    );
    assert_eq!(result.team_used, Some(json!(["Jessica Rodriguez"])));
    assert!(session.state().artifact().is_some());
    assert_eq!(session.artifact_bytes(), Some(ARTIFACT_BYTES));
    assert_eq!(session.status(), Some(&StatusMessage::Succeeded));

    let submissions = server.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].language.as_deref(), Some("French"));
    let names: Vec<&str> = submissions[0].files.iter().map(|f| f.0.as_str()).collect();
    assert_eq!(names, vec!["A.pdf", "B.txt"]);
    assert_eq!(submissions[0].files[0].1.as_deref(), Some("application/pdf"));
    assert_eq!(server.downloads(), vec!["r1"]);
}

#[tokio::test]
async fn test_reference_with_reserved_characters_is_fetched_intact() {
    let mut payload = scenario_payload();
    payload["artifact_reference"] = json!("brief#2?v=1.pdf");
    let server = MockBriefService::start(200, payload, 200).await;
    let client = HttpBriefClient::new(&server.config());
    let mut session = french_session_with_a_and_b();

    session.submit(&client).await;

    assert_eq!(server.downloads(), vec!["brief#2?v=1.pdf"]);
    assert_eq!(session.artifact_bytes(), Some(ARTIFACT_BYTES));
}

#[tokio::test]
async fn test_artifact_404_still_succeeds_without_handle() {
    let server = MockBriefService::start(200, scenario_payload(), 404).await;
    let client = HttpBriefClient::new(&server.config());
    let mut session = french_session_with_a_and_b();

    session.submit(&client).await;

    match session.state() {
        SessionState::Succeeded { result, artifact } => {
            assert_eq!(result.actions.len(), 1);
            assert!(artifact.is_none());
        }
        other => panic!("expected Succeeded, got {:?}", other),
    }
    assert_eq!(
        session.status(),
        Some(&StatusMessage::SucceededWithoutArtifact)
    );
    assert!(session
        .status()
        .unwrap()
        .to_string()
        .contains("download is unavailable"));
    assert_eq!(session.artifacts().allocated(), 0);
}

#[tokio::test]
async fn test_submit_500_fails_and_keeps_selection() {
    let server = MockBriefService::start(500, Value::Null, 200).await;
    let client = HttpBriefClient::new(&server.config());
    let mut session = french_session_with_a_and_b();

    session.submit(&client).await;

    assert_eq!(
        session.state(),
        &SessionState::Failed {
            message: "Brief generation failed".to_string()
        }
    );
    let names: Vec<&str> = session.selection().files().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["A.pdf", "B.txt"]);
    assert!(session.result().is_none());
    assert!(server.downloads().is_empty());
}

#[tokio::test]
async fn test_submit_failure_reason_from_body() {
    let server = MockBriefService::start(422, json!({ "detail": "Unsupported file format" }), 200).await;
    let client = HttpBriefClient::new(&server.config());
    let mut session = french_session_with_a_and_b();

    session.submit(&client).await;

    assert_eq!(
        session.state(),
        &SessionState::Failed {
            message: "Brief generation failed: Unsupported file format".to_string()
        }
    );
}

#[tokio::test]
async fn test_unreachable_service_fails_with_cause() {
    // Grab a free port, then close it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = briefgen_core::Config {
        service_url: format!("http://{}", addr),
        request_timeout_secs: 5,
        ..briefgen_core::Config::new()
    };
    let client = HttpBriefClient::new(&config);
    let mut session = french_session_with_a_and_b();

    session.submit(&client).await;

    match session.state() {
        SessionState::Failed { message } => {
            assert!(message.starts_with("Brief generation failed: "), "{}", message);
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_removing_only_file_after_success_resets() {
    let server = MockBriefService::start(200, scenario_payload(), 200).await;
    let client = HttpBriefClient::new(&server.config());
    let mut session = Session::new(OutputLanguage::English);
    session.add_files(vec![PendingFile::new("A.pdf", b"%PDF".to_vec())]);

    session.submit(&client).await;
    let handle = session.state().artifact().unwrap();

    session.remove_file(0).unwrap();

    assert_eq!(session.state(), &SessionState::Idle);
    assert!(session.result().is_none());
    assert!(!session.artifacts().is_live(handle));
    assert_eq!(session.artifacts().released(), 1);
    assert_eq!(session.artifacts().live_count(), 0);

    // A second clear must not release again
    session.clear_files();
    assert_eq!(session.artifacts().released(), 1);
}

#[tokio::test]
async fn test_spawned_submission_completes() {
    let server = MockBriefService::start(200, scenario_payload(), 200).await;
    let service: Arc<dyn BriefService> = Arc::new(HttpBriefClient::new(&server.config()));
    let mut session = french_session_with_a_and_b();

    let ticket = session.begin_submission().unwrap();
    assert!(session.begin_submission().is_none());

    let task_service = Arc::clone(&service);
    let outcome = tokio::spawn(async move { run_submission(task_service.as_ref(), ticket).await })
        .await
        .unwrap();

    assert!(session.complete_submission(outcome));
    assert!(session.state().artifact().is_some());
}

#[tokio::test]
async fn test_save_artifact_to_download_dir() {
    let server = MockBriefService::start(200, scenario_payload(), 200).await;
    let client = HttpBriefClient::new(&server.config());
    let mut session = french_session_with_a_and_b();
    session.submit(&client).await;

    let dir = tempfile::tempdir().unwrap();
    let path = session.save_artifact(dir.path()).await.unwrap();

    assert_eq!(path.file_name().unwrap(), "brief_output.pdf");
    assert_eq!(std::fs::read(&path).unwrap(), ARTIFACT_BYTES);
}

#[tokio::test]
async fn test_pending_file_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "Campaign notes").unwrap();

    let file = PendingFile::from_path(&path).await.unwrap();

    assert_eq!(file.name(), "notes.txt");
    assert_eq!(file.size(), 14);
    assert_eq!(file.mime_type(), "text/plain");
}

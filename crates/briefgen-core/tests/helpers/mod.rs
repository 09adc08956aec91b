//! In-process stand-in for the brief service
//!
//! Binds an axum router to an ephemeral port and records what the client
//! sent, so tests can assert on both sides of the exchange.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use briefgen_core::Config;

pub const ARTIFACT_BYTES: &[u8] = b"%PDF-1.4 generated brief";

/// One multipart submission as the server saw it
#[derive(Debug, Clone, Default)]
pub struct ReceivedSubmission {
    /// (file name, content type, byte length) in arrival order
    pub files: Vec<(String, Option<String>, usize)>,
    pub language: Option<String>,
}

#[derive(Clone)]
struct MockState {
    submit_status: StatusCode,
    submit_body: Value,
    artifact_status: StatusCode,
    submissions: Arc<Mutex<Vec<ReceivedSubmission>>>,
    downloads: Arc<Mutex<Vec<String>>>,
}

pub struct MockBriefService {
    addr: SocketAddr,
    submissions: Arc<Mutex<Vec<ReceivedSubmission>>>,
    downloads: Arc<Mutex<Vec<String>>>,
}

impl MockBriefService {
    /// Start a server answering submit with `submit_status`/`submit_body`
    /// and downloads with `artifact_status`.
    pub async fn start(submit_status: u16, submit_body: Value, artifact_status: u16) -> Self {
        let submissions = Arc::new(Mutex::new(Vec::new()));
        let downloads = Arc::new(Mutex::new(Vec::new()));

        let state = MockState {
            submit_status: StatusCode::from_u16(submit_status).unwrap(),
            submit_body,
            artifact_status: StatusCode::from_u16(artifact_status).unwrap(),
            submissions: Arc::clone(&submissions),
            downloads: Arc::clone(&downloads),
        };

        let app = Router::new()
            .route("/brief", post(handle_brief))
            .route("/download/:reference", get(handle_download))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            submissions,
            downloads,
        }
    }

    pub fn config(&self) -> Config {
        Config {
            service_url: format!("http://{}", self.addr),
            request_timeout_secs: 10,
            ..Config::new()
        }
    }

    pub fn submissions(&self) -> Vec<ReceivedSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

async fn handle_brief(State(state): State<MockState>, mut multipart: Multipart) -> Response {
    let mut received = ReceivedSubmission::default();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
                received.files.push((file_name, content_type, len));
            }
            "language" => {
                received.language = field.text().await.ok();
            }
            _ => {}
        }
    }

    state.submissions.lock().unwrap().push(received);

    (state.submit_status, Json(state.submit_body.clone())).into_response()
}

async fn handle_download(State(state): State<MockState>, Path(reference): Path<String>) -> Response {
    state.downloads.lock().unwrap().push(reference);

    if state.artifact_status.is_success() {
        (
            [(header::CONTENT_TYPE, "application/pdf")],
            ARTIFACT_BYTES.to_vec(),
        )
            .into_response()
    } else {
        state.artifact_status.into_response()
    }
}

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{BinaryArtifact, BriefService, RawBriefPayload, SubmissionRequest};
use crate::config::Config;
use crate::error::TransferError;
use crate::selection::PendingFile;

/// Multipart field carrying each file (same name for every part)
pub const FILE_FIELD: &str = "files";
/// Multipart text field carrying the output language
pub const LANGUAGE_FIELD: &str = "language";

const SUBMIT_FAILED: &str = "Brief generation failed";
const FALLBACK_MIME: &str = "application/octet-stream";

/// reqwest-backed client for the brief service
#[derive(Clone)]
pub struct HttpBriefClient {
    client: Client,
    config: Config,
}

impl HttpBriefClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[async_trait]
impl BriefService for HttpBriefClient {
    async fn submit(&self, request: &SubmissionRequest) -> Result<RawBriefPayload, TransferError> {
        let url = self.config.submit_url();

        let mut form = Form::new();
        for file in &request.files {
            form = form.part(FILE_FIELD, file_part(file)?);
        }
        form = form.text(LANGUAGE_FIELD, request.language.as_str());

        info!(
            files = request.files.len(),
            language = request.language.as_str(),
            "Submitting brief request to {}",
            url
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransferError::submission(format!("{}: {}", SUBMIT_FAILED, e), None))?;

        if !response.status().is_success() {
            let status = response.status();
            let reason = failure_reason(response).await;
            warn!("Brief request failed with status {}", status);
            return Err(TransferError::submission(reason, Some(status.as_u16())));
        }

        let payload: Value = response.json().await.map_err(|e| {
            TransferError::submission(format!("{}: unreadable response: {}", SUBMIT_FAILED, e), None)
        })?;

        debug!("Brief request succeeded");
        Ok(payload)
    }

    async fn fetch_artifact(&self, reference: &str) -> Result<BinaryArtifact, TransferError> {
        let url = self
            .config
            .artifact_url(reference)
            .map_err(|e| TransferError::artifact(reference, e.to_string()))?;
        debug!("Fetching artifact from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransferError::artifact(reference, e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransferError::artifact(
                reference,
                format!("status {}", response.status()),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransferError::artifact(reference, e.to_string()))?;

        info!(bytes = bytes.len(), "Fetched artifact '{}'", reference);
        Ok(BinaryArtifact {
            reference: reference.to_string(),
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// One multipart part per file. The content is copied exactly once.
fn file_part(file: &PendingFile) -> Result<Part, TransferError> {
    Part::bytes(file.content().to_vec())
        .file_name(file.name().to_string())
        .mime_str(part_mime(file))
        .map_err(|e| TransferError::submission(format!("{}: {}", SUBMIT_FAILED, e), None))
}

/// The file's MIME type, or `application/octet-stream` when reqwest would
/// reject it. Checked on an empty part so no content is copied.
fn part_mime(file: &PendingFile) -> &str {
    match Part::bytes(Vec::new()).mime_str(file.mime_type()) {
        Ok(_) => file.mime_type(),
        Err(e) => {
            warn!("Invalid MIME type '{}' for {}: {}", file.mime_type(), file.name(), e);
            FALLBACK_MIME
        }
    }
}

/// Best-effort reason from a failed response. The body is only inspected for
/// a `detail`, `error`, or `message` string; anything else is ignored.
async fn failure_reason(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    match extract_detail(&body) {
        Some(detail) => format!("{}: {}", SUBMIT_FAILED, detail),
        None => SUBMIT_FAILED.to_string(),
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_detail_from_json_body() {
        assert_eq!(
            extract_detail(r#"{"detail": "Unsupported file format"}"#),
            Some("Unsupported file format".to_string())
        );
        assert_eq!(
            extract_detail(r#"{"error": "  quota exceeded "}"#),
            Some("quota exceeded".to_string())
        );
    }

    #[test]
    fn test_part_mime_falls_back_on_invalid_type() {
        let pdf = PendingFile::new("A.pdf", vec![1, 2, 3]);
        assert_eq!(part_mime(&pdf), "application/pdf");

        let broken = PendingFile::new("A.pdf", vec![1, 2, 3]).with_mime_type("not a mime");
        assert_eq!(part_mime(&broken), FALLBACK_MIME);
        assert!(file_part(&broken).is_ok());
    }

    #[test]
    fn test_extract_detail_ignores_non_json_and_empty() {
        assert_eq!(extract_detail("<html>Internal Server Error</html>"), None);
        assert_eq!(extract_detail(r#"{"detail": ""}"#), None);
        assert_eq!(extract_detail(""), None);
    }
}

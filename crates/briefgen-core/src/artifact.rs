//! Local handles for fetched artifacts
//!
//! A handle keeps the document bytes alive until it is released. The session
//! owns the store and releases its handle on every path out of `Succeeded`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::transfer::BinaryArtifact;

/// Default file name when saving the generated brief
pub const DEFAULT_DOWNLOAD_NAME: &str = "brief_output.pdf";
const DEFAULT_DOWNLOAD_STEM: &str = "brief_output";

/// Opaque id of a live artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactHandle(u64);

impl std::fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "artifact:{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct ArtifactStore {
    next_id: u64,
    live: HashMap<ArtifactHandle, BinaryArtifact>,
    allocated: u64,
    released: u64,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, artifact: BinaryArtifact) -> ArtifactHandle {
        self.next_id += 1;
        let handle = ArtifactHandle(self.next_id);
        debug!(bytes = artifact.bytes.len(), "Allocated {}", handle);
        self.live.insert(handle, artifact);
        self.allocated += 1;
        handle
    }

    /// Reclaim the bytes behind `handle`. Returns false if it was not live.
    pub fn release(&mut self, handle: ArtifactHandle) -> bool {
        match self.live.remove(&handle) {
            Some(_) => {
                self.released += 1;
                debug!("Released {}", handle);
                true
            }
            None => {
                warn!("Ignoring release of {} (not live)", handle);
                false
            }
        }
    }

    pub fn get(&self, handle: ArtifactHandle) -> Option<&BinaryArtifact> {
        self.live.get(&handle)
    }

    pub fn is_live(&self, handle: ArtifactHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    pub fn released(&self) -> u64 {
        self.released
    }

    /// Write the artifact into `dir`, named after its reference when that
    /// looks like a file name. Otherwise the name is `brief_output` with an
    /// extension taken from the content type, falling back to
    /// [`DEFAULT_DOWNLOAD_NAME`].
    pub async fn save_to_dir(&self, handle: ArtifactHandle, dir: &Path) -> std::io::Result<PathBuf> {
        let artifact = self.get(handle).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("{} is not live", handle))
        })?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(download_name(artifact));
        tokio::fs::write(&path, &artifact.bytes).await?;
        Ok(path)
    }
}

fn download_name(artifact: &BinaryArtifact) -> String {
    let from_reference = Path::new(&artifact.reference)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| n.contains('.'))
        .map(str::to_string);

    from_reference
        .or_else(|| {
            let ext = artifact.content_type.as_deref().and_then(extension_for)?;
            Some(format!("{}.{}", DEFAULT_DOWNLOAD_STEM, ext))
        })
        .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string())
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "application/pdf" => Some("pdf"),
        "text/plain" => Some("txt"),
        "text/markdown" => Some("md"),
        "text/html" => Some("html"),
        "application/json" => Some("json"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        _ => None,
    }
}

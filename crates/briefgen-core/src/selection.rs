//! Pending file selection
//!
//! Holds the files chosen for the next submission. Insertion order is display
//! order; duplicates by name are allowed.

use std::path::Path;
use std::sync::Arc;

use crate::error::SelectionError;

/// Coarse file category, derived from the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    Text,
    Video,
    Spreadsheet,
    Other,
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => FileKind::Pdf,
            "jpg" | "jpeg" | "png" => FileKind::Image,
            "txt" => FileKind::Text,
            "mp4" => FileKind::Video,
            "csv" | "xlsx" | "xls" => FileKind::Spreadsheet,
            _ => FileKind::Other,
        }
    }

    /// MIME type for the multipart part
    pub fn mime_type(&self, name: &str) -> &'static str {
        let lower = name.to_lowercase();
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Image if lower.ends_with(".png") => "image/png",
            FileKind::Image => "image/jpeg",
            FileKind::Text => "text/plain",
            FileKind::Video => "video/mp4",
            FileKind::Spreadsheet if lower.ends_with(".csv") => "text/csv",
            FileKind::Spreadsheet if lower.ends_with(".xls") => "application/vnd.ms-excel",
            FileKind::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            FileKind::Other => "application/octet-stream",
        }
    }

    /// Whether the brief service knows how to read this kind
    pub fn is_supported(&self) -> bool {
        !matches!(self, FileKind::Other)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Image => "Image",
            FileKind::Text => "Text",
            FileKind::Video => "Video",
            FileKind::Spreadsheet => "Spreadsheet",
            FileKind::Other => "Other",
        }
    }
}

/// A user-chosen file. Immutable once created; clones share the content.
#[derive(Debug, Clone)]
pub struct PendingFile {
    name: String,
    content: Arc<[u8]>,
    mime_type: String,
    kind: FileKind,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let kind = FileKind::from_name(&name);
        let mime_type = kind.mime_type(&name).to_string();
        let content: Vec<u8> = content.into();
        Self {
            name,
            content: Arc::from(content),
            mime_type,
            kind,
        }
    }

    /// Override the MIME type reported by the host
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Read a file from disk into a pending file
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }
}

/// Ordered sequence of pending files
#[derive(Debug, Clone, Default)]
pub struct Selection {
    files: Vec<PendingFile>,
    // Bumped on every mutation
    revision: u64,
    // Revision produced by the latest remove or clear
    trimmed_at: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, files: impl IntoIterator<Item = PendingFile>) {
        let before = self.files.len();
        self.files.extend(files);
        if self.files.len() != before {
            self.revision += 1;
        }
    }

    /// Remove exactly one entry, keeping the order of the rest.
    /// Out-of-bounds indices leave the selection unchanged.
    pub fn remove_at(&mut self, index: usize) -> Result<PendingFile, SelectionError> {
        if index >= self.files.len() {
            return Err(SelectionError::IndexOutOfBounds {
                index,
                len: self.files.len(),
            });
        }
        self.revision += 1;
        self.trimmed_at = self.revision;
        Ok(self.files.remove(index))
    }

    pub fn clear(&mut self) {
        if !self.files.is_empty() {
            self.revision += 1;
            self.trimmed_at = self.revision;
        }
        self.files.clear();
    }

    pub fn files(&self) -> &[PendingFile] {
        &self.files
    }

    pub fn get(&self, index: usize) -> Option<&PendingFile> {
        self.files.get(index)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when any file present at `revision` has since been removed.
    /// Appending alone never trims.
    pub fn trimmed_since(&self, revision: u64) -> bool {
        self.trimmed_at > revision
    }

    pub fn total_size(&self) -> usize {
        self.files.iter().map(PendingFile::size).sum()
    }
}

/// Human-readable byte size ("812 B", "1.4 KB", "3.2 MB")
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

//! Verification gate applied to a staged download before it is committed.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),

    #[error("file is empty")]
    Empty,

    #[error("{size} bytes is below the {min} byte minimum")]
    TooSmall { size: u64, min: u64 },

    #[error("server sent {0}, not a package")]
    ContentType(String),

    #[error("{inspector} check failed: {reason}")]
    Content { inspector: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Optional check on the file's contents.
pub trait ContentInspector: Send + Sync {
    fn name(&self) -> &str;

    /// Inspect the file at `path`; `Err` carries a human-readable reason.
    fn inspect(&self, path: &Path) -> Result<(), String>;
}

/// Requires a readable zip archive containing `AndroidManifest.xml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApkInspector;

impl ContentInspector for ApkInspector {
    fn name(&self) -> &str {
        "apk"
    }

    fn inspect(&self, path: &Path) -> Result<(), String> {
        let file = File::open(path).map_err(|e| e.to_string())?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| format!("not a zip archive: {e}"))?;
        let has_manifest = archive.by_name("AndroidManifest.xml").is_ok();
        if has_manifest {
            Ok(())
        } else {
            Err("AndroidManifest.xml missing".to_string())
        }
    }
}

/// Existence, non-empty, minimum size, the server's content type, then the
/// optional inspector.
#[derive(Clone, Default)]
pub struct VerificationGate {
    pub min_size: u64,
    inspector: Option<Arc<dyn ContentInspector>>,
}

impl std::fmt::Debug for VerificationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationGate")
            .field("min_size", &self.min_size)
            .field("inspector", &self.inspector.as_ref().map(|i| i.name()))
            .finish()
    }
}

impl VerificationGate {
    pub fn new(min_size: u64) -> Self {
        Self {
            min_size,
            inspector: None,
        }
    }

    #[must_use]
    pub fn with_inspector(mut self, inspector: Option<Arc<dyn ContentInspector>>) -> Self {
        self.inspector = inspector;
        self
    }

    /// Run every check, returning the file size on success.
    ///
    /// `content_type` is the `Content-Type` the server reported, if any. Text
    /// responses are error or landing pages and are rejected.
    ///
    /// # Errors
    ///
    /// Returns the first [`VerifyError`] encountered.
    pub fn check(&self, path: &Path, content_type: Option<&str>) -> Result<u64, VerifyError> {
        let size = match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Err(VerifyError::Missing(path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VerifyError::Missing(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        if size == 0 {
            return Err(VerifyError::Empty);
        }
        if size < self.min_size {
            return Err(VerifyError::TooSmall {
                size,
                min: self.min_size,
            });
        }
        if let Some(mime) = content_type.filter(|m| is_text(m)) {
            return Err(VerifyError::ContentType(mime.to_string()));
        }
        if let Some(inspector) = &self.inspector {
            inspector
                .inspect(path)
                .map_err(|reason| VerifyError::Content {
                    inspector: inspector.name().to_string(),
                    reason,
                })?;
        }
        Ok(size)
    }
}

fn is_text(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("text/") || essence == "application/xhtml+xml"
}

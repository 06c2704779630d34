//! Host platform seam: document picking and storage-access parameters.
//!
//! The bridge only maps platform outcomes onto method results; the picking
//! itself belongs to the host.

use std::io;

use async_trait::async_trait;
use thiserror::Error;

/// Arguments of a document-picker request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentRequest {
    /// Pick a document to write rather than read.
    pub writable: bool,
    /// Picker title (suggested file name when writable).
    pub title: Option<String>,
    /// Primary MIME type filter.
    pub mime_type: Option<String>,
    /// Additional MIME types.
    pub extra_types: Vec<String>,
}

/// How a picker interaction ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The user picked something. `None` when the host returned no URI.
    Selected(Option<String>),
    /// The picker was dismissed; carries the host result code.
    Cancelled(i64),
}

/// Platform operation failure.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The host cannot perform the operation.
    #[error("{0}")]
    Unsupported(String),

    /// The host tried and failed.
    #[error("{0}")]
    Failed(String),

    /// I/O failure while resolving a document.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Host platform capabilities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Platform: Send + Sync {
    /// Platform name reported by `getPlatform`.
    fn name(&self) -> String;

    /// Open a document picker and wait for its outcome.
    async fn select_document(&self, request: DocumentRequest) -> Result<SelectOutcome, PlatformError>;

    /// Resolve a document URI into a parameter the toolkit can open.
    async fn saf_parameter(&self, uri: &str, open_mode: &str) -> Result<String, PlatformError>;
}

/// Platform for a headless host: no picker, `file://` URIs resolve to paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalPlatform;

const OPEN_MODES: [&str; 6] = ["r", "w", "wt", "wa", "rw", "rwt"];

#[async_trait]
impl Platform for LocalPlatform {
    fn name(&self) -> String {
        std::env::consts::OS.to_string()
    }

    async fn select_document(&self, _request: DocumentRequest) -> Result<SelectOutcome, PlatformError> {
        Err(PlatformError::Unsupported(
            "Document picking is not available on this host.".into(),
        ))
    }

    async fn saf_parameter(&self, uri: &str, open_mode: &str) -> Result<String, PlatformError> {
        if !OPEN_MODES.contains(&open_mode) {
            return Err(PlatformError::Failed(format!("Unsupported open mode {open_mode}.")));
        }
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        if !path.starts_with('/') {
            return Err(PlatformError::Unsupported(format!("Cannot resolve {uri} on this host.")));
        }
        if open_mode == "r" {
            let _ = tokio::fs::metadata(path).await?;
        }
        Ok(path.to_string())
    }
}

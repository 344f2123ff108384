use std::fmt;

use bytes::Bytes;

use crate::persist::SavedArtifact;

pub type RunId = u64;

pub(crate) const FALLBACK_ERROR: &str = "An unknown server error occurred.";

/// One file as submitted to the conversion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub name: String,
    pub content: Bytes,
    pub content_kind: String,
}

/// Payload of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutput {
    /// Converted file kept by the service, fetched later by filename.
    Artifact { filename: String, location: String },
    /// Text returned inline by a text-extraction operation.
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Emitted immediately before the request for `name` is issued.
    ItemStarted { run_id: RunId, name: String },
    ItemCompleted {
        run_id: RunId,
        name: String,
        result: Result<ConversionOutput, ConversionError>,
    },
    /// Always the last event of a run that was not superseded.
    RunCompleted { run_id: RunId, summary: RunSummary },
    RunRejected {
        run_id: RunId,
        error: ValidationError,
    },
    /// The task running a batch died before its summary; items not yet
    /// reported never will be.
    RunAborted { run_id: RunId, message: String },
    ArtifactDownloaded {
        filename: String,
        result: Result<SavedArtifact, String>,
    },
}

/// Reasons a run is refused before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select a file.")]
    NoItems,
    #[error("Please select a target format or operation.")]
    NoTargetFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    Body,
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Timeout => write!(f, "timeout"),
            TransportKind::Connect => write!(f, "connection failed"),
            TransportKind::Body => write!(f, "body transfer failed"),
            TransportKind::Other => write!(f, "network error"),
        }
    }
}

/// Per-item failure. Never aborts the rest of a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("An error occurred: {message}")]
    Transport { kind: TransportKind, message: String },
    #[error("{message}")]
    Service { status: Option<u16>, message: String },
    #[error("Operation seems successful but no output information was received.")]
    InconsistentResponse,
}

impl ConversionError {
    pub(crate) fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn service(status: Option<u16>, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR.to_string());
        Self::Service { status, message }
    }
}

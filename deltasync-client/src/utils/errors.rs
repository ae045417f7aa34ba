//! Error types for the sync client.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level failure of a sync session.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cannot read {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Signature generation failed for {}: {source}", .path.display())]
    Signature {
        path: PathBuf,
        #[source]
        source: SignatureError,
    },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Failed to apply change to {path}: {source}")]
    Apply {
        path: String,
        #[source]
        source: ApplyError,
    },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Remote did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Sync cancelled")]
    Cancelled,

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SyncError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Validation(e) => e.exit_code(),
            SyncError::Protocol(e) => e.exit_code(),
            SyncError::Remote(_) => 11,
            SyncError::Filesystem { .. } => 20,
            SyncError::Signature { .. } => 21,
            SyncError::Apply { source: ApplyError::PatchFailed(_), .. } => 22,
            SyncError::Apply { .. } => 20,
            SyncError::Transport(_) | SyncError::Serialization(_) => 23,
            SyncError::Timeout(_) => 24,
            SyncError::Cancelled => 130,
            SyncError::Task(_) => 20,
        }
    }
}

/// Invalid input detected before any sync work starts.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("'{url}' is not a valid http(s) URL: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("local directory '{}' {reason}", .path.display())]
    LocalRoot { path: PathBuf, reason: String },

    #[error("no valid direction given: '{0}' (expected 'f' or 'b')")]
    Direction(String),
}

impl ValidationError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ValidationError::InvalidUrl { .. } => 1,
            ValidationError::LocalRoot { .. } => 2,
            ValidationError::Direction(_) => 3,
        }
    }
}

/// The remote answered with something that is not a usable response.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("response from remote is not understandable: {0}")]
    Unparsable(#[source] serde_json::Error),

    #[error("response from remote is not a structured value")]
    NotStructured,

    #[error("response from remote is missing the 'changes' list")]
    MissingChanges,

    #[error("invalid change entry: {0}")]
    InvalidChange(#[source] serde_json::Error),
}

impl ProtocolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ProtocolError::Unparsable(_) | ProtocolError::NotStructured => 10,
            ProtocolError::MissingChanges => 12,
            ProtocolError::InvalidChange(_) => 13,
        }
    }
}

/// Failure of a single change operation.
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("{} already exists", .0.display())]
    Exists(PathBuf),

    #[error("refusing to follow symbolic link at {}", .0.display())]
    Symlink(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("patch could not be applied: {0}")]
    PatchFailed(#[from] PatchError),
}

impl ApplyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ApplyError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure reported by the signature engine.
#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by the patcher.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct PatchError(pub String);

pub type Result<T> = std::result::Result<T, SyncError>;

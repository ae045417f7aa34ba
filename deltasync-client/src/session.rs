//! Sync session parameters, validated before any sync work begins.

use crate::protocol::Direction;
use crate::utils::ValidationError;
use nix::unistd::{access, AccessFlags};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SyncSession {
    direction: Direction,
    local_root: PathBuf,
    remote_base: Option<String>,
}

impl SyncSession {
    /// Validate and build a session.
    ///
    /// `local_root` must be an existing, writable directory.
    pub fn new(
        direction: Direction,
        local_root: impl Into<PathBuf>,
        remote_base: Option<String>,
    ) -> Result<Self, ValidationError> {
        let local_root = local_root.into();
        validate_local_root(&local_root)?;

        Ok(Self {
            direction,
            local_root,
            remote_base: remote_base.filter(|b| !b.is_empty()),
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn remote_base(&self) -> Option<&str> {
        self.remote_base.as_deref()
    }
}

/// Check that `path` is an existing directory the client may write into.
pub fn validate_local_root(path: &Path) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::LocalRoot {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if !path.is_dir() {
        return Err(invalid("is not a directory"));
    }
    access(path, AccessFlags::W_OK | AccessFlags::X_OK)
        .map_err(|e| invalid(&format!("is not writable ({})", e)))
}

//! File metadata handling for sync operations.
//!
//! Captures the metadata the remote needs to compare trees (permission bits,
//! mtime, ownership) and applies permission bits to written objects.

use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

/// Permission bits including setuid, setgid and sticky.
pub const PERMISSION_MASK: u32 = 0o7777;

/// Metadata recorded for one manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Permission bits (file type bits stripped)
    pub mode: u32,

    /// Last modified time (seconds since Unix epoch)
    pub mtime: i64,

    pub uid: u32,
    pub gid: u32,
}

impl EntryMetadata {
    /// Extract metadata from already-read filesystem metadata
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        Self {
            mode: metadata.mode() & PERMISSION_MASK,
            mtime: metadata.mtime(),
            uid: metadata.uid(),
            gid: metadata.gid(),
        }
    }

    /// Extract metadata from a path without following a final symlink
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        Ok(Self::from_metadata(&metadata))
    }
}

/// Set the permission bits of `path` to `mode`.
pub fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode & PERMISSION_MASK))
}

/// Read the permission bits of `path`.
pub fn mode_of(path: &Path) -> std::io::Result<u32> {
    Ok(fs::metadata(path)?.permissions().mode() & PERMISSION_MASK)
}

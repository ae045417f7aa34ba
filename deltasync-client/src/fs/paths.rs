//! Sync-relative paths.
//!
//! Paths on the wire are POSIX-style and rooted at the sync base: `/sub/b.txt`.
//! A `SyncPath` has no `.` or `..` segments, so it stays lexically inside
//! whatever local root it is resolved against. Symbolic links on disk are a
//! separate matter, checked by the applier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SyncPath {
    segments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPath {
    #[error("path is empty")]
    Empty,

    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("path '{0}' contains a '.' or '..' segment")]
    Traversal(String),

    #[error("path '{0}' contains a NUL byte")]
    Nul(String),
}

impl SyncPath {
    /// Parse a wire path. A single leading `/` denotes the sync root.
    pub fn parse(raw: &str) -> Result<Self, InvalidPath> {
        if raw.contains('\0') {
            return Err(InvalidPath::Nul(raw.to_string()));
        }

        let relative = raw.strip_prefix('/').unwrap_or(raw);
        if relative.is_empty() {
            return Err(InvalidPath::Empty);
        }

        let mut segments = Vec::new();
        for segment in relative.split('/') {
            match segment {
                "" => return Err(InvalidPath::EmptySegment(raw.to_string())),
                "." | ".." => return Err(InvalidPath::Traversal(raw.to_string())),
                s => segments.push(s.to_string()),
            }
        }

        Ok(Self { segments })
    }

    /// Build a path from a parent and a single entry name.
    pub fn child(parent: Option<&SyncPath>, name: &str) -> Result<Self, InvalidPath> {
        let mut segments = parent.map(|p| p.segments.clone()).unwrap_or_default();
        match name {
            "" => return Err(InvalidPath::Empty),
            "." | ".." => return Err(InvalidPath::Traversal(name.to_string())),
            n if n.contains('/') => return Err(InvalidPath::EmptySegment(name.to_string())),
            n if n.contains('\0') => return Err(InvalidPath::Nul(name.to_string())),
            n => segments.push(n.to_string()),
        }
        Ok(Self { segments })
    }

    /// Resolve against a local root.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut resolved = root.to_path_buf();
        for segment in &self.segments {
            resolved.push(segment);
        }
        resolved
    }

    /// Segments from the root downwards.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True if `self` lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &SyncPath) -> bool {
        self.segments.len() > ancestor.segments.len()
            && self.segments.starts_with(&ancestor.segments)
    }
}

impl fmt::Display for SyncPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for SyncPath {
    type Error = InvalidPath;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SyncPath::parse(&value)
    }
}

impl From<SyncPath> for String {
    fn from(value: SyncPath) -> Self {
        value.to_string()
    }
}

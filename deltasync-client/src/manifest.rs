//! Manifest types describing the local side of a sync.
//!
//! A manifest records every file and directory under the sync root with the
//! metadata the remote compares against its own tree. Entries keep traversal
//! order, so a directory always precedes everything nested under it.

use crate::fs::metadata::EntryMetadata;
use crate::fs::paths::SyncPath;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "dir")]
    Directory,
}

/// Metadata for a single filesystem object, in wire field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "name")]
    pub path: SyncPath,

    #[serde(rename = "type")]
    pub entry_type: EntryType,

    /// Permission bits
    #[serde(rename = "rights")]
    pub mode: u32,

    pub mtime: i64,
    pub uid: u32,
    pub gid: u32,
}

impl ManifestEntry {
    pub fn new(path: SyncPath, entry_type: EntryType, metadata: EntryMetadata) -> Self {
        Self {
            path,
            entry_type,
            mode: metadata.mode,
            mtime: metadata.mtime,
            uid: metadata.uid,
            gid: metadata.gid,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }
}

/// Ordered `path -> entry` mapping for one tree at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: IndexMap<SyncPath, ManifestEntry>,
}

impl Manifest {
    /// Build a manifest from entries in traversal order.
    ///
    /// A path that appears twice keeps its first position and its last entry.
    pub fn from_entries(entries: impl IntoIterator<Item = ManifestEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();
        Self { entries }
    }

    pub fn get(&self, path: &SyncPath) -> Option<&ManifestEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values()
    }

    /// Regular file entries in traversal order.
    pub fn files(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.iter().filter(|e| e.entry_type == EntryType::File)
    }

    pub fn file_count(&self) -> usize {
        self.files().count()
    }

    pub fn dir_count(&self) -> usize {
        self.len() - self.file_count()
    }

    /// Serialize to the JSON object sent as `filelist`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

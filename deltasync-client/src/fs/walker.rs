//! Tree scanner producing the local manifest.
//!
//! Walks depth-first in pre-order with siblings sorted by name, so every
//! directory is recorded before its contents and two scans of an unchanged
//! tree produce identical manifests.

use crate::fs::metadata::EntryMetadata;
use crate::fs::paths::SyncPath;
use crate::manifest::{EntryType, Manifest, ManifestEntry};
use crate::utils::{Result, SyncError};
use std::path::{Component, Path};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Scan `root` and build its manifest.
///
/// Symbolic links and special files are skipped, never followed. Fails if any
/// directory cannot be listed or any entry's metadata cannot be read.
///
/// # Example
/// ```no_run
/// use deltasync_client::fs::walker::scan;
/// use std::path::Path;
///
/// let manifest = scan(Path::new("/data")).unwrap();
/// println!("Found {} entries", manifest.len());
/// ```
pub fn scan(root: &Path) -> Result<Manifest> {
    let mut entries = Vec::new();

    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            SyncError::Filesystem {
                path,
                source: e.into(),
            }
        })?;

        let file_type = entry.file_type();
        let entry_type = if file_type.is_dir() {
            EntryType::Directory
        } else if file_type.is_file() {
            EntryType::File
        } else {
            debug!("Skipping special file {}", entry.path().display());
            continue;
        };

        let Some(path) = sync_path(root, entry.path()) else {
            warn!(
                "Skipping {} (name is not valid UTF-8)",
                entry.path().display()
            );
            if entry_type == EntryType::Directory {
                walker.skip_current_dir();
            }
            continue;
        };

        let metadata = entry.metadata().map_err(|e| SyncError::Filesystem {
            path: entry.path().to_path_buf(),
            source: e.into(),
        })?;

        entries.push(ManifestEntry::new(
            path,
            entry_type,
            EntryMetadata::from_metadata(&metadata),
        ));
    }

    Ok(Manifest::from_entries(entries))
}

/// Relative wire path of `full` below `root`, or None if it cannot be expressed.
fn sync_path(root: &Path, full: &Path) -> Option<SyncPath> {
    let relative = full.strip_prefix(root).ok()?;
    let mut path: Option<SyncPath> = None;
    for component in relative.components() {
        let Component::Normal(name) = component else {
            return None;
        };
        path = Some(SyncPath::child(path.as_ref(), name.to_str()?).ok()?);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn paths(manifest: &Manifest) -> Vec<String> {
        manifest.iter().map(|e| e.path.to_string()).collect()
    }

    #[test]
    fn test_scan_empty_directory() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let manifest = scan(temp_dir.path())?;
        assert!(manifest.is_empty());
        Ok(())
    }

    #[test]
    fn test_scan_records_files_and_directories() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), b"hello").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("sub/b.txt"), b"world").unwrap();

        let manifest = scan(temp_dir.path())?;

        assert_eq!(paths(&manifest), vec!["/a.txt", "/sub", "/sub/b.txt"]);
        assert_eq!(manifest.file_count(), 2);
        assert_eq!(manifest.dir_count(), 1);
        Ok(())
    }

    #[test]
    fn test_directories_precede_their_contents() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("a/d")).unwrap();
        fs::write(root.join("a/b/c/deep.txt"), b"x").unwrap();
        fs::write(root.join("a/d/side.txt"), b"y").unwrap();
        fs::write(root.join("a.txt"), b"z").unwrap();

        let manifest = scan(root)?;
        let entries: Vec<&ManifestEntry> = manifest.iter().collect();

        for (idx, entry) in entries.iter().enumerate() {
            for earlier in &entries[..idx] {
                assert!(
                    !earlier.path.is_descendant_of(&entry.path),
                    "{} appears before its ancestor {}",
                    earlier.path,
                    entry.path
                );
            }
        }

        // Pre-order: a directory's subtree is contiguous
        assert_eq!(
            paths(&manifest),
            vec![
                "/a",
                "/a/b",
                "/a/b/c",
                "/a/b/c/deep.txt",
                "/a/d",
                "/a/d/side.txt",
                "/a.txt",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_symlinks_are_skipped() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("real.txt"), b"data").unwrap();
        fs::create_dir(root.join("dir")).unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(root.join("dir"), root.join("dirlink")).unwrap();
        std::os::unix::fs::symlink(root, root.join("dir/loop")).unwrap();

        let manifest = scan(root)?;

        assert_eq!(paths(&manifest), vec!["/dir", "/real.txt"]);
        Ok(())
    }

    #[test]
    fn test_dotfiles_are_included() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".hidden"), b"secret").unwrap();
        fs::create_dir(temp_dir.path().join(".config")).unwrap();

        let manifest = scan(temp_dir.path())?;

        assert_eq!(paths(&manifest), vec!["/.config", "/.hidden"]);
        Ok(())
    }

    #[test]
    fn test_scan_records_metadata() -> Result<()> {
        use crate::fs::metadata::set_mode;

        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.txt");
        fs::write(&file, b"hello").unwrap();
        set_mode(&file, 0o600).unwrap();

        let manifest = scan(temp_dir.path())?;
        let entry = manifest.get(&SyncPath::parse("/a.txt").unwrap()).unwrap();

        assert_eq!(entry.entry_type, EntryType::File);
        assert_eq!(entry.mode, 0o600);
        assert!(entry.mtime > 0);
        Ok(())
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = scan(&missing).unwrap_err();
        assert!(matches!(err, SyncError::Filesystem { .. }));
    }
}

//! Applies change operations to the local tree.
//!
//! Each call touches exactly one filesystem object. Patches are written to a
//! sibling temporary file and renamed over the original, so the target is
//! either the old content or the new content, never a mix.
//!
//! Symbolic links already present under the local root are never followed:
//! the scanner does not report them, so the remote cannot know where they
//! point.

use crate::fs::metadata::{set_mode, PERMISSION_MASK};
use crate::fs::paths::SyncPath;
use crate::protocol::{ChangeKind, ChangeOperation};
use crate::sync::DeltaEngine;
use crate::utils::format::format_mode;
use crate::utils::ApplyError;
use nix::fcntl::OFlag;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Prefix of temporary files staged next to a patch target.
pub const STAGING_PREFIX: &str = ".sync-";

/// Suffix of temporary files staged next to a patch target.
pub const STAGING_SUFFIX: &str = ".sync-tmp";

/// What an applied change did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedKind {
    DirectoryCreated,
    FileCreated,
    FilePatched,
}

impl From<&ChangeKind> for AppliedKind {
    fn from(kind: &ChangeKind) -> Self {
        match kind {
            ChangeKind::NewDirectory { .. } => AppliedKind::DirectoryCreated,
            ChangeKind::NewFile { .. } => AppliedKind::FileCreated,
            ChangeKind::Patch { .. } => AppliedKind::FilePatched,
        }
    }
}

/// Outcome of one applied change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    pub target: SyncPath,
    pub kind: AppliedKind,
    pub bytes_written: u64,
}

/// Apply `op` below `local_root`.
pub fn apply(
    local_root: &Path,
    op: &ChangeOperation,
    engine: &dyn DeltaEngine,
) -> Result<AppliedChange, ApplyError> {
    let path = resolve_contained(local_root, &op.target)?;

    let bytes_written = match &op.kind {
        ChangeKind::NewDirectory { mode } => {
            create_directory(&path, *mode)?;
            0
        }
        ChangeKind::NewFile { mode, content } => {
            create_file(&path, content, *mode)?;
            content.len() as u64
        }
        ChangeKind::Patch { mode, delta } => patch_file(&path, delta, *mode, engine)?,
    };

    debug!(
        "Applied {} to {} (mode {}, {} bytes)",
        op.kind.name(),
        op.target,
        format_mode(op.kind.mode()),
        bytes_written
    );

    Ok(AppliedChange {
        target: op.target.clone(),
        kind: AppliedKind::from(&op.kind),
        bytes_written,
    })
}

/// Resolve `target` under `local_root`, refusing any existing component that
/// is a symbolic link. Components that do not exist yet are left to the
/// operation itself to report.
fn resolve_contained(local_root: &Path, target: &SyncPath) -> Result<PathBuf, ApplyError> {
    let mut path = local_root.to_path_buf();
    for segment in target.segments() {
        path.push(segment);
        match fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                return Err(ApplyError::Symlink(path));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => return Err(ApplyError::io(&path, e)),
        }
    }
    Ok(target.resolve(local_root))
}

fn create_directory(path: &Path, mode: u32) -> Result<(), ApplyError> {
    if fs::symlink_metadata(path).is_ok() {
        return Err(ApplyError::Exists(path.to_path_buf()));
    }

    fs::create_dir(path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => ApplyError::Exists(path.to_path_buf()),
        _ => ApplyError::io(path, e),
    })?;

    set_mode(path, mode).map_err(|e| ApplyError::io(path, e))
}

fn create_file(path: &Path, content: &[u8], mode: u32) -> Result<(), ApplyError> {
    let write = || -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode & PERMISSION_MASK)
            .custom_flags(OFlag::O_NOFOLLOW.bits())
            .open(path)?;
        file.write_all(content)?;
        // fchmod on the open handle, so a link swapped in meanwhile is not chmodded
        file.set_permissions(fs::Permissions::from_mode(mode & PERMISSION_MASK))
    };

    write().map_err(|e| match e.raw_os_error() {
        Some(code) if code == nix::errno::Errno::ELOOP as i32 => {
            ApplyError::Symlink(path.to_path_buf())
        }
        _ => ApplyError::io(path, e),
    })
}

fn patch_file(
    path: &Path,
    delta: &[u8],
    mode: u32,
    engine: &dyn DeltaEngine,
) -> Result<u64, ApplyError> {
    let baseline = fs::read(path).map_err(|e| ApplyError::io(path, e))?;
    let patched = engine.apply_patch(&baseline, delta)?;

    let staged = StagedFile::stage(path, &patched, mode)?;
    staged.commit()?;

    Ok(patched.len() as u64)
}

/// New content for `target`, fully written to a sibling temporary file.
///
/// Dropping a `StagedFile` without committing removes the temporary file and
/// leaves the target untouched.
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Write `content` with permission bits `mode` next to `target`.
    ///
    /// The temporary name does not embed the target's name, so targets whose
    /// names are already at the filesystem limit can still be staged.
    pub fn stage(target: &Path, content: &[u8], mode: u32) -> Result<Self, ApplyError> {
        let parent = target
            .parent()
            .ok_or_else(|| ApplyError::io(target, io::Error::other("target has no parent")))?;

        let mut temp = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(parent)
            .map_err(|e| ApplyError::io(parent, e))?;

        let write = |temp: &mut NamedTempFile| -> io::Result<()> {
            temp.write_all(content)?;
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(mode & PERMISSION_MASK))?;
            temp.as_file().sync_all()
        };
        write(&mut temp).map_err(|e| ApplyError::io(temp.path(), e))?;

        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Atomically replace the target with the staged content.
    pub fn commit(self) -> Result<(), ApplyError> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map(|_| ())
            .map_err(|e| ApplyError::io(&target, e.error))
    }
}

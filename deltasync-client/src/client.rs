//! Sync protocol client - orchestrates one sync session.
//!
//! This module ties together:
//! - Tree scanner (manifest of the local root)
//! - Signature engine (push only)
//! - Transport round trip
//! - Change applier (pull only)
//!
//! Filesystem work runs on the blocking pool; the only await that can take
//! long is the round trip, which is raced against the cancellation token and
//! the configured timeout. Nothing is written locally before the response has
//! been fully parsed.

use crate::applier::{self, AppliedKind};
use crate::fs::paths::SyncPath;
use crate::fs::walker::scan;
use crate::protocol::encoding::Base64Bytes;
use crate::protocol::{parse_response, ChangeOperation, Direction, SignatureMap, SyncRequest};
use crate::session::SyncSession;
use crate::sync::DeltaEngine;
use crate::transport::Transport;
use crate::utils::format::{format_bytes, format_elapsed};
use crate::utils::{Result, SignatureError, SyncError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default bound on the round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Summary of a completed session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub direction: Direction,
    pub files_scanned: usize,
    pub directories_scanned: usize,
    pub signatures_sent: usize,
    pub directories_created: usize,
    pub files_created: usize,
    pub files_patched: usize,
    pub bytes_written: u64,
    pub elapsed: Duration,
}

impl SessionReport {
    pub fn changes_applied(&self) -> usize {
        self.directories_created + self.files_created + self.files_patched
    }
}

/// Counts of applied changes, accumulated on the blocking pool.
#[derive(Debug, Default)]
struct ApplyStats {
    directories_created: usize,
    files_created: usize,
    files_patched: usize,
    bytes_written: u64,
}

pub struct SyncClient<T, E> {
    transport: T,
    engine: Arc<E>,
    timeout: Duration,
}

impl<T, E> SyncClient<T, E>
where
    T: Transport,
    E: DeltaEngine + 'static,
{
    pub fn new(transport: T, engine: E) -> Self {
        Self {
            transport,
            engine: Arc::new(engine),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one scan -> exchange -> apply cycle.
    ///
    /// A failure while applying changes aborts the remaining ones; changes
    /// already applied stay in place and a rerun starts from the resulting tree.
    pub async fn run_session(
        &self,
        session: &SyncSession,
        cancel: &CancellationToken,
    ) -> Result<SessionReport> {
        let start_time = Instant::now();
        let direction = session.direction();

        info!(
            "Starting {} session for {} (remote base: {})",
            direction,
            session.local_root().display(),
            session.remote_base().unwrap_or("default")
        );

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let root = session.local_root().to_path_buf();
        let manifest = tokio::task::spawn_blocking(move || scan(&root)).await??;

        let mut report = SessionReport {
            direction,
            files_scanned: manifest.file_count(),
            directories_scanned: manifest.dir_count(),
            ..SessionReport::default()
        };
        info!(
            "Scanned {}: {} files, {} directories",
            session.local_root().display(),
            report.files_scanned,
            report.directories_scanned
        );

        let signatures = match direction {
            Direction::Push => {
                let files: Vec<SyncPath> = manifest.files().map(|e| e.path.clone()).collect();
                self.compute_signatures(session.local_root(), files).await?
            }
            Direction::Pull => SignatureMap::new(),
        };
        report.signatures_sent = signatures.len();

        let request = SyncRequest::initial(
            manifest,
            direction,
            session.remote_base().map(str::to_string),
            signatures,
        );

        let body = self.exchange(&request, cancel).await?;
        let changes = parse_response(&body, direction)?;

        match direction {
            Direction::Pull => {
                info!("Remote sent {} changes", changes.len());
                let stats = self
                    .apply_changes(session.local_root(), changes, cancel)
                    .await?;
                report.directories_created = stats.directories_created;
                report.files_created = stats.files_created;
                report.files_patched = stats.files_patched;
                report.bytes_written = stats.bytes_written;
            }
            Direction::Push => {
                info!(
                    "Remote accepted manifest and {} signatures",
                    report.signatures_sent
                );
            }
        }

        report.elapsed = start_time.elapsed();
        info!(
            "Sync completed: {} changes applied, {} written, {}",
            report.changes_applied(),
            format_bytes(report.bytes_written),
            format_elapsed(report.elapsed)
        );

        Ok(report)
    }

    /// Send the request, racing it against cancellation and the timeout.
    async fn exchange(&self, request: &SyncRequest, cancel: &CancellationToken) -> Result<Vec<u8>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Sync cancelled while waiting for the remote");
                Err(SyncError::Cancelled)
            }
            result = tokio::time::timeout(self.timeout, self.transport.exchange(request)) => {
                result.map_err(|_| SyncError::Timeout(self.timeout))?
            }
        }
    }

    async fn compute_signatures(&self, root: &Path, files: Vec<SyncPath>) -> Result<SignatureMap> {
        let engine = Arc::clone(&self.engine);
        let root = root.to_path_buf();

        let signatures = tokio::task::spawn_blocking(move || {
            let mut signatures = SignatureMap::new();
            for path in files {
                let full = path.resolve(&root);
                let signature = sign_file(engine.as_ref(), &full)
                    .map_err(|source| SyncError::Signature { path: full, source })?;
                debug!("Signed {} ({} bytes)", path, signature.len());
                signatures.insert(path, Base64Bytes(signature));
            }
            Ok::<_, SyncError>(signatures)
        })
        .await??;

        info!("Computed {} signatures", signatures.len());
        Ok(signatures)
    }

    async fn apply_changes(
        &self,
        root: &Path,
        changes: Vec<ChangeOperation>,
        cancel: &CancellationToken,
    ) -> Result<ApplyStats> {
        let engine = Arc::clone(&self.engine);
        let root: PathBuf = root.to_path_buf();
        let cancel = cancel.clone();

        tokio::task::spawn_blocking(move || {
            let mut stats = ApplyStats::default();
            for op in &changes {
                if cancel.is_cancelled() {
                    warn!(
                        "Sync cancelled after {} of {} changes",
                        stats.directories_created + stats.files_created + stats.files_patched,
                        changes.len()
                    );
                    return Err(SyncError::Cancelled);
                }

                let applied = applier::apply(&root, op, engine.as_ref()).map_err(|source| {
                    SyncError::Apply {
                        path: op.target.to_string(),
                        source,
                    }
                })?;

                match applied.kind {
                    AppliedKind::DirectoryCreated => stats.directories_created += 1,
                    AppliedKind::FileCreated => stats.files_created += 1,
                    AppliedKind::FilePatched => stats.files_patched += 1,
                }
                stats.bytes_written += applied.bytes_written;
            }
            Ok(stats)
        })
        .await?
    }
}

fn sign_file(engine: &dyn DeltaEngine, path: &Path) -> std::result::Result<Vec<u8>, SignatureError> {
    let mut file = std::fs::File::open(path)?;
    engine.generate_signature(&mut file)
}

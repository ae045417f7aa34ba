//! Deltasync Client Library
//!
//! Synchronizes a local directory tree with a remote sync service over HTTP,
//! transferring rsync-style deltas computed with fast_rsync.

pub mod applier;
pub mod client;
pub mod config;
pub mod fs;
pub mod manifest;
pub mod protocol;
pub mod session;
pub mod shutdown;
pub mod sync;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use client::{SessionReport, SyncClient};
pub use config::Config;
pub use protocol::Direction;
pub use session::SyncSession;
pub use transport::HttpTransport;
pub use utils::errors::SyncError;
pub type Result<T> = std::result::Result<T, SyncError>;

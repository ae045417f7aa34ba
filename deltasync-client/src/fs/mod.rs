//! Local filesystem access: tree scanning, metadata and sync-relative paths.

pub mod metadata;
pub mod paths;
pub mod walker;

pub use paths::SyncPath;
pub use walker::scan;

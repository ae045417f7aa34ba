//! Utility modules for the sync client.

pub mod errors;
pub mod format;
pub mod logger;

pub use errors::{
    ApplyError, PatchError, ProtocolError, Result, SignatureError, SyncError, ValidationError,
};

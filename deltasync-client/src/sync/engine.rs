//! The signature/patch capability injected into the sync client.
//!
//! The session and the change applier only see [`DeltaEngine`]; the rolling
//! checksum algorithm behind it is sealed. [`FastRsyncEngine`] is the
//! production implementation.

use crate::sync::patch::apply_delta_to_bytes;
use crate::sync::signature::{generate_signature, BlockOptions};
use crate::utils::{PatchError, SignatureError};
use std::io::Read;

pub trait DeltaEngine: Send + Sync {
    /// Produce the signature of `content`. Identical content yields identical bytes.
    fn generate_signature(&self, content: &mut dyn Read) -> Result<Vec<u8>, SignatureError>;

    /// Reconstruct new content from `base` and a delta computed against its signature.
    fn apply_patch(&self, base: &[u8], delta: &[u8]) -> Result<Vec<u8>, PatchError>;
}

/// librsync-compatible engine backed by fast_rsync.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastRsyncEngine {
    options: BlockOptions,
}

impl FastRsyncEngine {
    pub fn new(options: BlockOptions) -> Self {
        Self {
            options: options.sanitized(),
        }
    }

    pub fn options(&self) -> BlockOptions {
        self.options
    }
}

impl DeltaEngine for FastRsyncEngine {
    fn generate_signature(&self, content: &mut dyn Read) -> Result<Vec<u8>, SignatureError> {
        Ok(generate_signature(content, self.options)?)
    }

    fn apply_patch(&self, base: &[u8], delta: &[u8]) -> Result<Vec<u8>, PatchError> {
        apply_delta_to_bytes(base, delta).map_err(|e| PatchError(e.to_string()))
    }
}

/// Deterministic stand-in used by unit tests.
///
/// Signatures are `SIG:` followed by the content; a delta is appended to the
/// base, and any delta starting with `FAIL` is rejected.
#[cfg(test)]
pub(crate) struct FakeEngine;

#[cfg(test)]
impl DeltaEngine for FakeEngine {
    fn generate_signature(&self, content: &mut dyn Read) -> Result<Vec<u8>, SignatureError> {
        let mut signature = b"SIG:".to_vec();
        content.read_to_end(&mut signature)?;
        Ok(signature)
    }

    fn apply_patch(&self, base: &[u8], delta: &[u8]) -> Result<Vec<u8>, PatchError> {
        if delta.starts_with(b"FAIL") {
            return Err(PatchError("fake patcher rejected delta".to_string()));
        }
        let mut output = base.to_vec();
        output.extend_from_slice(delta);
        Ok(output)
    }
}

//! Delta computation logic.
//!
//! This is the remote side of a pull: given the signature of a baseline file
//! and the new content, produce the delta that turns one into the other. The
//! client uses it for the push direction and to verify the patch round trip.

use fast_rsync::{diff, Signature};

/// Compute a delta from a serialized signature and the new content.
///
/// # Example
/// ```no_run
/// use deltasync_client::sync::delta::compute_delta;
/// use deltasync_client::sync::signature::{generate_signature_from_bytes, BlockOptions};
///
/// let sig = generate_signature_from_bytes(b"Hello, World!", BlockOptions::default());
/// let delta = compute_delta(sig.serialized(), b"Hello, Rust!").unwrap();
///
/// println!("Delta size: {} bytes", delta.len());
/// ```
pub fn compute_delta(signature: &[u8], new_data: &[u8]) -> Result<Vec<u8>, String> {
    let signature = Signature::deserialize(signature.to_vec())
        .map_err(|e| format!("invalid signature: {:?}", e))?;
    compute_delta_from_signature(&signature, new_data)
}

/// Compute a delta against an already parsed signature.
pub fn compute_delta_from_signature(
    signature: &Signature,
    new_data: &[u8],
) -> Result<Vec<u8>, String> {
    let mut delta_output = Vec::new();
    let indexed = signature.index();
    diff(&indexed, new_data, &mut delta_output)
        .map_err(|e| format!("delta computation failed: {:?}", e))?;
    Ok(delta_output)
}

//! Delta application to reconstruct files.

use fast_rsync::apply;
use std::io;

/// Apply a delta to baseline data to reconstruct the new content
///
/// # Example
/// ```no_run
/// use deltasync_client::sync::{
///     delta::compute_delta,
///     patch::apply_delta_to_bytes,
///     signature::{generate_signature_from_bytes, BlockOptions},
/// };
///
/// let baseline = b"Hello, World!";
/// let modified = b"Hello, Rust!";
///
/// let sig = generate_signature_from_bytes(baseline, BlockOptions::default());
/// let delta = compute_delta(sig.serialized(), modified).unwrap();
///
/// let reconstructed = apply_delta_to_bytes(baseline, &delta).unwrap();
/// assert_eq!(reconstructed, modified);
/// ```
pub fn apply_delta_to_bytes(baseline_data: &[u8], delta: &[u8]) -> io::Result<Vec<u8>> {
    let mut output = Vec::new();
    apply(baseline_data, delta, &mut output)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{
        delta::compute_delta,
        signature::{generate_signature_from_bytes, BlockOptions},
    };

    fn round_trip(baseline: &[u8], modified: &[u8], options: BlockOptions) -> io::Result<Vec<u8>> {
        let sig = generate_signature_from_bytes(baseline, options);
        let delta = compute_delta(sig.serialized(), modified).unwrap();
        apply_delta_to_bytes(baseline, &delta)
    }

    #[test]
    fn test_apply_delta_identical_files() -> io::Result<()> {
        let data = b"This is test data for delta application.";
        assert_eq!(round_trip(data, data, BlockOptions::default())?, data);
        Ok(())
    }

    #[test]
    fn test_apply_delta_modified_file() -> io::Result<()> {
        let baseline = b"Hello, World! This is the baseline version.";
        let modified = b"Hello, Rust! This is the modified version.";
        assert_eq!(round_trip(baseline, modified, BlockOptions::default())?, modified);
        Ok(())
    }

    #[test]
    fn test_apply_delta_append() -> io::Result<()> {
        assert_eq!(round_trip(b"hello", b"hello world", BlockOptions::default())?, b"hello world");
        Ok(())
    }

    #[test]
    fn test_round_trip_large_data_small_blocks() -> io::Result<()> {
        let baseline = vec![b'A'; 10000];
        let mut modified = baseline.clone();
        for byte in &mut modified[5000..5100] {
            *byte = b'B';
        }
        modified.extend_from_slice(b"tail");

        let options = BlockOptions {
            block_size: 512,
            ..BlockOptions::default()
        };
        assert_eq!(round_trip(&baseline, &modified, options)?, modified);
        Ok(())
    }

    #[test]
    fn test_round_trip_to_empty() -> io::Result<()> {
        assert!(round_trip(b"something", b"", BlockOptions::default())?.is_empty());
        assert_eq!(round_trip(b"", b"fresh", BlockOptions::default())?, b"fresh");
        Ok(())
    }

    #[test]
    fn test_garbage_delta_is_rejected() {
        let err = apply_delta_to_bytes(b"baseline", b"\x00\x01garbage").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}

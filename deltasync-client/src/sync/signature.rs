//! File signature generation using fast_rsync.
//!
//! Signatures use the rsync rolling checksum plus a truncated MD4 strong
//! hash per block, serialized in the librsync wire format.

use fast_rsync::{Signature, SignatureOptions};
use std::io::{self, Read};

/// Default block size for signature generation (16KB)
pub const DEFAULT_BLOCK_SIZE: u32 = 16 * 1024;

/// Default strong hash length in bytes (8 bytes = 64 bits)
pub const DEFAULT_CRYPTO_HASH_SIZE: u32 = 8;

/// Largest strong hash the MD4 digest can provide.
pub const MAX_CRYPTO_HASH_SIZE: u32 = 16;

/// Block partitioning used when signing files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOptions {
    pub block_size: u32,
    pub crypto_hash_size: u32,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            crypto_hash_size: DEFAULT_CRYPTO_HASH_SIZE,
        }
    }
}

impl BlockOptions {
    /// Clamp to values fast_rsync accepts.
    pub fn sanitized(self) -> Self {
        Self {
            block_size: self.block_size.max(1),
            crypto_hash_size: self.crypto_hash_size.clamp(1, MAX_CRYPTO_HASH_SIZE),
        }
    }

    fn to_signature_options(self) -> SignatureOptions {
        let options = self.sanitized();
        SignatureOptions {
            block_size: options.block_size,
            crypto_hash_size: options.crypto_hash_size,
        }
    }
}

/// Generate a signature from a byte buffer.
pub fn generate_signature_from_bytes(data: &[u8], options: BlockOptions) -> Signature {
    Signature::calculate(data, options.to_signature_options())
}

/// Read `content` to the end and return its serialized signature.
///
/// Note: This reads the entire content into memory.
pub fn generate_signature(content: &mut dyn Read, options: BlockOptions) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    content.read_to_end(&mut data)?;
    Ok(generate_signature_from_bytes(&data, options).serialized().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_signature_from_bytes() {
        let sig = generate_signature_from_bytes(b"Hello, World!", BlockOptions::default());
        assert!(!sig.serialized().is_empty());
    }

    #[test]
    fn test_signature_is_deterministic() -> io::Result<()> {
        let data = vec![7u8; 100_000];

        let first = generate_signature(&mut Cursor::new(&data), BlockOptions::default())?;
        let second = generate_signature(&mut Cursor::new(&data), BlockOptions::default())?;

        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_smaller_blocks_give_larger_signature() -> io::Result<()> {
        let data = vec![0u8; 1024 * 64];
        let coarse = BlockOptions::default();
        let fine = BlockOptions {
            block_size: 4096,
            ..BlockOptions::default()
        };

        let coarse_sig = generate_signature(&mut Cursor::new(&data), coarse)?;
        let fine_sig = generate_signature(&mut Cursor::new(&data), fine)?;

        assert!(fine_sig.len() > coarse_sig.len());
        Ok(())
    }

    #[test]
    fn test_sanitized_options() {
        let options = BlockOptions {
            block_size: 0,
            crypto_hash_size: 64,
        }
        .sanitized();

        assert_eq!(options.block_size, 1);
        assert_eq!(options.crypto_hash_size, MAX_CRYPTO_HASH_SIZE);
    }
}

//! Streaming SHA-256 content fingerprints.
//!
//! The digest recorded at encryption time is the plaintext's identity;
//! decryption recomputes it over the restored file to detect divergence.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::errors::Result;

/// Bytes read from disk per `update` call.
pub const CHUNK_SIZE: usize = 4096;

/// Hex-encoded SHA-256 of the file at `path`, read in fixed-size chunks.
pub fn digest_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hex-encoded SHA-256 of an in-memory buffer.
pub fn digest_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compare two hex digests in constant time.
pub fn digests_match(actual: &str, expected: &str) -> bool {
    use subtle::ConstantTimeEq;
    actual
        .to_ascii_lowercase()
        .as_bytes()
        .ct_eq(expected.to_ascii_lowercase().as_bytes())
        .into()
}

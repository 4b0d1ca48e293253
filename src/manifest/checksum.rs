//! SHA-256 integrity verification for downloaded artifacts.

use anyhow::{Context, Result};
use log::debug;
use sha2::{Digest, Sha256};
use std::io::Read;

/// Declared and computed digests disagree; the artifact must not be installed.
#[derive(Debug)]
pub struct IntegrityError {
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Checksum mismatch: expected {}, got {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for IntegrityError {}

/// Streams a reader through SHA-256 and compares against the declared digest.
///
/// Hex comparison is case-insensitive.
pub fn verify_reader<R: Read>(mut reader: R, expected: &str) -> Result<()> {
    let mut hasher = Sha256::new();
    let bytes_read =
        std::io::copy(&mut reader, &mut hasher).context("Failed to read artifact for hashing")?;
    let actual = hex::encode(hasher.finalize());
    debug!("Calculated SHA256: {} ({} bytes read)", actual, bytes_read);

    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(IntegrityError {
            expected: expected.to_string(),
            actual,
        }
        .into())
    }
}

/// Verifies an in-memory payload. Convenience wrapper over [`verify_reader`].
pub fn verify_bytes(data: &[u8], expected: &str) -> Result<()> {
    verify_reader(data, expected)
}

/// Checks that a string has the shape of a hex-encoded SHA-256 digest.
pub fn is_digest_shaped(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}

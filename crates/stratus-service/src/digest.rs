//! Content digest computation and verification.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use sha2::{Digest, Sha512};

use stratus_core::error::AppError;
use stratus_core::result::AppResult;

/// Computes SHA-512 content digests in base64 text form, the format
/// callers declare checksums in.
pub struct Hasher;

impl Hasher {
    /// Compute the base64-encoded SHA-512 digest of the data.
    pub fn digest(data: &[u8]) -> String {
        BASE64_STANDARD.encode(Sha512::digest(data))
    }

    /// Verify data against an expected digest.
    pub fn verify(data: &[u8], expected: &str) -> AppResult<()> {
        if Self::digest(data) == expected {
            Ok(())
        } else {
            Err(AppError::checksum_mismatch(
                "Content does not match the declared checksum",
            ))
        }
    }
}

// warden-store-sqlite/src/hashing.rs
// ============================================================================
// Module: Row Integrity Hashing
// Description: SHA-256 digests over a row's exact stored bytes.
// Purpose: Detect on-disk corruption between write and read without
//          depending on cross-serializer canonical-JSON determinism, since
//          every row is both written and read by this crate's own encoder.
// Dependencies: sha2
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

/// Returns the lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::default();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_and_sensitive_to_input() {
        let a = hex_digest(b"hello");
        let b = hex_digest(b"hello");
        let c = hex_digest(b"world");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}

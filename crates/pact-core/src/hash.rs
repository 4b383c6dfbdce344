//! Content hash of a contract.
//!
//! The hash is SHA-256 over the UTF-8 bytes of `"{id}-{terms}"`, hex-encoded
//! in lowercase. Existing snapshots carry this value, so the derivation must
//! stay bit-exact.

use sha2::{Digest, Sha256};

/// Compute the content hash for a contract id and its terms.
pub fn content_hash(id: &str, terms: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(id.as_bytes());
  hasher.update(b"-");
  hasher.update(terms.as_bytes());
  hex::encode(hasher.finalize())
}

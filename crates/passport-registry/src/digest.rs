//! Content digests for off-registry passport documents.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Digest a canonical JSON rendering of `value` using SHA-256.
///
/// Maps serialize with sorted keys and compact separators, so two documents
/// with the same content always produce the same digest regardless of the
/// key order they were authored in. The result is the hex string callers
/// pass to the registry as `integrity_hash`.
pub fn content_digest(value: &Value) -> String {
    digest_bytes(value.to_string().as_bytes())
}

/// Digest raw bytes using SHA-256, hex-encoded.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

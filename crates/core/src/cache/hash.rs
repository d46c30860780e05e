//! Cache key generation for stored request/response pairs.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request.
///
/// The key covers the method and the full URL, so `GET /a` and `HEAD /a`
/// are distinct entries. The method is uppercased before hashing.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

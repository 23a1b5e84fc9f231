//! Idempotency keys
//!
//! Deterministic workflow keys: identical logical requests hash to the
//! same key across retries, so the durable executor can deduplicate them.
//! No wall-clock input ever contributes to a key.

use sha2::{Digest, Sha256};

/// Derive a 64-character hex key from the identifying parts of a request.
#[must_use]
pub fn derive_key(parts: &[&str]) -> String {
    let composite = parts.join(":");
    let mut hasher = Sha256::new();
    hasher.update(composite.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = derive_key(&["tok-1", "pco", "Person", "per_1", "update", "req-9"]);
        let b = derive_key(&["tok-1", "pco", "Person", "per_1", "update", "req-9"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_distinct_inputs_distinct_keys() {
        let a = derive_key(&["tok-1", "pco", "Person", "per_1", "update", "req-9"]);
        let b = derive_key(&["tok-1", "pco", "Person", "per_1", "delete", "req-9"]);
        let c = derive_key(&["tok-1", "pco", "Person", "per_1", "update", "req-10"]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}

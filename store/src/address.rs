//! Content addresses: opaque, stable identifiers of canonical bytes.
//!
//! The reference hash scheme is BLAKE3-256, rendered as a lowercase hex
//! string prefixed with `b3:` so two deployments can confirm at a glance
//! that they canonicalize identically (see `LedgerConfig::hash_scheme`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable, opaque identifier of a blob's canonical byte encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentAddress(String);

impl ContentAddress {
    /// Hash `bytes` and produce its content address.
    pub fn of(bytes: &[u8]) -> Self {
        let digest = blake3::hash(bytes);
        ContentAddress(format!("b3:{}", digest.to_hex()))
    }

    /// The filesystem-safe key this address maps to under `blocks/`.
    pub fn as_key(&self) -> &str {
        self.0.trim_start_matches("b3:")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ContentAddress {
    fn from(s: String) -> Self {
        ContentAddress(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_address() {
        let a = ContentAddress::of(b"hello");
        let b = ContentAddress::of(b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_different_address() {
        let a = ContentAddress::of(b"hello");
        let b = ContentAddress::of(b"world");
        assert_ne!(a, b);
    }
}

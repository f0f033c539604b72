//! Identifiers used throughout the settlement engine.
//!
//! Accounts, tokens and contracts are all 20-byte addresses. Orders are
//! identified by the SHA-256 of their canonical encoding.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use alloy_primitives::Address;

/// Token amounts in the token's smallest unit.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

// ---------------------------------------------------------------------------
// OrderHash
// ---------------------------------------------------------------------------

/// Content hash of an encoded order (order + extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderHash(pub [u8; 32]);

impl OrderHash {
    /// Hash an arbitrary byte string.
    #[must_use]
    pub fn digest(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 bytes are plenty for log lines.
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

/// Derive an address from a 32-byte public key: the last 20 bytes of its
/// SHA-256 digest.
#[must_use]
pub fn address_from_public_key(public_key: &[u8; 32]) -> Address {
    let digest = Sha256::digest(public_key);
    Address::from_slice(&digest[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_hash_is_deterministic() {
        let a = OrderHash::digest(b"order");
        let b = OrderHash::digest(b"order");
        let c = OrderHash::digest(b"other");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn order_hash_display_is_short_hex() {
        let h = OrderHash([0xab; 32]);
        assert_eq!(format!("{h}"), "abababababababab");
    }

    #[test]
    fn address_from_key_is_stable() {
        let key = [7u8; 32];
        assert_eq!(address_from_public_key(&key), address_from_public_key(&key));
        assert_ne!(address_from_public_key(&key), address_from_public_key(&[8u8; 32]));
    }
}

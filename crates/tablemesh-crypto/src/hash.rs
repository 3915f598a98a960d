use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the collision-resistant hash used throughout the mesh (node ids,
/// Merkle roots, card commitments, message ids).
pub const HASH_LEN: usize = 32;

/// A 256-bit hash digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Hash32(pub [u8; HASH_LEN]);

impl Hash32 {
    pub const ZERO: Self = Self([0u8; HASH_LEN]);

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Hash32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LEN]> for Hash32 {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash an arbitrary byte slice to a 32-byte digest.
///
/// Used both for the log's incremental Merkle chain (§4.1) and for mental-poker
/// card commitments (§4.5) — a single collision-resistant hash serves both.
pub fn hash(data: &[u8]) -> Hash32 {
    Hash32(*blake3::hash(data).as_bytes())
}

/// Chains a hash the way the log store's incremental Merkle root does:
/// `next = H(prev || data)`.
pub fn chain(prev: Hash32, data: &[u8]) -> Hash32 {
    let mut buf = Vec::with_capacity(HASH_LEN + data.len());
    buf.extend_from_slice(&prev.0);
    buf.extend_from_slice(data);
    hash(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash(b"abc"), hash(b"abc"));
    }

    #[test]
    fn hash_is_sensitive_to_input() {
        assert_ne!(hash(b"abc"), hash(b"abd"));
    }

    #[test]
    fn chain_differs_from_plain_hash() {
        let direct = hash(b"abc");
        let chained = chain(Hash32::ZERO, b"abc");
        assert_ne!(direct, chained);
    }

    #[test]
    fn chain_is_order_sensitive() {
        let a = chain(Hash32::ZERO, b"one");
        let b = chain(a, b"two");
        let c = chain(Hash32::ZERO, b"two");
        let d = chain(c, b"one");
        assert_ne!(b, d);
    }
}

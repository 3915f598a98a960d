//! Per-node identity (§3 "Node identity", C2).

use serde::{Deserialize, Serialize};
use std::fmt;
use tablemesh_crypto::{hash, Hash32, PrivateKey, PublicKey};

/// `node_id := hash(public_key)`, 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(Hash32);

impl NodeId {
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(hash(public_key.as_bytes()))
    }

    pub fn as_hash(&self) -> Hash32 {
        self.0
    }

    /// Reconstructs a `NodeId` from its raw 32-byte hash, e.g. when decoding
    /// one off the wire (§4.2). Does not re-derive it from a public key.
    pub fn from_hash_bytes(bytes: [u8; 32]) -> Self {
        Self(Hash32::from(bytes))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", &self.0.to_hex()[..8])
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A local node's full identity material: keypair plus the metadata the
/// spec attaches to it (display name, creation timestamp, reputation hint).
pub struct Identity {
    private_key: PrivateKey,
    public_key: PublicKey,
    node_id: NodeId,
    display_name: String,
    created_at_ms: u64,
    /// Monotonically adjusted reputation scalar. Non-authoritative: never
    /// consulted by consensus or replay, only surfaced to operators/UIs.
    reputation: f64,
}

impl Identity {
    pub fn generate(display_name: impl Into<String>, created_at_ms: u64) -> Self {
        let (private_key, public_key) = tablemesh_crypto::generate_keypair();
        let node_id = NodeId::from_public_key(&public_key);
        Self {
            private_key,
            public_key,
            node_id,
            display_name: display_name.into(),
            created_at_ms,
            reputation: 0.5,
        }
    }

    pub fn from_private_key(
        private_key: PrivateKey,
        display_name: impl Into<String>,
        created_at_ms: u64,
    ) -> Self {
        let public_key = private_key.public_key();
        let node_id = NodeId::from_public_key(&public_key);
        Self {
            private_key,
            public_key,
            node_id,
            display_name: display_name.into(),
            created_at_ms,
            reputation: 0.5,
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn reputation(&self) -> f64 {
        self.reputation
    }

    /// Same EWMA shape as peer reliability (§4.8), applied to the local
    /// node's own non-authoritative reputation hint.
    pub fn adjust_reputation(&mut self, success: bool) {
        self.reputation = if success {
            0.9 * self.reputation + 0.1
        } else {
            0.9 * self.reputation
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_deterministic_from_public_key() {
        let identity = Identity::generate("alice", 1_000);
        let again = NodeId::from_public_key(&identity.public_key());
        assert_eq!(identity.node_id(), again);
    }

    #[test]
    fn distinct_identities_get_distinct_ids() {
        let a = Identity::generate("alice", 1_000);
        let b = Identity::generate("bob", 1_000);
        assert_ne!(a.node_id(), b.node_id());
    }

    #[test]
    fn reputation_decays_and_recovers() {
        let mut identity = Identity::generate("alice", 1_000);
        let start = identity.reputation();
        identity.adjust_reputation(false);
        assert!(identity.reputation() < start);
        identity.adjust_reputation(true);
        assert!(identity.reputation() > 0.0);
    }
}

//! The append-only, per-origin ordered log store (§4.1, C3).
//!
//! Readers may run concurrently; a writer acquires exclusive access for
//! `install_remote`/`append_local` (§5 shared-resource policy). Grounded on
//! the teacher's preference for non-poisoning `parking_lot` locks for
//! long-lived shared node state (`examples/happybigmtn-nullspace/node/src/supervisor.rs`).

mod error;

pub use error::LogError;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tablemesh_codec::{Entry, Payload, MAX_PAYLOAD_LEN};
use tablemesh_crypto::Hash32;
use tablemesh_identity::{Identity, NodeId};
use tracing::{debug, warn};

/// Resolves a claimed origin's public key so `install_remote` can verify its
/// signature (§4.1). Typically backed by the peer table (C11).
pub trait PublicKeyResolver: Send + Sync {
    fn resolve(&self, node_id: &NodeId) -> Option<tablemesh_crypto::PublicKey>;
}

/// An observer notified after every successful append (§3 "observers are
/// notified"). The gossip engine and state replay register themselves here.
pub type Observer = Box<dyn Fn(&Entry) + Send + Sync>;

#[derive(Default)]
struct OriginLog {
    entries: Vec<Entry>,
    merkle_root: Hash32,
}

/// The append-only log store. One instance per node; holds every origin's
/// log this node has observed.
pub struct LogStore {
    resolver: Arc<dyn PublicKeyResolver>,
    origins: RwLock<HashMap<NodeId, OriginLog>>,
    observers: RwLock<Vec<Observer>>,
    max_entries_per_origin: usize,
}

impl LogStore {
    pub fn new(resolver: Arc<dyn PublicKeyResolver>) -> Self {
        Self::with_capacity(resolver, 10_000_000)
    }

    pub fn with_capacity(resolver: Arc<dyn PublicKeyResolver>, max_entries_per_origin: usize) -> Self {
        Self {
            resolver,
            origins: RwLock::new(HashMap::new()),
            observers: RwLock::new(Vec::new()),
            max_entries_per_origin,
        }
    }

    pub fn subscribe(&self, observer: Observer) {
        self.observers.write().push(observer);
    }

    fn notify(&self, entry: &Entry) {
        for observer in self.observers.read().iter() {
            observer(entry);
        }
    }

    /// Allocates the next sequence for the local node, timestamps, signs,
    /// stores, and notifies observers (§4.1).
    pub fn append_local(
        &self,
        identity: &Identity,
        table_id: u64,
        payload: Payload,
        timestamp_ms: u64,
    ) -> Result<Entry, LogError> {
        let payload_bytes = payload.encode_bytes();
        if payload_bytes.len() > MAX_PAYLOAD_LEN {
            return Err(LogError::PayloadTooLarge);
        }
        let node_id = identity.node_id();
        let mut origins = self.origins.write();
        let origin_log = origins.entry(node_id).or_default();
        if origin_log.entries.len() >= self.max_entries_per_origin {
            return Err(LogError::StoreFull);
        }
        let sequence = origin_log.entries.last().map_or(1, |e| e.sequence + 1);
        let mut entry = Entry {
            sequence,
            timestamp: timestamp_ms,
            origin_node_id: node_id,
            table_id,
            payload,
            signature: tablemesh_crypto::Signature::from_bytes([0u8; 64]),
        };
        let signature = identity.private_key().sign(&entry.signing_bytes());
        entry.signature = signature;
        origin_log.entries.push(entry.clone());
        origin_log.merkle_root = tablemesh_crypto::chain(origin_log.merkle_root, &entry.encode());
        drop(origins);
        debug!(sequence, table_id, "appended local entry");
        self.notify(&entry);
        Ok(entry)
    }

    /// Verifies and installs an entry received from gossip (§4.1).
    pub fn install_remote(&self, entry: Entry) -> Result<(), LogError> {
        let public_key = self
            .resolver
            .resolve(&entry.origin_node_id)
            .ok_or(LogError::UnknownOrigin)?;
        public_key
            .verify(&entry.signing_bytes(), &entry.signature)
            .map_err(|_| LogError::BadSignature)?;

        let mut origins = self.origins.write();
        let origin_log = origins.entry(entry.origin_node_id).or_default();
        let expected = origin_log.entries.last().map_or(1, |e| e.sequence + 1);
        if entry.sequence < expected {
            // Already have this sequence (or earlier): distinguish duplicate
            // from a stale retransmit of an already-installed entry.
            if origin_log
                .entries
                .get((entry.sequence - 1) as usize)
                .is_some()
            {
                warn!(sequence = entry.sequence, "rejected duplicate entry");
                return Err(LogError::DuplicateEntry);
            }
            return Err(LogError::OutOfOrderSequence);
        }
        if entry.sequence > expected {
            return Err(LogError::OutOfOrderSequence);
        }
        if origin_log.entries.len() >= self.max_entries_per_origin {
            return Err(LogError::StoreFull);
        }
        origin_log.entries.push(entry.clone());
        origin_log.merkle_root = tablemesh_crypto::chain(origin_log.merkle_root, &entry.encode());
        drop(origins);
        debug!(sequence = entry.sequence, origin = %entry.origin_node_id, "installed remote entry");
        self.notify(&entry);
        Ok(())
    }

    /// Returns the inclusive `[from, to]` range for `origin`; empty if absent.
    pub fn range(&self, origin: NodeId, from: u64, to: u64) -> Vec<Entry> {
        let origins = self.origins.read();
        let Some(origin_log) = origins.get(&origin) else {
            return Vec::new();
        };
        origin_log
            .entries
            .iter()
            .filter(|e| e.sequence >= from && e.sequence <= to)
            .cloned()
            .collect()
    }

    pub fn latest_sequence(&self, origin: NodeId) -> u64 {
        self.origins
            .read()
            .get(&origin)
            .and_then(|log| log.entries.last())
            .map_or(0, |e| e.sequence)
    }

    pub fn merkle_root(&self, origin: NodeId) -> Hash32 {
        self.origins
            .read()
            .get(&origin)
            .map_or(Hash32::ZERO, |log| log.merkle_root)
    }

    /// Every origin this node currently holds at least one entry for.
    pub fn known_origins(&self) -> Vec<NodeId> {
        self.origins.read().keys().copied().collect()
    }

    /// All entries across all origins concerning `table_id`, in no
    /// particular cross-origin order; callers needing a total order use
    /// `tablemesh-replay`'s ordering rules (§4.6/SPEC_FULL §4.6).
    pub fn entries_for_table(&self, table_id: u64) -> Vec<Entry> {
        self.origins
            .read()
            .values()
            .flat_map(|log| log.entries.iter().cloned())
            .filter(|e| e.table_id == table_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;
    use tablemesh_codec::{ChatMessagePayload, Payload};

    struct StaticResolver(StdHashMap<NodeId, tablemesh_crypto::PublicKey>);

    impl PublicKeyResolver for StaticResolver {
        fn resolve(&self, node_id: &NodeId) -> Option<tablemesh_crypto::PublicKey> {
            self.0.get(node_id).copied()
        }
    }

    fn chat_payload(identity: &Identity, text: &str) -> Payload {
        Payload::ChatMessage(ChatMessagePayload {
            table_id: 1,
            sender_id: identity.node_id(),
            text: text.into(),
            timestamp: 1,
            signature: identity.private_key().sign(text.as_bytes()),
        })
    }

    #[test]
    fn append_local_then_install_remote_round_trips() {
        let alice = Identity::generate("alice", 1);
        let bob = Identity::generate("bob", 1);
        let mut keys = StdHashMap::new();
        keys.insert(alice.node_id(), alice.public_key());
        keys.insert(bob.node_id(), bob.public_key());
        let resolver = Arc::new(StaticResolver(keys));

        let alice_store = LogStore::new(resolver.clone());
        let entry = alice_store
            .append_local(&alice, 1, chat_payload(&alice, "hi"), 1000)
            .unwrap();
        assert_eq!(entry.sequence, 1);

        let bob_store = LogStore::new(resolver);
        bob_store.install_remote(entry.clone()).unwrap();
        assert_eq!(bob_store.latest_sequence(alice.node_id()), 1);
        assert_eq!(
            bob_store.merkle_root(alice.node_id()),
            alice_store.merkle_root(alice.node_id())
        );
    }

    #[test]
    fn sequences_increment_with_no_gaps() {
        let alice = Identity::generate("alice", 1);
        let mut keys = StdHashMap::new();
        keys.insert(alice.node_id(), alice.public_key());
        let store = LogStore::new(Arc::new(StaticResolver(keys)));
        for i in 0..5 {
            let entry = store
                .append_local(&alice, 1, chat_payload(&alice, &format!("msg {i}")), 1000)
                .unwrap();
            assert_eq!(entry.sequence, i + 1);
        }
        assert_eq!(store.latest_sequence(alice.node_id()), 5);
    }

    #[test]
    fn install_remote_rejects_out_of_order_sequence() {
        let alice = Identity::generate("alice", 1);
        let mut keys = StdHashMap::new();
        keys.insert(alice.node_id(), alice.public_key());
        let resolver = Arc::new(StaticResolver(keys));
        let source = LogStore::new(resolver.clone());
        let _seq1 = source
            .append_local(&alice, 1, chat_payload(&alice, "one"), 1000)
            .unwrap();
        let seq2 = source
            .append_local(&alice, 1, chat_payload(&alice, "two"), 1001)
            .unwrap();

        let dest = LogStore::new(resolver);
        // current is 0 (nothing installed), installing sequence 2 directly
        // is out of order (N+2 when current is N, §8 boundary behaviour).
        assert_eq!(
            dest.install_remote(seq2).unwrap_err(),
            LogError::OutOfOrderSequence
        );
    }

    #[test]
    fn install_remote_rejects_duplicate() {
        let alice = Identity::generate("alice", 1);
        let mut keys = StdHashMap::new();
        keys.insert(alice.node_id(), alice.public_key());
        let resolver = Arc::new(StaticResolver(keys));
        let source = LogStore::new(resolver.clone());
        let entry = source
            .append_local(&alice, 1, chat_payload(&alice, "one"), 1000)
            .unwrap();
        let dest = LogStore::new(resolver);
        dest.install_remote(entry.clone()).unwrap();
        assert_eq!(
            dest.install_remote(entry).unwrap_err(),
            LogError::DuplicateEntry
        );
    }

    #[test]
    fn install_remote_rejects_bad_signature() {
        let alice = Identity::generate("alice", 1);
        let mallory = Identity::generate("mallory", 1);
        let mut keys = StdHashMap::new();
        keys.insert(alice.node_id(), alice.public_key());
        let resolver = Arc::new(StaticResolver(keys));
        let mut entry = LogStore::new(resolver.clone())
            .append_local(&alice, 1, chat_payload(&alice, "one"), 1000)
            .unwrap();
        // Forge: swap in a signature from a different key.
        entry.signature = mallory.private_key().sign(&entry.signing_bytes());
        let dest = LogStore::new(resolver);
        assert_eq!(
            dest.install_remote(entry).unwrap_err(),
            LogError::BadSignature
        );
    }

    #[test]
    fn range_is_empty_for_unknown_origin() {
        let alice = Identity::generate("alice", 1);
        let store = LogStore::new(Arc::new(StaticResolver(StdHashMap::new())));
        assert!(store.range(alice.node_id(), 1, 10).is_empty());
    }
}

//! Known-peer tracking: liveness, reliability scoring, and fanout ranking
//! (§4.8, C11).

mod error;

pub use error::PeerError;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tablemesh_crypto::PublicKey;
use tablemesh_identity::NodeId;

/// Default eviction window: a peer silent for longer than this is dropped
/// from the table (§6 `peer_timeout_ms`, default 30 000 ms).
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Default table capacity (§6 `max_peers`, default 1 000).
pub const DEFAULT_MAX_PEERS: usize = 1_000;

/// Everything the mesh knows about one remote node (§3 "Peer record").
#[derive(Clone, Debug)]
pub struct PeerRecord {
    pub node_id: NodeId,
    pub public_key: PublicKey,
    pub address: SocketAddr,
    pub last_seen: Instant,
    /// Latest sequence this peer is known to hold, per log origin —
    /// generalises the single-field `observed_latest_sequence` to the
    /// per-origin shape the gossip gap check in §4.4 actually needs.
    pub observed_sequences: HashMap<NodeId, u64>,
    pub smoothed_latency_ms: f64,
    pub reliability: f64,
    pub trusted: bool,
}

impl PeerRecord {
    fn new(node_id: NodeId, public_key: PublicKey, address: SocketAddr) -> Self {
        Self {
            node_id,
            public_key,
            address,
            last_seen: Instant::now(),
            observed_sequences: HashMap::new(),
            smoothed_latency_ms: 0.0,
            reliability: 0.5,
            trusted: false,
        }
    }

    fn fanout_score(&self) -> f64 {
        self.reliability * (1.0 / (1.0 + self.smoothed_latency_ms.max(0.0)))
    }
}

/// The peer table: one per node, guarded by a reader/writer lock (§5, §4.8).
pub struct PeerTable {
    peers: RwLock<HashMap<NodeId, PeerRecord>>,
    peer_timeout: Duration,
    max_peers: usize,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_PEER_TIMEOUT, DEFAULT_MAX_PEERS)
    }

    pub fn with_limits(peer_timeout: Duration, max_peers: usize) -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
            peer_timeout,
            max_peers,
        }
    }

    /// Inserts a never-before-seen peer, or refreshes `last_seen` for a
    /// known one, on any received message (§4.8 "insert/refresh").
    pub fn insert_or_refresh(
        &self,
        node_id: NodeId,
        public_key: PublicKey,
        address: SocketAddr,
    ) -> Result<(), PeerError> {
        let mut peers = self.peers.write();
        if let Some(existing) = peers.get_mut(&node_id) {
            existing.last_seen = Instant::now();
            existing.address = address;
            return Ok(());
        }
        if peers.len() >= self.max_peers {
            return Err(PeerError::PeerTableFull);
        }
        peers.insert(node_id, PeerRecord::new(node_id, public_key, address));
        Ok(())
    }

    /// EWMA reliability update on message delivery success (§4.8).
    pub fn mark_success(&self, node_id: NodeId) {
        self.adjust_reliability(node_id, true);
    }

    /// EWMA reliability update on message delivery failure (§4.8); also
    /// the hook used when an installing component detects byzantine
    /// behaviour from this peer (open question 1, DESIGN.md).
    pub fn mark_failure(&self, node_id: NodeId) {
        self.adjust_reliability(node_id, false);
    }

    pub fn penalize(&self, node_id: NodeId) {
        self.mark_failure(node_id);
    }

    fn adjust_reliability(&self, node_id: NodeId, success: bool) {
        let mut peers = self.peers.write();
        if let Some(peer) = peers.get_mut(&node_id) {
            peer.reliability = if success {
                0.9 * peer.reliability + 0.1
            } else {
                0.9 * peer.reliability
            };
        }
    }

    /// EWMA latency smoothing, same shape as reliability (§4.8).
    pub fn record_latency(&self, node_id: NodeId, sample_ms: f64) {
        let mut peers = self.peers.write();
        if let Some(peer) = peers.get_mut(&node_id) {
            peer.smoothed_latency_ms = 0.9 * peer.smoothed_latency_ms + 0.1 * sample_ms;
        }
    }

    pub fn update_observed_sequence(&self, node_id: NodeId, origin: NodeId, sequence: u64) {
        let mut peers = self.peers.write();
        if let Some(peer) = peers.get_mut(&node_id) {
            let slot = peer.observed_sequences.entry(origin).or_insert(0);
            if sequence > *slot {
                *slot = sequence;
            }
        }
    }

    pub fn get(&self, node_id: &NodeId) -> Option<PeerRecord> {
        self.peers.read().get(node_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Peers seen within the eviction timeout (§4.4 step 2 "active set").
    pub fn active_peers(&self) -> Vec<PeerRecord> {
        let now = Instant::now();
        self.peers
            .read()
            .values()
            .filter(|p| now.duration_since(p.last_seen) <= self.peer_timeout)
            .cloned()
            .collect()
    }

    /// Drops peers silent longer than the eviction timeout, returning the
    /// evicted node ids (§3 "Lifecycles").
    pub fn evict_stale(&self) -> Vec<NodeId> {
        let now = Instant::now();
        let mut peers = self.peers.write();
        let stale: Vec<NodeId> = peers
            .values()
            .filter(|p| now.duration_since(p.last_seen) > self.peer_timeout)
            .map(|p| p.node_id)
            .collect();
        for node_id in &stale {
            peers.remove(node_id);
        }
        stale
    }

    /// Selects up to `fanout` active peers ranked by `reliability ×
    /// 1/(1+latency)` (§4.4 step 2).
    pub fn select_fanout(&self, fanout: usize) -> Vec<PeerRecord> {
        let mut active = self.active_peers();
        active.sort_by(|a, b| {
            b.fanout_score()
                .partial_cmp(&a.fanout_score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        active.truncate(fanout);
        active
    }
}

impl Default for PeerTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablemesh_crypto::generate_keypair;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    fn sample_node_id() -> (NodeId, PublicKey) {
        let (_, pk) = generate_keypair();
        (NodeId::from_public_key(&pk), pk)
    }

    #[test]
    fn insert_then_refresh_does_not_duplicate() {
        let table = PeerTable::new();
        let (node_id, pk) = sample_node_id();
        table.insert_or_refresh(node_id, pk, addr(9000)).unwrap();
        table.insert_or_refresh(node_id, pk, addr(9001)).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&node_id).unwrap().address, addr(9001));
    }

    #[test]
    fn reliability_rises_on_success_and_falls_on_failure() {
        let table = PeerTable::new();
        let (node_id, pk) = sample_node_id();
        table.insert_or_refresh(node_id, pk, addr(9000)).unwrap();
        let start = table.get(&node_id).unwrap().reliability;
        table.mark_success(node_id);
        assert!(table.get(&node_id).unwrap().reliability > start);
        let after_success = table.get(&node_id).unwrap().reliability;
        table.mark_failure(node_id);
        assert!(table.get(&node_id).unwrap().reliability < after_success);
    }

    #[test]
    fn table_rejects_new_peers_over_capacity() {
        let table = PeerTable::with_limits(DEFAULT_PEER_TIMEOUT, 1);
        let (a, pk_a) = sample_node_id();
        let (b, pk_b) = sample_node_id();
        table.insert_or_refresh(a, pk_a, addr(9000)).unwrap();
        assert_eq!(
            table.insert_or_refresh(b, pk_b, addr(9001)).unwrap_err(),
            PeerError::PeerTableFull
        );
    }

    #[test]
    fn fanout_ranks_by_reliability_and_latency() {
        let table = PeerTable::new();
        let (fast_reliable, pk1) = sample_node_id();
        let (slow_unreliable, pk2) = sample_node_id();
        table
            .insert_or_refresh(fast_reliable, pk1, addr(9000))
            .unwrap();
        table
            .insert_or_refresh(slow_unreliable, pk2, addr(9001))
            .unwrap();
        for _ in 0..10 {
            table.mark_success(fast_reliable);
            table.mark_failure(slow_unreliable);
        }
        table.record_latency(fast_reliable, 5.0);
        table.record_latency(slow_unreliable, 500.0);

        let fanout = table.select_fanout(1);
        assert_eq!(fanout[0].node_id, fast_reliable);
    }

    #[test]
    fn evict_stale_removes_peers_past_timeout() {
        let table = PeerTable::with_limits(Duration::from_millis(0), DEFAULT_MAX_PEERS);
        let (node_id, pk) = sample_node_id();
        table.insert_or_refresh(node_id, pk, addr(9000)).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let evicted = table.evict_stale();
        assert_eq!(evicted, vec![node_id]);
        assert!(table.is_empty());
    }
}

use crate::config::GossipConfig;
use crate::message::{
    AnnounceEntry, AnnouncePayload, BroadcastPayload, GossipMessage, NoisePayload,
    RangeRequestPayload, RangeResponsePayload,
};
use lru::LruCache;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tablemesh_codec::Entry;
use tablemesh_crypto::Hash32;
use tablemesh_identity::NodeId;
use tablemesh_log::LogStore;
use tablemesh_peers::PeerTable;
use tablemesh_transport::Transport;
use tracing::{debug, trace, warn};

/// Runs one node's gossip dissemination: round procedure, duplicate
/// suppression, mixing, noise traffic, and probabilistic forwarding
/// (§4.3). Generic over the transport so the same logic runs against
/// `TokioUdpTransport` in production and `InMemoryTransport` in tests.
pub struct GossipEngine<T: Transport> {
    node_id: NodeId,
    transport: Arc<T>,
    log_store: Arc<LogStore>,
    peers: Arc<PeerTable>,
    config: GossipConfig,
    seen: Mutex<LruCache<Hash32, ()>>,
    mix_pool: Mutex<Vec<(SocketAddr, Vec<u8>)>>,
}

impl<T: Transport> GossipEngine<T> {
    pub fn new(
        node_id: NodeId,
        transport: Arc<T>,
        log_store: Arc<LogStore>,
        peers: Arc<PeerTable>,
        config: GossipConfig,
    ) -> Self {
        let cache_size =
            NonZeroUsize::new(config.seen_message_cache.max(1)).expect("checked non-zero above");
        Self {
            node_id,
            transport,
            log_store,
            peers,
            config,
            seen: Mutex::new(LruCache::new(cache_size)),
            mix_pool: Mutex::new(Vec::new()),
        }
    }

    /// `true` if this is the first time `message_id` has been seen; marks
    /// it seen as a side effect (§4.3 "Duplicate suppression").
    fn mark_seen(&self, message_id: Hash32) -> bool {
        let mut seen = self.seen.lock();
        if seen.contains(&message_id) {
            false
        } else {
            seen.put(message_id, ());
            true
        }
    }

    fn now_ms(&self) -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    async fn send_to(&self, addr: SocketAddr, message: &GossipMessage) {
        if let Err(err) = self.transport.send(addr, message.encode()).await {
            trace!(%addr, ?err, "gossip send failed");
        }
    }

    /// One gossip round (§4.3 "Round procedure" steps 1-3): build the
    /// local announcement and send it to up to `fanout` active peers
    /// ranked by reliability × 1/(1+latency).
    pub async fn run_round(&self) {
        let entries: Vec<AnnounceEntry> = self
            .log_store
            .known_origins()
            .into_iter()
            .map(|origin| AnnounceEntry {
                origin,
                latest_sequence: self.log_store.latest_sequence(origin),
                merkle_root: self.log_store.merkle_root(origin),
            })
            .collect();
        let message = GossipMessage::Announce(AnnouncePayload {
            sender: self.node_id,
            timestamp: self.now_ms(),
            entries,
        });
        let targets = self.peers.select_fanout(self.config.fanout);
        for peer in targets {
            self.send_to(peer.address, &message).await;
        }
    }

    /// Prunes the peer table; the seen-message cache self-evicts by LRU
    /// capacity rather than wall-clock expiry (§5 "maintenance").
    pub fn run_maintenance(&self) {
        let evicted = self.peers.evict_stale();
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "evicted stale peers");
        }
    }

    /// Emits one fixed-rate dummy message to a random active peer to flatten
    /// traffic analysis (§4.3 "Noise traffic"). No-op with no active peers.
    pub async fn emit_noise(&self) {
        let active = self.peers.active_peers();
        let Some(peer) = active.choose(&mut rand::thread_rng()) else {
            return;
        };
        let mut filler = vec![0u8; 32];
        rand::thread_rng().fill(&mut filler[..]);
        let message = GossipMessage::Noise(NoisePayload {
            sender: self.node_id,
            timestamp: self.now_ms(),
            filler,
        });
        self.send_to(peer.address, &message).await;
    }

    /// Announces a freshly appended local entry directly to the fanout set.
    /// Locally originated entries are priority traffic and bypass the mix
    /// pool (§4.3 "Priority messages bypass the pool").
    pub async fn broadcast_local(&self, entry: Entry) {
        let message = GossipMessage::Broadcast(BroadcastPayload {
            sender: self.node_id,
            timestamp: self.now_ms(),
            ttl: self.config.message_ttl,
            entry,
        });
        self.mark_seen(message.message_id());
        for peer in self.peers.select_fanout(self.config.fanout) {
            self.send_to(peer.address, &message).await;
        }
    }

    /// Deposits a non-priority frame into the mix pool instead of sending
    /// it immediately (§4.3 "Mixing"); relayed broadcasts take this path.
    fn deposit_mix(&self, to: SocketAddr, frame: Vec<u8>) {
        self.mix_pool.lock().push((to, frame));
    }

    /// Whenever the pool holds at least `mix_min` entries, dispatches a
    /// random fraction (up to half) in randomised order (§4.3 "Mixing").
    pub async fn flush_mix_pool(&self) {
        let batch = {
            let mut pool = self.mix_pool.lock();
            if pool.len() < self.config.mix_min {
                return;
            }
            let take = rand::thread_rng().gen_range(1..=(pool.len() / 2).max(1));
            let mut batch = Vec::with_capacity(take);
            for _ in 0..take {
                let idx = rand::thread_rng().gen_range(0..pool.len());
                batch.push(pool.remove(idx));
            }
            batch
        };
        let mut batch = batch;
        batch.shuffle(&mut rand::thread_rng());
        for (addr, frame) in batch {
            if let Err(err) = self.transport.send(addr, frame).await {
                trace!(%addr, ?err, "mix pool send failed");
            }
        }
    }

    /// Dispatches one inbound frame (§4.3 round procedure steps 4-5, plus
    /// duplicate suppression and forwarding). Returns once the frame has
    /// been fully handled; callers loop this against `Transport::recv`.
    pub async fn handle_inbound(&self, from: SocketAddr, frame: Vec<u8>) {
        let message = match GossipMessage::decode(&frame) {
            Ok(m) => m,
            Err(err) => {
                warn!(%from, ?err, "dropped malformed gossip frame");
                return;
            }
        };
        if !self.mark_seen(message.message_id()) {
            trace!(%from, "dropped duplicate gossip message");
            return;
        }

        match message {
            GossipMessage::Announce(payload) => self.handle_announce(from, payload).await,
            GossipMessage::RangeRequest(payload) => self.handle_range_request(from, payload).await,
            GossipMessage::RangeResponse(payload) => {
                self.handle_range_response(from, payload).await
            }
            GossipMessage::Broadcast(payload) => self.handle_broadcast(from, payload).await,
            GossipMessage::Noise(_) => {}
        }
    }

    async fn handle_announce(&self, from: SocketAddr, payload: AnnouncePayload) {
        for entry in payload.entries {
            let local_latest = self.log_store.latest_sequence(entry.origin);
            if entry.latest_sequence > local_latest {
                let request = GossipMessage::RangeRequest(RangeRequestPayload {
                    sender: self.node_id,
                    timestamp: self.now_ms(),
                    origin: entry.origin,
                    from: local_latest + 1,
                    to: entry.latest_sequence,
                });
                self.send_to(from, &request).await;
            }
        }
    }

    async fn handle_range_request(&self, from: SocketAddr, payload: RangeRequestPayload) {
        let capped_to = payload
            .to
            .min(payload.from + self.config.response_max as u64 - 1);
        let entries = self.log_store.range(payload.origin, payload.from, capped_to);
        let response = GossipMessage::RangeResponse(RangeResponsePayload {
            sender: self.node_id,
            timestamp: self.now_ms(),
            origin: payload.origin,
            entries,
        });
        self.send_to(from, &response).await;
    }

    async fn handle_range_response(&self, from: SocketAddr, payload: RangeResponsePayload) {
        for entry in payload.entries {
            if let Err(err) = self.log_store.install_remote(entry) {
                warn!(%from, ?err, "rejected entry from range response");
                self.peers.penalize(payload.sender);
            }
        }
    }

    async fn handle_broadcast(&self, from: SocketAddr, payload: BroadcastPayload) {
        match self.log_store.install_remote(payload.entry.clone()) {
            Ok(()) => self.peers.mark_success(payload.sender),
            Err(tablemesh_log::LogError::DuplicateEntry) => return,
            Err(err) => {
                warn!(%from, ?err, "rejected broadcast entry");
                self.peers.penalize(payload.sender);
                return;
            }
        }
        self.maybe_forward(payload).await;
    }

    /// Decrements TTL and forwards with probability `forward_probability`,
    /// dropping at TTL 0 (§4.3 "Probabilistic forwarding"). Relayed
    /// broadcasts are non-priority and go through the mix pool.
    async fn maybe_forward(&self, payload: BroadcastPayload) {
        if payload.ttl == 0 {
            return;
        }
        let forwarded = GossipMessage::Broadcast(BroadcastPayload {
            sender: self.node_id,
            timestamp: self.now_ms(),
            ttl: payload.ttl - 1,
            entry: payload.entry,
        });
        let roll: f64 = rand::thread_rng().gen();
        if roll >= self.config.forward_probability {
            return;
        }
        for peer in self.peers.select_fanout(self.config.fanout) {
            self.deposit_mix(peer.address, forwarded.encode());
        }
        self.flush_mix_pool().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tablemesh_codec::{ChatMessagePayload, Payload};
    use tablemesh_crypto::generate_keypair;
    use tablemesh_identity::Identity;
    use tablemesh_transport::InMemoryTransport;

    struct AllowAll(HashMap<NodeId, tablemesh_crypto::PublicKey>);
    impl tablemesh_log::PublicKeyResolver for AllowAll {
        fn resolve(&self, node_id: &NodeId) -> Option<tablemesh_crypto::PublicKey> {
            self.0.get(node_id).copied()
        }
    }

    fn make_node(
        identity: &Identity,
        addr: SocketAddr,
        network: &Arc<
            Mutex<
                HashMap<
                    SocketAddr,
                    (
                        Arc<Mutex<std::collections::VecDeque<(SocketAddr, Vec<u8>)>>>,
                        Arc<tokio::sync::Notify>,
                    ),
                >,
            >,
        >,
        keys: HashMap<NodeId, tablemesh_crypto::PublicKey>,
    ) -> (Arc<GossipEngine<InMemoryTransport>>, Arc<LogStore>, Arc<PeerTable>) {
        let transport = Arc::new(InMemoryTransport::new(addr, network.clone()));
        let log_store = Arc::new(LogStore::new(Arc::new(AllowAll(keys))));
        let peers = Arc::new(PeerTable::new());
        let engine = Arc::new(GossipEngine::new(
            identity.node_id(),
            transport,
            log_store.clone(),
            peers.clone(),
            GossipConfig::default(),
        ));
        (engine, log_store, peers)
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

    #[tokio::test]
    async fn announce_with_gap_triggers_range_request() {
        let network = InMemoryTransport::new_network();
        let alice = Identity::generate("alice", 1);
        let bob = Identity::generate("bob", 1);
        let alice_addr: SocketAddr = "127.0.0.1:10".parse().unwrap();
        let bob_addr: SocketAddr = "127.0.0.1:11".parse().unwrap();

        let mut keys = HashMap::new();
        keys.insert(alice.node_id(), alice.public_key());
        let (alice_engine, alice_log, alice_peers) =
            make_node(&alice, alice_addr, &network, keys.clone());
        let (bob_engine, bob_log, _bob_peers) = make_node(&bob, bob_addr, &network, keys);

        alice_log
            .append_local(&alice, 1, chat_payload(&alice, "hi"), 1000)
            .unwrap();
        alice_peers
            .insert_or_refresh(bob.node_id(), bob.public_key(), bob_addr)
            .unwrap();

        alice_engine.run_round().await;
        let (from, frame) = bob_engine
            .transport
            .recv()
            .await
            .expect("bob receives alice's announce");
        bob_engine.handle_inbound(from, frame).await;

        let (from2, frame2) = alice_engine
            .transport
            .recv()
            .await
            .expect("alice receives bob's range request");
        alice_engine.handle_inbound(from2, frame2).await;

        let (from3, frame3) = bob_engine
            .transport
            .recv()
            .await
            .expect("bob receives alice's range response");
        bob_engine.handle_inbound(from3, frame3).await;

        assert_eq!(bob_log.latest_sequence(alice.node_id()), 1);
    }

    #[tokio::test]
    async fn duplicate_message_is_not_handled_twice() {
        let network = InMemoryTransport::new_network();
        let alice = Identity::generate("alice", 1);
        let addr: SocketAddr = "127.0.0.1:20".parse().unwrap();
        let mut keys = HashMap::new();
        keys.insert(alice.node_id(), alice.public_key());
        let (engine, log_store, _peers) = make_node(&alice, addr, &network, keys);

        let entry = log_store
            .append_local(&alice, 1, chat_payload(&alice, "hi"), 1000)
            .unwrap();
        let message = GossipMessage::Broadcast(BroadcastPayload {
            sender: alice.node_id(),
            timestamp: 1,
            ttl: 3,
            entry,
        });
        assert!(engine.mark_seen(message.message_id()));
        assert!(!engine.mark_seen(message.message_id()));
    }

    #[tokio::test]
    async fn forwarding_stops_at_ttl_zero() {
        let network = InMemoryTransport::new_network();
        let alice = Identity::generate("alice", 1);
        let bob = Identity::generate("bob", 1);
        let addr: SocketAddr = "127.0.0.1:30".parse().unwrap();
        let bob_addr: SocketAddr = "127.0.0.1:31".parse().unwrap();
        let mut keys = HashMap::new();
        keys.insert(alice.node_id(), alice.public_key());
        let (engine, log_store, peers) = make_node(&alice, addr, &network, keys);
        peers
            .insert_or_refresh(bob.node_id(), bob.public_key(), bob_addr)
            .unwrap();
        let _bob_transport = InMemoryTransport::new(bob_addr, network.clone());

        let (_, pk) = generate_keypair();
        let other_origin = NodeId::from_public_key(&pk);
        let entry = Entry {
            sequence: 1,
            timestamp: 1,
            origin_node_id: other_origin,
            table_id: 1,
            payload: chat_payload(&alice, "relayed"),
            signature: tablemesh_crypto::Signature::from_bytes([0u8; 64]),
        };
        let payload = BroadcastPayload {
            sender: bob.node_id(),
            timestamp: 1,
            ttl: 0,
            entry,
        };
        // TTL already 0: must not forward regardless of install outcome.
        engine.maybe_forward(payload).await;
        assert!(engine.mix_pool.lock().is_empty());
        let _ = log_store;
    }
}

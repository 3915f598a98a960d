use std::collections::HashMap;
use tablemesh_codec::Entry;
use tablemesh_identity::NodeId;

/// Default per-round timeout before the leader abandons and may re-propose
/// with an incremented round number (§4.4 step 4).
pub const DEFAULT_ROUND_TIMEOUT_MS: u64 = 2_000;

/// Leader-owned state for one in-flight proposal (§4.4, §5 "owned by a
/// single task at a time; proposals ... serialise on the leader's queue").
pub struct ConsensusRound {
    pub round_number: u64,
    pub entry: Entry,
    votes: HashMap<NodeId, bool>,
    num_active_peers: usize,
}

impl ConsensusRound {
    pub fn new(round_number: u64, entry: Entry, num_active_peers: usize) -> Self {
        Self {
            round_number,
            entry,
            votes: HashMap::new(),
            num_active_peers,
        }
    }

    /// Records one peer's vote; later votes from the same peer overwrite
    /// the earlier one rather than double-counting.
    pub fn record_vote(&mut self, voter: NodeId, accept: bool) {
        self.votes.insert(voter, accept);
    }

    pub fn accept_count(&self) -> usize {
        self.votes.values().filter(|v| **v).count()
    }

    /// Quorum threshold: strictly more than `⌊num_active_peers / 2⌋`
    /// accept votes (§4.4 step 3, §8 boundary behaviour).
    pub fn has_quorum(&self) -> bool {
        self.accept_count() > self.num_active_peers / 2
    }
}

use tablemesh_identity::NodeId;

/// One layer of the pot: a chip amount and the seats eligible to win it
/// (§4.6 "Side pots").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidePot {
    pub amount: u64,
    pub eligible: Vec<NodeId>,
}

/// Partitions total hand contributions into main/side pots (§4.6): sort
/// distinct committed amounts ascending, and for each boundary form a
/// layer from every seat that committed at least that much, excluding
/// folded seats from eligibility (their chips still count toward the
/// layer's size, they just can't win it).
///
/// `contributions` is `(player_id, committed_this_hand, folded)`. Players
/// with zero commitment are ignored; who actually holds the best hand at
/// each layer is a strength-evaluation question out of scope here (§1) —
/// this only computes the layer sizes and eligible sets.
pub fn compute_side_pots(contributions: &[(NodeId, u64, bool)]) -> Vec<SidePot> {
    let mut levels: Vec<u64> = contributions
        .iter()
        .map(|(_, amount, _)| *amount)
        .filter(|amount| *amount > 0)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut pots = Vec::new();
    let mut prev = 0u64;
    for level in levels {
        let width = level - prev;
        let contributors: Vec<&(NodeId, u64, bool)> = contributions
            .iter()
            .filter(|(_, amount, _)| *amount >= level)
            .collect();
        let amount = width * contributors.len() as u64;
        let eligible: Vec<NodeId> = contributors
            .iter()
            .filter(|(_, _, folded)| !folded)
            .map(|(id, _, _)| *id)
            .collect();
        if amount > 0 && !eligible.is_empty() {
            pots.push(SidePot { amount, eligible });
        }
        prev = level;
    }
    pots
}

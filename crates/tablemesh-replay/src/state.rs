use std::collections::BTreeMap;
use tablemesh_codec::{Card, Round};
use tablemesh_identity::NodeId;

/// A seated player's view at a point in replay (§3 "Table state (derived)").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatState {
    pub player_id: NodeId,
    pub display_name: String,
    pub chips: u64,
    pub current_bet: u64,
    /// Total wagered into the pot this hand, across all betting rounds.
    /// Used by the side-pot layering algorithm (§4.6), which needs each
    /// all-in seat's cumulative commitment rather than just the live
    /// street's `current_bet`.
    pub committed_this_hand: u64,
    pub status: SeatStatus,
    pub hole_commitment: Option<tablemesh_crypto::Hash32>,
    pub revealed_cards: Option<Vec<Card>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeatStatus {
    Active,
    Folded,
    AllIn,
    SittingOut,
}

/// Derived game state for one table (§3). Produced purely from a log
/// prefix by [`crate::apply`]/[`crate::replay_prefix`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TableState {
    pub table_id: u64,
    pub hand_number: u64,
    pub button_seat: u8,
    pub pot: u64,
    pub current_bet: u64,
    pub min_raise: u64,
    pub round: Option<Round>,
    pub seats: BTreeMap<u8, SeatState>,
    pub board: Vec<Card>,
    /// Action numbers already applied this hand, in the order seen;
    /// guards idempotent re-application of the same `PLAYER_ACTION` (§4.6
    /// "replay is idempotent for repeated application of the same entry
    /// sequence").
    pub(crate) applied_actions: BTreeMap<u64, u64>,
    /// Seats that have acted since the last raise, for round-advancement
    /// detection (§4.6 "at least one complete action cycle ... since the
    /// last raise").
    pub(crate) acted_since_last_raise: std::collections::BTreeSet<u8>,
    pub completed_hands: Vec<CompletedHand>,
}

/// A hand that reached `HAND_RESULT`. Recording it here, rather than
/// leaving callers to scan `TableState` transitions for a round flip to
/// `Showdown`, gives `tablemesh-node` a cheap way to notice "a hand just
/// completed" after folding a log prefix — it does not itself carry enough
/// (no antes, blinds, starting stacks, or action list) to build the archive's
/// `HandRecord`; that conversion re-walks the raw entries directly (C9, see
/// `tablemesh-archive::hand_record_from_entries`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedHand {
    pub hand_number: u64,
    pub winners: Vec<tablemesh_codec::Winner>,
    pub rake: u64,
    pub board: Vec<Card>,
}

impl TableState {
    pub fn new(table_id: u64) -> Self {
        Self {
            table_id,
            ..Default::default()
        }
    }

    pub fn seat_by_player(&self, player_id: NodeId) -> Option<(u8, &SeatState)> {
        self.seats
            .iter()
            .find(|(_, seat)| seat.player_id == player_id)
            .map(|(seat, state)| (*seat, state))
    }

    /// Seats still contesting the pot (not folded, not sitting out).
    pub fn contesting_seats(&self) -> Vec<u8> {
        self.seats
            .iter()
            .filter(|(_, s)| matches!(s.status, SeatStatus::Active | SeatStatus::AllIn))
            .map(|(seat, _)| *seat)
            .collect()
    }
}

use thiserror::Error;

/// Failure modes for the state-replay fold (§4.6, §7). A `ReplayError`
/// never tears down the caller: `replay_prefix` logs a warning and skips
/// the offending entry, since "partial replay is safe" (§4.6).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("seat {0} is already occupied")]
    SeatOccupied(u8),
    #[error("seat {0} has no occupant")]
    SeatEmpty(u8),
    #[error("player {0:?} is not seated at this table")]
    PlayerNotSeated(tablemesh_identity::NodeId),
    #[error("action references hand {action_hand}, but the table's active hand is {active_hand:?}")]
    WrongHand {
        action_hand: u64,
        active_hand: Option<u64>,
    },
    #[error("check requires current_bet == player's current_bet")]
    IllegalCheck,
    #[error("bet/raise amount {0} does not exceed the current bet")]
    NonRaisingBet(u64),
    #[error("player has no chips left to act with")]
    NoChipsRemaining,
    #[error("hand cannot start: fewer than two seated players")]
    NotEnoughPlayers,
    #[error("entry kind {0:?} is not recognised by this build and was skipped")]
    UnknownKind(tablemesh_codec::EntryKind),
}

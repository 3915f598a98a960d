use thiserror::Error;

/// Failure modes for the peer table (§4.8, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeerError {
    #[error("peer table is at capacity")]
    PeerTableFull,
    #[error("no peer record exists for this node id")]
    UnknownPeer,
}

use thiserror::Error;

/// Failure modes for the consensus round (§4.4, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("malformed consensus message")]
    MalformedMessage,
    #[error("vote cast for a round this node is not tracking")]
    UnknownRound,
    #[error("entry signature did not validate during proposal review")]
    InvalidProposal,
    #[error("round timed out before reaching quorum")]
    TimedOut,
}

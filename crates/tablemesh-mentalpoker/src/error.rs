use thiserror::Error;

/// Failure modes for the mental-poker card protocol (§4.5, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MentalPokerError {
    #[error("revealed cards do not hash to the prior commitment")]
    CommitmentMismatch,
    #[error("encrypted hole-card blob failed to authenticate")]
    BadAuthenticator,
    #[error("decrypted hole-card blob is not a valid card sequence")]
    MalformedCards,
}

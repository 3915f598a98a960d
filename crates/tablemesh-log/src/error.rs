use thiserror::Error;

/// Failure modes for the log store (§4.1, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogError {
    #[error("payload exceeds the 4 KiB bound")]
    PayloadTooLarge,
    #[error("log store is at capacity for this origin")]
    StoreFull,
    #[error("local signing failed")]
    SigningFailure,
    #[error("entry signature did not verify against the claimed origin")]
    BadSignature,
    #[error("sequence is not stored_max_for_origin + 1")]
    OutOfOrderSequence,
    #[error("an entry already occupies this (origin, sequence) pair")]
    DuplicateEntry,
    #[error("no public key is known for the claimed origin")]
    UnknownOrigin,
}

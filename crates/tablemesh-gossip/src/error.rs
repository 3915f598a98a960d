use thiserror::Error;

/// Failure modes for the gossip engine (§4.3, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GossipError {
    #[error("malformed gossip message")]
    MalformedMessage,
    #[error("message tag is not recognised by this build")]
    UnknownMessageTag(u8),
}

use thiserror::Error;

/// Failure modes for the transport adapter (§4.9, §7).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("destination has no registered channel")]
    UnknownDestination,
    #[error("frame exceeds the maximum datagram size")]
    FrameTooLarge,
}

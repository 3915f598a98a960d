use thiserror::Error;

/// Failure modes for the hand-archive reader/writer (§4.7, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("required key `{0}` is missing from the hand record")]
    MissingKey(&'static str),
    #[error("key `{key}` has a malformed value: {value}")]
    MalformedValue { key: &'static str, value: String },
    #[error("action string `{0}` does not match the action grammar")]
    MalformedAction(String),
    #[error("card sequence `{0}` is not valid")]
    MalformedCards(String),
    #[error("no HAND_START entry found for hand {0}")]
    MissingHandStart(u64),
    #[error("no HAND_RESULT entry found for hand {0}")]
    MissingHandResult(u64),
}

//! Byzantine-majority consensus for entries two peers could legitimately
//! produce simultaneously (§4.4, C6): propose, quorum vote, commit.

mod engine;
mod error;
mod message;
mod round;

pub use engine::ConsensusEngine;
pub use error::ConsensusError;
pub use message::{CommitPayload, ConsensusMessage, ProposePayload, VotePayload};
pub use round::{ConsensusRound, DEFAULT_ROUND_TIMEOUT_MS};

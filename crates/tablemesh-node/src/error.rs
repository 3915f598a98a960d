use thiserror::Error;

/// Aggregates every component error behind one type, used only at
/// task-boundary `Result` returns (§7); `main.rs` reaches for
/// `anyhow::Context` instead for human-readable startup failures.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Log(#[from] tablemesh_log::LogError),
    #[error(transparent)]
    Peer(#[from] tablemesh_peers::PeerError),
    #[error(transparent)]
    Transport(#[from] tablemesh_transport::TransportError),
    #[error(transparent)]
    Gossip(#[from] tablemesh_gossip::GossipError),
    #[error(transparent)]
    Consensus(#[from] tablemesh_consensus::ConsensusError),
    #[error(transparent)]
    Replay(#[from] tablemesh_replay::ReplayError),
    #[error(transparent)]
    Archive(#[from] tablemesh_archive::ArchiveError),
    #[error("failed to write hand archive: {0}")]
    ArchiveIo(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

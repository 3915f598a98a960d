//! Node orchestration: wires identity, log store, peer table, gossip and
//! consensus engines, and a transport adapter into the runtime described in
//! §5.

pub mod archive;
pub mod channel_transport;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod node;

pub use archive::install_archive_observer;
pub use channel_transport::ChannelTransport;
pub use cli::Cli;
pub use config::{Config, KnownPeer};
pub use error::NodeError;
pub use metrics::Metrics;
pub use node::Node;

use std::sync::Arc;
use tablemesh_peers::PeerTable;

/// Resolves an origin's public key from the peer table (`LogStore`'s
/// `PublicKeyResolver`, §4.1).
pub struct PeerTableResolver(pub Arc<PeerTable>);

impl tablemesh_log::PublicKeyResolver for PeerTableResolver {
    fn resolve(&self, node_id: &tablemesh_identity::NodeId) -> Option<tablemesh_crypto::PublicKey> {
        self.0.get(node_id).map(|peer| peer.public_key)
    }
}

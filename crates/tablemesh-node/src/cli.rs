use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runs one tablemesh node: identity, log store, peer table, gossip and
/// consensus engines bound to a UDP transport (§6).
#[derive(Parser, Debug)]
#[command(name = "tablemesh-node", version, about)]
pub struct Cli {
    /// Optional YAML configuration file; unset fields use the §6 defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overrides `bind_addr`.
    #[arg(long)]
    pub bind_addr: Option<SocketAddr>,

    /// Overrides `gossip_interval_ms`.
    #[arg(long)]
    pub gossip_interval_ms: Option<u64>,

    /// Overrides `gossip_fanout`.
    #[arg(long)]
    pub fanout: Option<usize>,

    /// Overrides `peer_timeout_ms`.
    #[arg(long)]
    pub peer_timeout_ms: Option<u64>,
}

impl Cli {
    /// Applies the CLI's per-field overrides onto a loaded `Config` (§6
    /// "per-field overrides for the most commonly tuned knobs").
    pub fn apply_overrides(&self, mut config: crate::config::Config) -> crate::config::Config {
        if let Some(bind_addr) = self.bind_addr {
            config.bind_addr = bind_addr;
        }
        if let Some(gossip_interval_ms) = self.gossip_interval_ms {
            config.gossip_interval_ms = gossip_interval_ms;
        }
        if let Some(fanout) = self.fanout {
            config.gossip_fanout = fanout;
        }
        if let Some(peer_timeout_ms) = self.peer_timeout_ms {
            config.peer_timeout_ms = peer_timeout_ms;
        }
        config
    }
}

//! Node configuration (§6): a single struct with `#[serde(default)]` fields
//! matching the §6 defaults exactly, loadable from a YAML file and
//! overridable from the CLI (`cli.rs`).

use NodeError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tablemesh_gossip::GossipConfig;

fn default_bind_addr() -> SocketAddr {
    "127.0.0.1:9000".parse().expect("valid default bind address")
}

fn default_display_name() -> String {
    "tablemesh-node".to_string()
}

fn default_gossip_interval_ms() -> u64 {
    100
}

fn default_maintenance_interval_ms() -> u64 {
    10_000
}

fn default_fanout() -> usize {
    8
}

fn default_message_ttl() -> u8 {
    7
}

fn default_forward_probability() -> f64 {
    1.0
}

fn default_peer_timeout_ms() -> u64 {
    30_000
}

fn default_message_expiry_ms() -> u64 {
    300_000
}

fn default_noise_interval_ms() -> u64 {
    5_000
}

fn default_mix_min() -> usize {
    10
}

fn default_max_peers() -> usize {
    1_000
}

fn default_log_initial_capacity() -> usize {
    1_000
}

fn default_seen_message_cache() -> usize {
    10_000
}

fn default_response_max() -> usize {
    256
}

fn default_inbound_queue_capacity() -> usize {
    1_024
}

fn default_consensus_round_timeout_ms() -> u64 {
    tablemesh_consensus::DEFAULT_ROUND_TIMEOUT_MS
}

fn default_archive_path() -> String {
    "tablemesh-archive.phh".to_string()
}

/// A statically known peer: its identity material and last-known address,
/// read out of band (the handshake that would otherwise establish these is
/// out of scope, §4.9). Mirrors the teacher's own static `Peers` directory
/// keyed by hex-encoded public key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KnownPeer {
    pub node_id: String,
    pub public_key: String,
    pub address: SocketAddr,
}

/// Node configuration (§6 "configuration surface"). Every field carries the
/// §6 default so an empty YAML file, or no `--config` flag at all, is a
/// valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub display_name: String,
    /// Hex-encoded Ed25519 private key; generated fresh at startup when
    /// absent (mirrors the teacher's `Config::parse_signer`, minus the
    /// requirement that a signer always come from disk).
    pub private_key: Option<String>,
    pub bootstrap_peers: Vec<KnownPeer>,
    pub gossip_interval_ms: u64,
    pub maintenance_interval_ms: u64,
    pub gossip_fanout: usize,
    pub message_ttl: u8,
    pub forward_probability: f64,
    pub peer_timeout_ms: u64,
    pub message_expiry_ms: u64,
    pub noise_interval_ms: u64,
    pub mix_min: usize,
    pub max_peers: usize,
    pub log_initial_capacity: usize,
    pub seen_message_cache: usize,
    pub response_max: usize,
    /// Capacity of the bounded receiver-to-gossip channel (§5); overflow
    /// is dropped and counted rather than applying backpressure to the
    /// receive loop.
    pub inbound_queue_capacity: usize,
    pub consensus_round_timeout_ms: u64,
    /// Where completed hands are appended in the §4.7 text format (C8→C9).
    pub archive_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            display_name: default_display_name(),
            private_key: None,
            bootstrap_peers: Vec::new(),
            gossip_interval_ms: default_gossip_interval_ms(),
            maintenance_interval_ms: default_maintenance_interval_ms(),
            gossip_fanout: default_fanout(),
            message_ttl: default_message_ttl(),
            forward_probability: default_forward_probability(),
            peer_timeout_ms: default_peer_timeout_ms(),
            message_expiry_ms: default_message_expiry_ms(),
            noise_interval_ms: default_noise_interval_ms(),
            mix_min: default_mix_min(),
            max_peers: default_max_peers(),
            log_initial_capacity: default_log_initial_capacity(),
            seen_message_cache: default_seen_message_cache(),
            response_max: default_response_max(),
            inbound_queue_capacity: default_inbound_queue_capacity(),
            consensus_round_timeout_ms: default_consensus_round_timeout_ms(),
            archive_path: default_archive_path(),
        }
    }
}

impl Config {
    /// Parses a YAML configuration file; unset fields fall back to the
    /// §6 defaults via `#[serde(default)]`.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }

    pub fn max_peers(&self) -> usize {
        self.max_peers
    }

    pub fn consensus_round_timeout(&self) -> Duration {
        Duration::from_millis(self.consensus_round_timeout_ms)
    }

    /// Decodes `bootstrap_peers` into the triples `insert_or_refresh`
    /// expects, surfacing any malformed hex as a `NodeError::Config`.
    pub fn decode_bootstrap_peers(
        &self,
    ) -> Result<
        Vec<(
            tablemesh_identity::NodeId,
            tablemesh_crypto::PublicKey,
            SocketAddr,
        )>,
        NodeError,
    > {
        self.bootstrap_peers
            .iter()
            .map(|peer| {
                let node_id_bytes: [u8; 32] = hex::decode(&peer.node_id)
                    .map_err(|e| NodeError::Config(e.to_string()))?
                    .try_into()
                    .map_err(|_| {
                        NodeError::Config(format!(
                            "node_id `{}` is not 32 bytes",
                            peer.node_id
                        ))
                    })?;
                let public_key_bytes: [u8; 32] = hex::decode(&peer.public_key)
                    .map_err(|e| NodeError::Config(e.to_string()))?
                    .try_into()
                    .map_err(|_| {
                        NodeError::Config(format!(
                            "public_key `{}` is not 32 bytes",
                            peer.public_key
                        ))
                    })?;
                let public_key = tablemesh_crypto::PublicKey::from_bytes(public_key_bytes)
                    .map_err(|_| {
                        NodeError::Config(format!(
                            "public_key `{}` is not a valid key",
                            peer.public_key
                        ))
                    })?;
                let node_id = tablemesh_identity::NodeId::from_hash_bytes(node_id_bytes);
                Ok((node_id, public_key, peer.address))
            })
            .collect()
    }

    /// Builds the node's identity: from `private_key` when configured, or
    /// a freshly generated keypair otherwise (not persisted across
    /// restarts in the latter case).
    pub fn build_identity(&self, now_ms: u64) -> Result<tablemesh_identity::Identity, NodeError> {
        match &self.private_key {
            Some(hex_key) => {
                let bytes: [u8; 32] = hex::decode(hex_key)
                    .map_err(|e| NodeError::Config(e.to_string()))?
                    .try_into()
                    .map_err(|_| NodeError::Config("private_key is not 32 bytes".into()))?;
                let private_key = tablemesh_crypto::PrivateKey::from_bytes(bytes);
                Ok(tablemesh_identity::Identity::from_private_key(
                    private_key,
                    self.display_name.clone(),
                    now_ms,
                ))
            }
            None => Ok(tablemesh_identity::Identity::generate(
                self.display_name.clone(),
                now_ms,
            )),
        }
    }

    pub fn gossip_config(&self) -> GossipConfig {
        GossipConfig {
            gossip_interval: Duration::from_millis(self.gossip_interval_ms),
            maintenance_interval: Duration::from_millis(self.maintenance_interval_ms),
            fanout: self.gossip_fanout,
            message_ttl: self.message_ttl,
            forward_probability: self.forward_probability,
            message_expiry: Duration::from_millis(self.message_expiry_ms),
            noise_interval: if self.noise_interval_ms == 0 {
                None
            } else {
                Some(Duration::from_millis(self.noise_interval_ms))
            },
            mix_min: self.mix_min,
            seen_message_cache: self.seen_message_cache,
            response_max: self.response_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_section_6() {
        let config = Config::default();
        assert_eq!(config.gossip_interval_ms, 100);
        assert_eq!(config.gossip_fanout, 8);
        assert_eq!(config.message_ttl, 7);
        assert_eq!(config.forward_probability, 1.0);
        assert_eq!(config.peer_timeout_ms, 30_000);
        assert_eq!(config.message_expiry_ms, 300_000);
        assert_eq!(config.noise_interval_ms, 5_000);
        assert_eq!(config.mix_min, 10);
        assert_eq!(config.max_peers, 1_000);
        assert_eq!(config.log_initial_capacity, 1_000);
        assert_eq!(config.seen_message_cache, 10_000);
    }

    #[test]
    fn empty_yaml_document_uses_all_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.gossip_fanout, Config::default().gossip_fanout);
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let config = Config::from_yaml("gossip_fanout: 16\npeer_timeout_ms: 1000\n").unwrap();
        assert_eq!(config.gossip_fanout, 16);
        assert_eq!(config.peer_timeout_ms, 1000);
        assert_eq!(config.message_ttl, Config::default().message_ttl);
    }
}

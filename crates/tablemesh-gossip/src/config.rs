use std::time::Duration;

/// Tunable knobs for the gossip engine (§6 defaults).
#[derive(Clone, Debug)]
pub struct GossipConfig {
    pub gossip_interval: Duration,
    pub maintenance_interval: Duration,
    pub fanout: usize,
    pub message_ttl: u8,
    pub forward_probability: f64,
    pub message_expiry: Duration,
    pub noise_interval: Option<Duration>,
    pub mix_min: usize,
    pub seen_message_cache: usize,
    /// Cap on entries streamed per range response (§4.3 step 5); not given
    /// a default value in spec.md, chosen here to bound a single UDP burst.
    pub response_max: usize,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            gossip_interval: Duration::from_millis(100),
            maintenance_interval: Duration::from_secs(10),
            fanout: 8,
            message_ttl: 7,
            forward_probability: 1.0,
            message_expiry: Duration::from_millis(300_000),
            noise_interval: Some(Duration::from_millis(5_000)),
            mix_min: 10,
            seen_message_cache: 10_000,
            response_max: 256,
        }
    }
}

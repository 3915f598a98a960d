//! Node-level metrics (§5 "ADDED"). Kept intentionally thin: a
//! `prometheus_client`-style registry and counter, matching the teacher's
//! ambient `prometheus-client` dependency, but with no `/metrics` HTTP
//! endpoint exposed (out of scope).

use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

pub struct Metrics {
    pub registry: Registry,
    /// Incremented whenever the bounded receiver-to-gossip channel is full
    /// and an inbound gossip frame is dropped rather than applying
    /// backpressure to the receive loop (§5).
    pub inbound_queue_overflow: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let inbound_queue_overflow = Counter::default();
        registry.register(
            "inbound_queue_overflow",
            "Inbound gossip frames dropped because the receiver-to-gossip channel was full",
            inbound_queue_overflow.clone(),
        );
        Self {
            registry,
            inbound_queue_overflow,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

//! Node orchestration (§5 "ADDED"): wires identity, log store, peer table,
//! gossip engine, consensus engine and transport into the three
//! cooperative tasks the concurrency model names — gossip round loop,
//! maintenance loop, and a central demuxing receiver loop.

use crate::channel_transport::{demux, ChannelTransport, CONSENSUS_CHANNEL, GOSSIP_CHANNEL};
use crate::config::Config;
use crate::error::NodeError;
use crate::metrics::Metrics;
use std::sync::Arc;
use tablemesh_consensus::{ConsensusEngine, ConsensusMessage};
use tablemesh_gossip::GossipEngine;
use tablemesh_identity::Identity;
use tablemesh_log::LogStore;
use tablemesh_peers::PeerTable;
use tablemesh_transport::Transport;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A running node: the three §5 tasks plus a shared cancellation token used
/// to stop them.
pub struct Node<T: Transport + Send + Sync + 'static> {
    identity: Identity,
    transport: Arc<T>,
    log_store: Arc<LogStore>,
    peers: Arc<PeerTable>,
    gossip: Arc<GossipEngine<ChannelTransport<T>>>,
    consensus: Arc<ConsensusEngine<ChannelTransport<T>>>,
    metrics: Arc<Metrics>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl<T: Transport + Send + Sync + 'static> Node<T> {
    pub fn new(
        identity: Identity,
        config: &Config,
        transport: Arc<T>,
        log_store: Arc<LogStore>,
        peers: Arc<PeerTable>,
        resolver: Arc<dyn tablemesh_log::PublicKeyResolver>,
    ) -> Self {
        let gossip_transport = Arc::new(ChannelTransport::new(transport.clone(), GOSSIP_CHANNEL));
        let consensus_transport =
            Arc::new(ChannelTransport::new(transport.clone(), CONSENSUS_CHANNEL));
        let gossip = Arc::new(GossipEngine::new(
            identity.node_id(),
            gossip_transport,
            log_store.clone(),
            peers.clone(),
            config.gossip_config(),
        ));
        let consensus = Arc::new(ConsensusEngine::with_timeout(
            identity.node_id(),
            consensus_transport,
            log_store.clone(),
            peers.clone(),
            resolver,
            config.consensus_round_timeout(),
        ));
        Self {
            identity,
            transport,
            log_store,
            peers,
            gossip,
            consensus,
            metrics: Arc::new(Metrics::new()),
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn log_store(&self) -> &Arc<LogStore> {
        &self.log_store
    }

    pub fn peers(&self) -> &Arc<PeerTable> {
        &self.peers
    }

    pub fn consensus(&self) -> &Arc<ConsensusEngine<ChannelTransport<T>>> {
        &self.consensus
    }

    pub fn gossip(&self) -> &Arc<GossipEngine<ChannelTransport<T>>> {
        &self.gossip
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Spawns the gossip round loop, the maintenance loop, and the central
    /// receiver loop (§5), each holding a clone of `self.cancel`.
    pub fn run(&mut self, config: &Config) {
        let (inbound_tx, inbound_rx) =
            mpsc::channel::<(std::net::SocketAddr, Vec<u8>)>(config.inbound_queue_capacity);

        self.tasks.push(tokio::spawn(gossip_task(
            self.gossip.clone(),
            inbound_rx,
            config.gossip_config().gossip_interval,
            self.cancel.clone(),
        )));
        self.tasks.push(tokio::spawn(maintenance_task(
            self.gossip.clone(),
            config.gossip_config().maintenance_interval,
            config.gossip_config().noise_interval,
            self.cancel.clone(),
        )));
        self.tasks.push(tokio::spawn(receiver_task(
            self.transport.clone(),
            self.consensus.clone(),
            inbound_tx,
            self.metrics.clone(),
            self.cancel.clone(),
        )));
        info!(
            node_id = %self.identity.node_id(),
            tasks = self.tasks.len(),
            "node started"
        );
    }

    /// Cancels the shared token and waits for every spawned task to exit.
    pub async fn shutdown(mut self) -> Result<(), NodeError> {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                warn!(?err, "node task panicked during shutdown");
            }
        }
        Ok(())
    }
}

async fn gossip_task<T: Transport + Send + Sync + 'static>(
    gossip: Arc<GossipEngine<ChannelTransport<T>>>,
    mut inbound_rx: mpsc::Receiver<(std::net::SocketAddr, Vec<u8>)>,
    interval: std::time::Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("gossip task cancelled");
                return;
            }
            _ = ticker.tick() => {
                gossip.run_round().await;
                gossip.flush_mix_pool().await;
            }
            Some((from, frame)) = inbound_rx.recv() => {
                gossip.handle_inbound(from, frame).await;
            }
        }
    }
}

async fn maintenance_task<T: Transport + Send + Sync + 'static>(
    gossip: Arc<GossipEngine<ChannelTransport<T>>>,
    maintenance_interval: std::time::Duration,
    noise_interval: Option<std::time::Duration>,
    cancel: CancellationToken,
) {
    let mut maintenance_ticker = tokio::time::interval(maintenance_interval);
    let mut noise_ticker = noise_interval.map(tokio::time::interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("maintenance task cancelled");
                return;
            }
            _ = maintenance_ticker.tick() => {
                gossip.run_maintenance();
            }
            _ = async {
                match noise_ticker.as_mut() {
                    Some(ticker) => { ticker.tick().await; }
                    None => std::future::pending::<()>().await,
                }
            } => {
                gossip.emit_noise().await;
            }
        }
    }
}

async fn receiver_task<T: Transport + Send + Sync + 'static>(
    transport: Arc<T>,
    consensus: Arc<ConsensusEngine<ChannelTransport<T>>>,
    inbound_tx: mpsc::Sender<(std::net::SocketAddr, Vec<u8>)>,
    metrics: Arc<Metrics>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("receiver task cancelled");
                return;
            }
            received = transport.recv() => {
                let (from, frame) = match received {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(?err, "transport receive failed");
                        continue;
                    }
                };
                let Some((channel, payload)) = demux(&frame) else {
                    warn!(%from, "dropped empty frame");
                    continue;
                };
                match channel {
                    GOSSIP_CHANNEL => {
                        if inbound_tx.try_send((from, payload.to_vec())).is_err() {
                            metrics.inbound_queue_overflow.inc();
                            warn!(%from, "inbound gossip queue full, dropping frame");
                        }
                    }
                    CONSENSUS_CHANNEL => match ConsensusMessage::decode(payload) {
                        Ok(message) => consensus.handle_inbound(from, message).await,
                        Err(err) => warn!(%from, ?err, "dropped malformed consensus frame"),
                    },
                    other => warn!(%from, channel = other, "dropped frame for unknown channel"),
                }
            }
        }
    }
}

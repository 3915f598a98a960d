use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tablemesh_node::{Cli, Config, Node, PeerTableResolver};
use tablemesh_peers::PeerTable;
use tablemesh_transport::TokioUdpTransport;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            Config::from_yaml(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => Config::default(),
    };
    Ok(cli.apply_overrides(config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let identity = config
        .build_identity(now_ms())
        .context("building node identity from configuration")?;
    info!(node_id = %identity.node_id(), display_name = identity.display_name(), "identity ready");

    let peers = Arc::new(PeerTable::with_limits(
        config.peer_timeout(),
        config.max_peers(),
    ));
    for (node_id, public_key, address) in config
        .decode_bootstrap_peers()
        .context("decoding configured bootstrap peers")?
    {
        peers
            .insert_or_refresh(node_id, public_key, address)
            .context("seeding bootstrap peer")?;
    }

    let resolver = Arc::new(PeerTableResolver(peers.clone()));
    let log_store = Arc::new(tablemesh_log::LogStore::with_capacity(
        resolver.clone(),
        config.log_initial_capacity,
    ));

    tablemesh_node::install_archive_observer(&log_store, std::path::PathBuf::from(&config.archive_path));

    let transport = Arc::new(
        TokioUdpTransport::bind(config.bind_addr)
            .await
            .with_context(|| format!("binding udp transport on {}", config.bind_addr))?,
    );
    info!(bind_addr = %config.bind_addr, "transport bound");

    let mut node = Node::new(
        identity,
        &config,
        transport,
        log_store,
        peers,
        resolver,
    );
    node.run(&config);

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown signal received");
    node.shutdown().await.context("shutting down node tasks")?;
    Ok(())
}

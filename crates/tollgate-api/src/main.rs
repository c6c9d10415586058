//! # tollgate-api Binary Entry Point
//!
//! Loads configuration, opens the token store, and serves the gated router
//! until SIGINT/SIGTERM. Binds to a configurable port (default 8080).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tollgate_api::config::AppConfig;
use tollgate_api::gate::GateState;
use tollgate_api::middleware::metrics;
use tollgate_api::state::AppState;
use tollgate_core::SystemClock;
use tollgate_store::{FileBackend, KeyValueBackend, MemoryBackend, TokenStore};

#[derive(Parser, Debug)]
#[command(name = "tollgate-api", version, about = "Bearer-token gate server")]
struct Cli {
    /// YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overriding the configuration.
    #[arg(short, long)]
    port: Option<u16>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("installing metrics recorder")?;

    let backend: Arc<dyn KeyValueBackend> = match &config.store.path {
        Some(dir) => {
            let backend = FileBackend::open(dir).context("opening token store directory")?;
            tracing::info!(path = %backend.dir().display(), "using file-backed token store");
            Arc::new(backend)
        }
        None => {
            tracing::warn!("no store path configured; tokens will not survive restart");
            Arc::new(MemoryBackend::new())
        }
    };

    let store = TokenStore::initialize(backend, config.store_options()?)
        .await
        .context("initializing token store")?;
    tracing::info!(tokens = store.len(), "token store ready");
    metrics::record_stored(store.len());

    let gate = GateState::new(
        store.clone(),
        config.credential()?,
        config.token_ttl()?,
        config.gate_policy()?,
    );
    tracing::info!(
        client_id = gate.credential.client_id(),
        token_path = gate.policy.token_path(),
        ttl_secs = gate.ttl.as_secs(),
        "gate configured"
    );

    let sweeper = config.sweep_interval()?.map(|every| {
        tracing::info!(every_secs = every.as_secs(), "expired-token sweeper enabled");
        tollgate_api::sweeper::spawn_sweeper(store.clone(), Arc::new(SystemClock), every)
    });

    let app = tollgate_api::app(AppState::new(gate).with_prometheus(prometheus));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("Tollgate listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    store.flush().await.context("flushing token store")?;
    tracing::info!("shutdown complete");

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

//! Cirrus server - managed cluster lifecycle service

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use kube::Client;
use tracing::info;

use cirrus_common::telemetry::init_tracing;
use cirrus_provision::{OrchestratorProvisioner, OrchestratorReconciler};
use cirrus_server::router::router;
use cirrus_service::{ClustersService, LifecycleService};
use cirrus_store::SqliteClusterStore;

/// Cirrus - cluster lifecycle management service
#[derive(Parser, Debug)]
#[command(name = "cirrus-server", version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database file holding cluster records
    #[arg(long, default_value = "cirrus.db")]
    db_path: PathBuf,

    /// Orchestrator namespace where Cirrus-managed resources live
    #[arg(long, default_value = cirrus_common::DEFAULT_CLUSTERS_NAMESPACE)]
    namespace: String,

    /// Address to serve the clusters API on
    #[arg(long, default_value = "0.0.0.0:8000")]
    listen_addr: SocketAddr,

    /// Per-call deadline for orchestrator requests, in seconds
    #[arg(long, default_value_t = 30)]
    orchestrator_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let cli = Cli::parse();

    // Infers kubeconfig or in-cluster configuration, in that order.
    let client = Client::try_default()
        .await
        .context("failed to build kubernetes client for the orchestrator")?;

    let store = Arc::new(
        SqliteClusterStore::open(&cli.db_path).context("failed to open the cluster store")?,
    );

    let timeout = Duration::from_secs(cli.orchestrator_timeout_secs);
    let provisioner = Arc::new(OrchestratorProvisioner::new(
        client.clone(),
        cli.namespace.clone(),
        timeout,
    ));
    let reconciler = Arc::new(OrchestratorReconciler::new(
        client,
        cli.namespace.clone(),
        timeout,
    ));

    let service: Arc<dyn ClustersService> =
        Arc::new(LifecycleService::new(store, provisioner, reconciler));

    let app = router(service);
    let listener = tokio::net::TcpListener::bind(cli.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen_addr))?;
    info!(addr = %cli.listen_addr, namespace = %cli.namespace, "serving clusters API");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}

// Path: crates/node/src/main.rs
//! The scheduler process: wires an in-memory `Services` instance, installs
//! structured logging and Prometheus metrics, starts the `/metrics`,
//! `/healthz`, `/readyz` server, and runs the periodic sweeps (spec §5).

mod config;
mod scheduler;

use clap::Parser;
use rental_api::ports::SystemClock;
use rental_api::Services;
use rental_services::{
    ContractWorkflow, InvitationSubsystem, MatchingEngine, NotificationDispatcher, RateGuard,
    SignatureFlow,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "rental-node", about = "Scheduler process for the rental contract engine")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "RENTAL_CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rental_telemetry::init::init_tracing()?;

    let cli = Cli::parse();
    let node_config = config::load(cli.config.as_deref())?;

    let sink = rental_telemetry::prometheus::install()?;
    rental_telemetry::sinks::SINK
        .set(sink)
        .map_err(|_| anyhow::anyhow!("metrics sink already installed"))?;

    let services = build_demo_services();
    let workflow = ContractWorkflow::new(services.clone());
    let invitations = InvitationSubsystem::new(services.clone(), workflow.clone());
    let signatures = SignatureFlow::new(services.clone(), workflow.clone());
    let matching = MatchingEngine::new(services.clone());
    let notifications = NotificationDispatcher::new(services.clone());
    let rate_guard = Arc::new(RateGuard::new(services.clock.clone()));

    let bind_address: SocketAddr = node_config
        .bind_address
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind_address {}: {e}", node_config.bind_address))?;

    let http_handle = tokio::spawn(rental_telemetry::http::run_server(bind_address));
    let sweep_handles = scheduler::spawn_all(
        &node_config.scheduler,
        invitations,
        signatures,
        matching,
        notifications,
        rate_guard,
    );

    tracing::info!(bind_address = %bind_address, sweeps = sweep_handles.len(), "rental-node started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    http_handle.abort();
    for handle in sweep_handles {
        handle.abort();
    }
    Ok(())
}

/// Wires the in-memory reference stores and fakes as a standalone demo
/// deployment; a production deployment would substitute real store and
/// adapter implementations behind the same `Services` ports.
fn build_demo_services() -> Services {
    Services::new(
        Arc::new(SystemClock),
        Arc::new(rental_storage::InMemoryContractStore::new()),
        Arc::new(rental_storage::InMemoryInvitationStore::new()),
        Arc::new(rental_storage::InMemoryObjectionStore::new()),
        Arc::new(rental_storage::InMemoryGuaranteeStore::new()),
        Arc::new(rental_storage::InMemoryMatchStore::new()),
        Arc::new(rental_storage::InMemoryNotificationStore::new()),
        Arc::new(rental_storage::RecordingChannelAdapter::new()),
        Arc::new(rental_storage::PlaceholderPdfRenderer),
        Arc::new(rental_storage::InMemoryUserDirectory::new()),
    )
}

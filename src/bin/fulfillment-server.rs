//! # Fulfillment Server
//!
//! Process entry point: loads configuration, wires the repository and service clients into
//! a [`FulfillmentCoordinator`], starts the job worker and the scheduler, and serves the
//! HTTP trigger surface until Ctrl-C.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use print_fulfillment_core::client::{
    ApiTemplateClient, HttpUrlProbe, OAuthRefreshExchange, ScriptDeliveryClient, TokenCache,
};
use print_fulfillment_core::config::ConfigManager;
use print_fulfillment_core::constants::pipeline::JOB_QUEUE_CAPACITY;
use print_fulfillment_core::database::{DatabaseConnection, PgOrderRepository};
use print_fulfillment_core::logging::init_structured_logging;
use print_fulfillment_core::orchestration::{FulfillmentCoordinator, JobQueue, Scheduler};
use print_fulfillment_core::web::{create_router, AppState};

#[derive(Parser)]
#[command(name = "fulfillment-server")]
#[command(about = "Run the print fulfillment pipeline and its trigger endpoints")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Environment overlay to load (development, test, production)
    #[arg(short, long, env = "FULFILLMENT_ENV")]
    environment: Option<String>,

    /// Configuration directory (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Override `web.bind_address`
    #[arg(long)]
    bind: Option<String>,

    /// Do not start the interval scheduler
    #[arg(long)]
    no_scheduler: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_structured_logging();

    let environment = cli
        .environment
        .unwrap_or_else(ConfigManager::detect_environment);
    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir, &environment)
        .context("loading configuration")?;
    let config = manager.config();

    let connection = DatabaseConnection::new(&config.database)
        .await
        .context("connecting to the database")?;
    let repository = Arc::new(PgOrderRepository::new(connection.pool().clone()));

    let timeout = config.http.request_timeout();
    let render = Arc::new(ApiTemplateClient::new(&config.api_template, timeout)?);
    let exchange = Arc::new(OAuthRefreshExchange::new(&config.google, timeout)?);
    let tokens = Arc::new(TokenCache::new(
        exchange,
        config.google.token_expiration_buffer_seconds,
    ));
    let delivery = Arc::new(ScriptDeliveryClient::new(&config.google, tokens, timeout)?);
    let probe = Arc::new(HttpUrlProbe::new(timeout)?);

    let coordinator = Arc::new(FulfillmentCoordinator::new(
        config, repository, render, delivery, probe,
    ));

    let (shutdown_tx, _) = broadcast::channel(4);
    let (queue, worker) = JobQueue::new(JOB_QUEUE_CAPACITY);
    let worker_handle = worker.spawn(coordinator.clone(), shutdown_tx.subscribe());

    let scheduler_handle = if config.scheduler.enabled && !cli.no_scheduler {
        let scheduler = Scheduler::from_config(queue.clone(), &config.scheduler);
        Some(scheduler.spawn(shutdown_tx.subscribe()))
    } else {
        info!("Scheduler disabled");
        None
    };

    let bind_address = cli.bind.unwrap_or_else(|| config.web.bind_address.clone());
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {bind_address}"))?;
    info!(bind_address = %bind_address, environment = %environment, "Fulfillment server listening");

    let app = create_router(AppState::new(queue, coordinator));
    let mut server_shutdown = shutdown_tx.subscribe();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = server_shutdown.recv().await;
    });
    let server_handle = tokio::spawn(async move { server.await });

    signal::ctrl_c().await.context("listening for Ctrl-C")?;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());

    if let Err(e) = server_handle.await? {
        error!(error = %e, "HTTP server stopped with an error");
    }
    if let Some(handle) = scheduler_handle {
        handle.await?;
    }
    worker_handle.await?;
    connection.close().await;

    info!("Fulfillment server stopped");
    Ok(())
}

//! # belfryd — belfry daemon
//!
//! Composition root that wires all adapters together and starts the bell
//! controller.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and install logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Load the schedule document into the engine
//! - Spawn the polling driver that rings the bell
//! - Build the axum router around the schedule service and serve it
//! - Handle graceful shutdown (Ctrl-C)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use belfry_adapter_http_axum::state::AppState;
use belfry_adapter_storage_sqlite_sqlx::Database;
use belfry_adapter_virtual::{SystemClock, VirtualRelay};
use belfry_app::driver::PollingDriver;
use belfry_app::engine::ScheduleEngine;
use belfry_app::services::ScheduleService;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Database
    let db = Database::open(config.database_url()).await?;

    // Engine
    let clock = SystemClock::new(config.utc_offset()?, config.clock.assume_synchronized);
    let engine = ScheduleEngine::load(db.schedule_store(), VirtualRelay::default(), clock).await?;
    let engine = Arc::new(engine);

    let driver = tokio::spawn(PollingDriver::new(Arc::clone(&engine), config.driver_config()).run());

    // HTTP
    let state = AppState::new(ScheduleService::new(engine));
    let app = belfry_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "belfryd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    driver.abort();
    tracing::info!("belfryd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

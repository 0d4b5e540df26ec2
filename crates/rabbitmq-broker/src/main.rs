//! Service Broker Binary
//!
//! Runs the RabbitMQ service broker HTTP server.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use broker_admin::RabbitAdmin;
use rabbitmq_broker::{
    create_router, default_catalog, load_catalog, logging, AppState, Args, PidFile, RabbitService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    logging::init(&config.logging).context("Failed to initialize logging")?;

    let catalog = match &config.catalog_path {
        Some(path) => load_catalog(path)?,
        None => default_catalog(),
    };

    let admin = RabbitAdmin::new(
        config.rabbit.management_url(),
        &config.rabbit.user,
        &config.rabbit.pass,
        config.rabbit.admin_timeout,
    )?;
    admin.ping().await.with_context(|| {
        format!(
            "RabbitMQ management API at {} is unreachable",
            admin.base_url()
        )
    })?;
    info!(url = %admin.base_url(), "RabbitMQ management API reachable");

    let service = RabbitService::new(
        Arc::new(admin),
        config.credentials.generator(),
        Arc::new(catalog),
        config.rabbit.settings(),
    );

    info!(
        addr = %config.listen_addr(),
        rabbit = ?config.rabbit,
        credentials = ?config.credentials,
        "Starting RabbitMQ service broker"
    );

    let state = Arc::new(AppState {
        service: Arc::new(service),
        auth: config.auth.clone(),
    });
    let app = create_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let _pid_file = config
        .pid_file
        .as_ref()
        .map(PidFile::create)
        .transpose()
        .context("Failed to write PID file")?;

    info!(addr = %addr, "Service broker listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Service broker stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

use std::sync::Arc;

use clap::Parser;
use msgext_core::{QueryHandler, TemplateCardRenderer};
use msgext_graph::{GraphProfileClient, OnBehalfOfAuthProvider};
use msgext_server::cli::Cli;
use msgext_server::{AppState, router};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(error) = run().await {
        tracing::error!("server shut down with error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.app_config();
    config.validate()?;

    let handler = QueryHandler::new(
        &config,
        Arc::new(OnBehalfOfAuthProvider::new()),
        Arc::new(GraphProfileClient::new(cli.graph_base_url.clone())),
        Arc::new(TemplateCardRenderer),
    )?;
    tracing::info!(
        records = handler.dataset().len(),
        tenant_id = %config.tenant_id,
        "query handler ready"
    );

    let addr = cli.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http server listening");

    axum::serve(listener, router(AppState::new(handler)))
        .with_graceful_shutdown(async {
            match signal::ctrl_c().await {
                Ok(()) => tracing::info!("shutdown signal received"),
                Err(err) => tracing::warn!("failed to listen for shutdown signal: {err}"),
            }
        })
        .await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

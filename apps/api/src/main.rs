mod chat;
mod config;
mod errors;
mod llm_client;
mod pdf;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

/// CareerIQ: an AI career advisor chat service.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Port to listen on (overrides PORT).
    #[arg(long = "server.port")]
    port: Option<u16>,

    /// Address to bind (overrides HOST).
    #[arg(long = "server.address")]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(address) = cli.address {
        config.host = address;
    }

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={level},tower_http={level}",
                env!("CARGO_PKG_NAME"),
                level = &config.log_level
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CareerIQ v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Model: {} (temperature={}, max_output_tokens={})",
        config.gemini_model_name, config.temperature, config.max_output_tokens
    );

    // Initialize LLM client
    let llm = LlmClient::new(&config).context("Failed to build Gemini client")?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;

    // Build app state
    let state = AppState::new(config, Arc::new(llm));

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

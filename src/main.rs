//! BitSwarp Gateway - natural-language trade intents to signable transactions
//!
//! The gateway resolves user intents, acquires chain-appropriate aggregator
//! quotes, assembles execution payloads, and drives the confirm/sign/broadcast
//! state machine for EVM and Solana swaps.

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

mod adapters;
mod api;
mod chain;
mod config;
mod error;
mod intent;
mod market;
mod pipeline;
mod registry;
mod session;

use adapters::{JupiterAdapter, OpenOceanAdapter};
use chain::{EvmClient, SolanaClient};
use config::Settings;
use intent::{HttpIntentExtractor, IntentResolver};
use market::PriceService;
use pipeline::TradePipeline;
use registry::{AgentRegistry, InMemoryAgentStore};
use session::{SessionManager, TradeExecutor};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("Starting BitSwarp Gateway v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;
    info!(
        "Loaded configuration: {} Solana tokens, {} EVM tokens",
        settings.tokens.solana.len(),
        settings.tokens.evm.len()
    );

    // Chain clients
    let solana = Arc::new(SolanaClient::new(&settings.solana));
    let evm = Arc::new(EvmClient::new(&settings.evm)?);
    info!("Chain clients initialized");

    // Quote adapters
    let jupiter = Arc::new(JupiterAdapter::new(
        &settings.aggregator,
        settings.tokens.clone(),
    ));
    let openocean = Arc::new(OpenOceanAdapter::new(
        &settings.aggregator,
        &settings.evm,
        settings.tokens.clone(),
    ));

    // Intent resolution
    let extractor = Arc::new(HttpIntentExtractor::new(settings.intent.clone()));
    let resolver = Arc::new(IntentResolver::new(extractor));

    // Pipeline and sessions
    let pipeline = Arc::new(TradePipeline::new(
        jupiter,
        openocean,
        settings.tokens.clone(),
    ));
    let sessions = Arc::new(SessionManager::new());
    let executor = Arc::new(TradeExecutor::new(solana.clone(), evm.clone()));

    // Agent key registry
    let registry = Arc::new(AgentRegistry::new(
        Arc::new(InMemoryAgentStore::new()),
        settings.auth.agent_key_prefix.clone(),
    ));

    let state = api::AppState {
        registry,
        resolver,
        pipeline,
        sessions,
        executor,
        solana,
        evm,
        prices: Arc::new(PriceService::new(&settings.aggregator)),
        admin_key: settings.auth.admin_key.clone(),
    };

    let api_config = settings.api.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::run_server(api_config, state).await {
            error!("API server error: {}", e);
        }
    });

    info!(
        "BitSwarp Gateway is running at http://{}:{}",
        settings.api.host, settings.api.port
    );

    shutdown_signal().await;
    info!("Shutdown signal received, stopping...");

    api_handle.abort();

    info!("BitSwarp Gateway stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bitswarp_gateway=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

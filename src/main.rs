// =============================================================================
// sentrix-core — Main Entry Point
// =============================================================================
//
// The engine starts in whatever `trading_mode` the config file specifies
// (default: Paused). Nothing here flips it to Live — that's an operator
// decision made by editing the config and restarting.
// =============================================================================

mod broker;
mod config;
mod controller;
mod error;
mod host;
mod indicators;
mod journal;
mod market_data;
mod news;
mod state;
mod strategy;
mod types;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::broker::BrokerClient;
use crate::config::EngineConfig;
use crate::controller::CycleController;
use crate::journal::Journal;
use crate::market_data::adapter::MarketDataAdapter;
use crate::news::NewsClient;
use crate::state::EngineState;
use crate::strategy::base::Strategy;

const CONFIG_PATH: &str = "engine_config.json";
const DATA_DIR: &str = "data";
const MODEL_DIR: &str = "data/models";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("sentrix-core starting up");

    let config = EngineConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load engine config, using defaults");
        EngineConfig::default()
    });

    info!(
        symbols = ?config.symbols,
        trading_mode = %config.trading_mode,
        "engine configured"
    );

    let roster = crate::strategy::impls::build_roster(MODEL_DIR);
    let strategy_ids: Vec<String> = roster.iter().map(|s| s.id().to_string()).collect();
    info!(count = strategy_ids.len(), "strategy roster built");

    let market_data = Arc::new(
        MarketDataAdapter::new(config.data_server.base_url.clone())?
            .with_ttl(std::time::Duration::from_secs(config.data_server.cache_ttl_secs))
            .with_max_retries(config.data_server.retry_attempts),
    );

    let news = match EngineConfig::news_api_key() {
        Some(api_key) => {
            info!(provider = ?config.trading.news_provider, "news API key found, enabling news enrichment");
            Some(Arc::new(NewsClient::new(config.trading.news_provider, api_key)))
        }
        None => {
            warn!("no NEWS_API_KEY configured, news-driven strategies will sit idle");
            None
        }
    };

    let broker = Arc::new(BrokerClient::new(
        config.ib_server.host.clone(),
        config.ib_server.port,
        config.ib_server.client_id,
    ));

    let journal = Arc::new(Journal::new(DATA_DIR));
    journal.load();

    let engine = Arc::new(EngineState::new(config, strategy_ids));

    let run_started_at = chrono::Utc::now();
    let controller = Arc::new(CycleController::new(
        engine.clone(),
        broker,
        roster,
        market_data,
        journal,
        run_started_at,
        news,
    ));

    controller.connect().await;
    info!("broker connect attempt complete, entering run loop");

    let run_controller = controller.clone();
    let run_handle = tokio::spawn(async move { run_controller.run_until_stopped().await });

    tokio::signal::ctrl_c().await?;
    warn!("shutdown signal received, stopping gracefully");
    controller.begin_shutdown();

    match run_handle.await {
        Ok(Ok(())) => info!("cycle controller stopped cleanly"),
        Ok(Err(e)) => warn!(error = %e, "cycle controller stopped with a fatal error"),
        Err(e) => warn!(error = %e, "cycle controller task panicked"),
    }

    if let Err(e) = engine.config.read().save(CONFIG_PATH) {
        warn!(error = %e, "failed to save engine config on shutdown");
    }

    info!("sentrix-core shut down complete");
    Ok(())
}

// =============================================================================
// Engine configuration — nested config tree with atomic persistence
// =============================================================================
//
// Every tunable lives here so the engine can be reconfigured without a
// rebuild. All fields carry `#[serde(default = "...")]` so that adding a new
// field never breaks loading an older config file. Secrets (broker client
// id, news API key) are read from the environment via dotenv, never stored
// in the JSON file.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::TradingMode;

/// News/sentiment feed provider. A closed enumeration with an explicit
/// unknown-value fallback to `AlphaVantage` (the dispatch table always has
/// a default, even for a recognized-but-unsupported name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsProvider {
    AlphaVantage,
    NewsApi,
    Polygon,
    #[serde(other)]
    Unknown,
}

impl Default for NewsProvider {
    fn default() -> Self {
        Self::AlphaVantage
    }
}

impl NewsProvider {
    /// Resolve to the provider actually dispatched to, logging when the
    /// configured value falls back to the default.
    pub fn resolved(self) -> Self {
        if matches!(self, Self::Unknown) {
            warn!("unrecognized news provider in config, falling back to AlphaVantage");
            Self::AlphaVantage
        } else {
            self
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_data_server_base_url() -> String {
    "http://127.0.0.1:8800".to_string()
}

fn default_data_ttl_secs() -> u64 {
    300
}

fn default_data_retry_attempts() -> u32 {
    3
}

fn default_ib_host() -> String {
    "127.0.0.1".to_string()
}

fn default_ib_port() -> u16 {
    7497
}

fn default_client_id() -> u32 {
    1
}

fn default_risk_per_trade() -> f64 {
    0.01
}

fn default_stop_loss_atr_multiple() -> f64 {
    2.0
}

fn default_min_cash_buffer() -> f64 {
    0.1
}

fn default_per_trade_notional_cap() -> f64 {
    20_000.0
}

fn default_max_active_positions() -> u32 {
    5
}

fn default_max_daily_loss_pct() -> f64 {
    3.0
}

fn default_limit_offset() -> f64 {
    0.001
}

fn default_cycle_interval_secs() -> u64 {
    60
}

fn default_force_close_time() -> String {
    "15:55".to_string()
}

fn default_close_positions_time() -> String {
    "15:58".to_string()
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataServerConfig {
    #[serde(default = "default_data_server_base_url")]
    pub base_url: String,
    #[serde(default = "default_data_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_data_retry_attempts")]
    pub retry_attempts: u32,
}

impl Default for DataServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_data_server_base_url(),
            cache_ttl_secs: default_data_ttl_secs(),
            retry_attempts: default_data_retry_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IbServerConfig {
    #[serde(default = "default_ib_host")]
    pub host: String,
    #[serde(default = "default_ib_port")]
    pub port: u16,
    #[serde(default = "default_client_id")]
    pub client_id: u32,
}

impl Default for IbServerConfig {
    fn default() -> Self {
        Self {
            host: default_ib_host(),
            port: default_ib_port(),
            client_id: default_client_id(),
        }
    }
}

/// Trading-wide parameters applied by the strategy base across all strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    #[serde(default = "default_risk_per_trade")]
    pub risk_per_trade: f64,
    #[serde(default = "default_stop_loss_atr_multiple")]
    pub stop_loss_atr_multiple: f64,
    #[serde(default = "default_min_cash_buffer")]
    pub min_cash_buffer: f64,
    #[serde(default = "default_per_trade_notional_cap")]
    pub per_trade_notional_cap: f64,
    #[serde(default = "default_max_active_positions")]
    pub max_active_positions: u32,
    #[serde(default = "default_max_daily_loss_pct")]
    pub max_daily_loss_pct: f64,
    #[serde(default = "default_limit_offset")]
    pub limit_offset: f64,
    #[serde(default)]
    pub short_selling_enabled: bool,
    #[serde(default)]
    pub sell_exempt_from_cap: bool,
    #[serde(default = "default_true")]
    pub same_day_sell_only: bool,
    #[serde(default = "default_force_close_time")]
    pub force_close_time: String,
    #[serde(default = "default_close_positions_time")]
    pub close_positions_time: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub news_provider: NewsProvider,
    #[serde(default = "default_max_news_age_hours")]
    pub max_news_age_hours: f64,
    #[serde(default = "default_trading_hours_start")]
    pub trading_hours_start: String,
    #[serde(default = "default_trading_hours_end")]
    pub trading_hours_end: String,
    #[serde(default)]
    pub allow_orders_outside_trading_hours: bool,
    #[serde(default = "default_true")]
    pub close_all_positions_before_market_close: bool,
    #[serde(default = "default_scan_interval_minutes")]
    pub scan_interval_minutes: u64,
}

fn default_max_news_age_hours() -> f64 {
    6.0
}

fn default_trading_hours_start() -> String {
    "09:30".to_string()
}

fn default_trading_hours_end() -> String {
    "16:00".to_string()
}

fn default_scan_interval_minutes() -> u64 {
    1
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            risk_per_trade: default_risk_per_trade(),
            stop_loss_atr_multiple: default_stop_loss_atr_multiple(),
            min_cash_buffer: default_min_cash_buffer(),
            per_trade_notional_cap: default_per_trade_notional_cap(),
            max_active_positions: default_max_active_positions(),
            max_daily_loss_pct: default_max_daily_loss_pct(),
            limit_offset: default_limit_offset(),
            short_selling_enabled: false,
            sell_exempt_from_cap: false,
            same_day_sell_only: true,
            force_close_time: default_force_close_time(),
            close_positions_time: default_close_positions_time(),
            timezone: default_timezone(),
            news_provider: NewsProvider::default(),
            max_news_age_hours: default_max_news_age_hours(),
            trading_hours_start: default_trading_hours_start(),
            trading_hours_end: default_trading_hours_end(),
            allow_orders_outside_trading_hours: false,
            close_all_positions_before_market_close: true,
            scan_interval_minutes: default_scan_interval_minutes(),
        }
    }
}

fn default_stop_loss_pct() -> f64 {
    0.05
}

fn default_max_holding_minutes() -> u64 {
    24 * 60
}

/// Per-strategy tunables; unknown keys are tolerated so the map can carry
/// strategy-specific overrides beyond this common shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub cooldown_minutes: Option<u32>,
    #[serde(default)]
    pub ib_order_type: Option<String>,
    /// Fraction loss from `avg_cost` that trips the generic stop-loss exit
    /// (§4.4.2 step 3).
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,
    /// Flat take-profit threshold, applied alongside the fixed tiered
    /// take-profit ladder (§4.4.2 step 4).
    #[serde(default)]
    pub take_profit_pct: Option<f64>,
    /// Dollar unrealized-PnL threshold for the PnL-based take-profit
    /// (§4.4.2 step 5).
    #[serde(default)]
    pub pnl_take_profit_threshold: Option<f64>,
    #[serde(default = "default_max_holding_minutes")]
    pub max_holding_minutes: u64,
    #[serde(default)]
    pub min_confidence: f64,
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_minutes: None,
            ib_order_type: None,
            stop_loss_pct: default_stop_loss_pct(),
            take_profit_pct: None,
            pnl_take_profit_threshold: None,
            max_holding_minutes: default_max_holding_minutes(),
            min_confidence: 0.0,
            extra: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub trading_mode: TradingMode,
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    #[serde(default)]
    pub data_server: DataServerConfig,
    #[serde(default)]
    pub ib_server: IbServerConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub strategies: HashMap<String, StrategyConfig>,
    #[serde(default)]
    pub symbol_strategy_map: HashMap<String, Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["AAPL".to_string(), "MSFT".to_string(), "NVDA".to_string()],
            trading_mode: TradingMode::default(),
            cycle_interval_secs: default_cycle_interval_secs(),
            data_server: DataServerConfig::default(),
            ib_server: IbServerConfig::default(),
            trading: TradingConfig::default(),
            strategies: HashMap::new(),
            symbol_strategy_map: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`, falling back to
    /// defaults (with a log message) if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no config file found, starting from defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;
        info!(path = %path.display(), symbols = ?config.symbols, "engine config loaded");
        Ok(config)
    }

    /// Persist the current configuration using an atomic write (tmp + rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).context("failed to serialize engine config")?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;
        info!(path = %path.display(), "engine config saved (atomic)");
        Ok(())
    }

    /// News API provider resolved from the environment, defaulting to a
    /// conservative no-op when unset (see open-question decision in
    /// SPEC_FULL.md §9.1).
    pub fn news_api_key() -> Option<String> {
        std::env::var("NEWS_API_KEY").ok().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_safe_trading_floor() {
        let config = EngineConfig::default();
        assert!(config.trading.min_cash_buffer > 0.0);
        assert!(matches!(config.trading_mode, TradingMode::Paused));
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load("/tmp/does-not-exist-engine-config.json").unwrap();
        assert_eq!(config.symbols, EngineConfig::default().symbols);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("sentrix-core-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("engine_config.json");

        let mut config = EngineConfig::default();
        config.symbols = vec!["TSLA".to_string()];
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.symbols, vec!["TSLA".to_string()]);

        std::fs::remove_dir_all(&dir).ok();
    }
}

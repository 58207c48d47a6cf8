use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{Bar, BarSeries, IndicatorSet};

const DEFAULT_TIMEOUT_SECS: u64 = 12;
const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_MAX_RETRIES: u32 = 3;
const RETRY_BASE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct CacheKey {
    symbol: String,
    interval: String,
}

struct CacheEntry {
    fetched_at: Instant,
    series: BarSeries,
}

/// Raw wire shape returned by the `enhanced-data` endpoint.
#[derive(Debug, Deserialize)]
struct EnhancedDataResponse {
    bars: Vec<WireBar>,
    #[serde(default)]
    indicators: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct WireBar {
    #[serde(rename = "t")]
    timestamp: i64,
    #[serde(rename = "o")]
    open: f64,
    #[serde(rename = "h")]
    high: f64,
    #[serde(rename = "l")]
    low: f64,
    #[serde(rename = "c")]
    close: f64,
    #[serde(rename = "v")]
    volume: u64,
}

/// Polling HTTP adapter over a vendor "enhanced-data" market-data service,
/// with a short-lived TTL cache to keep repeated strategy-cycle fetches of
/// the same `(symbol, interval)` pair from re-hitting the network.
pub struct MarketDataAdapter {
    client: Client,
    base_url: String,
    ttl: Duration,
    max_retries: u32,
    cache: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MarketDataAdapter {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build market-data HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Fetch bars for `symbol`/`interval` over `period`, serving from cache
    /// when the entry is fresh. Applies linear backoff across up to
    /// `max_retries` attempts on transient failures.
    pub async fn get_intraday(&self, symbol: &str, period: &str, interval: &str) -> Result<BarSeries> {
        let key = CacheKey {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
        };

        if let Some(entry) = self.cache.read().get(&key) {
            if entry.fetched_at.elapsed() < self.ttl {
                debug!(symbol, interval, "market-data cache hit");
                return Ok(entry.series.clone());
            }
        }

        let response = self.fetch_with_retry(symbol, period, interval).await?;
        let series = normalize_bars(response.bars)?;

        self.cache.write().insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                series: series.clone(),
            },
        );

        Ok(series)
    }

    /// Fetch server-precomputed indicators alongside bars for `symbol`.
    pub async fn get_indicators(&self, symbol: &str, period: &str, interval: &str) -> Result<IndicatorSet> {
        let response = self.fetch_with_retry(symbol, period, interval).await?;
        let mut set = IndicatorSet::default();
        for (name, value) in response.indicators {
            set.scalars.insert(name, value);
        }
        Ok(set)
    }

    async fn fetch_with_retry(&self, symbol: &str, period: &str, interval: &str) -> Result<EnhancedDataResponse> {
        let url = format!("{}/enhanced-data", self.base_url);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .client
                .get(&url)
                .query(&[("symbol", symbol), ("period", period), ("interval", interval)])
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .json::<EnhancedDataResponse>()
                        .await
                        .context("failed to decode enhanced-data response");
                }
                Ok(resp) if attempt < self.max_retries => {
                    warn!(symbol, status = %resp.status(), attempt, "enhanced-data request failed, retrying");
                }
                Ok(resp) => {
                    anyhow::bail!("enhanced-data request failed with status {}", resp.status());
                }
                Err(e) if attempt < self.max_retries => {
                    warn!(symbol, error = %e, attempt, "enhanced-data request errored, retrying");
                }
                Err(e) => {
                    return Err(e).context("enhanced-data request failed after retries");
                }
            }

            tokio::time::sleep(RETRY_BASE * attempt).await;
        }
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .context("invalid bar timestamp in enhanced-data response")
}

fn normalize_bars(wire: Vec<WireBar>) -> Result<BarSeries> {
    let bars: Vec<Bar> = wire
        .into_iter()
        .map(|w| {
            Ok(Bar {
                timestamp: millis_to_datetime(w.timestamp)?,
                open: w.open,
                high: w.high,
                low: w.low,
                close: w.close,
                volume: w.volume,
            })
        })
        .collect::<Result<_>>()?;
    BarSeries::new(bars).context("upstream bars failed ordering validation")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_bars_preserves_order() {
        let wire = vec![
            WireBar { timestamp: 60_000, open: 1.0, high: 1.0, low: 1.0, close: 1.0, volume: 1 },
            WireBar { timestamp: 120_000, open: 1.0, high: 1.0, low: 1.0, close: 1.0, volume: 1 },
        ];
        let series = normalize_bars(wire).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn normalize_bars_rejects_non_ascending_timestamps() {
        let wire = vec![
            WireBar { timestamp: 120_000, open: 1.0, high: 1.0, low: 1.0, close: 1.0, volume: 1 },
            WireBar { timestamp: 60_000, open: 1.0, high: 1.0, low: 1.0, close: 1.0, volume: 1 },
        ];
        assert!(normalize_bars(wire).is_err());
    }
}

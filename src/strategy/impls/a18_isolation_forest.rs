// A18 — Isolation Forest anomaly detector. Unlike the other single-indicator
// strategies this one holds fitted model state per symbol, persisted to
// `data/models/{symbol}_a18_isolation_forest.json` and retrained every 30
// days. Anomaly signals use a 7-day cooldown (configured on the strategy
// rather than the default 15-minute window) since a fresh anomaly call
// should not repeat until the model has had a chance to move on.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::indicators::isolation_forest::IsolationForest;
use crate::indicators::roc::calculate_roc;
use crate::indicators::rsi::calculate_rsi;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::{entry_signal, volume_ratio};
use crate::types::{Action, BarSeries, IndicatorSet, Signal, SignalType};

const RETRAIN_INTERVAL_DAYS: i64 = 30;
const TRAINING_WINDOW: usize = 200;
const ANOMALY_SCORE_THRESHOLD: f64 = 0.62;

pub struct IsolationForestAnomaly {
    model_dir: PathBuf,
    models: Mutex<HashMap<String, IsolationForest>>,
}

impl IsolationForestAnomaly {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self { model_dir: model_dir.into(), models: Mutex::new(HashMap::new()) }
    }

    fn model_path(&self, symbol: &str) -> PathBuf {
        self.model_dir.join(format!("{symbol}_a18_isolation_forest.json"))
    }

    fn load_from_disk(path: &Path) -> Option<IsolationForest> {
        let content = std::fs::read_to_string(path).ok()?;
        match IsolationForest::from_json(&content) {
            Ok(model) => Some(model),
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to deserialize persisted isolation forest, will refit");
                None
            }
        }
    }

    fn persist(&self, symbol: &str, model: &IsolationForest) {
        let path = self.model_path(symbol);
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(%err, dir = %parent.display(), "failed to create model directory");
                return;
            }
        }
        match model.to_json() {
            Ok(json) => {
                if let Err(err) = std::fs::write(&path, json) {
                    warn!(%err, path = %path.display(), "failed to persist isolation forest model");
                }
            }
            Err(err) => warn!(%err, "failed to serialize isolation forest model"),
        }
    }

    fn feature_rows(bars: &BarSeries) -> Vec<Vec<f64>> {
        let closes = bars.closes();
        if closes.len() < TRAINING_WINDOW + 20 {
            return Vec::new();
        }
        let rsi = calculate_rsi(&closes, 14);
        let roc = calculate_roc(&closes, 10);
        let volumes = bars.volumes();

        let start = closes.len() - TRAINING_WINDOW;
        let mut rows = Vec::with_capacity(TRAINING_WINDOW);
        for i in start..closes.len() {
            if i == 0 {
                continue;
            }
            let ret = (closes[i] - closes[i - 1]) / closes[i - 1];
            let vol_avg = if i >= 10 { volumes[i - 10..i].iter().sum::<f64>() / 10.0 } else { volumes[i] };
            let vol_ratio = if vol_avg > 0.0 { volumes[i] / vol_avg } else { 1.0 };
            let row = vec![ret, roc.get(i).copied().unwrap_or(0.0), rsi.get(i).copied().unwrap_or(50.0), vol_ratio];
            if row.iter().all(|v| v.is_finite()) {
                rows.push(row);
            }
        }
        rows
    }

    fn current_feature_row(bars: &BarSeries) -> Option<Vec<f64>> {
        let closes = bars.closes();
        if closes.len() < 2 {
            return None;
        }
        let rsi = calculate_rsi(&closes, 14);
        let roc = calculate_roc(&closes, 10);
        let volumes = bars.volumes();
        let i = closes.len() - 1;
        let ret = (closes[i] - closes[i - 1]) / closes[i - 1];
        let vol_ratio = volume_ratio(bars, 10);
        let row = vec![ret, *roc.last()?, *rsi.last()?, vol_ratio];
        row.iter().all(|v| v.is_finite()).then_some(row)
    }

    fn model_for(&self, symbol: &str, bars: &BarSeries, now: DateTime<Utc>) -> Option<()> {
        let mut models = self.models.lock();
        let needs_fit = match models.get(symbol) {
            Some(model) => model.age_days(now) >= RETRAIN_INTERVAL_DAYS,
            None => {
                let path = self.model_path(symbol);
                if let Some(model) = Self::load_from_disk(&path) {
                    let stale = model.age_days(now) >= RETRAIN_INTERVAL_DAYS;
                    models.insert(symbol.to_string(), model);
                    stale
                } else {
                    true
                }
            }
        };

        if needs_fit {
            let rows = Self::feature_rows(bars);
            if rows.len() < 32 {
                return models.contains_key(symbol).then_some(());
            }
            let seed = symbol.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            if let Some(model) = IsolationForest::fit(&rows, seed) {
                info!(symbol, rows = rows.len(), "retrained isolation forest anomaly model");
                self.persist(symbol, &model);
                models.insert(symbol.to_string(), model);
            }
        }
        models.contains_key(symbol).then_some(())
    }
}

impl Strategy for IsolationForestAnomaly {
    fn id(&self) -> &str {
        "a18_isolation_forest"
    }

    fn cooldown_window(&self) -> Duration {
        Duration::from_secs(7 * 24 * 60 * 60)
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        if self.model_for(symbol, bars, now).is_none() {
            return Vec::new();
        }
        let Some(features) = Self::current_feature_row(bars) else { return Vec::new() };
        let models = self.models.lock();
        let Some(model) = models.get(symbol) else { return Vec::new() };
        let Some(score) = model.score(&features) else { return Vec::new() };
        if score < ANOMALY_SCORE_THRESHOLD {
            return Vec::new();
        }

        let price = *bars.closes().last().unwrap();
        // Anomaly direction proxies off the most recent return: a sharp move
        // that the model flags as unusual is treated as a reversal setup.
        let ret = features[0];
        let action = if ret < 0.0 { Action::Buy } else { Action::Sell };
        entry_signal(
            symbol, self.id(), SignalType::Named("A18_ISOLATION_FOREST_ANOMALY".into()), action, price, 1,
            score.clamp(0.5, 0.95), format!("anomaly score {score:.3}"), now,
        )
        .into_iter()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bars_with_jitter(n: usize) -> BarSeries {
        let mut bars = Vec::new();
        for i in 0..n {
            let price = 100.0 + (i as f64 * 0.1).sin() * 2.0;
            bars.push(crate::types::Bar {
                timestamp: Utc.timestamp_opt(i as i64 * 60, 0).unwrap(),
                open: price,
                high: price + 0.5,
                low: price - 0.5,
                close: price,
                volume: 10_000,
            });
        }
        BarSeries::new(bars).unwrap()
    }

    #[test]
    fn feature_rows_empty_below_training_window() {
        let bars = bars_with_jitter(50);
        assert!(IsolationForestAnomaly::feature_rows(&bars).is_empty());
    }

    #[test]
    fn feature_rows_populated_above_training_window() {
        let bars = bars_with_jitter(250);
        let rows = IsolationForestAnomaly::feature_rows(&bars);
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.len() == 4));
    }

    #[test]
    fn cooldown_window_is_seven_days() {
        let strat = IsolationForestAnomaly::new(std::env::temp_dir());
        assert_eq!(strat.cooldown_window(), Duration::from_secs(7 * 24 * 60 * 60));
    }
}

// A15 / A25 — pairs / cointegration trading. The original strategies trade a
// symbol against a dynamically-chosen cointegrated partner; this engine has
// no second-leg market-data feed, so both strategies proxy the pair series
// with the symbol's own trailing SMA (the same fallback the source took when
// no partner was configured) and trade the z-score of price-to-SMA ratio
// back toward its mean. A25 uses a longer lookback and tighter thresholds to
// approximate the original's cointegration-test-gated entry.

use chrono::{DateTime, Utc};

use crate::indicators::sma::current_sma;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::entry_signal;
use crate::types::{Action, BarSeries, IndicatorSet, Position, Signal, SignalType};

fn ratio_zscore(closes: &[f64], sma_period: usize, lookback: usize) -> Option<f64> {
    if closes.len() < sma_period + lookback {
        return None;
    }
    let pair_price = current_sma(closes, sma_period)?;
    if pair_price <= 0.0 {
        return None;
    }
    let window = &closes[closes.len() - lookback..];
    let ratios: Vec<f64> = window.iter().map(|c| c / pair_price).collect();
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    let variance = ratios.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / ratios.len() as f64;
    let std = variance.sqrt();
    if std <= 0.0 {
        return None;
    }
    let current_ratio = closes.last()? / pair_price;
    Some((current_ratio - mean) / std)
}

// --- A15: pairs trading (60-minute cooldown per the base lifecycle) --------

pub struct PairsTrading;

impl Strategy for PairsTrading {
    fn id(&self) -> &str {
        "a15_pairs_trading"
    }

    fn cooldown_window(&self) -> std::time::Duration {
        std::time::Duration::from_secs(60 * 60)
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        const ENTRY_THRESHOLD: f64 = 2.0;
        let Some(z) = ratio_zscore(&closes, 50, 60) else { return Vec::new() };
        let price = *closes.last().unwrap();
        let confidence = (0.5 + (z.abs() / 5.0).min(0.4)).min(0.9);

        if z < -ENTRY_THRESHOLD {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A15_PAIRS_UNDERVALUED".into()), Action::Buy, price, 1,
                confidence, format!("pair ratio z-score {z:.2} below -{ENTRY_THRESHOLD}"), now,
            )
            .into_iter()
            .collect();
        }
        if z > ENTRY_THRESHOLD {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A15_PAIRS_OVERVALUED".into()), Action::Sell, price, 1,
                confidence, format!("pair ratio z-score {z:.2} above {ENTRY_THRESHOLD}"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }

    fn check_exit_conditions(&self, symbol: &str, position: &Position, price: f64, now: DateTime<Utc>, bars: Option<&BarSeries>) -> Option<Signal> {
        let bars = bars?;
        const EXIT_THRESHOLD: f64 = 0.5;
        let z = ratio_zscore(&bars.closes(), 50, 60)?;
        if z.abs() <= EXIT_THRESHOLD {
            let action = if position.is_long() { Action::Sell } else { Action::Buy };
            return entry_signal(
                symbol, self.id(), SignalType::Named("A15_PAIRS_EXIT".into()), action, price,
                position.size.unsigned_abs(), 0.5, format!("pair ratio reverted to mean (z={z:.2})"), now,
            );
        }
        None
    }
}

// --- A25: cointegration-proxy pairs trading (longer lookback, tighter z) ---

pub struct CointegrationPairs;

impl Strategy for CointegrationPairs {
    fn id(&self) -> &str {
        "a25_cointegration_pairs"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        const ZSCORE_ENTRY: f64 = 2.0;
        let Some(z) = ratio_zscore(&closes, 100, 252) else { return Vec::new() };
        let price = *closes.last().unwrap();
        let confidence = (0.5 + (z.abs() / 5.0).min(0.4)).min(0.9);

        if z < -ZSCORE_ENTRY {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A25_COINT_UNDERVALUED".into()), Action::Buy, price, 1,
                confidence, format!("long-horizon ratio z-score {z:.2} below -{ZSCORE_ENTRY}"), now,
            )
            .into_iter()
            .collect();
        }
        if z > ZSCORE_ENTRY {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A25_COINT_OVERVALUED".into()), Action::Sell, price, 1,
                confidence, format!("long-horizon ratio z-score {z:.2} above {ZSCORE_ENTRY}"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }

    fn check_exit_conditions(&self, symbol: &str, position: &Position, price: f64, now: DateTime<Utc>, bars: Option<&BarSeries>) -> Option<Signal> {
        let bars = bars?;
        const ZSCORE_EXIT: f64 = 0.5;
        let z = ratio_zscore(&bars.closes(), 100, 252)?;
        if z.abs() <= ZSCORE_EXIT {
            let action = if position.is_long() { Action::Sell } else { Action::Buy };
            return entry_signal(
                symbol, self.id(), SignalType::Named("A25_COINT_EXIT".into()), action, price,
                position.size.unsigned_abs(), 0.5, format!("long-horizon ratio reverted to mean (z={z:.2})"), now,
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_zscore_none_on_flat_series() {
        let closes = vec![100.0; 200];
        assert!(ratio_zscore(&closes, 50, 60).is_none());
    }

    #[test]
    fn ratio_zscore_detects_deviation() {
        let mut closes: Vec<f64> = (0..120).map(|_| 100.0).collect();
        closes.push(130.0);
        let z = ratio_zscore(&closes, 50, 60).unwrap();
        assert!(z > 0.0);
    }
}

// A30 — IBD-style relative-strength rating. Without a benchmark index feed
// this engine falls back to the same technical-strength proxy the source
// strategy uses when no benchmark is supplied: price-to-MA50 ratio times the
// MA50/MA200 trend ratio, scaled into a 0-100 rating.

use chrono::{DateTime, Utc};

use crate::indicators::sma::current_sma;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::entry_signal;
use crate::types::{Action, BarSeries, IndicatorSet, Signal, SignalType};

const RS_RATING_THRESHOLD: f64 = 70.0;

fn rs_proxy(bars: &BarSeries) -> Option<f64> {
    let closes = bars.closes();
    let sma50 = current_sma(&closes, 50)?;
    let sma200 = current_sma(&closes, 200)?;
    if sma50 <= 0.0 || sma200 <= 0.0 {
        return None;
    }
    let price = *closes.last()?;
    let price_to_ma_ratio = price / sma50;
    let ma_trend = sma50 / sma200;
    Some((price_to_ma_ratio * ma_trend * 25.0).clamp(0.0, 100.0))
}

pub struct RsRating;

impl Strategy for RsRating {
    fn id(&self) -> &str {
        "a30_rs_rating"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let Some(rating) = rs_proxy(bars) else { return Vec::new() };
        if rating < RS_RATING_THRESHOLD {
            return Vec::new();
        }
        let price = *bars.closes().last().unwrap();
        entry_signal(
            symbol, self.id(), SignalType::Named("A30_RS_RATING_STRONG".into()), Action::Buy, price, 1,
            ((rating - RS_RATING_THRESHOLD) / 30.0).clamp(0.3, 0.9), format!("RS rating proxy {rating:.0}"), now,
        )
        .into_iter()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::types::Bar;

    fn bar(ts: i64, close: f64) -> Bar {
        Bar { timestamp: Utc.timestamp_opt(ts, 0).unwrap(), open: close, high: close, low: close, close, volume: 1_000 }
    }

    #[test]
    fn rs_proxy_none_below_200_bars() {
        let bars = BarSeries::new((0..50).map(|i| bar(i * 60, 100.0)).collect()).unwrap();
        assert!(rs_proxy(&bars).is_none());
    }

    #[test]
    fn rs_proxy_flat_series_is_neutral() {
        let bars = BarSeries::new((0..250).map(|i| bar(i * 60, 100.0)).collect()).unwrap();
        let rating = rs_proxy(&bars).unwrap();
        assert!((rating - 25.0).abs() < 1e-6);
    }
}

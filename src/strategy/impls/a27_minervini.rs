// A27 — Minervini trend template. Enters when all of the trend-template
// conditions hold with a volume surge confirming institutional interest;
// exits as soon as any template condition breaks. Cooldown of 24 hours
// (position-level strategy, not a scalping oscillator).

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::indicators::sma::current_sma;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::{entry_signal, volume_ratio};
use crate::types::{Action, BarSeries, IndicatorSet, Position, Signal, SignalType};

const MIN_PRICE_INCREASE_FROM_LOW: f64 = 1.3;
const MAX_DECLINE_FROM_HIGH: f64 = 0.75;

fn template_holds(bars: &BarSeries) -> Option<bool> {
    let closes = bars.closes();
    let highs = bars.highs();
    let lows = bars.lows();
    if closes.len() < 252 {
        return None;
    }
    let price = *closes.last().unwrap();
    let sma50 = current_sma(&closes, 50)?;
    let sma150 = current_sma(&closes, 150)?;
    let sma200 = current_sma(&closes, 200)?;

    let sma200_series = crate::indicators::sma::calculate_sma(&closes, 200);
    let sma200_20_ago = sma200_series.get(sma200_series.len().wrapping_sub(21)).copied().unwrap_or(sma200);
    let sma200_rising = !sma200_20_ago.is_finite() || sma200 > sma200_20_ago;

    let high_52w = highs[highs.len() - 252..].iter().cloned().fold(f64::MIN, f64::max);
    let low_52w = lows[lows.len() - 252..].iter().cloned().fold(f64::MAX, f64::min);

    Some(
        price > sma150
            && sma150 > sma200
            && sma200_rising
            && price > sma50
            && price >= MIN_PRICE_INCREASE_FROM_LOW * low_52w
            && price >= MAX_DECLINE_FROM_HIGH * high_52w,
    )
}

pub struct MinerviniTrend;

impl Strategy for MinerviniTrend {
    fn id(&self) -> &str {
        "a27_minervini_trend"
    }

    fn cooldown_window(&self) -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let Some(true) = template_holds(bars) else { return Vec::new() };
        if volume_ratio(bars, 20) < 1.5 {
            return Vec::new();
        }
        let closes = bars.closes();
        let price = *closes.last().unwrap();
        let Some(sma50) = current_sma(&closes, 50) else { return Vec::new() };
        let ratio = price / sma50;
        let confidence = (0.6 + (ratio - 1.0) * 2.0).min(0.9);

        entry_signal(
            symbol, self.id(), SignalType::Named("A27_MINERVINI_BUY".into()), Action::Buy, price, 1,
            confidence.max(0.3), "Minervini trend template satisfied with volume surge", now,
        )
        .into_iter()
        .collect()
    }

    fn check_exit_conditions(&self, symbol: &str, position: &Position, price: f64, now: DateTime<Utc>, bars: Option<&BarSeries>) -> Option<Signal> {
        let bars = bars?;
        if !position.is_long() {
            return None;
        }
        if template_holds(bars) == Some(false) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A27_MINERVINI_TEMPLATE_BROKEN".into()), Action::Sell, price,
                position.size.unsigned_abs(), 0.8, "Minervini trend template conditions no longer hold", now,
            );
        }
        None
    }
}

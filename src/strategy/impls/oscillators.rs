// A8–A31 single-indicator oscillator state machines. Each strategy here
// follows the same shape: compute the indicator, detect a last-bar cross
// into an actionable zone, confirm with a deterministic confidence function
// of the indicator's distance from its threshold, and emit a single BUY or
// SELL signal. Dedicated files exist for strategies that need more than a
// plain cross detector (pairs trading, isolation forest, Super-Trend,
// Aroon, Minervini, RS rating, pivot points, linear regression, MLP).

use chrono::{DateTime, Utc};

use crate::indicators::cci::current_cci;
use crate::indicators::ema::calculate_ema;
use crate::indicators::macd::calculate_macd;
use crate::indicators::mfi::current_mfi;
use crate::indicators::roc::calculate_roc;
use crate::indicators::rsi::calculate_rsi;
use crate::indicators::sma::calculate_sma;
use crate::indicators::stoch_rsi::current_stoch_rsi;
use crate::indicators::ultimate::current_ultimate_oscillator;
use crate::indicators::williams_r::current_williams_r;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::{distance_confidence, entry_signal};
use crate::types::{Action, BarSeries, IndicatorSet, Position, Signal, SignalType};

fn cross_up(prev: f64, current: f64, level: f64) -> bool {
    prev <= level && current > level
}

fn cross_down(prev: f64, current: f64, level: f64) -> bool {
    prev >= level && current < level
}

// --- A8: RSI oscillator (oversold=30, overbought=70) ---------------------

pub struct RsiOscillator;

impl Strategy for RsiOscillator {
    fn id(&self) -> &str {
        "a8_rsi_oscillator"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        let rsi = calculate_rsi(&closes, 14);
        if rsi.len() < 2 {
            return Vec::new();
        }
        let (prev, current) = (rsi[rsi.len() - 2], rsi[rsi.len() - 1]);
        if !prev.is_finite() || !current.is_finite() {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        if cross_up(prev, current, 30.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A8_RSI_OVERSOLD_CROSS".into()), Action::Buy, price, 1,
                distance_confidence(current, 30.0, 20.0, 0.3), format!("RSI crossed above 30 ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        if cross_down(prev, current, 70.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A8_RSI_OVERBOUGHT_CROSS".into()), Action::Sell, price, 1,
                distance_confidence(current, 70.0, 20.0, 0.3), format!("RSI crossed below 70 ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }

    fn check_exit_conditions(&self, symbol: &str, position: &Position, price: f64, now: DateTime<Utc>, bars: Option<&BarSeries>) -> Option<Signal> {
        let bars = bars?;
        let rsi = calculate_rsi(&bars.closes(), 14);
        let current = *rsi.last()?;
        if !current.is_finite() {
            return None;
        }
        let should_exit = if position.is_long() { current >= 70.0 } else { current <= 30.0 };
        should_exit.then(|| {
            let action = if position.is_long() { Action::Sell } else { Action::Buy };
            entry_signal(
                symbol, self.id(), SignalType::Named("A8_RSI_EXIT".into()), action, price,
                position.size.unsigned_abs(), 0.5, "RSI reached opposite extreme", now,
            )
        })
        .flatten()
    }
}

// --- A9: MACD crossover ----------------------------------------------------

pub struct MacdCrossover;

impl Strategy for MacdCrossover {
    fn id(&self) -> &str {
        "a9_macd_crossover"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        let Some(macd) = calculate_macd(&closes, 12, 26, 9) else { return Vec::new() };
        if macd.histogram.len() < 2 {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        let n = macd.histogram.len();
        let (prev_h, current_h) = (macd.histogram[n - 2], macd.histogram[n - 1]);
        if !prev_h.is_finite() || !current_h.is_finite() {
            return Vec::new();
        }
        const HISTOGRAM_THRESHOLD: f64 = 0.1;
        if prev_h <= 0.0 && current_h > HISTOGRAM_THRESHOLD {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A9_MACD_BULL_CROSS".into()), Action::Buy, price, 1,
                distance_confidence(current_h, 0.0, 1.0, 0.3), format!("MACD histogram turned positive ({current_h:.3})"), now,
            )
            .into_iter()
            .collect();
        }
        if prev_h >= 0.0 && current_h < -HISTOGRAM_THRESHOLD {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A9_MACD_BEAR_CROSS".into()), Action::Sell, price, 1,
                distance_confidence(current_h, 0.0, 1.0, 0.3), format!("MACD histogram turned negative ({current_h:.3})"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

// --- A10: Bollinger Bands breakout -----------------------------------------

pub struct BollingerBands;

impl Strategy for BollingerBands {
    fn id(&self) -> &str {
        "a10_bollinger_bands"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        use crate::indicators::bollinger::calculate_bollinger;
        let closes = bars.closes();
        let Some(bands) = calculate_bollinger(&closes, 20, 2.0) else { return Vec::new() };
        let price = *closes.last().unwrap();
        const BREAKOUT_PCT: f64 = 0.001;
        if price > bands.upper * (1.0 + BREAKOUT_PCT) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A10_BB_BREAKOUT_UP".into()), Action::Buy, price, 1,
                distance_confidence(price, bands.upper, bands.upper * 0.02, 0.3), "price broke above upper band", now,
            )
            .into_iter()
            .collect();
        }
        if price < bands.lower * (1.0 - BREAKOUT_PCT) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A10_BB_BREAKOUT_DOWN".into()), Action::Sell, price, 1,
                distance_confidence(price, bands.lower, bands.lower * 0.02, 0.3), "price broke below lower band", now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }

    fn check_exit_conditions(&self, symbol: &str, position: &Position, price: f64, now: DateTime<Utc>, bars: Option<&BarSeries>) -> Option<Signal> {
        use crate::indicators::bollinger::calculate_bollinger;
        let bars = bars?;
        let bands = calculate_bollinger(&bars.closes(), 20, 2.0)?;
        let reverted = if position.is_long() { price <= bands.middle } else { price >= bands.middle };
        reverted.then(|| {
            let action = if position.is_long() { Action::Sell } else { Action::Buy };
            entry_signal(
                symbol, self.id(), SignalType::Named("A10_BB_EXIT".into()), action, price,
                position.size.unsigned_abs(), 0.5, "price reverted to middle band", now,
            )
        })
        .flatten()
    }
}

// --- A11: moving-average crossover (fast 9 / slow 21, SMA) -----------------

pub struct MovingAverageCrossover;

impl Strategy for MovingAverageCrossover {
    fn id(&self) -> &str {
        "a11_moving_average_crossover"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        let fast = calculate_sma(&closes, 9);
        let slow = calculate_sma(&closes, 21);
        if fast.len() < 2 || slow.len() < 2 {
            return Vec::new();
        }
        let n = fast.len();
        let (prev_fast, current_fast) = (fast[n - 2], fast[n - 1]);
        let (prev_slow, current_slow) = (slow[n - 2], slow[n - 1]);
        if ![prev_fast, current_fast, prev_slow, current_slow].iter().all(|v| v.is_finite()) {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        if prev_fast <= prev_slow && current_fast > current_slow {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A11_MA_GOLDEN_CROSS".into()), Action::Buy, price, 1,
                distance_confidence(current_fast, current_slow, current_slow * 0.01, 0.3), "fast MA crossed above slow MA", now,
            )
            .into_iter()
            .collect();
        }
        if prev_fast >= prev_slow && current_fast < current_slow {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A11_MA_DEATH_CROSS".into()), Action::Sell, price, 1,
                distance_confidence(current_fast, current_slow, current_slow * 0.01, 0.3), "fast MA crossed below slow MA", now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

// --- A12: Stochastic RSI (oversold=0.2, overbought=0.8) ---------------------

pub struct StochasticRsi;

impl Strategy for StochasticRsi {
    fn id(&self) -> &str {
        "a12_stochastic_rsi"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        if closes.len() < 29 {
            return Vec::new();
        }
        let Some(current) = current_stoch_rsi(&closes, 14, 14) else { return Vec::new() };
        let Some(prev) = current_stoch_rsi(&closes[..closes.len() - 1], 14, 14) else { return Vec::new() };
        let price = *closes.last().unwrap();
        if cross_up(prev, current, 0.2) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A12_STOCH_RSI_OVERSOLD".into()), Action::Buy, price, 1,
                distance_confidence(current, 0.2, 0.3, 0.3), format!("Stochastic RSI crossed above 0.2 ({current:.2})"), now,
            )
            .into_iter()
            .collect();
        }
        if cross_down(prev, current, 0.8) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A12_STOCH_RSI_OVERBOUGHT".into()), Action::Sell, price, 1,
                distance_confidence(current, 0.8, 0.3, 0.3), format!("Stochastic RSI crossed below 0.8 ({current:.2})"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

// --- A13: EMA crossover (short 9 / long 21) ---------------------------------

pub struct EmaCrossover;

impl Strategy for EmaCrossover {
    fn id(&self) -> &str {
        "a13_ema_crossover"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        let short = calculate_ema(&closes, 9);
        let long = calculate_ema(&closes, 21);
        if short.len() < 2 || long.len() < 2 {
            return Vec::new();
        }
        let n = short.len();
        let (prev_short, current_short) = (short[n - 2], short[n - 1]);
        let (prev_long, current_long) = (long[n - 2], long[n - 1]);
        if ![prev_short, current_short, prev_long, current_long].iter().all(|v| v.is_finite()) {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        if prev_short <= prev_long && current_short > current_long {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A13_EMA_BULL_CROSS".into()), Action::Buy, price, 1,
                distance_confidence(current_short, current_long, current_long * 0.01, 0.3), "short EMA crossed above long EMA", now,
            )
            .into_iter()
            .collect();
        }
        if prev_short >= prev_long && current_short < current_long {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A13_EMA_BEAR_CROSS".into()), Action::Sell, price, 1,
                distance_confidence(current_short, current_long, current_long * 0.01, 0.3), "short EMA crossed below long EMA", now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

// --- A14: RSI trendline (RSI mean vs. long-period trend MA) -----------------

pub struct RsiTrendline;

impl Strategy for RsiTrendline {
    fn id(&self) -> &str {
        "a14_rsi_trendline"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        if closes.len() < 60 {
            return Vec::new();
        }
        let rsi = calculate_rsi(&closes, 14);
        let Some(trend_ma) = crate::indicators::sma::current_sma(&closes, 50) else { return Vec::new() };
        let lookback = 5.min(rsi.len());
        let window = &rsi[rsi.len() - lookback..];
        if window.iter().any(|v| !v.is_finite()) {
            return Vec::new();
        }
        let recent_rsi_avg = window.iter().sum::<f64>() / lookback as f64;
        let price = *closes.last().unwrap();

        if price > trend_ma && recent_rsi_avg > 55.0 {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A14_RSI_TRENDLINE_LONG".into()), Action::Buy, price, 1,
                distance_confidence(recent_rsi_avg, 55.0, 15.0, 0.3), format!("RSI trend average {recent_rsi_avg:.1} above 55 in uptrend"), now,
            )
            .into_iter()
            .collect();
        }
        if price < trend_ma && recent_rsi_avg < 45.0 {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A14_RSI_TRENDLINE_SHORT".into()), Action::Sell, price, 1,
                distance_confidence(recent_rsi_avg, 45.0, 15.0, 0.3), format!("RSI trend average {recent_rsi_avg:.1} below 45 in downtrend"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

// --- A16: ROC momentum -------------------------------------------------------

pub struct RocMomentum;

impl Strategy for RocMomentum {
    fn id(&self) -> &str {
        "a16_roc"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        let roc = calculate_roc(&closes, 12);
        if roc.len() < 2 {
            return Vec::new();
        }
        let n = roc.len();
        let (prev, current) = (roc[n - 2], roc[n - 1]);
        if !prev.is_finite() || !current.is_finite() {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        if cross_up(prev, current, 0.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A16_ROC_TURNED_POSITIVE".into()), Action::Buy, price, 1,
                distance_confidence(current, 0.0, 5.0, 0.3), format!("ROC turned positive ({current:.2}%)"), now,
            )
            .into_iter()
            .collect();
        }
        if cross_down(prev, current, 0.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A16_ROC_TURNED_NEGATIVE".into()), Action::Sell, price, 1,
                distance_confidence(current, 0.0, 5.0, 0.3), format!("ROC turned negative ({current:.2}%)"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

// --- A17: CCI (oversold=-100, overbought=100) -------------------------------

pub struct CciOscillator;

impl Strategy for CciOscillator {
    fn id(&self) -> &str {
        "a17_cci"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        let highs = bars.highs();
        let lows = bars.lows();
        if closes.len() < 21 {
            return Vec::new();
        }
        let Some(current) = current_cci(&highs, &lows, &closes, 20) else { return Vec::new() };
        let Some(prev) = current_cci(&highs[..highs.len() - 1], &lows[..lows.len() - 1], &closes[..closes.len() - 1], 20) else {
            return Vec::new();
        };
        let price = *closes.last().unwrap();
        if cross_up(prev, current, -100.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A17_CCI_OVERSOLD_CROSS".into()), Action::Buy, price, 1,
                distance_confidence(current, -100.0, 100.0, 0.3), format!("CCI crossed above -100 ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        if cross_down(prev, current, 100.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A17_CCI_OVERBOUGHT_CROSS".into()), Action::Sell, price, 1,
                distance_confidence(current, 100.0, 100.0, 0.3), format!("CCI crossed below 100 ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

// --- A24: Ultimate Oscillator (oversold=30, overbought=70) ------------------

pub struct UltimateOscillator;

impl Strategy for UltimateOscillator {
    fn id(&self) -> &str {
        "a24_ultimate_oscillator"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let highs = bars.highs();
        let lows = bars.lows();
        let closes = bars.closes();
        if closes.len() < 29 {
            return Vec::new();
        }
        let Some(current) = current_ultimate_oscillator(&highs, &lows, &closes, 7, 14, 28) else { return Vec::new() };
        let prev_closes = &closes[..closes.len() - 1];
        let prev_highs = &highs[..highs.len() - 1];
        let prev_lows = &lows[..lows.len() - 1];
        let Some(prev) = current_ultimate_oscillator(prev_highs, prev_lows, prev_closes, 7, 14, 28) else { return Vec::new() };
        let price = *closes.last().unwrap();
        if cross_up(prev, current, 30.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A24_UO_OVERSOLD_CROSS".into()), Action::Buy, price, 1,
                distance_confidence(current, 30.0, 20.0, 0.3), format!("Ultimate Oscillator crossed above 30 ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        if cross_down(prev, current, 70.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A24_UO_OVERBOUGHT_CROSS".into()), Action::Sell, price, 1,
                distance_confidence(current, 70.0, 20.0, 0.3), format!("Ultimate Oscillator crossed below 70 ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

// --- A26: Williams %R (oversold=-80, overbought=-20) ------------------------

pub struct WilliamsR;

impl Strategy for WilliamsR {
    fn id(&self) -> &str {
        "a26_williams_r"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let highs = bars.highs();
        let lows = bars.lows();
        let closes = bars.closes();
        if closes.len() < 15 {
            return Vec::new();
        }
        let Some(current) = current_williams_r(&highs, &lows, &closes, 14) else { return Vec::new() };
        let Some(prev) = current_williams_r(&highs[..highs.len() - 1], &lows[..lows.len() - 1], &closes[..closes.len() - 1], 14) else {
            return Vec::new();
        };
        let price = *closes.last().unwrap();
        if cross_up(prev, current, -80.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A26_WILLIAMS_R_OVERSOLD_CROSS".into()), Action::Buy, price, 1,
                distance_confidence(current, -80.0, 20.0, 0.3), format!("Williams %R crossed above -80 ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        if cross_down(prev, current, -20.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A26_WILLIAMS_R_OVERBOUGHT_CROSS".into()), Action::Sell, price, 1,
                distance_confidence(current, -20.0, 20.0, 0.3), format!("Williams %R crossed below -20 ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

// --- A28: True Strength Index (zero-line cross) -----------------------------

pub struct TrueStrengthIndex;

fn tsi_series(closes: &[f64], r: usize, s: usize) -> Vec<f64> {
    if closes.len() < 2 {
        return Vec::new();
    }
    let momentum: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let abs_momentum: Vec<f64> = momentum.iter().map(|m| m.abs()).collect();
    let smoothed_momentum = calculate_ema(&calculate_ema(&momentum, r), s);
    let smoothed_abs = calculate_ema(&calculate_ema(&abs_momentum, r), s);
    smoothed_momentum
        .iter()
        .zip(smoothed_abs.iter())
        .map(|(m, a)| if *a != 0.0 && a.is_finite() && m.is_finite() { 100.0 * m / a } else { f64::NAN })
        .collect()
}

impl Strategy for TrueStrengthIndex {
    fn id(&self) -> &str {
        "a28_true_strength_index"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        let tsi = tsi_series(&closes, 25, 13);
        if tsi.len() < 2 {
            return Vec::new();
        }
        let n = tsi.len();
        let (prev, current) = (tsi[n - 2], tsi[n - 1]);
        if !prev.is_finite() || !current.is_finite() {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        if cross_up(prev, current, 0.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A28_TSI_BULL_CROSS".into()), Action::Buy, price, 1,
                distance_confidence(current, 0.0, 15.0, 0.3), format!("TSI crossed above zero ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        if cross_down(prev, current, 0.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A28_TSI_BEAR_CROSS".into()), Action::Sell, price, 1,
                distance_confidence(current, 0.0, 15.0, 0.3), format!("TSI crossed below zero ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

// --- A29: Stochastic oscillator (%K/%D, oversold=20, overbought=80) ---------

pub struct StochasticOscillator;

fn stochastic_kd(highs: &[f64], lows: &[f64], closes: &[f64], k_period: usize, d_period: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    if highs.len() < k_period || highs.len() != lows.len() || highs.len() != closes.len() {
        return None;
    }
    let mut k = vec![f64::NAN; closes.len()];
    for i in k_period - 1..closes.len() {
        let window_h = &highs[i + 1 - k_period..=i];
        let window_l = &lows[i + 1 - k_period..=i];
        let hh = window_h.iter().cloned().fold(f64::MIN, f64::max);
        let ll = window_l.iter().cloned().fold(f64::MAX, f64::min);
        k[i] = if hh > ll { 100.0 * (closes[i] - ll) / (hh - ll) } else { 50.0 };
    }
    let d = calculate_sma(&k, d_period);
    Some((k, d))
}

impl Strategy for StochasticOscillator {
    fn id(&self) -> &str {
        "a29_stochastic_oscillator"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let highs = bars.highs();
        let lows = bars.lows();
        let closes = bars.closes();
        let Some((k, d)) = stochastic_kd(&highs, &lows, &closes, 14, 3) else { return Vec::new() };
        if k.len() < 2 || d.len() < 2 {
            return Vec::new();
        }
        let n = k.len();
        let (prev_k, current_k) = (k[n - 2], k[n - 1]);
        let (prev_d, current_d) = (d[n - 2], d[n - 1]);
        if ![prev_k, current_k, prev_d, current_d].iter().all(|v| v.is_finite()) {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        if prev_k <= 20.0 && prev_d <= 20.0 && current_k > current_d {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A29_STOCH_OVERSOLD_CROSS".into()), Action::Buy, price, 1,
                distance_confidence(current_k, 20.0, 20.0, 0.3), format!("%K crossed above %D in oversold zone ({current_k:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        if prev_k >= 80.0 && prev_d >= 80.0 && current_k < current_d {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A29_STOCH_OVERBOUGHT_CROSS".into()), Action::Sell, price, 1,
                distance_confidence(current_k, 80.0, 20.0, 0.3), format!("%K crossed below %D in overbought zone ({current_k:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

// --- A31: Money Flow Index (oversold=20, overbought=80) ---------------------

pub struct MoneyFlowIndex;

impl Strategy for MoneyFlowIndex {
    fn id(&self) -> &str {
        "a31_money_flow_index"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let highs = bars.highs();
        let lows = bars.lows();
        let closes = bars.closes();
        let volumes: Vec<f64> = bars.volumes();
        if closes.len() < 15 {
            return Vec::new();
        }
        let Some(current) = current_mfi(&highs, &lows, &closes, &volumes, 14) else { return Vec::new() };
        let Some(prev) = current_mfi(
            &highs[..highs.len() - 1],
            &lows[..lows.len() - 1],
            &closes[..closes.len() - 1],
            &volumes[..volumes.len() - 1],
            14,
        ) else {
            return Vec::new();
        };
        let price = *closes.last().unwrap();
        if cross_up(prev, current, 20.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A31_MFI_OVERSOLD_CROSS".into()), Action::Buy, price, 1,
                distance_confidence(current, 20.0, 20.0, 0.3), format!("MFI crossed above 20 ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        if cross_down(prev, current, 80.0) {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A31_MFI_OVERBOUGHT_CROSS".into()), Action::Sell, price, 1,
                distance_confidence(current, 80.0, 20.0, 0.3), format!("MFI crossed below 80 ({current:.1})"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_up_detects_upward_threshold_crossing() {
        assert!(cross_up(29.0, 31.0, 30.0));
        assert!(!cross_up(31.0, 32.0, 30.0));
    }

    #[test]
    fn cross_down_detects_downward_threshold_crossing() {
        assert!(cross_down(71.0, 69.0, 70.0));
        assert!(!cross_down(69.0, 68.0, 70.0));
    }
}

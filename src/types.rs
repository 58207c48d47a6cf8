// =============================================================================
// Core data model — Bar, Signal, Position, TradeRecord, AccountSnapshot
// =============================================================================

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the engine is actively trading, paused, or killed. Orthogonal to
/// the cycle controller's `ControllerState` machine (§4.7) — this is the
/// operator-facing switch; `ControllerState` is the process lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradingMode {
    Live,
    Paused,
    Killed,
}

impl Default for TradingMode {
    fn default() -> Self {
        Self::Paused
    }
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "Live"),
            Self::Paused => write!(f, "Paused"),
            Self::Killed => write!(f, "Killed"),
        }
    }
}

// =============================================================================
// Bars
// =============================================================================

/// One OHLCV sample for a symbol over an interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// An ordered, duplicate-free sequence of bars ascending by timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a `BarSeries` from already-sorted, already-deduplicated bars.
    ///
    /// Returns `None` if timestamps are not strictly ascending — callers at
    /// the adapter boundary are expected to have already dropped malformed
    /// rows (§4.2); this is a cheap invariant check, not a repair step.
    pub fn new(bars: Vec<Bar>) -> Option<Self> {
        if bars.windows(2).any(|w| w[0].timestamp >= w[1].timestamp) {
            return None;
        }
        Some(Self { bars })
    }

    pub fn empty() -> Self {
        Self { bars: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }
}

/// Opaque mapping from indicator name to either a scalar or a short series.
/// The strategy owns which keys it reads; the adapter only guarantees the
/// keys it documents it computes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub scalars: HashMap<String, f64>,
    pub series: HashMap<String, Vec<f64>>,
}

impl IndicatorSet {
    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.scalars.get(name).copied()
    }

    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }
}

// =============================================================================
// Signal
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Mkt,
    Lmt,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalType {
    MomentumEntry,
    ReversalEntry,
    ZscoreOversold,
    ZscoreOverbought,
    MaGoldenCross,
    MaDeathCross,
    BbUpperBreakout,
    BbLowerBreakout,
    StopLoss,
    TakeProfit,
    MaxHolding,
    TrailingStop,
    ForceClose,
    MarketClose,
    PartialExit,
    CloseAllPositions,
    /// Per-strategy named variant (e.g. "A22_SUPERTREND_FLIP").
    Named(String),
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalType::MomentumEntry => write!(f, "MOMENTUM_ENTRY"),
            SignalType::ReversalEntry => write!(f, "REVERSAL_ENTRY"),
            SignalType::ZscoreOversold => write!(f, "ZSCORE_OVERSOLD"),
            SignalType::ZscoreOverbought => write!(f, "ZSCORE_OVERBOUGHT"),
            SignalType::MaGoldenCross => write!(f, "MA_GOLDEN_CROSS"),
            SignalType::MaDeathCross => write!(f, "MA_DEATH_CROSS"),
            SignalType::BbUpperBreakout => write!(f, "BB_UPPER_BREAKOUT"),
            SignalType::BbLowerBreakout => write!(f, "BB_LOWER_BREAKOUT"),
            SignalType::StopLoss => write!(f, "STOP_LOSS"),
            SignalType::TakeProfit => write!(f, "TAKE_PROFIT"),
            SignalType::MaxHolding => write!(f, "MAX_HOLDING"),
            SignalType::TrailingStop => write!(f, "TRAILING_STOP"),
            SignalType::ForceClose => write!(f, "FORCE_CLOSE"),
            SignalType::MarketClose => write!(f, "MARKET_CLOSE"),
            SignalType::PartialExit => write!(f, "PARTIAL_EXIT"),
            SignalType::CloseAllPositions => write!(f, "CLOSE_ALL_POSITIONS"),
            SignalType::Named(name) => write!(f, "{name}"),
        }
    }
}

/// An intent-to-trade record produced by a strategy.
///
/// Invariant (enforced by `Signal::new`): `position_size > 0`,
/// `0.0 <= confidence <= 1.0`, `reference_price > 0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub strategy_id: String,
    pub signal_type: SignalType,
    pub action: Action,
    pub reference_price: f64,
    pub position_size: u64,
    pub confidence: f64,
    pub reason: String,
    pub indicators_snapshot: Option<HashMap<String, f64>>,
    pub force_market_order: bool,
    pub signal_hash: String,
    pub generated_at: DateTime<Utc>,
}

impl Signal {
    /// Construct a signal, computing its hash from the identifying fields.
    /// Returns `None` if the data-model invariant would be violated.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        strategy_id: impl Into<String>,
        signal_type: SignalType,
        action: Action,
        reference_price: f64,
        position_size: u64,
        confidence: f64,
        reason: impl Into<String>,
        force_market_order: bool,
        generated_at: DateTime<Utc>,
    ) -> Option<Self> {
        if position_size == 0 || !(0.0..=1.0).contains(&confidence) || reference_price <= 0.0 {
            return None;
        }
        let symbol = symbol.into();
        let reason = reason.into();
        let signal_hash = crate::strategy::hash::signal_hash(
            &symbol,
            &signal_type.to_string(),
            action,
            &reason,
            reference_price,
        );
        Some(Self {
            symbol,
            strategy_id: strategy_id.into(),
            signal_type,
            action,
            reference_price,
            position_size,
            confidence,
            reason,
            indicators_snapshot: None,
            force_market_order,
            signal_hash,
            generated_at,
        })
    }

    pub fn with_snapshot(mut self, snapshot: HashMap<String, f64>) -> Self {
        self.indicators_snapshot = Some(snapshot);
        self
    }
}

// =============================================================================
// Position
// =============================================================================

/// Per-symbol, per-strategy position cache entry.
///
/// Invariant: a `Position` is present in the owning map iff `size != 0`;
/// zero size implies deletion (see `StrategyState::positions`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Signed share count: positive = long, negative = short.
    pub size: i64,
    pub avg_cost: f64,
    pub entry_time: DateTime<Utc>,
    pub highest_price: Option<f64>,
    pub lowest_price: Option<f64>,
}

impl Position {
    pub fn new(size: i64, avg_cost: f64, entry_time: DateTime<Utc>) -> Self {
        Self {
            size,
            avg_cost,
            entry_time,
            highest_price: None,
            lowest_price: None,
        }
    }

    pub fn is_long(&self) -> bool {
        self.size > 0
    }

    pub fn is_short(&self) -> bool {
        self.size < 0
    }

    /// Sign-aware percentage change of `price` relative to `avg_cost`:
    /// positive for a long that has appreciated or a short that has
    /// depreciated (i.e. always "in our favor" when positive).
    pub fn price_change_pct(&self, price: f64) -> f64 {
        if self.avg_cost <= 0.0 {
            return 0.0;
        }
        let raw = (price - self.avg_cost) / self.avg_cost;
        if self.is_short() {
            -raw
        } else {
            raw
        }
    }

    /// Update the trailing watermarks. Must only be called from the exit
    /// check (§9 design note) — no other code path may mutate these fields.
    pub fn update_watermarks(&mut self, price: f64) {
        if self.is_long() {
            self.highest_price = Some(self.highest_price.map_or(price, |h| h.max(price)));
        } else if self.is_short() {
            self.lowest_price = Some(self.lowest_price.map_or(price, |l| l.min(price)));
        }
    }
}

// =============================================================================
// Trade record
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Pending,
    Executed,
    Failed,
    Cancelled,
    Error,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub action: Action,
    pub entry_price: f64,
    pub size: i64,
    pub timestamp: DateTime<Utc>,
    pub signal_type: SignalType,
    pub confidence: f64,
    pub status: TradeStatus,
    pub order_type: OrderType,
    pub order_id: Option<String>,
    pub order_status: Option<String>,
    pub reason: Option<String>,
    /// True when no live broker was used and the fill was simulated
    /// (Degraded-mode bookkeeping, §7).
    pub simulated: bool,
}

// =============================================================================
// Account
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub net_liquidation: f64,
    pub available_funds: f64,
}

impl Default for AccountSnapshot {
    fn default() -> Self {
        Self {
            net_liquidation: 0.0,
            available_funds: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn bar_series_rejects_non_ascending() {
        let bars = vec![
            Bar { timestamp: t(60), open: 1.0, high: 1.0, low: 1.0, close: 1.0, volume: 1 },
            Bar { timestamp: t(0), open: 1.0, high: 1.0, low: 1.0, close: 1.0, volume: 1 },
        ];
        assert!(BarSeries::new(bars).is_none());
    }

    #[test]
    fn bar_series_accepts_ascending() {
        let bars = vec![
            Bar { timestamp: t(0), open: 1.0, high: 1.0, low: 1.0, close: 1.0, volume: 1 },
            Bar { timestamp: t(60), open: 1.0, high: 1.0, low: 1.0, close: 2.0, volume: 1 },
        ];
        let series = BarSeries::new(bars).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![1.0, 2.0]);
    }

    #[test]
    fn signal_rejects_invalid_invariants() {
        let now = t(0);
        assert!(Signal::new("AAA", "a1", SignalType::MomentumEntry, Action::Buy, 10.0, 0, 0.5, "x", false, now).is_none());
        assert!(Signal::new("AAA", "a1", SignalType::MomentumEntry, Action::Buy, 10.0, 1, 1.5, "x", false, now).is_none());
        assert!(Signal::new("AAA", "a1", SignalType::MomentumEntry, Action::Buy, 0.0, 1, 0.5, "x", false, now).is_none());
    }

    #[test]
    fn signal_accepts_valid_invariants() {
        let now = t(0);
        let s = Signal::new("AAA", "a1", SignalType::MomentumEntry, Action::Buy, 10.0, 5, 0.5, "x", false, now).unwrap();
        assert_eq!(s.position_size, 5);
        assert_eq!(s.signal_hash.len(), 8);
    }

    #[test]
    fn position_price_change_pct_sign_aware_for_shorts() {
        let long = Position::new(10, 100.0, t(0));
        assert!((long.price_change_pct(110.0) - 0.10).abs() < 1e-9);

        let short = Position::new(-10, 100.0, t(0));
        // Price dropped -> favorable for a short -> positive change.
        assert!((short.price_change_pct(90.0) - 0.10).abs() < 1e-9);
        assert!((short.price_change_pct(110.0) + 0.10).abs() < 1e-9);
    }

    #[test]
    fn watermarks_track_extremes_per_direction() {
        let mut long = Position::new(10, 100.0, t(0));
        long.update_watermarks(105.0);
        long.update_watermarks(103.0);
        long.update_watermarks(110.0);
        assert_eq!(long.highest_price, Some(110.0));
        assert_eq!(long.lowest_price, None);
    }
}

// =============================================================================
// Strategy base — the generic lifecycle every concrete strategy rides on
// =============================================================================
//
// Owns: signal-hash cooldown tracking, the generic exit policy (trip order
// is fixed and applied before any strategy-specific exit logic), position
// sizing, and the order-submission gate sequence. Concrete strategies only
// ever implement `generate_signals` and, optionally, an extra exit check.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::broker::{BrokerClient, OrderStatus};
use crate::config::TradingConfig;
use crate::error::{EngineError, EngineResult};
use crate::types::{Action, BarSeries, IndicatorSet, OrderType, Position, Signal, SignalType, TradeRecord, TradeStatus};

/// The contract every concrete strategy (A1-A35) implements. `generate_signals`
/// is pure with respect to engine state — it only reads bars/indicators and
/// produces candidate signals; the base applies cooldown, sizing, and the
/// submission gate sequence around it.
pub trait Strategy: Send + Sync {
    fn id(&self) -> &str;

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal>;

    /// Optional strategy-specific exit check, evaluated after the generic
    /// exit policy finds no match. Default: no additional exit.
    fn check_exit_conditions(
        &self,
        _symbol: &str,
        _position: &Position,
        _price: f64,
        _now: DateTime<Utc>,
        _bars: Option<&BarSeries>,
    ) -> Option<Signal> {
        None
    }

    /// Strategy-specific cooldown window. Defaults to 15 minutes; strategies
    /// with non-default windows (A15, A27) override this.
    fn cooldown_window(&self) -> Duration {
        Duration::from_secs(15 * 60)
    }
}

// =============================================================================
// 4.4.1 — Signal hash cooldown
// =============================================================================

/// Tracks when each `signal_hash` last fired so near-duplicate signals within
/// a strategy-specific cooldown window are suppressed.
#[derive(Default)]
pub struct SignalCooldown {
    last_fired: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SignalCooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `hash` fired within `window` of `now`.
    pub fn in_cooldown(&self, hash: &str, now: DateTime<Utc>, window: Duration) -> bool {
        match self.last_fired.read().get(hash) {
            Some(last) => (now - *last).to_std().map(|elapsed| elapsed < window).unwrap_or(true),
            None => false,
        }
    }

    pub fn record(&self, hash: &str, now: DateTime<Utc>) {
        self.last_fired.write().insert(hash.to_string(), now);
    }
}

/// Prevents the same signal hash from firing twice within a single cycle,
/// even if two different strategies independently produce it.
#[derive(Default)]
pub struct ExecutedSignalSet {
    seen: RwLock<std::collections::HashSet<String>>,
}

impl ExecutedSignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this is the first time `hash` is seen this cycle.
    pub fn try_claim(&self, hash: &str) -> bool {
        self.seen.write().insert(hash.to_string())
    }

    pub fn clear(&self) {
        self.seen.write().clear();
    }
}

// =============================================================================
// 4.4.2 — Generic exit policy
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub enum ExitCheck {
    MaxHoldingTime,
    ForcedClose,
    StopLoss,
    TakeProfitTiered(f64),
    TakeProfitFlat,
    PnlTakeProfit,
}

pub struct ExitDecision {
    pub check: ExitCheck,
    pub confidence: f64,
}

const TIERED_TAKE_PROFIT: [(f64, f64); 4] = [(0.02, 0.7), (0.05, 0.8), (0.10, 0.9), (0.20, 1.0)];

/// Applied whenever `symbol` has an open position, before any
/// strategy-specific exit logic. Trip order is fixed; first match wins.
#[allow(clippy::too_many_arguments)]
pub fn check_generic_exit(
    position: &Position,
    price: f64,
    now: DateTime<Utc>,
    max_holding: Duration,
    force_close_time_reached: bool,
    stop_loss_pct: f64,
    take_profit_pct: Option<f64>,
    unrealized_pnl: Option<f64>,
    pnl_take_profit_threshold: Option<f64>,
) -> Option<ExitDecision> {
    let held_for = (now - position.entry_time).to_std().unwrap_or(Duration::ZERO);
    if held_for >= max_holding {
        return Some(ExitDecision { check: ExitCheck::MaxHoldingTime, confidence: 1.0 });
    }

    if force_close_time_reached {
        return Some(ExitDecision { check: ExitCheck::ForcedClose, confidence: 1.0 });
    }

    let change_pct = position.price_change_pct(price);

    if change_pct <= -stop_loss_pct {
        return Some(ExitDecision { check: ExitCheck::StopLoss, confidence: 1.0 });
    }

    if let Some(winning_tier) = TIERED_TAKE_PROFIT.iter().rev().find(|(threshold, _)| change_pct >= *threshold) {
        return Some(ExitDecision { check: ExitCheck::TakeProfitTiered(winning_tier.0), confidence: winning_tier.1 });
    }

    if let Some(tp_pct) = take_profit_pct {
        if change_pct >= tp_pct {
            return Some(ExitDecision { check: ExitCheck::TakeProfitFlat, confidence: 1.0 });
        }
    }

    if let (Some(pnl), Some(threshold)) = (unrealized_pnl, pnl_take_profit_threshold) {
        if pnl >= threshold {
            return Some(ExitDecision { check: ExitCheck::PnlTakeProfit, confidence: 1.0 });
        }
    }

    None
}

// =============================================================================
// 4.4.3 — Position sizing
// =============================================================================

pub struct PositionSizer;

impl PositionSizer {
    /// Returns the number of shares to trade, or `0` if any gate rejects the
    /// trade. `atr` should fall back to `price * 0.02` when unavailable.
    #[allow(clippy::too_many_arguments)]
    pub fn size(
        equity: f64,
        active_positions: u32,
        max_active_positions: u32,
        risk_per_trade: f64,
        confidence: f64,
        atr: f64,
        stop_loss_atr_multiple: f64,
        min_cash_buffer: f64,
        per_trade_notional_cap: f64,
        price: f64,
    ) -> u64 {
        if active_positions >= max_active_positions {
            return 0;
        }

        let risk_amount = equity * risk_per_trade * confidence;
        let risk_per_share = atr * stop_loss_atr_multiple;
        if risk_per_share <= 0.0 {
            return 0;
        }

        let shares_by_risk = (risk_amount / risk_per_share).floor().max(1.0);

        let equity_buffered = equity * (1.0 - min_cash_buffer);
        let max_notional = per_trade_notional_cap.min(equity_buffered);
        let shares_by_notional = if price > 0.0 { (max_notional / price).floor() } else { 0.0 };

        shares_by_risk.min(shares_by_notional).max(0.0) as u64
    }
}

// =============================================================================
// 4.4.4 — Order submission path
// =============================================================================

pub struct StrategyContext<'a> {
    pub broker: Option<&'a BrokerClient>,
    pub config: &'a TradingConfig,
    pub available_funds: f64,
    pub current_position: Option<&'a Position>,
    pub today_has_buy_entry: bool,
    pub outside_trading_hours: bool,
    pub simulation_mode: bool,
}

pub struct StrategyBase {
    pub cooldown: SignalCooldown,
    pub executed_this_cycle: ExecutedSignalSet,
}

impl Default for StrategyBase {
    fn default() -> Self {
        Self {
            cooldown: SignalCooldown::new(),
            executed_this_cycle: ExecutedSignalSet::new(),
        }
    }
}

impl StrategyBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the full ordered gate sequence from §4.4.4, returning the final
    /// trade record. The caller is responsible for persisting it to the
    /// journal regardless of terminal status.
    pub async fn submit(
        &self,
        signal: &Signal,
        ctx: &StrategyContext<'_>,
        cooldown_window: Duration,
        now: DateTime<Utc>,
    ) -> EngineResult<TradeRecord> {
        if signal.position_size == 0 {
            return Err(EngineError::BusinessReject("position_size must be > 0".into()));
        }

        if self.cooldown.in_cooldown(&signal.signal_hash, now, cooldown_window) {
            return Err(EngineError::BusinessReject("signal in cooldown".into()));
        }

        if ctx.broker.is_none() && !ctx.simulation_mode {
            return Err(EngineError::Degraded("no broker adapter and simulation mode disabled".into()));
        }

        let mut qty = signal.position_size;

        match signal.action {
            Action::Buy => {
                if ctx.config.same_day_sell_only && ctx.today_has_buy_entry {
                    return Err(EngineError::BusinessReject("same_day_sell_only: duplicate buy entry today".into()));
                }
                if ctx.available_funds != 0.0 && ctx.available_funds < 500.0 {
                    return Err(EngineError::BusinessReject("available funds below $500 floor".into()));
                }
                let notional = qty as f64 * signal.reference_price;
                if notional > ctx.available_funds {
                    let clamped = (ctx.available_funds / signal.reference_price).floor();
                    if clamped < 1.0 {
                        return Err(EngineError::BusinessReject("clamped buy quantity below 1 share".into()));
                    }
                    qty = clamped as u64;
                }
            }
            Action::Sell => {
                let current = ctx.current_position;
                match current {
                    None if !ctx.config.short_selling_enabled => {
                        return Err(EngineError::BusinessReject("no position and short selling disabled".into()));
                    }
                    Some(pos) if pos.is_long() => {
                        qty = qty.min(pos.size.unsigned_abs());
                    }
                    _ => {}
                }
                if !ctx.config.sell_exempt_from_cap {
                    let notional = qty as f64 * signal.reference_price;
                    if notional > ctx.config.per_trade_notional_cap {
                        qty = (ctx.config.per_trade_notional_cap / signal.reference_price).floor() as u64;
                    }
                }
            }
        }

        if let Some(broker) = ctx.broker {
            let limit_price = match signal.action {
                Action::Buy => signal.reference_price * (1.0 - ctx.config.limit_offset),
                Action::Sell => signal.reference_price * (1.0 + ctx.config.limit_offset),
            };
            let has_duplicate = broker
                .has_active_order(&signal.symbol, signal.action, qty as f64, Some(limit_price), 0.02)
                .await
                .unwrap_or(false);
            if has_duplicate {
                return Err(EngineError::BusinessReject("duplicate active order already open".into()));
            }
        }

        let order_type = if signal.force_market_order
            || ctx.outside_trading_hours
            || matches!(signal.signal_type, SignalType::CloseAllPositions)
        {
            OrderType::Mkt
        } else {
            OrderType::Lmt
        };

        let limit_price = match order_type {
            OrderType::Lmt => Some(match signal.action {
                Action::Buy => signal.reference_price * (1.0 - ctx.config.limit_offset),
                Action::Sell => signal.reference_price * (1.0 + ctx.config.limit_offset),
            }),
            OrderType::Mkt => None,
        };

        let (status, order_id, order_status) = if let Some(broker) = ctx.broker {
            match broker.place_order(&signal.symbol, signal.action, qty as f64, order_type, limit_price).await {
                Ok(placed) => {
                    let status = match placed.status {
                        OrderStatus::Executed => TradeStatus::Executed,
                        OrderStatus::Cancelled => TradeStatus::Cancelled,
                        OrderStatus::Failed => TradeStatus::Failed,
                        OrderStatus::Pending => TradeStatus::Pending,
                    };
                    (status, Some(placed.order_id), Some(format!("{:?}", placed.status)))
                }
                Err(e) => {
                    warn!(symbol = %signal.symbol, error = %e, "broker rejected order submission");
                    (TradeStatus::Error, None, Some(e.to_string()))
                }
            }
        } else {
            debug!(symbol = %signal.symbol, "simulation mode: synthesizing executed fill");
            (TradeStatus::Executed, None, Some("SIMULATED".to_string()))
        };

        if status == TradeStatus::Executed {
            self.cooldown.record(&signal.signal_hash, now);
            info!(symbol = %signal.symbol, hash = %signal.signal_hash, qty, "signal executed");
        }

        Ok(TradeRecord {
            symbol: signal.symbol.clone(),
            action: signal.action,
            entry_price: signal.reference_price,
            size: qty as i64,
            timestamp: now,
            signal_type: signal.signal_type.clone(),
            confidence: signal.confidence,
            status,
            order_type,
            order_id,
            order_status,
            reason: Some(signal.reason.clone()),
            simulated: ctx.broker.is_none(),
        })
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
    fn cooldown_suppresses_within_window() {
        let cd = SignalCooldown::new();
        cd.record("abc", t(0));
        assert!(cd.in_cooldown("abc", t(60), Duration::from_secs(300)));
        assert!(!cd.in_cooldown("abc", t(600), Duration::from_secs(300)));
    }

    #[test]
    fn executed_signal_set_claims_once_per_cycle() {
        let set = ExecutedSignalSet::new();
        assert!(set.try_claim("abc"));
        assert!(!set.try_claim("abc"));
        set.clear();
        assert!(set.try_claim("abc"));
    }

    #[test]
    fn position_sizer_respects_active_position_cap() {
        let shares = PositionSizer::size(100_000.0, 5, 5, 0.01, 0.8, 1.0, 2.0, 0.1, 20_000.0, 50.0);
        assert_eq!(shares, 0);
    }

    #[test]
    fn position_sizer_notional_cap_binds() {
        let shares = PositionSizer::size(1_000_000.0, 0, 5, 0.5, 1.0, 0.01, 2.0, 0.0, 1_000.0, 100.0);
        // notional cap of 1000 at price 100 => at most 10 shares regardless of risk budget.
        assert_eq!(shares, 10);
    }

    #[test]
    fn tiered_take_profit_picks_highest_met_threshold() {
        let position = Position::new(10, 100.0, t(0));
        let decision = check_generic_exit(
            &position, 112.0, t(3600), Duration::from_secs(86_400), false, 0.05, None, None, None,
        )
        .unwrap();
        match decision.check {
            ExitCheck::TakeProfitTiered(threshold) => assert!((threshold - 0.10).abs() < 1e-9),
            _ => panic!("expected tiered take-profit"),
        }
    }

    #[test]
    fn stop_loss_trips_before_take_profit_checks() {
        let position = Position::new(10, 100.0, t(0));
        let decision = check_generic_exit(
            &position, 90.0, t(60), Duration::from_secs(86_400), false, 0.05, None, None, None,
        )
        .unwrap();
        assert!(matches!(decision.check, ExitCheck::StopLoss));
    }
}

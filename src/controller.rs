// =============================================================================
// Cycle controller — the top-level INIT→CONNECTED→RUNNING→STOPPING→STOPPED loop
// =============================================================================
//
// One tick per `scan_interval_minutes`: trading-hours gate, position
// reconciliation against broker truth, forced liquidation once the close
// window is reached, a streaming pass of the strategy host with each signal
// run through its strategy's `StrategyBase::submit`, then a status report.
// A broker unreachable at reconcile time flips the tick into simulation mode
// rather than failing it — see `reconcile.rs`'s original safety policy: never
// auto-cancel or auto-close on drift, a human resolves it.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::broker::BrokerClient;
use crate::error::EngineResult;
use crate::host::{StrategyHost, TaggedSignal};
use crate::journal::Journal;
use crate::market_data::adapter::MarketDataAdapter;
use crate::news::NewsClient;
use crate::state::EngineState;
use crate::strategy::base::{check_generic_exit, PositionSizer, Strategy, StrategyContext};
use crate::types::{Action, Position, Signal, SignalType, TradeStatus, TradingMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Init,
    Connected,
    Running,
    Stopping,
    Stopped,
}

pub struct CycleController {
    state: RwLock<ControllerState>,
    engine: Arc<EngineState>,
    broker: Arc<BrokerClient>,
    host: StrategyHost,
    roster: HashMap<String, Arc<dyn Strategy>>,
    journal: Arc<Journal>,
    run_started_at: DateTime<Utc>,
    /// Set when the broker was unreachable at the last reconciliation attempt;
    /// cleared on the next successful one. Orders submit in simulation mode
    /// while set, regardless of `TradingConfig`.
    degraded: AtomicBool,
}

impl CycleController {
    pub fn new(
        engine: Arc<EngineState>,
        broker: Arc<BrokerClient>,
        roster: Vec<Arc<dyn Strategy>>,
        market_data: Arc<MarketDataAdapter>,
        journal: Arc<Journal>,
        run_started_at: DateTime<Utc>,
        news: Option<Arc<NewsClient>>,
    ) -> Self {
        let (symbol_strategy_map, universe) = {
            let config = engine.config.read();
            (config.symbol_strategy_map.clone(), config.symbols.clone())
        };
        let roster_map: HashMap<String, Arc<dyn Strategy>> =
            roster.iter().map(|s| (s.id().to_string(), s.clone())).collect();
        let mut host = StrategyHost::new(roster, &symbol_strategy_map, &universe, market_data, "10d", "5m");
        if let Some(news) = news {
            host = host.with_news(news);
        }

        Self {
            state: RwLock::new(ControllerState::Init),
            engine,
            broker,
            host,
            roster: roster_map,
            journal,
            run_started_at,
            degraded: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ControllerState {
        *self.state.read()
    }

    pub fn begin_shutdown(&self) {
        *self.state.write() = ControllerState::Stopping;
    }

    /// INIT -> CONNECTED. A failed broker connect does not block startup —
    /// the controller proceeds in degraded (simulation) mode and tries again
    /// at the next reconciliation.
    pub async fn connect(&self) {
        if !self.broker.connect().await {
            warn!("broker unreachable at startup, starting in degraded mode");
            self.degraded.store(true, Ordering::Relaxed);
            self.engine.push_error("broker unreachable at startup".to_string());
        }
        *self.state.write() = ControllerState::Connected;
    }

    /// CONNECTED -> RUNNING, ticking every `scan_interval_minutes` until
    /// shutdown is requested via `begin_shutdown`.
    pub async fn run_until_stopped(&self) -> EngineResult<()> {
        *self.state.write() = ControllerState::Running;
        let scan_minutes = self.engine.config.read().trading.scan_interval_minutes.max(1);
        let mut ticker = tokio::time::interval(Duration::from_secs(scan_minutes * 60));

        loop {
            ticker.tick().await;
            if self.state() == ControllerState::Stopping {
                break;
            }

            if let Err(e) = self.tick(Utc::now()).await {
                if e.is_fatal() {
                    *self.state.write() = ControllerState::Stopped;
                    return Err(e);
                }
                warn!(error = %e, "cycle tick returned a non-fatal error");
                self.engine.push_error(e.to_string());
            }
        }

        *self.state.write() = ControllerState::Stopped;
        Ok(())
    }

    async fn tick(&self, now: DateTime<Utc>) -> EngineResult<()> {
        let trading_mode = self.engine.config.read().trading_mode;
        if trading_mode == TradingMode::Killed {
            debug!("trading mode is Killed, skipping tick");
            return Ok(());
        }

        let trading = self.engine.config.read().trading.clone();
        let tz: Tz = Tz::from_str(&trading.timezone).unwrap_or(chrono_tz::America::New_York);
        let in_hours = within_trading_hours(now, tz, &trading.trading_hours_start, &trading.trading_hours_end);
        if !in_hours && !trading.allow_orders_outside_trading_hours {
            debug!("outside trading hours, skipping tick");
            return Ok(());
        }

        for state in self.engine.strategies.values() {
            state.base.executed_this_cycle.clear();
        }

        self.sync_positions_from_broker().await;

        if trading.close_all_positions_before_market_close
            && past_clock_time(now, tz, &trading.close_positions_time)
        {
            self.close_all_positions("close_positions_time reached", now, in_hours).await;
        }

        let mut rx = self.host.stream_run(now);
        let mut preselected = Vec::new();
        while let Some(tagged) = rx.recv().await {
            preselected.push(tagged.signal.clone());
            self.dispatch_tagged_signal(tagged, now, in_hours).await;
        }
        if let Err(e) = self.journal.append_preselect_signals(self.run_started_at, &preselected) {
            debug!(error = %e, "failed to append preselect signal sidecar");
        }

        self.evaluate_exits(now, in_hours).await;

        let report = self.engine.status_report();
        info!(
            uptime_secs = report.uptime_secs,
            strategies = report.strategy_count,
            open_positions = report.open_positions,
            recent_errors = report.recent_error_count,
            "cycle complete"
        );
        Ok(())
    }

    /// Reconcile every strategy's position cache against broker truth
    /// (§4.7 step 3). A broker failure flips the controller into degraded
    /// mode for this cycle rather than failing the tick — positions already
    /// in the local cache are left untouched (the "never auto-close on drift"
    /// policy).
    async fn sync_positions_from_broker(&self) {
        match self.broker.positions().await {
            Ok(positions) => {
                self.degraded.store(false, Ordering::Relaxed);
                self.engine.mark_reconcile_ok();

                let mut by_symbol: HashMap<String, Position> = HashMap::new();
                for bp in positions {
                    if bp.size == 0 {
                        continue;
                    }
                    by_symbol.insert(bp.symbol.clone(), Position::new(bp.size, bp.avg_cost, Utc::now()));
                }

                for state in self.engine.strategies.values() {
                    let symbols: Vec<String> = state.positions.read().keys().cloned().collect();
                    let broker_symbols: Vec<String> = by_symbol.keys().cloned().collect();
                    for symbol in symbols.iter().chain(broker_symbols.iter()) {
                        state.reconcile_symbol(symbol, by_symbol.get(symbol).cloned());
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "broker position sync failed, entering degraded mode for this cycle");
                self.degraded.store(true, Ordering::Relaxed);
                self.engine.mark_reconcile_failed(e.to_string());
            }
        }

        match self.broker.account_summary().await {
            Ok(summary) => {
                let mut account = self.engine.account.write();
                account.net_liquidation = summary.net_liquidation;
                account.available_funds = summary.available_funds;
            }
            Err(e) => {
                debug!(error = %e, "account summary fetch failed, keeping last known snapshot");
            }
        }
    }

    /// Forced liquidation (§4.4.5): synthesize a `CloseAllPositions` signal
    /// for every open position and submit it as a market order, bypassing
    /// sizing (the full held size is closed).
    async fn close_all_positions(&self, reason: &str, now: DateTime<Utc>, in_hours: bool) {
        for (strategy_id, state) in &self.engine.strategies {
            let open: Vec<(String, Position)> = state
                .positions
                .read()
                .iter()
                .filter(|(_, p)| p.size != 0)
                .map(|(s, p)| (s.clone(), p.clone()))
                .collect();

            for (symbol, position) in open {
                let action = if position.is_long() { Action::Sell } else { Action::Buy };
                let qty = position.size.unsigned_abs();
                let price = if position.avg_cost > 0.0 { position.avg_cost } else { continue };

                let Some(signal) = Signal::new(
                    symbol.as_str(),
                    strategy_id.as_str(),
                    SignalType::CloseAllPositions,
                    action,
                    price,
                    qty,
                    1.0,
                    reason,
                    true,
                    now,
                ) else {
                    continue;
                };

                self.submit_and_journal(strategy_id, signal, now, in_hours, Some(qty)).await;
            }
        }
    }

    /// Evaluate the generic exit policy (and any strategy-specific exit) for
    /// every open position, independent of whether the strategy produced a
    /// fresh entry signal this cycle.
    async fn evaluate_exits(&self, now: DateTime<Utc>, in_hours: bool) {
        let trading = self.engine.config.read().trading.clone();

        for (strategy_id, state) in &self.engine.strategies {
            let Some(strategy) = self.roster.get(strategy_id) else { continue };
            let strategy_cfg = self.engine.config.read().strategies.get(strategy_id).cloned().unwrap_or_default();

            let open: Vec<(String, Position)> = state
                .positions
                .read()
                .iter()
                .filter(|(_, p)| p.size != 0)
                .map(|(s, p)| (s.clone(), p.clone()))
                .collect();

            for (symbol, position) in open {
                let Ok(bars) = self.host.market_data().get_intraday(&symbol, "10d", "5m").await else {
                    continue;
                };
                let Some(last) = bars.last() else { continue };
                let price = last.close;

                let force_close_reached = past_clock_time(
                    now,
                    Tz::from_str(&trading.timezone).unwrap_or(chrono_tz::America::New_York),
                    &trading.force_close_time,
                );
                let max_holding = Duration::from_secs(strategy_cfg.max_holding_minutes * 60);
                let unrealized_pnl = Some((price - position.avg_cost) * position.size as f64);

                let generic = check_generic_exit(
                    &position,
                    price,
                    now,
                    max_holding,
                    force_close_reached,
                    strategy_cfg.stop_loss_pct,
                    strategy_cfg.take_profit_pct,
                    unrealized_pnl,
                    strategy_cfg.pnl_take_profit_threshold,
                );

                let exit_signal = match generic {
                    Some(decision) => {
                        let action = if position.is_long() { Action::Sell } else { Action::Buy };
                        let signal_type = match decision.check {
                            crate::strategy::base::ExitCheck::MaxHoldingTime => SignalType::MaxHolding,
                            crate::strategy::base::ExitCheck::ForcedClose => SignalType::ForceClose,
                            crate::strategy::base::ExitCheck::StopLoss => SignalType::StopLoss,
                            crate::strategy::base::ExitCheck::TakeProfitTiered(_) => SignalType::TakeProfit,
                            crate::strategy::base::ExitCheck::TakeProfitFlat => SignalType::TakeProfit,
                            crate::strategy::base::ExitCheck::PnlTakeProfit => SignalType::TakeProfit,
                        };
                        Signal::new(
                            symbol.as_str(),
                            strategy_id.as_str(),
                            signal_type,
                            action,
                            price,
                            position.size.unsigned_abs(),
                            decision.confidence,
                            "generic exit policy",
                            false,
                            now,
                        )
                    }
                    None => strategy.check_exit_conditions(&symbol, &position, price, now, Some(&bars)),
                };

                if let Some(signal) = exit_signal {
                    let qty = position.size.unsigned_abs();
                    self.submit_and_journal(strategy_id, signal, now, in_hours, Some(qty)).await;
                }
            }
        }
    }

    async fn dispatch_tagged_signal(&self, tagged: TaggedSignal, now: DateTime<Utc>, in_hours: bool) {
        let TaggedSignal { origin_strategy, signal, .. } = tagged;
        self.submit_and_journal(&origin_strategy, signal, now, in_hours, None).await;
    }

    /// Sizes (unless `fixed_qty` overrides it), gates, and submits one signal
    /// through its strategy's `StrategyBase`, journaling the outcome
    /// regardless of terminal status.
    async fn submit_and_journal(
        &self,
        strategy_id: &str,
        mut signal: Signal,
        now: DateTime<Utc>,
        in_hours: bool,
        fixed_qty: Option<u64>,
    ) {
        let Some(state) = self.engine.strategy_state(strategy_id) else {
            warn!(strategy_id, "no engine state for strategy, dropping signal");
            return;
        };
        let Some(strategy) = self.roster.get(strategy_id) else {
            return;
        };

        let strategy_cfg = self.engine.config.read().strategies.get(strategy_id).cloned().unwrap_or_default();
        if !strategy_cfg.enabled {
            return;
        }
        if signal.confidence < strategy_cfg.min_confidence {
            debug!(strategy_id, symbol = %signal.symbol, "signal below min_confidence, skipping");
            return;
        }

        if !state.base.executed_this_cycle.try_claim(&signal.signal_hash) {
            debug!(strategy_id, symbol = %signal.symbol, hash = %signal.signal_hash, "signal hash already claimed this cycle");
            return;
        }

        let trading = self.engine.config.read().trading.clone();
        let account = *self.engine.account.read();
        let equity = if account.available_funds > 0.0 { account.available_funds } else { account.net_liquidation };

        if let Some(qty) = fixed_qty {
            signal.position_size = qty;
        } else {
            let active = state.positions.read().values().filter(|p| p.size != 0).count() as u32;
            let atr = self
                .host
                .market_data()
                .get_indicators(&signal.symbol, "10d", "5m")
                .await
                .ok()
                .and_then(|set| set.scalar("ATR_14"))
                .filter(|v| *v > 0.0)
                .unwrap_or(signal.reference_price * 0.02);

            signal.position_size = PositionSizer::size(
                equity,
                active,
                trading.max_active_positions,
                trading.risk_per_trade,
                signal.confidence,
                atr,
                trading.stop_loss_atr_multiple,
                trading.min_cash_buffer,
                trading.per_trade_notional_cap,
                signal.reference_price,
            );
        }

        let current_position = state.positions.read().get(&signal.symbol).cloned();
        let today_has_buy_entry = state
            .today_buy_entries
            .read()
            .get(&signal.symbol)
            .map(|t| t.date_naive() == now.date_naive())
            .unwrap_or(false);

        let live_trading = self.engine.config.read().trading_mode == TradingMode::Live;
        let use_broker = !self.degraded.load(Ordering::Relaxed) && live_trading;
        let broker_ref = if use_broker { Some(&*self.broker) } else { None };

        let ctx = StrategyContext {
            broker: broker_ref,
            config: &trading,
            available_funds: account.available_funds,
            current_position: current_position.as_ref(),
            today_has_buy_entry,
            outside_trading_hours: !in_hours,
            simulation_mode: true,
        };

        let cooldown_window = strategy.cooldown_window();
        match state.base.submit(&signal, &ctx, cooldown_window, now).await {
            Ok(record) => {
                if record.status == TradeStatus::Executed {
                    self.apply_executed_position_update(&state, &signal, &record, now);
                }
                if let Err(e) = self.journal.record_trade(record) {
                    warn!(error = %e, "failed to persist trade journal");
                }
            }
            Err(e) => {
                debug!(strategy_id, symbol = %signal.symbol, error = %e, "signal rejected before submission");
            }
        }
    }

    /// Merge an executed fill into the strategy's local position cache: a
    /// buy volume-weighs into any existing long, a sell reduces it (removing
    /// the entry once flat).
    fn apply_executed_position_update(
        &self,
        state: &crate::state::StrategyState,
        signal: &Signal,
        record: &crate::types::TradeRecord,
        now: DateTime<Utc>,
    ) {
        let mut positions = state.positions.write();
        match signal.action {
            Action::Buy => {
                let entry = positions.entry(signal.symbol.clone()).or_insert_with(|| Position::new(0, 0.0, now));
                let existing_notional = entry.avg_cost * entry.size.max(0) as f64;
                let new_notional = record.entry_price * record.size as f64;
                let new_size = entry.size + record.size;
                entry.avg_cost = if new_size != 0 { (existing_notional + new_notional) / new_size as f64 } else { 0.0 };
                entry.size = new_size;
                drop(positions);
                state.today_buy_entries.write().insert(signal.symbol.clone(), now);
            }
            Action::Sell => {
                if let Some(entry) = positions.get_mut(&signal.symbol) {
                    entry.size -= record.size;
                    if entry.size == 0 {
                        positions.remove(&signal.symbol);
                    }
                }
            }
        }
    }
}

/// Parse an "HH:MM" clock string into a `NaiveTime`. Malformed strings fall
/// back to midnight so a bad config value degrades to "always past" rather
/// than panicking.
fn parse_hhmm(s: &str) -> NaiveTime {
    let mut parts = s.splitn(2, ':');
    let hour: u32 = parts.next().and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap())
}

fn within_trading_hours(now: DateTime<Utc>, tz: Tz, start: &str, end: &str) -> bool {
    let local_time = now.with_timezone(&tz).time();
    let start = parse_hhmm(start);
    let end = parse_hhmm(end);
    local_time >= start && local_time < end
}

fn past_clock_time(now: DateTime<Utc>, tz: Tz, clock: &str) -> bool {
    let local_time = now.with_timezone(&tz).time();
    local_time >= parse_hhmm(clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ny_time(h: u32, m: u32) -> DateTime<Utc> {
        let tz = chrono_tz::America::New_York;
        let local = tz.with_ymd_and_hms(2026, 6, 15, h, m, 0).unwrap();
        local.with_timezone(&Utc)
    }

    #[test]
    fn within_trading_hours_respects_window() {
        let tz = chrono_tz::America::New_York;
        assert!(within_trading_hours(ny_time(10, 0), tz, "09:30", "16:00"));
        assert!(!within_trading_hours(ny_time(8, 0), tz, "09:30", "16:00"));
        assert!(!within_trading_hours(ny_time(16, 0), tz, "09:30", "16:00"));
    }

    #[test]
    fn past_clock_time_trips_at_boundary() {
        let tz = chrono_tz::America::New_York;
        assert!(!past_clock_time(ny_time(15, 57), tz, "15:58"));
        assert!(past_clock_time(ny_time(15, 58), tz, "15:58"));
        assert!(past_clock_time(ny_time(16, 1), tz, "15:58"));
    }

    #[test]
    fn parse_hhmm_falls_back_to_midnight_on_garbage() {
        assert_eq!(parse_hhmm("garbage"), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }
}

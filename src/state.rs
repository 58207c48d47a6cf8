// =============================================================================
// Engine state — the ambient shared-state aggregator
// =============================================================================
//
// Narrower than the reference `AppState`: no dashboard snapshot, no
// websocket sequence numbers. What survives is the shape that mattered —
// config behind a lock, a capped ring buffer of recent errors, and the
// per-strategy state each worker owns privately (cooldown cache, executed-
// this-cycle set, position cache), reachable from the controller for
// reconciliation and status reporting.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::strategy::base::StrategyBase;
use crate::types::{AccountSnapshot, Position};

const MAX_RECENT_ERRORS: usize = 50;

/// A recorded error event, capped to the most recent [`MAX_RECENT_ERRORS`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Per-strategy private state: the `StrategyBase` lifecycle helper plus the
/// position cache it reconciles against broker truth every cycle. Owned
/// exclusively by the strategy's worker — see SPEC_FULL.md §9's "position
/// cache vs. broker truth" note: writable only by reconciliation and the
/// post-EXECUTED update inside `submit`.
pub struct StrategyState {
    pub base: StrategyBase,
    pub positions: RwLock<HashMap<String, Position>>,
    pub today_buy_entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl Default for StrategyState {
    fn default() -> Self {
        Self {
            base: StrategyBase::new(),
            positions: RwLock::new(HashMap::new()),
            today_buy_entries: RwLock::new(HashMap::new()),
        }
    }
}

impl StrategyState {
    /// Replace the local position cache with broker truth for a single
    /// symbol. Broker-absent symbols are removed (position closed).
    pub fn reconcile_symbol(&self, symbol: &str, broker_position: Option<Position>) {
        let mut positions = self.positions.write();
        match broker_position {
            Some(pos) if pos.size != 0 => {
                positions.insert(symbol.to_string(), pos);
            }
            _ => {
                positions.remove(symbol);
            }
        }
    }
}

/// Central, process-wide engine state shared across the controller, the
/// strategy host workers, and the journal via `Arc`.
pub struct EngineState {
    pub config: RwLock<EngineConfig>,
    pub strategies: HashMap<String, Arc<StrategyState>>,
    pub account: RwLock<AccountSnapshot>,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,
    pub last_reconcile_ok: RwLock<Option<DateTime<Utc>>>,
    pub last_reconcile_error: RwLock<Option<String>>,
    pub start_time: DateTime<Utc>,
}

impl EngineState {
    pub fn new(config: EngineConfig, strategy_ids: impl IntoIterator<Item = String>) -> Self {
        let strategies = strategy_ids
            .into_iter()
            .map(|id| (id, Arc::new(StrategyState::default())))
            .collect();

        Self {
            config: RwLock::new(config),
            strategies,
            account: RwLock::new(AccountSnapshot::default()),
            recent_errors: RwLock::new(Vec::new()),
            last_reconcile_ok: RwLock::new(None),
            last_reconcile_error: RwLock::new(None),
            start_time: Utc::now(),
        }
    }

    pub fn strategy_state(&self, strategy_id: &str) -> Option<Arc<StrategyState>> {
        self.strategies.get(strategy_id).cloned()
    }

    pub fn push_error(&self, message: impl Into<String>) {
        let record = ErrorRecord {
            message: message.into(),
            at: Utc::now(),
        };
        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
    }

    pub fn mark_reconcile_ok(&self) {
        *self.last_reconcile_ok.write() = Some(Utc::now());
        *self.last_reconcile_error.write() = None;
    }

    pub fn mark_reconcile_failed(&self, reason: impl Into<String>) {
        *self.last_reconcile_error.write() = Some(reason.into());
    }

    pub fn status_report(&self) -> StatusReport {
        let open_positions: usize = self
            .strategies
            .values()
            .map(|s| s.positions.read().values().filter(|p| p.size != 0).count())
            .sum();

        StatusReport {
            uptime_secs: (Utc::now() - self.start_time).num_seconds().max(0),
            strategy_count: self.strategies.len(),
            open_positions,
            recent_error_count: self.recent_errors.read().len(),
            last_reconcile_ok: *self.last_reconcile_ok.read(),
            last_reconcile_error: self.last_reconcile_error.read().clone(),
        }
    }
}

/// A point-in-time summary emitted at the end of every controller tick
/// (SPEC_FULL.md §4.7 step 6).
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub uptime_secs: i64,
    pub strategy_count: usize,
    pub open_positions: usize,
    pub recent_error_count: usize,
    pub last_reconcile_ok: Option<DateTime<Utc>>,
    pub last_reconcile_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_ring_buffer_caps_at_limit() {
        let state = EngineState::new(EngineConfig::default(), vec!["a1".to_string()]);
        for i in 0..(MAX_RECENT_ERRORS + 10) {
            state.push_error(format!("err {i}"));
        }
        assert_eq!(state.recent_errors.read().len(), MAX_RECENT_ERRORS);
    }

    #[test]
    fn reconcile_symbol_removes_flat_position() {
        let strat = StrategyState::default();
        strat.positions.write().insert("AAA".to_string(), Position::new(10, 100.0, Utc::now()));
        strat.reconcile_symbol("AAA", None);
        assert!(!strat.positions.read().contains_key("AAA"));
    }

    #[test]
    fn status_report_counts_open_positions_across_strategies() {
        let state = EngineState::new(EngineConfig::default(), vec!["a1".to_string(), "a2".to_string()]);
        state.strategy_state("a1").unwrap().positions.write().insert("AAA".to_string(), Position::new(5, 10.0, Utc::now()));
        state.strategy_state("a2").unwrap().positions.write().insert("BBB".to_string(), Position::new(-5, 20.0, Utc::now()));
        assert_eq!(state.status_report().open_positions, 2);
    }
}

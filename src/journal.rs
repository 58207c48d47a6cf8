// =============================================================================
// Trade journal — append-only trade history plus observability sidecars
// =============================================================================
//
// `data/trades.json` holds the last N (<= 100) trade records as a JSON array;
// every write re-serializes the capped in-memory buffer and does an atomic
// tmp+rename, the same persistence idiom `EngineConfig::save` uses. The CSV
// sidecars (`preselect_signals_*.csv`, `signal_performance_*.csv`) are
// observability only — never read back by the engine — so they're appended
// to directly with a fixed column schema rather than pulled in through a
// dependency.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::types::{Signal, TradeRecord};

const MAX_TRADE_RECORDS: usize = 100;

pub struct Journal {
    dir: PathBuf,
    trades: Mutex<Vec<TradeRecord>>,
}

impl Journal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            trades: Mutex::new(Vec::new()),
        }
    }

    fn trades_path(&self) -> PathBuf {
        self.dir.join("trades.json")
    }

    /// Load any existing `trades.json` from disk into memory (best-effort;
    /// a missing or corrupted file just starts from an empty journal).
    pub fn load(&self) {
        let path = self.trades_path();
        if !path.exists() {
            return;
        }
        match std::fs::read_to_string(&path).and_then(|s| {
            serde_json::from_str::<Vec<TradeRecord>>(&s).map_err(std::io::Error::other)
        }) {
            Ok(records) => *self.trades.lock() = records,
            Err(e) => warn!(error = %e, path = %path.display(), "failed to load trade journal, starting empty"),
        }
    }

    /// Append a trade record regardless of its terminal status
    /// (SPEC_FULL.md §4.4.4 step 10), then persist the capped buffer.
    pub fn record_trade(&self, record: TradeRecord) -> Result<()> {
        {
            let mut trades = self.trades.lock();
            trades.push(record);
            while trades.len() > MAX_TRADE_RECORDS {
                trades.remove(0);
            }
        }
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("failed to create journal directory")?;
        let path = self.trades_path();
        let content = {
            let trades = self.trades.lock();
            serde_json::to_string_pretty(&*trades).context("failed to serialize trade journal")?
        };
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp journal to {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("failed to rename tmp journal to {}", path.display()))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.trades.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one row per preselected signal to a run-scoped CSV sidecar.
    /// Observability only — not read back by the engine.
    pub fn append_preselect_signals(&self, run_started_at: DateTime<Utc>, signals: &[Signal]) -> Result<()> {
        if signals.is_empty() {
            return Ok(());
        }
        let path = self.sidecar_path("preselect_signals", run_started_at);
        let is_new = !path.exists();
        let mut file = self.open_append(&path)?;
        if is_new {
            writeln!(file, "timestamp,symbol,strategy_id,signal_type,action,reference_price,confidence")?;
        }
        for s in signals {
            writeln!(
                file,
                "{},{},{},{},{:?},{},{}",
                s.generated_at.to_rfc3339(),
                s.symbol,
                s.strategy_id,
                s.signal_type,
                s.action,
                s.reference_price,
                s.confidence,
            )?;
        }
        Ok(())
    }

    /// Append one row per closed trade's realized outcome to a run-scoped
    /// CSV sidecar.
    pub fn append_signal_performance(
        &self,
        run_started_at: DateTime<Utc>,
        symbol: &str,
        signal_hash: &str,
        realized_pnl: f64,
    ) -> Result<()> {
        let path = self.sidecar_path("signal_performance", run_started_at);
        let is_new = !path.exists();
        let mut file = self.open_append(&path)?;
        if is_new {
            writeln!(file, "timestamp,symbol,signal_hash,realized_pnl")?;
        }
        writeln!(file, "{},{},{},{}", Utc::now().to_rfc3339(), symbol, signal_hash, realized_pnl)?;
        Ok(())
    }

    fn sidecar_path(&self, prefix: &str, run_started_at: DateTime<Utc>) -> PathBuf {
        self.dir.join(format!("{prefix}_{}.csv", run_started_at.format("%Y%m%d_%H%M%S")))
    }

    fn open_append(&self, path: &Path) -> Result<std::fs::File> {
        std::fs::create_dir_all(&self.dir).context("failed to create journal directory")?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open sidecar file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, OrderType, SignalType, TradeStatus};

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            symbol: "AAA".to_string(),
            action: Action::Buy,
            entry_price: 100.0,
            size: 10,
            timestamp: Utc::now(),
            signal_type: SignalType::MomentumEntry,
            confidence: 0.8,
            status: TradeStatus::Executed,
            order_type: OrderType::Mkt,
            order_id: None,
            order_status: Some("SIMULATED".to_string()),
            reason: Some("test".to_string()),
            simulated: true,
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("sentrix-core-journal-test-{}-{}", std::process::id(), rand_suffix()))
    }

    fn rand_suffix() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos() as u64
    }

    #[test]
    fn record_trade_caps_at_max_records() {
        let dir = temp_dir();
        let journal = Journal::new(&dir);
        for _ in 0..(MAX_TRADE_RECORDS + 5) {
            journal.record_trade(sample_trade()).unwrap();
        }
        assert_eq!(journal.len(), MAX_TRADE_RECORDS);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_round_trips_persisted_trades() {
        let dir = temp_dir();
        {
            let journal = Journal::new(&dir);
            journal.record_trade(sample_trade()).unwrap();
        }
        let reloaded = Journal::new(&dir);
        reloaded.load();
        assert_eq!(reloaded.len(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}

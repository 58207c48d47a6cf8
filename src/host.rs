// =============================================================================
// Strategy host — runs the roster across a symbol universe each cycle
// =============================================================================
//
// Groups symbols by their assigned strategy (`symbol_strategy_map`, defaulting
// an unlisted symbol to every strategy in the roster) and launches one
// `tokio::task` worker per strategy group. Within a worker, symbols are
// processed serially — `generate_signals` is pure with respect to engine
// state, so there's nothing to parallelize within a group beyond what the
// worker pool already buys across groups. Workers never touch the broker
// adapter; they only read bars/indicators and produce `Signal`s.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::market_data::adapter::MarketDataAdapter;
use crate::news::NewsClient;
use crate::strategy::base::Strategy;
use crate::types::{BarSeries, Signal};

/// Trailing bars spanned when estimating `recent_volatility` for A6 — on a
/// 5m interval this covers the same ~30 minute reaction window the original
/// news-impact analysis used.
const NEWS_VOLATILITY_WINDOW: usize = 6;

/// One delivered signal, tagged with the strategy that produced it — see
/// SPEC_FULL.md §4.6 "signals are tagged with `origin_strategy`".
#[derive(Debug, Clone)]
pub struct TaggedSignal {
    pub origin_strategy: String,
    pub symbol: String,
    pub signal: Signal,
}

struct StrategyGroup {
    strategy: Arc<dyn Strategy>,
    symbols: Vec<String>,
}

pub struct StrategyHost {
    groups: Vec<StrategyGroup>,
    market_data: Arc<MarketDataAdapter>,
    period: String,
    interval: String,
    news: Option<Arc<NewsClient>>,
}

impl StrategyHost {
    /// `symbol_strategy_map` maps a symbol to the strategy ids it should be
    /// routed through; a symbol absent from the map is routed through every
    /// strategy in `roster` (the spec's "default per symbol if unlisted").
    pub fn new(
        roster: Vec<Arc<dyn Strategy>>,
        symbol_strategy_map: &HashMap<String, Vec<String>>,
        universe: &[String],
        market_data: Arc<MarketDataAdapter>,
        period: impl Into<String>,
        interval: impl Into<String>,
    ) -> Self {
        let mut by_strategy: HashMap<String, Vec<String>> = HashMap::new();
        let all_ids: Vec<String> = roster.iter().map(|s| s.id().to_string()).collect();

        for symbol in universe {
            let ids = symbol_strategy_map.get(symbol).cloned().unwrap_or_else(|| all_ids.clone());
            for id in ids {
                by_strategy.entry(id).or_default().push(symbol.clone());
            }
        }

        let groups = roster
            .into_iter()
            .filter_map(|strategy| {
                let symbols = by_strategy.remove(strategy.id())?;
                Some(StrategyGroup { strategy, symbols })
            })
            .collect();

        Self {
            groups,
            market_data,
            period: period.into(),
            interval: interval.into(),
            news: None,
        }
    }

    /// Attach a news client — once set, every symbol's `IndicatorSet` is
    /// enriched with `news_sentiment`/`news_relevance`/`news_age_hours`/
    /// `recent_volatility` before `generate_signals` runs (consumed by A6).
    pub fn with_news(mut self, news: Arc<NewsClient>) -> Self {
        self.news = Some(news);
        self
    }

    pub fn worker_count(&self) -> usize {
        self.groups.len()
    }

    pub fn market_data(&self) -> &MarketDataAdapter {
        &self.market_data
    }

    /// Batch mode: run every group to completion and return every signal
    /// produced, keyed by symbol.
    pub async fn run_once(&self, now: DateTime<Utc>) -> HashMap<String, Vec<Signal>> {
        let mut handles = Vec::with_capacity(self.groups.len());

        for group in &self.groups {
            let strategy = group.strategy.clone();
            let symbols = group.symbols.clone();
            let market_data = self.market_data.clone();
            let period = self.period.clone();
            let interval = self.interval.clone();
            let news = self.news.clone();

            handles.push(tokio::spawn(async move {
                run_group(strategy, symbols, market_data, period, interval, news, now).await
            }));
        }

        let mut out: HashMap<String, Vec<Signal>> = HashMap::new();
        for handle in handles {
            match handle.await {
                Ok(per_symbol) => {
                    for (symbol, signals) in per_symbol {
                        out.entry(symbol).or_default().extend(signals);
                    }
                }
                Err(e) => warn!(error = %e, "strategy worker task panicked"),
            }
        }
        out
    }

    /// Streaming mode: spawn every group as an independent worker pushing
    /// `TaggedSignal`s onto a bounded channel as they're produced. The
    /// channel is sized `2 * number_of_workers` so a stalled execution lane
    /// backpressures strategy workers (SPEC_FULL.md §5.1/§9).
    pub fn stream_run(&self, now: DateTime<Utc>) -> mpsc::Receiver<TaggedSignal> {
        let capacity = (2 * self.groups.len().max(1)).max(1);
        let (tx, rx) = mpsc::channel(capacity);

        for group in &self.groups {
            let strategy = group.strategy.clone();
            let symbols = group.symbols.clone();
            let market_data = self.market_data.clone();
            let period = self.period.clone();
            let interval = self.interval.clone();
            let news = self.news.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                for symbol in symbols {
                    let signals =
                        generate_for_symbol(&strategy, &symbol, &market_data, &period, &interval, news.as_deref(), now).await;
                    for signal in signals {
                        let tagged = TaggedSignal {
                            origin_strategy: strategy.id().to_string(),
                            symbol: symbol.clone(),
                            signal,
                        };
                        if tx.send(tagged).await.is_err() {
                            // Receiver dropped (controller shutting down); the
                            // remaining symbols in this group are abandoned.
                            return;
                        }
                    }
                }
            });
        }

        rx
    }
}

async fn run_group(
    strategy: Arc<dyn Strategy>,
    symbols: Vec<String>,
    market_data: Arc<MarketDataAdapter>,
    period: String,
    interval: String,
    news: Option<Arc<NewsClient>>,
    now: DateTime<Utc>,
) -> HashMap<String, Vec<Signal>> {
    let mut out = HashMap::new();
    for symbol in symbols {
        let signals = generate_for_symbol(&strategy, &symbol, &market_data, &period, &interval, news.as_deref(), now).await;
        if !signals.is_empty() {
            out.insert(symbol, signals);
        }
    }
    out
}

async fn generate_for_symbol(
    strategy: &Arc<dyn Strategy>,
    symbol: &str,
    market_data: &MarketDataAdapter,
    period: &str,
    interval: &str,
    news: Option<&NewsClient>,
    now: DateTime<Utc>,
) -> Vec<Signal> {
    let bars = match market_data.get_intraday(symbol, period, interval).await {
        Ok(bars) => bars,
        Err(e) => {
            warn!(symbol, strategy = strategy.id(), error = %e, "market data fetch failed, skipping symbol this cycle");
            return Vec::new();
        }
    };
    if bars.is_empty() {
        debug!(symbol, strategy = strategy.id(), "no bars available, skipping");
        return Vec::new();
    }

    let mut indicators = market_data
        .get_indicators(symbol, period, interval)
        .await
        .unwrap_or_default();

    if let Some(news) = news {
        enrich_with_news(&mut indicators, news, symbol, &bars).await;
    }

    strategy.generate_signals(symbol, &bars, &indicators, now)
}

/// Populate `news_sentiment`/`news_relevance`/`news_age_hours`/
/// `recent_volatility` on `indicators` from a live news-impact fetch. Leaves
/// `indicators` untouched (no `news_sentiment` key) when the provider has
/// nothing for this symbol this cycle — A6 treats that key's absence as "no
/// news to act on".
async fn enrich_with_news(indicators: &mut crate::types::IndicatorSet, news: &NewsClient, symbol: &str, bars: &BarSeries) {
    let impact = match news.recent_impact(symbol).await {
        Ok(impact) => impact,
        Err(e) => {
            debug!(symbol, error = %e, "news fetch failed, skipping news enrichment this cycle");
            return;
        }
    };
    let Some(impact) = impact else { return };

    indicators.scalars.insert("news_sentiment".to_string(), impact.sentiment);
    indicators.scalars.insert("news_relevance".to_string(), impact.relevance);
    indicators.scalars.insert("news_age_hours".to_string(), impact.age_hours);
    indicators.scalars.insert("recent_volatility".to_string(), recent_volatility(bars));
}

/// Max excursion of the trailing [`NEWS_VOLATILITY_WINDOW`] bars from the
/// window's opening close, as a fraction of that close — the same "price
/// move following a news window" measure the reference impact analysis used.
fn recent_volatility(bars: &BarSeries) -> f64 {
    let all = bars.as_slice();
    let start_idx = all.len().saturating_sub(NEWS_VOLATILITY_WINDOW);
    let window = &all[start_idx..];
    let Some(start_close) = window.first().map(|b| b.close) else { return 0.0 };
    if start_close == 0.0 {
        return 0.0;
    }

    let max_high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let min_low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);

    ((max_high - start_close).abs() / start_close).max((min_low - start_close).abs() / start_close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::base::Strategy as _;
    use crate::types::{Action, BarSeries, IndicatorSet, SignalType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStrategy {
        id: &'static str,
        calls: AtomicUsize,
    }

    impl Strategy for CountingStrategy {
        fn id(&self) -> &str {
            self.id
        }

        fn generate_signals(&self, symbol: &str, _bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Signal::new(symbol, self.id, SignalType::MomentumEntry, Action::Buy, 10.0, 1, 0.5, "test", false, now)
                .into_iter()
                .collect()
        }
    }

    #[test]
    fn unlisted_symbol_defaults_to_every_strategy() {
        let roster: Vec<Arc<dyn Strategy>> = vec![
            Arc::new(CountingStrategy { id: "a1", calls: AtomicUsize::new(0) }),
            Arc::new(CountingStrategy { id: "a2", calls: AtomicUsize::new(0) }),
        ];
        let map = HashMap::new();
        let universe = vec!["AAA".to_string()];
        let md = Arc::new(MarketDataAdapter::new("http://localhost:0").unwrap());
        let host = StrategyHost::new(roster, &map, &universe, md, "10d", "5m");
        assert_eq!(host.worker_count(), 2);
    }
}

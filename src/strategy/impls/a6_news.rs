// A6 — News trading. The host fetches the per-symbol news impact once per
// cycle and publishes it into the shared `IndicatorSet` under the
// `news_sentiment` / `news_relevance` / `news_age_hours` keys alongside a
// short-window realized-volatility proxy under `recent_volatility`; this
// strategy is a pure reader of that snapshot. Stale news (older than
// `max_news_age_hours`) is ignored.

use chrono::{DateTime, Utc};

use crate::strategy::base::Strategy;
use crate::strategy::impls::common::entry_signal;
use crate::types::{Action, BarSeries, IndicatorSet, Signal, SignalType};

const SENTIMENT_THRESHOLD: f64 = 0.4;
const VOLATILITY_THRESHOLD: f64 = 0.01;
const RELEVANCE_MIN: f64 = 0.5;
const MAX_NEWS_AGE_HOURS: f64 = 6.0;

pub struct NewsTrading;

impl Strategy for NewsTrading {
    fn id(&self) -> &str {
        "a6_news"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let Some(price) = bars.last().map(|b| b.close) else { return Vec::new() };
        let Some(sentiment) = indicators.scalar("news_sentiment") else { return Vec::new() };
        let relevance = indicators.scalar("news_relevance").unwrap_or(0.0);
        let age_hours = indicators.scalar("news_age_hours").unwrap_or(f64::MAX);
        let volatility = indicators.scalar("recent_volatility").unwrap_or(0.0);

        if age_hours > MAX_NEWS_AGE_HOURS {
            return Vec::new();
        }
        if relevance < RELEVANCE_MIN || volatility < VOLATILITY_THRESHOLD {
            return Vec::new();
        }
        if sentiment.abs() < SENTIMENT_THRESHOLD {
            return Vec::new();
        }

        let action = if sentiment > 0.0 { Action::Buy } else { Action::Sell };
        entry_signal(
            symbol, self.id(), SignalType::Named("A6_NEWS_IMPACT".into()), action, price, 1,
            sentiment.abs().clamp(0.3, 1.0), format!("news sentiment {sentiment:.2} relevance {relevance:.2}"), now,
        )
        .into_iter()
        .collect()
    }
}

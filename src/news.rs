// =============================================================================
// News/sentiment feed client
// =============================================================================
//
// Thin HTTP client over whichever provider `NewsProvider` resolves to. All
// three vendors are queried through the same normalized shape; callers never
// see provider-specific JSON.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::NewsProvider;

/// Floor on request spacing per provider (spec.md §6: "engine enforces >= 1s
/// between calls per provider").
const MIN_CALL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct NewsImpact {
    pub sentiment: f64,
    pub relevance: f64,
    pub age_hours: f64,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    sentiment: f64,
    relevance: f64,
    #[serde(rename = "age_hours")]
    age_hours: f64,
}

pub struct NewsClient {
    client: Client,
    api_key: String,
    provider: NewsProvider,
    last_call: Mutex<Option<Instant>>,
}

impl NewsClient {
    pub fn new(provider: NewsProvider, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder().timeout(Duration::from_secs(8)).build().expect("reqwest client build"),
            api_key: api_key.into(),
            provider: provider.resolved(),
            last_call: Mutex::new(None),
        }
    }

    /// Block until at least [`MIN_CALL_INTERVAL`] has elapsed since the last
    /// call this client made, then record the new call time.
    async fn throttle(&self) {
        let wait = {
            let mut last_call = self.last_call.lock();
            let now = Instant::now();
            let wait = last_call.map(|prev| MIN_CALL_INTERVAL.saturating_sub(now.duration_since(prev))).unwrap_or(Duration::ZERO);
            *last_call = Some(now + wait);
            wait
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    fn endpoint(&self) -> &'static str {
        match self.provider {
            NewsProvider::AlphaVantage => "https://www.alphavantage.co/query",
            NewsProvider::NewsApi => "https://newsapi.org/v2/everything",
            NewsProvider::Polygon => "https://api.polygon.io/v2/reference/news",
            NewsProvider::Unknown => unreachable!("resolved() always normalizes away Unknown"),
        }
    }

    /// Most impactful recent news item for `symbol`, if any exists and the
    /// provider returned at least one story.
    pub async fn recent_impact(&self, symbol: &str) -> Result<Option<NewsImpact>> {
        self.throttle().await;

        let response = self
            .client
            .get(self.endpoint())
            .query(&[("symbol", symbol), ("apikey", &self.api_key)])
            .send()
            .await
            .context("news request failed")?;

        if !response.status().is_success() {
            debug!(symbol, status = %response.status(), "news provider returned non-success status");
            return Ok(None);
        }

        let items: Vec<NewsItem> = response.json().await.context("failed to decode news response")?;
        Ok(items
            .into_iter()
            .max_by(|a, b| a.sentiment.abs().partial_cmp(&b.sentiment.abs()).unwrap())
            .map(|item| NewsImpact { sentiment: item.sentiment, relevance: item.relevance, age_hours: item.age_hours }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_resolves_unknown_to_alphavantage() {
        let client = NewsClient::new(NewsProvider::Unknown, "key");
        assert_eq!(client.endpoint(), "https://www.alphavantage.co/query");
    }
}

// A34 — Linear regression forecast. Fit an OLS trendline over the trailing
// window and project one step ahead; trade when the projected change versus
// the current price clears the prediction threshold.

use chrono::{DateTime, Utc};

use crate::indicators::linreg::calculate_linreg;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::entry_signal;
use crate::types::{Action, BarSeries, IndicatorSet, Signal, SignalType};

const WINDOW: usize = 20;
const PREDICTION_THRESHOLD: f64 = 0.02;

pub struct LinearRegressionForecast;

impl Strategy for LinearRegressionForecast {
    fn id(&self) -> &str {
        "a34_linear_regression"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        let Some(features) = calculate_linreg(&closes, WINDOW) else { return Vec::new() };
        let price = *closes.last().unwrap();
        if price <= 0.0 {
            return Vec::new();
        }
        let predicted_change = (features.forecast - price) / price;

        if predicted_change > PREDICTION_THRESHOLD {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A34_LINREG_FORECAST_UP".into()), Action::Buy, price, 1,
                (predicted_change * 5.0).min(0.9), format!("regression forecasts {:.2}% upside", predicted_change * 100.0), now,
            )
            .into_iter()
            .collect();
        }
        if predicted_change < -PREDICTION_THRESHOLD {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A34_LINREG_FORECAST_DOWN".into()), Action::Sell, price, 1,
                (predicted_change.abs() * 5.0).min(0.9), format!("regression forecasts {:.2}% downside", predicted_change * 100.0), now,
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
    use crate::types::Bar;
    use chrono::TimeZone;

    fn bar(ts: i64, close: f64) -> Bar {
        Bar { timestamp: Utc.timestamp_opt(ts, 0).unwrap(), open: close, high: close, low: close, close, volume: 1_000 }
    }

    #[test]
    fn uptrend_predicts_positive_change() {
        let bars = BarSeries::new((0..25).map(|i| bar(i * 60, 100.0 + i as f64 * 0.5)).collect()).unwrap();
        let strat = LinearRegressionForecast;
        let indicators = IndicatorSet::default();
        let signals = strat.generate_signals("TEST", &bars, &indicators, Utc::now());
        assert!(!signals.is_empty());
        assert!(matches!(signals[0].action, Action::Buy));
    }
}

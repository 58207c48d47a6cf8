pub mod common;

pub mod a1_momentum_reversal;
pub mod a2_zscore;
pub mod a3_dual_ma_volume;
pub mod a4_pullback;
pub mod a5_multifactor;
pub mod a6_news;
pub mod a7_cta_trend;
pub mod oscillators;
pub mod pairs;
pub mod a18_isolation_forest;
pub mod a22_super_trend;
pub mod a23_aroon;
pub mod a27_minervini;
pub mod a30_rs_rating;
pub mod a33_pivot_points;
pub mod a34_linear_regression;
pub mod a35_mlp;

use std::sync::Arc;

use crate::strategy::base::Strategy;

/// Build the full roster of strategy implementations, keyed by `Strategy::id`.
/// `model_dir` is where the isolation-forest anomaly detector (A18) persists
/// its per-symbol model blobs.
pub fn build_roster(model_dir: impl Into<std::path::PathBuf>) -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(a1_momentum_reversal::MomentumReversal),
        Arc::new(a2_zscore::ZScoreReversion),
        Arc::new(a3_dual_ma_volume::DualMaVolume),
        Arc::new(a4_pullback::Pullback),
        Arc::new(a5_multifactor::Multifactor::default()),
        Arc::new(a6_news::NewsTrading),
        Arc::new(a7_cta_trend::CtaTrend),
        Arc::new(oscillators::RsiOscillator),
        Arc::new(oscillators::MacdCrossover),
        Arc::new(oscillators::BollingerBands),
        Arc::new(oscillators::MovingAverageCrossover),
        Arc::new(oscillators::StochasticRsi),
        Arc::new(oscillators::EmaCrossover),
        Arc::new(oscillators::RsiTrendline),
        Arc::new(pairs::PairsTrading),
        Arc::new(oscillators::RocMomentum),
        Arc::new(oscillators::CciOscillator),
        Arc::new(a18_isolation_forest::IsolationForestAnomaly::new(model_dir)),
        Arc::new(a22_super_trend::SuperTrendFlip),
        Arc::new(a23_aroon::AroonOscillator),
        Arc::new(oscillators::UltimateOscillator),
        Arc::new(oscillators::WilliamsR),
        Arc::new(a27_minervini::MinerviniTrend),
        Arc::new(oscillators::TrueStrengthIndex),
        Arc::new(oscillators::StochasticOscillator),
        Arc::new(a30_rs_rating::RsRating),
        Arc::new(oscillators::MoneyFlowIndex),
        Arc::new(pairs::CointegrationPairs),
        Arc::new(a33_pivot_points::PivotPointsBreakout),
        Arc::new(a34_linear_regression::LinearRegressionForecast),
        Arc::new(a35_mlp::MlpForecast),
    ]
}

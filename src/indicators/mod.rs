// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the core technical indicators used
// by the trading engine.  Every public function returns `Option<T>` so callers
// are forced to handle insufficient-data and numerical-edge-case scenarios.

pub mod ema;
pub mod rsi;
pub mod bollinger;
pub mod atr;
pub mod roc;
pub mod sma;
pub mod macd;
pub mod donchian;
pub mod zscore;
pub mod stoch_rsi;
pub mod cci;
pub mod super_trend;
pub mod aroon;
pub mod ultimate;
pub mod williams_r;
pub mod mfi;
pub mod pivot_points;
pub mod keltner;
pub mod linreg;
pub mod mlp;
pub mod isolation_forest;

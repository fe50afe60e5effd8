//! Indicator trait, concrete indicator families, and the indicator cache.
//!
//! All indicators implement the `Indicator` trait. The cache computes them
//! once per price table and stores them as named columns, shifted by each
//! indicator's `cache_shift` (one bar unless it says otherwise).
//!
//! Multi-series indicators (Bollinger, MACD, stochastic) are exposed as
//! separate named instances per series, keeping the single-series `Indicator`
//! trait unchanged.

pub mod atr;
pub mod bollinger;
pub mod cache;
pub mod ema;
pub mod impulse;
pub mod indicator;
pub mod macd;
pub mod rolling;
pub mod rolling_high;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod volatility;

pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBand};
pub use cache::{IndicatorCache, IndicatorRequest};
pub use ema::Ema;
pub use impulse::Impulse;
pub use indicator::{Indicator, IndicatorValues};
pub use macd::{Macd, MacdLine};
pub use rolling_high::RollingHigh;
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::Stochastic;
pub use volatility::Volatility;

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
/// Bars are one day apart starting 2024-01-02.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

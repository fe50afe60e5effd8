//! TradeLab Core — domain types, indicator cache, signal providers, trade engine.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, price tables, trades)
//! - Indicator families and the one-bar-shifted indicator cache
//! - Signal providers, one per strategy family, behind a closed enum
//! - The single-position trade simulation engine and its risk rules
//! - The random-forest classifier behind the probability signal

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod model;
pub mod signals;

pub use domain::{Bar, ExitReason, PriceTable, Trade};
pub use engine::{simulate, simulate_signals, ConfigError, EngineError, EngineState, RiskConfig};
pub use indicators::{IndicatorCache, IndicatorRequest};
pub use signals::{SignalError, SignalProvider, Signals, StrategyConfig, StrategyKind};

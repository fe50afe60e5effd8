//! Performance metrics as pure functions over per-trade net returns.
//!
//! Returns are in percent units. Each trade's net return is its
//! `pct_change` minus commission and slippage (both flat percent per trade),
//! optionally scaled by the trade's quantity. Aggregates are additive sums of
//! those per-trade returns, not a compounded equity curve.

use serde::{Deserialize, Serialize};
use tradelab_core::domain::Trade;

/// Per-trade cost deductions and weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Percent deducted from every trade.
    pub commission: f64,
    /// Percent deducted from every trade.
    pub slippage: f64,
    /// Scale each net return by the trade's quantity.
    pub weight_by_position_size: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            commission: 0.1,
            slippage: 0.05,
            weight_by_position_size: false,
        }
    }
}

impl ScoringConfig {
    /// No costs, no weighting.
    pub fn frictionless() -> Self {
        Self {
            commission: 0.0,
            slippage: 0.0,
            weight_by_position_size: false,
        }
    }

    pub fn net_return(&self, trade: &Trade) -> f64 {
        let net = trade.pct_change() - self.commission - self.slippage;
        if self.weight_by_position_size {
            net * trade.quantity()
        } else {
            net
        }
    }
}

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Sum of net per-trade returns, percent.
    pub total_return: f64,
    pub trade_count: usize,
    /// Mean net per-trade return, percent.
    pub avg_trade: f64,
    /// Per-trade Sharpe: mean / sample std of net returns (not annualised).
    pub sharpe: f64,
    /// Deepest fall of the cumulative net return from its running peak,
    /// in percent points, as a non-positive number.
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    /// Mean bars between entry and exit.
    #[serde(default)]
    pub avg_bars_held: f64,
}

impl PerformanceMetrics {
    pub fn compute(trades: &[Trade], scoring: &ScoringConfig) -> Self {
        let net = net_returns(trades, scoring);
        Self {
            total_return: total_return(&net),
            trade_count: net.len(),
            avg_trade: avg_trade(&net),
            sharpe: sharpe_ratio(&net),
            max_drawdown: max_drawdown(&net),
            win_rate: win_rate(&net),
            profit_factor: profit_factor(&net),
            avg_bars_held: avg_bars_held(trades),
        }
    }

    /// Metrics of a run with no trades.
    pub fn empty() -> Self {
        Self::compute(&[], &ScoringConfig::default())
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn net_returns(trades: &[Trade], scoring: &ScoringConfig) -> Vec<f64> {
    trades.iter().map(|t| scoring.net_return(t)).collect()
}

/// Sum of net returns; 0.0 with no trades.
pub fn avg_bars_held(trades: &[Trade]) -> f64 {
    let held: Vec<f64> = trades.iter().map(|t| t.bars_held() as f64).collect();
    mean_f64(&held)
}

pub fn total_return(net: &[f64]) -> f64 {
    net.iter().sum()
}

pub fn avg_trade(net: &[f64]) -> f64 {
    mean_f64(net)
}

/// Returns 0.0 if fewer than 2 trades or zero variance.
pub fn sharpe_ratio(net: &[f64]) -> f64 {
    if net.len() < 2 {
        return 0.0;
    }
    let std = std_dev(net);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(net) / std
}

/// Maximum drawdown of the cumulative-sum curve that starts at 0.
pub fn max_drawdown(net: &[f64]) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for &r in net {
        cumulative += r;
        peak = peak.max(cumulative);
        max_dd = max_dd.min(cumulative - peak);
    }
    max_dd
}

/// Fraction of trades with a positive net return.
pub fn win_rate(net: &[f64]) -> f64 {
    if net.is_empty() {
        return 0.0;
    }
    net.iter().filter(|&&r| r > 0.0).count() as f64 / net.len() as f64
}

/// Gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(net: &[f64]) -> f64 {
    let gross_profit: f64 = net.iter().filter(|&&r| r > 0.0).sum();
    let gross_loss: f64 = net.iter().filter(|&&r| r < 0.0).map(|r| r.abs()).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Trades with the given percent returns, produced by running the engine on
/// hand-built bars (trades can only come from the engine).
#[cfg(test)]
pub(crate) fn trades_with_returns(pcts: &[f64], quantity: f64) -> Vec<Trade> {
    use chrono::NaiveDate;
    use tradelab_core::domain::Bar;
    use tradelab_core::engine::{simulate, RiskConfig};

    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut bars = Vec::new();
    let mut entries = Vec::new();
    let mut exits = Vec::new();
    for &pct in pcts {
        for (close, entry, exit) in [(100.0, true, false), (100.0 * (1.0 + pct / 100.0), false, true)] {
            bars.push(Bar {
                timestamp: base + chrono::Duration::hours(bars.len() as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            });
            entries.push(entry);
            exits.push(exit);
        }
    }
    let risk = RiskConfig::new(99.0, 1000.0, None, quantity).unwrap();
    simulate(&bars, &entries, &exits, &risk).unwrap()
}

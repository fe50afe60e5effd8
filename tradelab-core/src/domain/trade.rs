//! Trade — a completed long round trip produced by the engine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
    EndOfData,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Signal => "signal",
            ExitReason::EndOfData => "end_of_data",
        }
    }
}

/// A closed round trip: entry → exit.
///
/// Fields are private; a `Trade` is only constructed by the engine and is
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    entry_bar: usize,
    entry_time: NaiveDateTime,
    entry_price: f64,

    // ── Exit ──
    exit_bar: usize,
    exit_time: NaiveDateTime,
    exit_price: f64,
    exit_reason: ExitReason,

    // ── Size ──
    quantity: f64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        entry_bar: usize,
        entry_time: NaiveDateTime,
        entry_price: f64,
        exit_bar: usize,
        exit_time: NaiveDateTime,
        exit_price: f64,
        exit_reason: ExitReason,
        quantity: f64,
    ) -> Self {
        Self {
            entry_bar,
            entry_time,
            entry_price,
            exit_bar,
            exit_time,
            exit_price,
            exit_reason,
            quantity,
        }
    }

    pub fn entry_bar(&self) -> usize {
        self.entry_bar
    }

    pub fn entry_time(&self) -> NaiveDateTime {
        self.entry_time
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn exit_bar(&self) -> usize {
        self.exit_bar
    }

    pub fn exit_time(&self) -> NaiveDateTime {
        self.exit_time
    }

    pub fn exit_price(&self) -> f64 {
        self.exit_price
    }

    pub fn exit_reason(&self) -> ExitReason {
        self.exit_reason
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Percent move from entry to exit: `(exit / entry - 1) * 100`.
    pub fn pct_change(&self) -> f64 {
        (self.exit_price / self.entry_price - 1.0) * 100.0
    }

    /// Bars between entry and exit; 0 for a same-bar exit.
    pub fn bars_held(&self) -> usize {
        self.exit_bar - self.entry_bar
    }
}

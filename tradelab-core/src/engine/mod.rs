//! Trade simulation engine — bar loop over a single long-only position.
//!
//! The engine walks the bars once, feeding each bar through the pure
//! [`step`] transition. Any position still open after the final bar is
//! closed at the final close with [`ExitReason::EndOfData`].
//!
//! The engine never fails on data content; the only error is a signal
//! vector whose length does not match the bars.

pub mod ratchet;
pub mod risk;
pub mod state;
pub mod step;

pub use ratchet::Ratchet;
pub use risk::{ConfigError, RiskConfig};
pub use state::{EngineState, OpenPosition};
pub use step::step;

use thiserror::Error;
use tracing::debug;

use crate::domain::{Bar, ExitReason, PriceTable, Trade};
use crate::signals::Signals;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("signal length mismatch: {bars} bars, {entries} entry flags, {exits} exit flags")]
    LengthMismatch {
        bars: usize,
        entries: usize,
        exits: usize,
    },
}

/// Run one backtest and return the closed trades in time order.
pub fn simulate(
    bars: &[Bar],
    entries: &[bool],
    exits: &[bool],
    risk: &RiskConfig,
) -> Result<Vec<Trade>, EngineError> {
    if entries.len() != bars.len() || exits.len() != bars.len() {
        return Err(EngineError::LengthMismatch {
            bars: bars.len(),
            entries: entries.len(),
            exits: exits.len(),
        });
    }

    let mut state = EngineState::Flat;
    let mut trades = Vec::new();
    for (i, bar) in bars.iter().enumerate() {
        let (next, closed) = step(state, i, bar, entries[i], exits[i], risk);
        state = next;
        trades.extend(closed);
    }

    if let (EngineState::Long(pos), Some(last)) = (state, bars.last()) {
        debug!(bar = bars.len() - 1, price = last.close, "forced exit at end of data");
        trades.push(pos.close(
            bars.len() - 1,
            last.timestamp,
            last.close,
            ExitReason::EndOfData,
        ));
    }

    debug!(bars = bars.len(), trades = trades.len(), "simulation complete");
    Ok(trades)
}

/// [`simulate`] over a table and the signal pair a provider produced for it.
pub fn simulate_signals(
    table: &PriceTable,
    signals: &Signals,
    risk: &RiskConfig,
) -> Result<Vec<Trade>, EngineError> {
    simulate(table.bars(), &signals.entries, &signals.exits, risk)
}

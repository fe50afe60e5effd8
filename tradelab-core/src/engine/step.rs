//! The per-bar transition function.

use tracing::{debug, trace};

use super::risk::RiskConfig;
use super::state::{EngineState, OpenPosition};
use crate::domain::{Bar, Trade};

/// Advance the engine by one bar.
///
/// - `Flat` + entry: open a long at the close. No exit check on this bar.
/// - `Long`: check stop, target, then exit signal. On exit go flat (no
///   re-entry on the same bar). Otherwise ratchet the trailing stop.
pub fn step(
    state: EngineState,
    index: usize,
    bar: &Bar,
    entry: bool,
    exit: bool,
    risk: &RiskConfig,
) -> (EngineState, Option<Trade>) {
    match state {
        EngineState::Flat if entry => {
            let pos = OpenPosition::open(index, bar, risk);
            debug!(
                bar = index,
                price = pos.entry_price,
                stop = pos.stop_price(),
                target = pos.take_profit_price,
                "entry"
            );
            (EngineState::Long(pos), None)
        }
        EngineState::Flat => (EngineState::Flat, None),
        EngineState::Long(mut pos) => {
            if let Some((price, reason)) = pos.exit_trigger(bar, exit) {
                debug!(bar = index, price, reason = reason.as_str(), "exit");
                let trade = pos.close(index, bar.timestamp, price, reason);
                return (EngineState::Flat, Some(trade));
            }
            if pos.trail(bar.high, risk) {
                trace!(bar = index, stop = pos.stop_price(), "trailing stop raised");
            }
            (EngineState::Long(pos), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExitReason;
    use crate::indicators::make_bars;

    fn long_at_100(risk: &RiskConfig) -> EngineState {
        let bars = make_bars(&[100.0]);
        let (state, _) = step(EngineState::Flat, 0, &bars[0], true, false, risk);
        state
    }

    #[test]
    fn flat_without_entry_stays_flat() {
        let bars = make_bars(&[100.0]);
        let risk = RiskConfig::fixed(5.0, 10.0).unwrap();
        let (state, trade) = step(EngineState::Flat, 0, &bars[0], false, true, &risk);
        assert!(state.is_flat());
        assert!(trade.is_none());
    }

    #[test]
    fn stop_beats_target_when_both_touch() {
        let risk = RiskConfig::fixed(5.0, 10.0).unwrap();
        let state = long_at_100(&risk);
        let mut bar = make_bars(&[100.0, 100.0])[1].clone();
        bar.low = 90.0;
        bar.high = 120.0;
        let (state, trade) = step(state, 1, &bar, false, true, &risk);
        let trade = trade.unwrap();
        assert!(state.is_flat());
        assert_eq!(trade.exit_reason(), ExitReason::StopLoss);
        assert!((trade.exit_price() - 95.0).abs() < 1e-12);
    }

    #[test]
    fn target_beats_signal() {
        let risk = RiskConfig::fixed(5.0, 10.0).unwrap();
        let state = long_at_100(&risk);
        let mut bar = make_bars(&[100.0, 105.0])[1].clone();
        bar.low = 99.0;
        bar.high = 111.0;
        let (_, trade) = step(state, 1, &bar, false, true, &risk);
        let trade = trade.unwrap();
        assert_eq!(trade.exit_reason(), ExitReason::TakeProfit);
        assert!((trade.exit_price() - 110.0).abs() < 1e-9);
    }

    #[test]
    fn signal_exit_fills_at_close() {
        let risk = RiskConfig::fixed(5.0, 10.0).unwrap();
        let state = long_at_100(&risk);
        let mut bar = make_bars(&[100.0, 103.0])[1].clone();
        bar.low = 99.0;
        bar.high = 104.0;
        let (_, trade) = step(state, 1, &bar, true, true, &risk);
        let trade = trade.unwrap();
        assert_eq!(trade.exit_reason(), ExitReason::Signal);
        assert_eq!(trade.exit_price(), 103.0);
    }

    #[test]
    fn trailing_stop_ratchets_on_new_highs_only() {
        let risk = RiskConfig::new(0.0, 100.0, Some(5.0), 1.0).unwrap();
        let mut state = long_at_100(&risk);
        let template = make_bars(&[100.0, 100.0])[1].clone();

        let highs = [110.0, 108.0, 112.0];
        let mut stops = Vec::new();
        for (i, &high) in highs.iter().enumerate() {
            let mut bar = template.clone();
            bar.high = high;
            bar.low = 105.0;
            bar.close = 106.0;
            let (next, trade) = step(state, i + 1, &bar, false, false, &risk);
            assert!(trade.is_none());
            stops.push(next.position().unwrap().stop_price());
            state = next;
        }
        assert!((stops[0] - 104.5).abs() < 1e-9);
        assert!((stops[1] - 104.5).abs() < 1e-9);
        assert!((stops[2] - 106.4).abs() < 1e-9);
    }
}

//! Engine state machine — one open long position at most.

use chrono::NaiveDateTime;

use super::ratchet::Ratchet;
use super::risk::RiskConfig;
use crate::domain::{Bar, ExitReason, Trade};

/// Per-run state, advanced one bar at a time by [`super::step`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EngineState {
    #[default]
    Flat,
    Long(OpenPosition),
}

impl EngineState {
    pub fn is_flat(&self) -> bool {
        matches!(self, EngineState::Flat)
    }

    pub fn position(&self) -> Option<&OpenPosition> {
        match self {
            EngineState::Flat => None,
            EngineState::Long(pos) => Some(pos),
        }
    }
}

/// A long position opened at a bar's close.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub take_profit_price: f64,
    pub quantity: f64,
    stop: Ratchet,
    trailing_floor: Option<Ratchet>,
}

impl OpenPosition {
    /// Open at `bar.close`. With a trailing stop, the initial floor is taken
    /// from the entry price and the stop starts at `max(stop, floor)`.
    pub fn open(index: usize, bar: &Bar, risk: &RiskConfig) -> Self {
        let entry_price = bar.close;
        let mut stop = Ratchet::new(risk.stop_price(entry_price));
        let trailing_floor = risk.trailing_level(entry_price).map(|floor| {
            stop.apply(floor);
            Ratchet::new(floor)
        });
        Self {
            entry_index: index,
            entry_time: bar.timestamp,
            entry_price,
            take_profit_price: risk.take_profit_price(entry_price),
            quantity: risk.position_size(),
            stop,
            trailing_floor,
        }
    }

    pub fn stop_price(&self) -> f64 {
        self.stop.level()
    }

    pub fn trailing_floor(&self) -> Option<f64> {
        self.trailing_floor.map(|r| r.level())
    }

    /// Ratchet the trailing floor toward `high * (1 - trail%)` and lift the
    /// stop to it. Returns true when the stop moved.
    pub(crate) fn trail(&mut self, high: f64, risk: &RiskConfig) -> bool {
        let (Some(floor), Some(candidate)) =
            (self.trailing_floor.as_mut(), risk.trailing_level(high))
        else {
            return false;
        };
        let before = self.stop.level();
        let floor = floor.apply(candidate);
        self.stop.apply(floor) > before
    }

    /// Price-triggered or signal exit for this bar, in priority order:
    /// stop-loss, take-profit, exit signal.
    ///
    /// When one bar's range spans both stop and target the stop wins; the
    /// intrabar path is unknown and this is the conservative reading.
    pub fn exit_trigger(&self, bar: &Bar, exit_signal: bool) -> Option<(f64, ExitReason)> {
        if bar.low <= self.stop_price() {
            Some((self.stop_price(), ExitReason::StopLoss))
        } else if bar.high >= self.take_profit_price {
            Some((self.take_profit_price, ExitReason::TakeProfit))
        } else if exit_signal {
            Some((bar.close, ExitReason::Signal))
        } else {
            None
        }
    }

    pub(crate) fn close(
        self,
        exit_index: usize,
        exit_time: NaiveDateTime,
        exit_price: f64,
        reason: ExitReason,
    ) -> Trade {
        Trade::new(
            self.entry_index,
            self.entry_time,
            self.entry_price,
            exit_index,
            exit_time,
            exit_price,
            reason,
            self.quantity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn open_without_trailing_uses_fixed_levels() {
        let bars = make_bars(&[100.0]);
        let risk = RiskConfig::new(5.0, 10.0, None, 2.0).unwrap();
        let pos = OpenPosition::open(0, &bars[0], &risk);
        assert_eq!(pos.entry_price, 100.0);
        assert!((pos.stop_price() - 95.0).abs() < 1e-12);
        assert!((pos.take_profit_price - 110.0).abs() < 1e-12);
        assert_eq!(pos.trailing_floor(), None);
        assert_eq!(pos.quantity, 2.0);
    }

    #[test]
    fn trailing_floor_above_fixed_stop_replaces_it() {
        let bars = make_bars(&[100.0]);
        let risk = RiskConfig::new(5.0, 10.0, Some(2.0), 1.0).unwrap();
        let pos = OpenPosition::open(0, &bars[0], &risk);
        assert_eq!(pos.trailing_floor(), Some(98.0));
        assert_eq!(pos.stop_price(), 98.0);
    }

    #[test]
    fn trail_without_trailing_config_is_a_no_op() {
        let bars = make_bars(&[100.0]);
        let risk = RiskConfig::fixed(5.0, 10.0).unwrap();
        let mut pos = OpenPosition::open(0, &bars[0], &risk);
        assert!(!pos.trail(200.0, &risk));
        assert!((pos.stop_price() - 95.0).abs() < 1e-12);
    }
}

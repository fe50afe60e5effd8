//! Ratchet invariant for long stops.
//!
//! **Core rule:** a stop may tighten (rise), never loosen.

/// A price level that only moves up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratchet {
    level: f64,
}

impl Ratchet {
    pub fn new(initial_level: f64) -> Self {
        Self {
            level: initial_level,
        }
    }

    /// Offer a new level; keeps `max(current, proposed)` and returns it.
    ///
    /// A NaN proposal leaves the level unchanged.
    pub fn apply(&mut self, proposed: f64) -> f64 {
        if proposed > self.level {
            self.level = proposed;
        }
        self.level
    }

    pub fn level(&self) -> f64 {
        self.level
    }
}

//! Grid enumeration over a search space, and local refinement around a result.

use tradelab_core::signals::StrategyKind;

use crate::params::{ParamSet, ParamValue, TrialConfig};
use crate::search_space::{ParamSpec, SearchSpace};

/// Lazy cartesian product of every parameter's grid values.
///
/// The last parameter varies fastest. An empty space yields one empty set.
pub struct GridIter {
    names: Vec<String>,
    values: Vec<Vec<ParamValue>>,
    cursor: Option<Vec<usize>>,
}

impl GridIter {
    pub fn new(space: &SearchSpace) -> Self {
        let names: Vec<String> = space.params().iter().map(|(n, _)| n.clone()).collect();
        let values: Vec<Vec<ParamValue>> =
            space.params().iter().map(|(_, s)| s.grid_values()).collect();
        let cursor = if values.iter().any(Vec::is_empty) {
            None
        } else {
            Some(vec![0; values.len()])
        };
        Self {
            names,
            values,
            cursor,
        }
    }
}

impl Iterator for GridIter {
    type Item = ParamSet;

    fn next(&mut self) -> Option<ParamSet> {
        let cursor = self.cursor.as_mut()?;
        let mut set = ParamSet::new();
        for ((name, values), &i) in self.names.iter().zip(&self.values).zip(cursor.iter()) {
            set.insert(name.clone(), values[i]);
        }

        // Odometer increment; exhausted once every digit wraps.
        let mut pos = cursor.len();
        let exhausted = loop {
            if pos == 0 {
                break true;
            }
            pos -= 1;
            cursor[pos] += 1;
            if cursor[pos] < self.values[pos].len() {
                break false;
            }
            cursor[pos] = 0;
        };
        if exhausted {
            self.cursor = None;
        }
        Some(set)
    }
}

/// Every grid point of the space, in enumeration order.
pub fn enumerate(space: &SearchSpace) -> GridIter {
    GridIter::new(space)
}

/// `value + i * step` for `i` in `-radius..=radius`, keeping positive values.
fn around(value: i64, step: i64, radius: i64) -> Vec<ParamValue> {
    (-radius..=radius)
        .map(|i| value + i * step)
        .filter(|&v| v > 0)
        .map(ParamValue::Int)
        .collect()
}

/// (parameter, step, radius) used to refine a strategy's integer parameters.
fn refine_steps(space: &SearchSpace) -> Vec<(String, i64, i64)> {
    if space.kind == StrategyKind::Sma {
        return vec![
            ("sma_fast".into(), 2, 2),
            ("sma_slow".into(), 5, 2),
            ("sl_pct".into(), 1, 1),
            ("tp_pct".into(), 5, 1),
        ];
    }
    space
        .params()
        .iter()
        .filter_map(|(name, spec)| match spec {
            ParamSpec::Int { step, .. } => {
                let radius = if name == "sl_pct" || name == "tp_pct" { 1 } else { 2 };
                Some((name.clone(), (*step).max(1), radius))
            }
            _ => None,
        })
        .collect()
}

/// A small grid centred on `best`: integer parameters move a few steps either
/// way, everything else is held at its best value. Combinations that would be
/// pruned are left out.
pub fn refine_around(space: &SearchSpace, best: &ParamSet) -> Vec<ParamSet> {
    let mut local = SearchSpace::new(space.kind);
    for (name, step, radius) in refine_steps(space) {
        if let Some(value) = best.get(&name).and_then(|v| v.as_i64()) {
            local = local.with(name, ParamSpec::Choice(around(value, step, radius)));
        }
    }
    for (name, value) in best.iter() {
        if local.get(name).is_none() {
            local = local.with(name, ParamSpec::Choice(vec![value]));
        }
    }
    if space.kind == StrategyKind::Sma {
        for (name, fallback) in [("position_size", 0.1), ("trailing_stop_pct", 1.0)] {
            if best.get(name).is_none() {
                local = local.with(name, ParamSpec::Choice(vec![ParamValue::Float(fallback)]));
            }
        }
    }

    enumerate(&local)
        .filter(|params| TrialConfig::from_params(space.kind, params).is_ok())
        .collect()
}

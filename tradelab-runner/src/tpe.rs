//! Tree-structured Parzen Estimator sampler.
//!
//! The first `n_startup` suggestions are uniform draws. After that the
//! completed trials are split into the best `gamma` fraction ("good") and the
//! rest ("bad"). Each numeric parameter is proposed by drawing candidates
//! from Gaussians centred on good observations and keeping the one with the
//! highest `l(x) / g(x)`, where `l` and `g` are Parzen densities over the good
//! and bad observations. Choice parameters are drawn from Laplace-smoothed
//! frequencies in the good set. Parameters are modelled independently.

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::params::{ParamSet, ParamValue};
use crate::search_space::{ParamSpec, SearchSpace};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TpeSettings {
    /// Uniform draws before the model is used.
    pub n_startup: usize,
    /// Fraction of completed trials treated as good.
    pub gamma: f64,
    /// Candidates scored per numeric parameter.
    pub n_candidates: usize,
    pub seed: u64,
}

impl Default for TpeSettings {
    fn default() -> Self {
        Self {
            n_startup: 10,
            gamma: 0.2,
            n_candidates: 24,
            seed: 42,
        }
    }
}

impl TpeSettings {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// Kernel width as a fraction of the parameter range.
const BANDWIDTH: f64 = 0.1;

pub struct TpeSampler {
    space: SearchSpace,
    settings: TpeSettings,
    rng: StdRng,
    history: Vec<(ParamSet, f64)>,
}

impl TpeSampler {
    pub fn new(space: SearchSpace, settings: TpeSettings) -> Self {
        let rng = StdRng::seed_from_u64(settings.seed);
        Self {
            space,
            settings,
            rng,
            history: Vec::new(),
        }
    }

    /// Record a completed trial. Higher scores are better.
    pub fn observe(&mut self, params: ParamSet, score: f64) {
        if score.is_finite() {
            self.history.push((params, score));
        }
    }

    pub fn observed(&self) -> usize {
        self.history.len()
    }

    pub fn suggest(&mut self) -> ParamSet {
        if self.history.len() < self.settings.n_startup.max(1) {
            return self.space.sample(&mut self.rng);
        }

        let mut ranked: Vec<&(ParamSet, f64)> = self.history.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let n_good = ((self.settings.gamma * ranked.len() as f64).ceil() as usize)
            .clamp(1, ranked.len());
        let (good, bad) = ranked.split_at(n_good);
        let bad = if bad.is_empty() { good } else { bad };

        let mut set = ParamSet::new();
        for (name, spec) in self.space.params() {
            let good_obs = observations(good, name);
            let value = match spec {
                ParamSpec::Choice(choices) => {
                    sample_choice(&mut self.rng, choices, &good_obs)
                }
                _ => {
                    let bad_obs = observations(bad, name);
                    sample_numeric(
                        &mut self.rng,
                        spec,
                        &good_obs,
                        &bad_obs,
                        self.settings.n_candidates,
                    )
                }
            };
            set.insert(name.clone(), value);
        }
        set
    }
}

fn observations(trials: &[&(ParamSet, f64)], name: &str) -> Vec<ParamValue> {
    trials.iter().filter_map(|(p, _)| p.get(name)).collect()
}

fn sample_choice(rng: &mut StdRng, choices: &[ParamValue], good: &[ParamValue]) -> ParamValue {
    let weights: Vec<f64> = choices
        .iter()
        .map(|c| 1.0 + good.iter().filter(|g| *g == c).count() as f64)
        .collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => choices[dist.sample(rng)],
        Err(_) => ParamValue::None,
    }
}

fn sample_numeric(
    rng: &mut StdRng,
    spec: &ParamSpec,
    good: &[ParamValue],
    bad: &[ParamValue],
    n_candidates: usize,
) -> ParamValue {
    let good: Vec<f64> = good.iter().filter_map(ParamValue::as_f64).collect();
    let bad: Vec<f64> = bad.iter().filter_map(ParamValue::as_f64).collect();
    let Some((low, high)) = spec.bounds() else {
        return spec.sample(rng);
    };
    if good.is_empty() || high <= low {
        return spec.sample(rng);
    }

    let sigma = BANDWIDTH * (high - low);
    let Ok(kernel) = Normal::new(0.0, sigma) else {
        return spec.sample(rng);
    };

    let mut best_x = good[0];
    let mut best_ratio = f64::NEG_INFINITY;
    for _ in 0..n_candidates.max(1) {
        let centre = good[rng.gen_range(0..good.len())];
        let x = (centre + kernel.sample(rng)).clamp(low, high);
        let ratio = parzen(x, &good, sigma) / (parzen(x, &bad, sigma) + 1e-12);
        if ratio > best_ratio {
            best_ratio = ratio;
            best_x = x;
        }
    }
    spec.snap(best_x)
}

/// Mean Gaussian density of `x` under kernels centred on `centres`.
fn parzen(x: f64, centres: &[f64], sigma: f64) -> f64 {
    if centres.is_empty() {
        return 0.0;
    }
    let norm = 1.0 / (sigma * (2.0 * std::f64::consts::PI).sqrt());
    centres
        .iter()
        .map(|c| {
            let z = (x - c) / sigma;
            norm * (-0.5 * z * z).exp()
        })
        .sum::<f64>()
        / centres.len() as f64
}

//! Classifier-probability signal — a random forest predicts P(next close up).
//!
//! The forest is fit on the leading `train_fraction` of bars and only scores
//! bars after that window. Bars inside the training window never signal.
//!
//! Features are every cached column whose name starts with one of
//! `FEATURE_PREFIXES`, in sorted name order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SignalError, SignalProvider, Signals};
use crate::domain::PriceTable;
use crate::engine::ConfigError;
use crate::indicators::IndicatorRequest;
use crate::model::{ForestConfig, RandomForest};

/// Column name prefixes read as model features.
pub const FEATURE_PREFIXES: [&str; 5] = ["sma_", "rsi_", "atr_", "vol_", "impulse_"];

/// Feature columns the default indicator request caches.
pub const DEFAULT_FEATURES: [&str; 6] = [
    "sma_10",
    "sma_50",
    "rsi_14",
    "atr_14",
    "vol_20",
    "impulse_10",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierProbability {
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub train_fraction: f64,
    pub seed: u64,
}

impl Default for ClassifierProbability {
    fn default() -> Self {
        Self {
            entry_threshold: 0.6,
            exit_threshold: 0.4,
            n_estimators: 50,
            max_depth: 8,
            train_fraction: 0.5,
            seed: 42,
        }
    }
}

impl ClassifierProbability {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("must lie in [0, 1], got {v}"),
                })
            }
        };
        unit("entry_threshold", self.entry_threshold)?;
        unit("exit_threshold", self.exit_threshold)?;
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "train_fraction".into(),
                reason: format!("must lie in (0, 1), got {}", self.train_fraction),
            });
        }
        super::check_window("n_estimators", self.n_estimators)?;
        super::check_window("max_depth", self.max_depth)
    }

    fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_trees: self.n_estimators,
            max_depth: self.max_depth,
            seed: self.seed,
            ..ForestConfig::default()
        }
    }

    /// First bar scored by the model.
    pub fn train_end(&self, n_bars: usize) -> usize {
        ((n_bars as f64 * self.train_fraction).floor() as usize).min(n_bars)
    }

    /// P(up) per bar; NaN inside the training window and wherever a feature is NaN.
    pub fn probabilities(&self, table: &PriceTable) -> Result<Vec<f64>, SignalError> {
        let names = feature_columns(table);
        if names.is_empty() {
            return Err(SignalError::MissingIndicator {
                column: FEATURE_PREFIXES.map(|p| format!("{p}*")).join(" | "),
            });
        }
        let columns: Vec<&[f64]> = names.iter().filter_map(|c| table.column(c)).collect();
        let closes = table.closes();
        let n = table.len();
        let train_end = self.train_end(n);

        let row = |i: usize| -> Option<Vec<f64>> {
            let r: Vec<f64> = columns.iter().map(|c| c[i]).collect();
            r.iter().all(|v| v.is_finite()).then_some(r)
        };

        // Labels use close[i + 1], which must still fall inside the window.
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..train_end.saturating_sub(1) {
            if let Some(r) = row(i) {
                features.push(r);
                labels.push(closes[i + 1] > closes[i]);
            }
        }

        let forest = RandomForest::fit(&features, &labels, &self.forest_config())?;
        debug!(
            features = names.len(),
            train_rows = features.len(),
            train_end,
            trees = forest.n_trees(),
            "classifier trained"
        );

        let mut probs = vec![f64::NAN; n];
        for (i, p) in probs.iter_mut().enumerate().skip(train_end) {
            if let Some(r) = row(i) {
                *p = forest.predict_proba(&r);
            }
        }
        Ok(probs)
    }
}

/// Feature columns present on `table`, sorted by name.
pub fn feature_columns(table: &PriceTable) -> Vec<&str> {
    table
        .column_names()
        .into_iter()
        .filter(|name| FEATURE_PREFIXES.iter().any(|p| name.starts_with(p)))
        .collect()
}

impl SignalProvider for ClassifierProbability {
    fn name(&self) -> &str {
        "classifier_probability"
    }

    fn indicator_request(&self) -> IndicatorRequest {
        let mut req = IndicatorRequest::new();
        req.sma.extend([10, 50]);
        req.rsi.insert(14);
        req.atr.insert(14);
        req.vol.insert(20);
        req.impulse.insert(10);
        req
    }

    fn required_columns(&self) -> Vec<String> {
        DEFAULT_FEATURES.iter().map(|c| c.to_string()).collect()
    }

    fn signals(&self, table: &PriceTable) -> Result<Signals, SignalError> {
        let probs = self.probabilities(table)?;
        Ok(Signals {
            entries: probs.iter().map(|&p| p > self.entry_threshold).collect(),
            exits: probs.iter().map(|&p| p < self.exit_threshold).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorCache;
    use crate::model::ModelError;
    use crate::signals::table_from;

    fn wavy_table(n: usize) -> PriceTable {
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.5).sin() + 0.05 * i as f64)
            .collect();
        let mut table = table_from(&closes);
        IndicatorCache::annotate(&mut table, &ClassifierProbability::default().indicator_request());
        table
    }

    #[test]
    fn request_covers_feature_columns() {
        let strat = ClassifierProbability::default();
        let table = wavy_table(120);
        for col in strat.required_columns() {
            assert!(table.has_column(&col), "{col} not cached");
        }
    }

    #[test]
    fn no_signal_inside_training_window() {
        let strat = ClassifierProbability {
            n_estimators: 10,
            ..Default::default()
        };
        let table = wavy_table(300);
        let probs = strat.probabilities(&table).unwrap();
        let train_end = strat.train_end(300);
        assert_eq!(train_end, 150);
        assert!(probs[..train_end].iter().all(|p| p.is_nan()));
        assert!(probs[train_end..].iter().all(|p| (0.0..=1.0).contains(p)));

        let sig = strat.signals(&table).unwrap();
        assert!(sig.entries[..train_end].iter().all(|&e| !e));
        assert!(sig.exits[..train_end].iter().all(|&e| !e));
    }

    #[test]
    fn seeded_forest_is_reproducible() {
        let strat = ClassifierProbability {
            n_estimators: 8,
            seed: 11,
            ..Default::default()
        };
        let table = wavy_table(200);
        assert_eq!(strat.signals(&table).unwrap(), strat.signals(&table).unwrap());
    }

    #[test]
    fn no_finite_training_rows_is_a_model_error() {
        let mut table = table_from(&[1.0, 2.0, 3.0, 4.0]);
        for col in DEFAULT_FEATURES {
            table.insert_column(col, vec![f64::NAN, 1.0, 1.0, 1.0]);
        }
        let err = ClassifierProbability::default().signals(&table).unwrap_err();
        assert!(matches!(err, SignalError::Model(ModelError::EmptyTrainingSet)));
    }

    #[test]
    fn extra_feature_column_joins_the_matrix_in_name_order() {
        let mut table = wavy_table(200);
        assert_eq!(
            feature_columns(&table),
            vec!["atr_14", "impulse_10", "rsi_14", "sma_10", "sma_50", "vol_20"]
        );
        let mut req = IndicatorRequest::new();
        req.sma.insert(20);
        req.bollinger.insert(20);
        IndicatorCache::annotate(&mut table, &req);

        assert_eq!(
            feature_columns(&table),
            vec!["atr_14", "impulse_10", "rsi_14", "sma_10", "sma_20", "sma_50", "vol_20"]
        );
    }

    #[test]
    fn any_single_feature_family_is_enough() {
        let closes: Vec<f64> = (0..200)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.5).sin())
            .collect();
        let mut table = table_from(&closes);
        let mut req = IndicatorRequest::new();
        req.rsi.insert(14);
        IndicatorCache::annotate(&mut table, &req);
        assert_eq!(feature_columns(&table), vec!["rsi_14"]);

        let strat = ClassifierProbability {
            n_estimators: 5,
            ..Default::default()
        };
        let probs = strat.probabilities(&table).unwrap();
        assert!(probs[100..].iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn no_feature_columns_is_missing_indicator() {
        let mut table = table_from(&[1.0, 2.0, 3.0, 4.0]);
        table.insert_column("hmax_3", vec![1.0; 4]);
        let err = ClassifierProbability::default().signals(&table).unwrap_err();
        assert!(matches!(err, SignalError::MissingIndicator { .. }));
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let bad = ClassifierProbability {
            train_fraction: 1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = ClassifierProbability {
            entry_threshold: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}

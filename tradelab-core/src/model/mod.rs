//! Probability classifier backing the classifier-probability signal.

pub mod forest;
pub mod tree;

pub use forest::{ForestConfig, RandomForest};
pub use tree::{DecisionTree, TreeConfig};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("training set has no feature columns")]
    NoFeatures,

    #[error("{rows} feature rows but {labels} labels")]
    LabelMismatch { rows: usize, labels: usize },

    #[error("feature row {row} has a different width than row 0")]
    RaggedRow { row: usize },
}

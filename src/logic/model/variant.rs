//! Classifier variants
//!
//! One fixed configuration per variant, no search.

use serde::{Deserialize, Serialize};

/// Algorithm and its hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum Algorithm {
    /// Support vector classifier with a linear kernel
    LinearSvc { c: f64 },
    GaussianNaiveBayes,
    /// L2-regularized; iterations bounded by the LBFGS solver (1000)
    LogisticRegression { alpha: f64 },
    /// Euclidean distance
    KNearestNeighbors { k: usize },
}

impl Algorithm {
    /// Needs both classes present in the training labels
    pub fn needs_both_classes(&self) -> bool {
        matches!(
            self,
            Algorithm::LinearSvc { .. } | Algorithm::LogisticRegression { .. }
        )
    }

    /// Hyperparameter sanity; `None` when valid
    pub fn invalid_reason(&self) -> Option<String> {
        match self {
            Algorithm::LinearSvc { c } if !(c.is_finite() && *c > 0.0) => {
                Some(format!("SVC c must be > 0, got {}", c))
            }
            Algorithm::LogisticRegression { alpha } if !(alpha.is_finite() && *alpha >= 0.0) => {
                Some(format!("logistic regression alpha must be >= 0, got {}", alpha))
            }
            Algorithm::KNearestNeighbors { k } if *k == 0 => {
                Some("KNN k must be >= 1".to_string())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantConfig {
    /// Display name, also the prediction artifact stem
    pub name: String,
    #[serde(flatten)]
    pub algorithm: Algorithm,
}

impl VariantConfig {
    pub fn new(name: &str, algorithm: Algorithm) -> Self {
        Self {
            name: name.to_string(),
            algorithm,
        }
    }

    pub fn artifact_name(&self) -> String {
        format!("{}.csv", self.name)
    }

    /// The standard ensemble: SVM, naive Bayes, logistic regression, KNN
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("SupportVectorMachine", Algorithm::LinearSvc { c: 1.0 }),
            Self::new("NaiveBayes", Algorithm::GaussianNaiveBayes),
            Self::new("LogisticRegression", Algorithm::LogisticRegression { alpha: 1.0 }),
            Self::new("K-NearestNeighbour", Algorithm::KNearestNeighbors { k: 5 }),
        ]
    }
}

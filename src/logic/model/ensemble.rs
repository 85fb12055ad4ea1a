//! Classifier Ensemble
//!
//! Fits every configured variant on the training matrix and labels every
//! row of the test matrix. Variants are independent: one failing variant is
//! reported in its outcome and the others still run.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use num_traits::ToPrimitive;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use smartcore::metrics::distance::euclidian::Euclidian;
use smartcore::naive_bayes::gaussian::{GaussianNB, GaussianNBParameters};
use smartcore::neighbors::knn_classifier::{KNNClassifier, KNNClassifierParameters};
use smartcore::svm::svc::{SVCParameters, SVC};
use smartcore::svm::Kernels;

use super::variant::{Algorithm, VariantConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::dataset::{FeatureMatrix, Label};

// ============================================================================
// PREDICTION
// ============================================================================

/// Map numeric predictions to labels; values above `threshold` are malicious
fn to_labels<T: ToPrimitive>(values: &[T], threshold: f64) -> Vec<Label> {
    values
        .iter()
        .map(|v| match v.to_f64() {
            Some(x) if x > threshold => Label::Malicious,
            _ => Label::Benign,
        })
        .collect()
}

/// Relative variance floor, as in the usual Gaussian naive Bayes smoothing
const VAR_SMOOTHING: f64 = 1e-9;

fn population_variance(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count() as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mean = values.clone().sum::<f64>() / n;
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var)
}

/// Give every feature a non-zero variance within each class.
///
/// A column that is constant inside a class has zero variance there, which
/// makes the Gaussian likelihood NaN. Two rows of that class get a symmetric
/// offset in that column: the class mean is unchanged and the class variance
/// becomes `VAR_SMOOTHING` times the largest feature variance.
fn smooth_class_variance(
    variant: &str,
    rows: &[Vec<f64>],
    labels: &[Label],
) -> PipelineResult<Vec<Vec<f64>>> {
    let width = rows.first().map_or(0, Vec::len);
    let max_var = (0..width)
        .map(|j| population_variance(rows.iter().map(|r| r[j])).1)
        .fold(0.0f64, f64::max);
    let epsilon = if max_var > 0.0 {
        VAR_SMOOTHING * max_var
    } else {
        VAR_SMOOTHING
    };

    let mut smoothed = rows.to_vec();
    for class in [Label::Benign, Label::Malicious] {
        let members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        if members.is_empty() {
            continue;
        }

        for j in 0..width {
            let (_, var) = population_variance(members.iter().map(|&i| rows[i][j]));
            if var >= epsilon {
                continue;
            }
            let (first, second) = match members.as_slice() {
                [a, b, ..] => (*a, *b),
                _ => {
                    return Err(PipelineError::computation(
                        variant,
                        format!("class {} has one training row; variance is undefined", class),
                    ))
                }
            };
            let offset = (epsilon * members.len() as f64 / 2.0).sqrt();
            smoothed[first][j] += offset;
            smoothed[second][j] -= offset;
            tracing::debug!(variant, column = j, %class, "Zero-variance feature smoothed");
        }
    }

    Ok(smoothed)
}

fn failed(variant: &str) -> impl Fn(smartcore::error::Failed) -> PipelineError + '_ {
    move |e| PipelineError::computation(variant, e.to_string())
}

impl Algorithm {
    /// Fit on (`x_train`, `y_train`) and predict one label per `x_test` row.
    /// `train_rows` holds the same values as `x_train`.
    pub fn fit_predict(
        &self,
        variant: &str,
        train_rows: &[Vec<f64>],
        x_train: &DenseMatrix<f64>,
        y_train: &[Label],
        x_test: &DenseMatrix<f64>,
    ) -> PipelineResult<Vec<Label>> {
        let signed: Vec<i32> = y_train.iter().map(|l| l.as_u8() as i32).collect();

        match self {
            Algorithm::LinearSvc { c } => {
                let y: Vec<i32> = y_train
                    .iter()
                    .map(|l| if l.is_malicious() { 1 } else { -1 })
                    .collect();
                let params = SVCParameters::default()
                    .with_c(*c)
                    .with_kernel(Kernels::linear());
                let model = SVC::fit(x_train, &y, &params).map_err(failed(variant))?;
                let predicted = model.predict(x_test).map_err(failed(variant))?;
                Ok(to_labels(&predicted, 0.0))
            }
            Algorithm::GaussianNaiveBayes => {
                let y: Vec<u32> = y_train.iter().map(|l| l.as_u8() as u32).collect();
                let x = DenseMatrix::from_2d_vec(&smooth_class_variance(variant, train_rows, y_train)?);
                let model = GaussianNB::fit(&x, &y, GaussianNBParameters::default())
                    .map_err(failed(variant))?;
                let predicted = model.predict(x_test).map_err(failed(variant))?;
                Ok(to_labels(&predicted, 0.5))
            }
            Algorithm::LogisticRegression { alpha } => {
                let params = LogisticRegressionParameters::default().with_alpha(*alpha);
                let model =
                    LogisticRegression::fit(x_train, &signed, params).map_err(failed(variant))?;
                let predicted = model.predict(x_test).map_err(failed(variant))?;
                Ok(to_labels(&predicted, 0.5))
            }
            Algorithm::KNearestNeighbors { k } => {
                if *k > y_train.len() {
                    return Err(PipelineError::computation(
                        variant,
                        format!("k = {} exceeds {} training rows", k, y_train.len()),
                    ));
                }
                let params = KNNClassifierParameters::<f64, Euclidian<f64>>::default().with_k(*k);
                let model = KNNClassifier::fit(x_train, &signed, params).map_err(failed(variant))?;
                let predicted = model.predict(x_test).map_err(failed(variant))?;
                Ok(to_labels(&predicted, 0.5))
            }
        }
    }
}

// ============================================================================
// ENSEMBLE
// ============================================================================

/// Result of one variant
#[derive(Debug)]
pub struct VariantOutcome {
    pub name: String,
    /// Test matrix plus predicted Label column
    pub result: PipelineResult<FeatureMatrix>,
    pub artifact: Option<PathBuf>,
}

impl VariantOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct ClassifierEnsemble {
    variants: Vec<VariantConfig>,
}

impl ClassifierEnsemble {
    pub fn new(variants: Vec<VariantConfig>) -> Self {
        Self { variants }
    }

    /// Shared preconditions; a failure here means no variant can run
    fn prepare(
        training: &FeatureMatrix,
        test: &FeatureMatrix,
    ) -> PipelineResult<(DenseMatrix<f64>, DenseMatrix<f64>)> {
        let labels = training.require_labels("training matrix")?;
        training.check_same_schema(test, "training vs test matrix")?;

        if training.is_empty() || test.is_empty() {
            return Err(PipelineError::computation(
                "ensemble",
                format!(
                    "empty matrix: {} training rows, {} test rows",
                    training.len(),
                    test.len()
                ),
            ));
        }
        if training.columns.is_empty() {
            return Err(PipelineError::schema("ensemble", "no feature columns"));
        }
        if labels.len() != training.len() {
            return Err(PipelineError::alignment(
                "training matrix",
                format!("{} labels for {} rows", labels.len(), training.len()),
            ));
        }

        Ok((
            DenseMatrix::from_2d_vec(&training.rows),
            DenseMatrix::from_2d_vec(&test.rows),
        ))
    }

    fn run_variant(
        variant: &VariantConfig,
        train_rows: &[Vec<f64>],
        x_train: &DenseMatrix<f64>,
        y_train: &[Label],
        x_test: &DenseMatrix<f64>,
        test: &FeatureMatrix,
    ) -> PipelineResult<FeatureMatrix> {
        if let Some(reason) = variant.algorithm.invalid_reason() {
            return Err(PipelineError::InvalidConfig(format!("{}: {}", variant.name, reason)));
        }

        if variant.algorithm.needs_both_classes() {
            let malicious = y_train.iter().filter(|l| l.is_malicious()).count();
            if malicious == 0 || malicious == y_train.len() {
                return Err(PipelineError::computation(
                    &variant.name,
                    "training labels contain a single class",
                ));
            }
        }

        tracing::info!(variant = %variant.name, "Training classifier...");
        // A panic inside the library fails this variant only
        let predicted = panic::catch_unwind(AssertUnwindSafe(|| {
            variant
                .algorithm
                .fit_predict(&variant.name, train_rows, x_train, y_train, x_test)
        }))
        .map_err(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "classifier panicked".to_string());
            PipelineError::computation(&variant.name, reason)
        })??;

        if predicted.len() != test.len() {
            return Err(PipelineError::alignment(
                &variant.name,
                format!("{} predictions for {} test rows", predicted.len(), test.len()),
            ));
        }

        Ok(test.features_only().with_labels(predicted))
    }

    /// Run every variant in memory
    pub fn run(
        &self,
        training: &FeatureMatrix,
        test: &FeatureMatrix,
    ) -> PipelineResult<Vec<VariantOutcome>> {
        let (x_train, x_test) = Self::prepare(training, test)?;
        let y_train = training.require_labels("training matrix")?;

        let outcomes = self
            .variants
            .iter()
            .map(|variant| {
                let result =
                    Self::run_variant(variant, &training.rows, &x_train, y_train, &x_test, test);
                if let Err(e) = &result {
                    tracing::warn!(variant = %variant.name, error = %e, "Classifier variant failed");
                }
                VariantOutcome {
                    name: variant.name.clone(),
                    result,
                    artifact: None,
                }
            })
            .collect();

        Ok(outcomes)
    }

    /// Run every variant and persist `<name>.csv` for each success
    pub fn run_and_write(
        &self,
        training: &FeatureMatrix,
        test: &FeatureMatrix,
        out_dir: &Path,
    ) -> PipelineResult<Vec<VariantOutcome>> {
        fs::create_dir_all(out_dir)?;
        let mut outcomes = self.run(training, test)?;

        for (outcome, variant) in outcomes.iter_mut().zip(&self.variants) {
            let Ok(matrix) = &outcome.result else {
                continue;
            };
            let path = out_dir.join(variant.artifact_name());
            match matrix.write(&path) {
                Ok(()) => {
                    tracing::info!(variant = %variant.name, path = %path.display(), "Predictions saved");
                    outcome.artifact = Some(path);
                }
                Err(e) => {
                    tracing::warn!(variant = %variant.name, error = %e, "Failed to save predictions");
                    outcome.result = Err(e);
                }
            }
        }

        Ok(outcomes)
    }
}

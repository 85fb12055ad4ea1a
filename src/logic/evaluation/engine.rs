//! Evaluation Engine
//!
//! Compares one variant's predictions with the ground truth row by row and
//! writes the remapped confusion matrix plus a metrics table. Every variant
//! is evaluated on its own; a failure is recorded in the summary and the
//! next variant still runs.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

use super::confusion::{ConfusionCells, ConfusionReport};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::dataset::FeatureMatrix;
use crate::logic::model::VariantConfig;

/// A variant that produced no report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantFailure {
    pub variant: String,
    pub kind: String,
    pub error: String,
}

impl VariantFailure {
    pub fn new(variant: &str, error: &PipelineError) -> Self {
        Self {
            variant: variant.to_string(),
            kind: error.kind().to_string(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub generated_at: DateTime<Utc>,
    pub reports: Vec<ConfusionReport>,
    pub failures: Vec<VariantFailure>,
}

impl EvaluationSummary {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            reports: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn write(&self, path: &Path) -> PipelineResult<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

impl Default for EvaluationSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Files written for one report
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub confusion_matrix: PathBuf,
    pub metrics_table: PathBuf,
}

pub struct EvaluationEngine;

impl EvaluationEngine {
    /// Evaluate in memory; rows are paired by position
    pub fn evaluate(
        variant: &str,
        predicted: &FeatureMatrix,
        actual: &FeatureMatrix,
    ) -> PipelineResult<ConfusionReport> {
        let predicted_labels = predicted.require_labels(&format!("{} predictions", variant))?;
        let actual_labels = actual.require_labels("ground truth")?;

        if predicted_labels.len() != actual_labels.len() {
            return Err(PipelineError::alignment(
                variant,
                format!(
                    "{} predicted rows vs {} ground-truth rows",
                    predicted_labels.len(),
                    actual_labels.len()
                ),
            ));
        }
        if actual_labels.is_empty() {
            return Err(PipelineError::computation(variant, "empty label column"));
        }

        let cells = ConfusionCells::from_labels(actual_labels, predicted_labels);
        tracing::debug!(variant, cells = ?cells.ravel(), "Confusion cells computed");
        Ok(ConfusionReport::from_cells(variant, cells))
    }

    pub fn evaluate_files(
        variant: &str,
        predicted: &Path,
        ground_truth: &Path,
    ) -> PipelineResult<ConfusionReport> {
        let predicted = FeatureMatrix::read(predicted)?;
        let actual = FeatureMatrix::read(ground_truth)?;
        Self::evaluate(variant, &predicted, &actual)
    }

    /// `Confusion_Matrix_<name>.csv` and `Metrics_Table_<name>.csv`
    pub fn write_report(report: &ConfusionReport, dir: &Path) -> PipelineResult<ReportArtifacts> {
        fs::create_dir_all(dir)?;

        let confusion_matrix = dir.join(format!("Confusion_Matrix_{}.csv", report.variant));
        let mut writer = WriterBuilder::new().from_path(&confusion_matrix)?;
        let [[pp, pn], [np, nn]] = report.quadrant.display_matrix();
        writer.write_record(["", "Actual Positive", "Actual Negative"])?;
        writer.write_record(["Predicted Positive".to_string(), pp.to_string(), pn.to_string()])?;
        writer.write_record(["Predicted Negative".to_string(), np.to_string(), nn.to_string()])?;
        writer.flush()?;

        let metrics_table = dir.join(format!("Metrics_Table_{}.csv", report.variant));
        let mut writer = WriterBuilder::new().from_path(&metrics_table)?;
        writer.write_record(["Metric", "Value"])?;
        for (name, value) in report.metric_rows() {
            writer.write_record([name, value.as_str()])?;
        }
        writer.flush()?;

        Ok(ReportArtifacts {
            confusion_matrix,
            metrics_table,
        })
    }

    /// Evaluate every variant's `<name>.csv` in `predictions_dir`
    pub fn run(
        variants: &[VariantConfig],
        predictions_dir: &Path,
        ground_truth: &Path,
        out_dir: &Path,
    ) -> PipelineResult<EvaluationSummary> {
        fs::create_dir_all(out_dir)?;
        let mut summary = EvaluationSummary::new();

        for variant in variants {
            let predicted = predictions_dir.join(variant.artifact_name());
            let result = Self::evaluate_files(&variant.name, &predicted, ground_truth)
                .and_then(|report| Self::write_report(&report, out_dir).map(|_| report));

            match result {
                Ok(report) => {
                    tracing::info!(
                        variant = %variant.name,
                        accuracy = report.accuracy,
                        f1 = report.f1,
                        "Variant evaluated"
                    );
                    summary.reports.push(report);
                }
                Err(e) => {
                    tracing::warn!(variant = %variant.name, error = %e, "Evaluation failed");
                    summary.failures.push(VariantFailure::new(&variant.name, &e));
                }
            }
        }

        Ok(summary)
    }
}

//! Configuration module
//!
//! Sources, lowest to highest precedence: defaults, JSON config file,
//! environment (`.env` included), CLI flags. The CLI layer is applied by
//! the binary after `load`.

use std::collections::HashSet;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::constants::{
    DEFAULT_CONTROL_SUBTYPES, DEFAULT_COUNTS_FILE, DEFAULT_LABELS_FILE, DEFAULT_PRECISION,
    DEFAULT_TRACE_FILE, EVALUATION_DIR, PREDICTIONS_DIR, TEST_DIR, TRAINING_DIR,
};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::dataset::NormalizeAxis;
use crate::logic::model::VariantConfig;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    /// One subdirectory per training run
    pub training_root: PathBuf,

    /// One subdirectory per test run
    pub test_root: PathBuf,

    /// Corpus, prediction and evaluation artifacts
    pub output_root: PathBuf,

    pub trace_file: String,
    pub counts_file: String,
    pub labels_file: String,

    /// Tracked control subtypes, e.g. DAO and DIO
    #[validate(length(min = 1, message = "at least one control subtype is required"))]
    pub control_subtypes: Vec<String>,

    pub normalize_axis: NormalizeAxis,

    /// Decimal places kept after normalization
    #[validate(range(max = 6))]
    pub precision: u32,

    #[validate(
        length(min = 1, message = "at least one classifier variant is required"),
        custom(function = "validate_variants")
    )]
    pub variants: Vec<VariantConfig>,
}

fn validate_variants(variants: &Vec<VariantConfig>) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for variant in variants {
        if !seen.insert(variant.name.as_str()) {
            let mut err = ValidationError::new("duplicate_variant");
            err.message = Some(format!("duplicate variant name {}", variant.name).into());
            return Err(err);
        }
        if let Some(reason) = variant.algorithm.invalid_reason() {
            let mut err = ValidationError::new("invalid_hyperparameter");
            err.message = Some(format!("{}: {}", variant.name, reason).into());
            return Err(err);
        }
    }
    Ok(())
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            training_root: PathBuf::from("data/training"),
            test_root: PathBuf::from("data/test"),
            output_root: PathBuf::from("output"),
            trace_file: DEFAULT_TRACE_FILE.to_string(),
            counts_file: DEFAULT_COUNTS_FILE.to_string(),
            labels_file: DEFAULT_LABELS_FILE.to_string(),
            control_subtypes: DEFAULT_CONTROL_SUBTYPES.iter().map(|s| s.to_string()).collect(),
            normalize_axis: NormalizeAxis::default(),
            precision: DEFAULT_PRECISION,
            variants: VariantConfig::defaults(),
        }
    }
}

impl PipelineConfig {
    /// Defaults, then the optional JSON file, then the environment
    pub fn load(path: Option<&Path>) -> PipelineResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        if !path.is_file() {
            return Err(PipelineError::missing(path));
        }
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Apply `DETECTOR_*` variables supplied by `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("DETECTOR_TRAINING_ROOT") {
            self.training_root = PathBuf::from(root);
        }
        if let Some(root) = lookup("DETECTOR_TEST_ROOT") {
            self.test_root = PathBuf::from(root);
        }
        if let Some(root) = lookup("DETECTOR_OUTPUT_ROOT") {
            self.output_root = PathBuf::from(root);
        }
        if let Some(list) = lookup("DETECTOR_CONTROL_SUBTYPES") {
            self.control_subtypes = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(raw) = lookup("DETECTOR_PRECISION") {
            match raw.trim().parse() {
                Ok(p) => self.precision = p,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid DETECTOR_PRECISION"),
            }
        }
    }

    pub fn check(&self) -> PipelineResult<()> {
        self.validate()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Derived paths
    // ------------------------------------------------------------------

    pub fn training_out(&self) -> PathBuf {
        self.output_root.join(TRAINING_DIR)
    }

    pub fn test_out(&self) -> PathBuf {
        self.output_root.join(TEST_DIR)
    }

    pub fn predictions_dir(&self) -> PathBuf {
        self.output_root.join(PREDICTIONS_DIR)
    }

    pub fn evaluation_dir(&self) -> PathBuf {
        self.output_root.join(EVALUATION_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::Algorithm;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.control_subtypes, vec!["DAO", "DIO"]);
        assert_eq!(config.precision, 2);
        assert_eq!(config.variants.len(), 4);
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DETECTOR_OUTPUT_ROOT", "/tmp/out"),
            ("DETECTOR_CONTROL_SUBTYPES", "DIO, DAO ,DIS"),
            ("DETECTOR_PRECISION", "3"),
        ]
        .into_iter()
        .collect();

        let mut config = PipelineConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.output_root, PathBuf::from("/tmp/out"));
        assert_eq!(config.control_subtypes, vec!["DIO", "DAO", "DIS"]);
        assert_eq!(config.precision, 3);
        assert_eq!(config.training_root, PathBuf::from("data/training"));
    }

    #[test]
    fn test_invalid_precision_env_ignored() {
        let mut config = PipelineConfig::default();
        config.apply_overrides(|k| (k == "DETECTOR_PRECISION").then(|| "two".to_string()));
        assert_eq!(config.precision, 2);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = PipelineConfig::default();
        config.control_subtypes.clear();
        assert!(matches!(config.check(), Err(PipelineError::InvalidConfig(_))));

        let mut config = PipelineConfig::default();
        config.precision = 7;
        assert!(config.check().is_err());

        let mut config = PipelineConfig::default();
        config.variants.push(VariantConfig::new("NaiveBayes", Algorithm::GaussianNaiveBayes));
        assert!(config.check().is_err());

        let mut config = PipelineConfig::default();
        config.variants = vec![VariantConfig::new("KNN", Algorithm::KNearestNeighbors { k: 0 })];
        assert!(config.check().is_err());
    }

    #[test]
    fn test_json_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detector.json");
        std::fs::write(
            &path,
            r#"{"precision": 4, "normalize_axis": "node",
                "variants": [{"name": "NB", "algorithm": "gaussian_naive_bayes"}]}"#,
        )
        .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.precision, 4);
        assert_eq!(config.normalize_axis, NormalizeAxis::Node);
        assert_eq!(config.variants.len(), 1);
        assert_eq!(config.trace_file, DEFAULT_TRACE_FILE);
    }

    #[test]
    fn test_missing_config_file() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/detector.json")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingFile { .. }));
    }
}

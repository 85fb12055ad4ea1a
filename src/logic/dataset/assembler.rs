//! Dataset Assembler
//!
//! Builds the views of a normalized corpus that later stages consume:
//! - `normalized`: provenance (NODE, RUN) + features (+ Label when known)
//! - `unlabeled`: features only, classifier input
//! - `labeled`: features + Label, training data or ground truth
//!
//! All views share row order and feature columns.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::corpus::Corpus;
use super::labels::{Label, LabelBook};
use super::matrix::FeatureMatrix;
use crate::constants::{
    GROUND_TRUTH_FILE, LAYOUT_FILE, NORMALIZED_FILE, TEST_MATRIX_FILE, TRAINING_MATRIX_FILE,
};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::features::LayoutInfo;

/// Role of a corpus in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusKind {
    Training,
    Test,
}

impl CorpusKind {
    pub fn name(self) -> &'static str {
        match self {
            CorpusKind::Training => "training",
            CorpusKind::Test => "test",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssembledDataset {
    pub layout: LayoutInfo,
    pub normalized: FeatureMatrix,
    pub unlabeled: FeatureMatrix,
    pub labeled: Option<FeatureMatrix>,
}

/// Paths written by `AssembledDataset::write`
#[derive(Debug, Clone, Default)]
pub struct DatasetArtifacts {
    pub normalized: PathBuf,
    pub matrix: PathBuf,
    pub ground_truth: Option<PathBuf>,
    pub layout: PathBuf,
}

pub struct DatasetAssembler;

impl DatasetAssembler {
    pub fn assemble(corpus: &Corpus, labels: Option<&LabelBook>) -> PipelineResult<AssembledDataset> {
        if corpus.is_empty() {
            return Err(PipelineError::computation(
                "dataset",
                "corpus has no rows to assemble",
            ));
        }

        let mut normalized = corpus.to_matrix();
        let row_labels: Option<Vec<Label>> = labels.map(|book| {
            corpus
                .provenance()
                .iter()
                .map(|p| book.label_for(&p.run, &p.node))
                .collect()
        });
        normalized.labels = row_labels.clone();

        let unlabeled = normalized.features_only();
        let labeled = row_labels.map(|l| unlabeled.clone().with_labels(l));

        if let Some(labeled) = &labeled {
            debug_assert_eq!(labeled.len(), unlabeled.len());
            let malicious = labeled
                .labels
                .iter()
                .flatten()
                .filter(|l| l.is_malicious())
                .count();
            tracing::info!(rows = labeled.len(), malicious, "Labeled dataset assembled");
        }

        Ok(AssembledDataset {
            layout: corpus.layout().info(),
            normalized,
            unlabeled,
            labeled,
        })
    }
}

impl AssembledDataset {
    /// Write the artifacts for `kind` into `dir`.
    /// A training corpus must be labeled; a test corpus writes ground truth
    /// only when labels were available.
    pub fn write(&self, dir: &Path, kind: CorpusKind) -> PipelineResult<DatasetArtifacts> {
        fs::create_dir_all(dir)?;

        let mut artifacts = DatasetArtifacts {
            normalized: dir.join(NORMALIZED_FILE),
            layout: dir.join(LAYOUT_FILE),
            ..Default::default()
        };
        self.normalized.write(&artifacts.normalized)?;
        fs::write(&artifacts.layout, serde_json::to_string_pretty(&self.layout)?)?;

        match kind {
            CorpusKind::Training => {
                let labeled = self
                    .labeled
                    .as_ref()
                    .ok_or_else(|| PipelineError::schema("training corpus", "no labels available"))?;
                artifacts.matrix = dir.join(TRAINING_MATRIX_FILE);
                labeled.write(&artifacts.matrix)?;
            }
            CorpusKind::Test => {
                artifacts.matrix = dir.join(TEST_MATRIX_FILE);
                self.unlabeled.write(&artifacts.matrix)?;
                if let Some(labeled) = &self.labeled {
                    let path = dir.join(GROUND_TRUTH_FILE);
                    labeled.write(&path)?;
                    artifacts.ground_truth = Some(path);
                }
            }
        }

        tracing::info!(corpus = kind.name(), dir = %dir.display(), "Dataset artifacts written");
        Ok(artifacts)
    }
}

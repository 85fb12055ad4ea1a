//! Pipeline orchestration
//!
//! Stages run in order: extract -> dataset -> classify -> evaluate. Inside a
//! stage every unit (run, variant) is isolated: a failure is logged, recorded
//! in the stage report and skipped. A stage fails as a whole only when it
//! had nothing to work with or every unit failed.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::constants::{
    EVALUATION_SUMMARY_FILE, GROUND_TRUTH_FILE, LAYOUT_FILE, TEST_MATRIX_FILE, TRAINING_MATRIX_FILE,
};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::dataset::{
    Corpus, CorpusKind, DatasetArtifacts, DatasetAssembler, FeatureMatrix, LabelBook, Normalizer,
};
use crate::logic::evaluation::{EvaluationEngine, EvaluationSummary};
use crate::logic::features::table::{read_counts, write_counts};
use crate::logic::features::layout::validate_layout;
use crate::logic::features::{extract_run, FeatureLayout, LayoutInfo};
use crate::logic::model::ClassifierEnsemble;
use crate::logic::run::{discover_runs, RunDir};
use crate::logic::trace::PacketTraceReader;

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedUnit {
    pub unit: String,
    pub kind: String,
    pub reason: String,
}

/// Processed and skipped units of one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub processed: Vec<String>,
    pub skipped: Vec<SkippedUnit>,
}

impl StageReport {
    pub fn new(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            processed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn ok(&mut self, unit: &str) {
        self.processed.push(unit.to_string());
    }

    fn skip(&mut self, unit: &str, err: &PipelineError) {
        tracing::warn!(stage = %self.stage, unit, kind = err.kind(), error = %err, "Unit skipped");
        self.skipped.push(SkippedUnit {
            unit: unit.to_string(),
            kind: err.kind().to_string(),
            reason: err.to_string(),
        });
    }

    /// `Exhausted` when nothing was processed
    fn finish(self) -> PipelineResult<Self> {
        if self.processed.is_empty() {
            return Err(PipelineError::Exhausted { stage: self.stage });
        }
        tracing::info!(
            stage = %self.stage,
            processed = self.processed.len(),
            skipped = self.skipped.len(),
            "Stage complete"
        );
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub stages: Vec<StageReport>,
}

impl PipelineSummary {
    pub fn push(&mut self, report: StageReport) {
        self.stages.push(report);
    }

    pub fn skipped_count(&self) -> usize {
        self.stages.iter().map(|s| s.skipped.len()).sum()
    }

    pub fn log(&self) {
        for stage in &self.stages {
            tracing::info!(
                stage = %stage.stage,
                processed = stage.processed.len(),
                skipped = stage.skipped.len(),
                "Summary"
            );
            for skipped in &stage.skipped {
                tracing::info!(stage = %stage.stage, unit = %skipped.unit, reason = %skipped.reason, "  skipped");
            }
        }
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline {
    config: PipelineConfig,
    layout: FeatureLayout,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.check()?;
        let layout = FeatureLayout::for_subtypes(&config.control_subtypes);
        Ok(Self { config, layout })
    }

    fn root(&self, kind: CorpusKind) -> &Path {
        match kind {
            CorpusKind::Training => &self.config.training_root,
            CorpusKind::Test => &self.config.test_root,
        }
    }

    fn out_dir(&self, kind: CorpusKind) -> PathBuf {
        match kind {
            CorpusKind::Training => self.config.training_out(),
            CorpusKind::Test => self.config.test_out(),
        }
    }

    // ------------------------------------------------------------------
    // Stage 1: traces -> per-run counts artifacts
    // ------------------------------------------------------------------

    fn extract_one(&self, run: &RunDir) -> PipelineResult<usize> {
        let records = PacketTraceReader::read_path(&run.file(&self.config.trace_file))?;
        let table = extract_run(&records, &self.config.control_subtypes);
        write_counts(&run.file(&self.config.counts_file), &table)?;
        Ok(table.node_count())
    }

    pub fn extract(&self, kind: CorpusKind) -> PipelineResult<StageReport> {
        let mut report = StageReport::new(&format!("extract:{}", kind.name()));

        for run in discover_runs(self.root(kind))? {
            match self.extract_one(&run) {
                Ok(nodes) => {
                    tracing::info!(run = %run.id, nodes, "Run counted");
                    report.ok(run.id.as_str());
                }
                Err(e) => report.skip(run.id.as_str(), &e),
            }
        }

        report.finish()
    }

    // ------------------------------------------------------------------
    // Stage 2: counts -> normalized corpus artifacts
    // ------------------------------------------------------------------

    fn labels(&self, kind: CorpusKind) -> PipelineResult<Option<LabelBook>> {
        let path = self.root(kind).join(&self.config.labels_file);
        match kind {
            CorpusKind::Training => {}
            CorpusKind::Test if path.is_file() => {}
            CorpusKind::Test => {
                tracing::info!(path = %path.display(), "No test labels; ground truth not written");
                return Ok(None);
            }
        }
        let book = LabelBook::read(&path)?;
        tracing::info!(corpus = kind.name(), malicious = book.malicious_count(), "Labels loaded");
        Ok(Some(book))
    }

    /// The corpus in `dir` must have been built with this pipeline's layout
    fn check_layout(&self, dir: &Path) -> PipelineResult<()> {
        let path = dir.join(LAYOUT_FILE);
        if !path.is_file() {
            return Err(PipelineError::missing(path));
        }
        let info: LayoutInfo = serde_json::from_reader(File::open(&path)?)?;
        validate_layout(&self.layout, info.version, info.hash)
            .map_err(|e| PipelineError::schema(path.display().to_string(), e.to_string()))
    }

    pub fn build_dataset(&self, kind: CorpusKind) -> PipelineResult<(StageReport, DatasetArtifacts)> {
        let mut report = StageReport::new(&format!("dataset:{}", kind.name()));
        let labels = self.labels(kind)?;
        let normalizer = Normalizer::new(self.config.normalize_axis, self.config.precision);
        let mut corpus = Corpus::new(self.layout.clone());

        for run in discover_runs(self.root(kind))? {
            let appended = read_counts(&run.file(&self.config.counts_file))
                .and_then(|table| corpus.append_run(&run.id, &normalizer.normalize(&table)));
            match appended {
                Ok(_) => report.ok(run.id.as_str()),
                Err(e) => report.skip(run.id.as_str(), &e),
            }
        }

        let report = report.finish()?;
        let dataset = DatasetAssembler::assemble(&corpus, labels.as_ref())?;
        let artifacts = dataset.write(&self.out_dir(kind), kind)?;
        Ok((report, artifacts))
    }

    // ------------------------------------------------------------------
    // Stage 3: training + test matrices -> predictions per variant
    // ------------------------------------------------------------------

    pub fn classify(&self) -> PipelineResult<StageReport> {
        self.check_layout(&self.config.training_out())?;
        self.check_layout(&self.config.test_out())?;
        let training = FeatureMatrix::read(&self.config.training_out().join(TRAINING_MATRIX_FILE))?;
        let test = FeatureMatrix::read(&self.config.test_out().join(TEST_MATRIX_FILE))?;

        let ensemble = ClassifierEnsemble::new(self.config.variants.clone());
        let outcomes = ensemble.run_and_write(&training, &test, &self.config.predictions_dir())?;

        let mut report = StageReport::new("classify");
        for outcome in &outcomes {
            match &outcome.result {
                Ok(_) => report.ok(&outcome.name),
                Err(e) => report.skip(&outcome.name, e),
            }
        }
        report.finish()
    }

    // ------------------------------------------------------------------
    // Stage 4: predictions vs ground truth
    // ------------------------------------------------------------------

    pub fn evaluate(&self) -> PipelineResult<(StageReport, EvaluationSummary)> {
        let out_dir = self.config.evaluation_dir();
        let summary = EvaluationEngine::run(
            &self.config.variants,
            &self.config.predictions_dir(),
            &self.config.test_out().join(GROUND_TRUTH_FILE),
            &out_dir,
        )?;
        summary.write(&out_dir.join(EVALUATION_SUMMARY_FILE))?;

        let mut report = StageReport::new("evaluate");
        for r in &summary.reports {
            report.ok(&r.variant);
        }
        for failure in &summary.failures {
            report.skipped.push(SkippedUnit {
                unit: failure.variant.clone(),
                kind: failure.kind.clone(),
                reason: failure.error.clone(),
            });
        }
        Ok((report.finish()?, summary))
    }

    /// Every stage over both corpora
    pub fn run_all(&self) -> PipelineResult<PipelineSummary> {
        let mut summary = PipelineSummary::default();

        for kind in [CorpusKind::Training, CorpusKind::Test] {
            summary.push(self.extract(kind)?);
        }
        for kind in [CorpusKind::Training, CorpusKind::Test] {
            let (report, _) = self.build_dataset(kind)?;
            summary.push(report);
        }
        summary.push(self.classify()?);
        let (report, _) = self.evaluate()?;
        summary.push(report);

        summary.log();
        Ok(summary)
    }
}

//! IoT Attack Detector - Main Entry Point
//!
//! Detects misbehaving sensor nodes in simulated IoT networks from packet
//! traces.
//!
//! ```text
//! Packet Trace.csv ──> counts ──> normalized corpus ──> classifiers ──> evaluation
//!   (per run)        (per run)   (training / test)     (per variant)   (per variant)
//! ```

mod config;
mod error;
mod logic;
pub mod constants;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::PipelineConfig;
use crate::constants::{APP_NAME, APP_VERSION};
use crate::logic::dataset::{CorpusKind, NormalizeAxis};
use crate::logic::pipeline::{Pipeline, PipelineSummary};

/// Packet-trace feature extraction and attack classification
#[derive(Parser, Debug)]
#[command(name = "iot-attack-detector")]
#[command(version)]
#[command(about = "Classify IoT sensor nodes as benign or malicious from packet traces")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Training corpus root (one subdirectory per run)
    #[arg(long, global = true)]
    training_root: Option<PathBuf>,

    /// Test corpus root (one subdirectory per run)
    #[arg(long, global = true)]
    test_root: Option<PathBuf>,

    /// Output directory for corpus, prediction and evaluation artifacts
    #[arg(short, long, global = true)]
    output_root: Option<PathBuf>,

    /// Tracked control subtypes, comma separated
    #[arg(long, global = true, value_delimiter = ',')]
    subtypes: Option<Vec<String>>,

    /// Normalization axis
    #[arg(long, global = true, value_enum)]
    axis: Option<AxisArg>,

    /// Decimal places kept after normalization
    #[arg(long, global = true)]
    precision: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count packets per node for every run
    Extract {
        #[arg(value_enum, default_value_t = CorpusArg::All)]
        corpus: CorpusArg,
    },
    /// Normalize counts and write the corpus matrices
    Normalize {
        #[arg(value_enum, default_value_t = CorpusArg::All)]
        corpus: CorpusArg,
    },
    /// Train every classifier variant and label the test matrix
    Classify,
    /// Compare predictions with the ground truth
    Evaluate,
    /// All stages over both corpora
    Run,
    /// Print the effective configuration as JSON
    PrintConfig,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CorpusArg {
    Training,
    Test,
    All,
}

impl CorpusArg {
    fn kinds(self) -> Vec<CorpusKind> {
        match self {
            CorpusArg::Training => vec![CorpusKind::Training],
            CorpusArg::Test => vec![CorpusKind::Test],
            CorpusArg::All => vec![CorpusKind::Training, CorpusKind::Test],
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AxisArg {
    Feature,
    Node,
}

impl From<AxisArg> for NormalizeAxis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::Feature => NormalizeAxis::Feature,
            AxisArg::Node => NormalizeAxis::Node,
        }
    }
}

impl Cli {
    /// Defaults < config file < environment < flags
    fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::load(self.config.as_deref())
            .context("Failed to load configuration")?;

        if let Some(root) = &self.training_root {
            config.training_root = root.clone();
        }
        if let Some(root) = &self.test_root {
            config.test_root = root.clone();
        }
        if let Some(root) = &self.output_root {
            config.output_root = root.clone();
        }
        if let Some(subtypes) = &self.subtypes {
            config.control_subtypes = subtypes.clone();
        }
        if let Some(axis) = self.axis {
            config.normalize_axis = axis.into();
        }
        if let Some(precision) = self.precision {
            config.precision = precision;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iot_attack_detector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = cli.load_config()?;

    if let Commands::PrintConfig = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    tracing::info!("{} v{} starting...", APP_NAME, APP_VERSION);
    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let mut summary = PipelineSummary::default();

    match cli.command {
        Commands::Extract { corpus } => {
            for kind in corpus.kinds() {
                summary.push(
                    pipeline
                        .extract(kind)
                        .with_context(|| format!("Extraction failed for {} corpus", kind.name()))?,
                );
            }
        }
        Commands::Normalize { corpus } => {
            for kind in corpus.kinds() {
                let (report, artifacts) = pipeline
                    .build_dataset(kind)
                    .with_context(|| format!("Dataset build failed for {} corpus", kind.name()))?;
                tracing::info!(matrix = %artifacts.matrix.display(), "Corpus written");
                summary.push(report);
            }
        }
        Commands::Classify => {
            summary.push(pipeline.classify().context("Classification failed")?);
        }
        Commands::Evaluate => {
            let (report, evaluation) = pipeline.evaluate().context("Evaluation failed")?;
            for r in &evaluation.reports {
                let [[pp, pn], [np, nn]] = r.quadrant.display_matrix();
                println!(
                    "{:<24} PP={:<4} PN={:<4} NP={:<4} NN={:<4} acc={:.4} prec={:.4} rec={:.4} f1={:.4}",
                    r.variant, pp, pn, np, nn, r.accuracy, r.precision, r.recall, r.f1
                );
            }
            summary.push(report);
        }
        Commands::Run => {
            summary = pipeline.run_all().context("Pipeline failed")?;
        }
        Commands::PrintConfig => {}
    }

    if summary.skipped_count() > 0 {
        tracing::warn!(skipped = summary.skipped_count(), "Some units were skipped");
    }
    tracing::info!("Done");
    Ok(())
}

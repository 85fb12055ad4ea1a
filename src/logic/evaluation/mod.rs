//! Evaluation Module - Confusion reports per classifier variant

pub mod confusion;
pub mod engine;


pub use confusion::{ConfusionCells, ConfusionReport, Quadrant};
pub use engine::{EvaluationEngine, EvaluationSummary, ReportArtifacts, VariantFailure};

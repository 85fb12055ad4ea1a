//! Dataset Module - Normalized training / test corpora
//!
//! Reads each run's counts artifact, normalizes it, concatenates runs into
//! one corpus and writes the matrices the classifiers consume.

pub mod assembler;
pub mod corpus;
pub mod labels;
pub mod matrix;
pub mod normalize;

#[cfg(test)]
mod tests;

pub use assembler::{AssembledDataset, CorpusKind, DatasetArtifacts, DatasetAssembler};
pub use corpus::Corpus;
pub use labels::{Label, LabelBook};
pub use matrix::{FeatureMatrix, Provenance};
pub use normalize::{NormalizeAxis, Normalizer};

//! Model Module - Classifier ensemble
//!
//! Variants are configured, not hard-coded; each one is trained and applied
//! independently.

pub mod ensemble;
pub mod variant;

#[cfg(test)]
mod tests;

// Re-export common types
pub use ensemble::{ClassifierEnsemble, VariantOutcome};
pub use variant::{Algorithm, VariantConfig};

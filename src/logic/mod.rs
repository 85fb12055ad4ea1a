//! Logic Module - Detection pipeline stages
//!
//! - `trace/` - packet trace reading, node identity
//! - `features/` - per-run traffic counts
//! - `dataset/` - normalization, labels, corpus matrices
//! - `model/` - classifier ensemble
//! - `evaluation/` - confusion reports
//! - `pipeline` - stage orchestration

pub mod dataset;
pub mod evaluation;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod run;
pub mod trace;

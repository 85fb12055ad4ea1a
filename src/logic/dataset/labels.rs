//! Ground-truth labels
//!
//! A corpus may carry a `labels.csv` with columns `RUN,NODE,Label`.
//! Nodes that are not listed are benign.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};

use crate::constants::{COL_LABEL, COL_NODE, COL_RUN};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::run::RunId;
use crate::logic::trace::NodeId;

/// Binary node label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Benign,
    Malicious,
}

impl Label {
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Benign => 0,
            Label::Malicious => 1,
        }
    }

    pub fn is_malicious(self) -> bool {
        self == Label::Malicious
    }

    /// Accepts `0`/`1` (also `0.0`/`1.0`) and `benign`/`malicious`
    pub fn parse(raw: &str) -> Option<Label> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("malicious") {
            return Some(Label::Malicious);
        }
        if raw.eq_ignore_ascii_case("benign") {
            return Some(Label::Benign);
        }
        match raw.parse::<f64>() {
            Ok(v) if v == 0.0 => Some(Label::Benign),
            Ok(v) if v == 1.0 => Some(Label::Malicious),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelBook {
    entries: HashMap<(RunId, NodeId), Label>,
}

impl LabelBook {
    pub fn insert(&mut self, run: RunId, node: NodeId, label: Label) {
        self.entries.insert((run, node), label);
    }

    pub fn label_for(&self, run: &RunId, node: &NodeId) -> Label {
        self.entries
            .get(&(run.clone(), node.clone()))
            .copied()
            .unwrap_or(Label::Benign)
    }

    pub fn malicious_count(&self) -> usize {
        self.entries.values().filter(|l| l.is_malicious()).count()
    }

    pub fn read(path: &Path) -> PipelineResult<Self> {
        if !path.is_file() {
            return Err(PipelineError::missing(path));
        }
        let file = File::open(path)?;
        Self::read_from(file, &path.display().to_string())
    }

    pub fn read_from<R: Read>(source: R, context: &str) -> PipelineResult<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(source);
        let headers = reader.headers()?.clone();

        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PipelineError::schema(context, format!("missing column {}", name)))
        };
        let run_idx = position(COL_RUN)?;
        let node_idx = position(COL_NODE)?;
        let label_idx = position(COL_LABEL)?;

        let mut book = LabelBook::default();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let raw_label = record.get(label_idx).unwrap_or_default();
            let label = Label::parse(raw_label).ok_or_else(|| {
                PipelineError::schema(
                    context,
                    format!("row {}: invalid label '{}'", line + 1, raw_label),
                )
            })?;
            book.insert(
                RunId::new(record.get(run_idx).unwrap_or_default()),
                NodeId::new(record.get(node_idx).unwrap_or_default()),
                label,
            );
        }

        Ok(book)
    }
}

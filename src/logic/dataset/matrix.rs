//! Feature Matrix - the tabular artifact shared by every later stage
//!
//! Layout on disk: `[NODE,RUN,]<features...>[,Label]`. Provenance and label
//! columns are optional and recognised by name; every other column is a
//! feature, kept in file order.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};

use super::labels::Label;
use crate::constants::{COL_LABEL, COL_NODE, COL_RUN};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::features::table::coerce_cell;
use crate::logic::features::FeatureLayout;
use crate::logic::run::RunId;
use crate::logic::trace::NodeId;

/// Where a corpus row came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub node: NodeId,
    pub run: RunId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub provenance: Option<Vec<Provenance>>,
    pub labels: Option<Vec<Label>>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self {
            columns,
            rows,
            provenance: None,
            labels: None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn layout(&self) -> FeatureLayout {
        FeatureLayout::from_columns(self.columns.clone())
    }

    pub fn with_labels(mut self, labels: Vec<Label>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Features only: provenance and labels removed
    pub fn features_only(&self) -> Self {
        Self::new(self.columns.clone(), self.rows.clone())
    }

    /// Labels or a schema error naming `context`
    pub fn require_labels(&self, context: &str) -> PipelineResult<&[Label]> {
        self.labels
            .as_deref()
            .ok_or_else(|| PipelineError::schema(context, format!("no {} column", COL_LABEL)))
    }

    /// Same feature columns, same order
    pub fn check_same_schema(&self, other: &FeatureMatrix, context: &str) -> PipelineResult<()> {
        if self.columns != other.columns {
            let (ours, theirs) = (self.layout(), other.layout());
            return Err(PipelineError::schema(
                context,
                format!(
                    "feature columns differ: [{}] (hash {:08x}) vs [{}] (hash {:08x})",
                    self.columns.join(","),
                    ours.hash(),
                    other.columns.join(","),
                    theirs.hash()
                ),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // IO
    // ------------------------------------------------------------------

    pub fn write(&self, path: &Path) -> PipelineResult<()> {
        let file = File::create(path)?;
        self.write_to(file)?;
        tracing::debug!(path = %path.display(), rows = self.len(), "Matrix written");
        Ok(())
    }

    pub fn write_to<W: Write>(&self, sink: W) -> PipelineResult<()> {
        let mut writer = WriterBuilder::new().from_writer(sink);

        let mut header = Vec::new();
        if self.provenance.is_some() {
            header.push(COL_NODE.to_string());
            header.push(COL_RUN.to_string());
        }
        header.extend(self.columns.iter().cloned());
        if self.labels.is_some() {
            header.push(COL_LABEL.to_string());
        }
        writer.write_record(&header)?;

        for (i, row) in self.rows.iter().enumerate() {
            let mut record = Vec::with_capacity(header.len());
            if let Some(p) = self.provenance.as_ref().and_then(|p| p.get(i)) {
                record.push(p.node.to_string());
                record.push(p.run.to_string());
            }
            record.extend(row.iter().map(|v| v.to_string()));
            if let Some(label) = self.labels.as_ref().and_then(|l| l.get(i)) {
                record.push(label.to_string());
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn read(path: &Path) -> PipelineResult<Self> {
        if !path.is_file() {
            return Err(PipelineError::missing(path));
        }
        let file = File::open(path)?;
        Self::read_from(file, &path.display().to_string())
    }

    pub fn read_from<R: Read>(source: R, context: &str) -> PipelineResult<Self> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_reader(source);
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let node_idx = headers.iter().position(|h| h == COL_NODE);
        let run_idx = headers.iter().position(|h| h == COL_RUN);
        let label_idx = headers.iter().position(|h| h == COL_LABEL);
        let feature_idx: Vec<usize> = (0..headers.len())
            .filter(|i| Some(*i) != node_idx && Some(*i) != run_idx && Some(*i) != label_idx)
            .collect();

        let mut matrix = FeatureMatrix::new(
            feature_idx.iter().map(|&i| headers[i].clone()).collect(),
            Vec::new(),
        );
        let has_provenance = node_idx.is_some() && run_idx.is_some();
        let mut provenance = Vec::new();
        let mut labels = Vec::new();

        for (line, record) in reader.records().enumerate() {
            let record = record?;
            matrix.rows.push(
                feature_idx
                    .iter()
                    .map(|&i| record.get(i).map(coerce_cell).unwrap_or(0.0))
                    .collect(),
            );

            if let (true, Some(n), Some(r)) = (has_provenance, node_idx, run_idx) {
                provenance.push(Provenance {
                    node: NodeId::new(record.get(n).unwrap_or_default()),
                    run: RunId::new(record.get(r).unwrap_or_default()),
                });
            }

            if let Some(l) = label_idx {
                let raw = record.get(l).unwrap_or_default();
                labels.push(Label::parse(raw).ok_or_else(|| {
                    PipelineError::schema(
                        context,
                        format!("row {}: invalid label '{}'", line + 1, raw),
                    )
                })?);
            }
        }

        if has_provenance {
            matrix.provenance = Some(provenance);
        }
        if label_idx.is_some() {
            matrix.labels = Some(labels);
        }
        Ok(matrix)
    }
}

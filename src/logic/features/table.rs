//! Feature Table - node × feature matrix of one run
//!
//! Also owns the per-run counts artifact (`Sensor_Message_Counts.csv`):
//! header `NODE,<columns...>`, one row per node.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};
use ndarray::Array2;

use super::aggregator::CountTable;
use super::layout::FeatureLayout;
use crate::constants::COL_NODE;
use crate::error::{PipelineError, PipelineResult};
use crate::logic::trace::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub layout: FeatureLayout,
    pub nodes: Vec<NodeId>,
    /// Shape: (nodes, layout columns)
    pub values: Array2<f64>,
}

impl FeatureTable {
    /// Build from row vectors; short rows are zero-padded, long rows truncated
    pub fn from_rows(layout: FeatureLayout, nodes: Vec<NodeId>, rows: &[Vec<f64>]) -> Self {
        let width = layout.len();
        let mut values = Array2::<f64>::zeros((nodes.len(), width));
        for (i, row) in rows.iter().take(nodes.len()).enumerate() {
            for (j, v) in row.iter().take(width).enumerate() {
                values[[i, j]] = *v;
            }
        }
        Self {
            layout,
            nodes,
            values,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, node: &NodeId, column: &str) -> Option<f64> {
        let i = self.nodes.iter().position(|n| n == node)?;
        let j = self.layout.index_of(column)?;
        Some(self.values[[i, j]])
    }
}

/// Cell coercion rule: non-numeric, NaN and infinite cells become 0
pub fn coerce_cell(cell: &str) -> f64 {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

// ============================================================================
// COUNTS ARTIFACT
// ============================================================================

/// Write the per-run counts artifact
pub fn write_counts(path: &Path, table: &CountTable) -> PipelineResult<()> {
    let file = File::create(path)?;
    write_counts_to(file, table)?;
    tracing::debug!(path = %path.display(), nodes = table.node_count(), "Counts written");
    Ok(())
}

pub fn write_counts_to<W: Write>(sink: W, table: &CountTable) -> PipelineResult<()> {
    let mut writer = WriterBuilder::new().from_writer(sink);

    let mut header = vec![COL_NODE.to_string()];
    header.extend(table.layout.columns().iter().cloned());
    writer.write_record(&header)?;

    for (node, row) in &table.rows {
        let mut record = vec![node.to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Read a counts artifact back as a feature table
pub fn read_counts(path: &Path) -> PipelineResult<FeatureTable> {
    if !path.is_file() {
        return Err(PipelineError::missing(path));
    }
    let file = File::open(path)?;
    read_counts_from(file, &path.display().to_string())
}

/// Columns may appear in any order; they are re-sorted into layout order
pub fn read_counts_from<R: Read>(source: R, context: &str) -> PipelineResult<FeatureTable> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.len() < 2 {
        return Err(PipelineError::schema(
            context,
            "counts table needs a node column and at least one feature column",
        ));
    }

    let file_columns = headers[1..].to_vec();
    let layout = FeatureLayout::from_columns(file_columns.clone());
    // file column position -> layout position
    let mapping: Vec<usize> = file_columns
        .iter()
        .map(|c| layout.index_of(c).unwrap_or(0))
        .collect();

    let mut nodes = Vec::new();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(node) = record.get(0).filter(|n| !n.is_empty()) else {
            continue;
        };

        let mut row = vec![0.0; layout.len()];
        for (file_idx, &layout_idx) in mapping.iter().enumerate() {
            row[layout_idx] = record.get(file_idx + 1).map(coerce_cell).unwrap_or(0.0);
        }
        nodes.push(NodeId::new(node));
        rows.push(row);
    }

    Ok(FeatureTable::from_rows(layout, nodes, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_cell() {
        assert_eq!(coerce_cell("3"), 3.0);
        assert_eq!(coerce_cell(" 2.5 "), 2.5);
        assert_eq!(coerce_cell("abc"), 0.0);
        assert_eq!(coerce_cell(""), 0.0);
        assert_eq!(coerce_cell("NaN"), 0.0);
        assert_eq!(coerce_cell("inf"), 0.0);
    }

    #[test]
    fn test_read_reorders_columns_and_coerces() {
        let data = "NODE,Data_Received,DAO_Sent\nS-1,4,x\nS-2,,7\n";
        let table = read_counts_from(data.as_bytes(), "inline").unwrap();

        assert_eq!(table.layout.columns(), &["DAO_Sent", "Data_Received"]);
        assert_eq!(table.get(&NodeId::new("S-1"), "DAO_Sent"), Some(0.0));
        assert_eq!(table.get(&NodeId::new("S-1"), "Data_Received"), Some(4.0));
        assert_eq!(table.get(&NodeId::new("S-2"), "DAO_Sent"), Some(7.0));
        assert_eq!(table.get(&NodeId::new("S-2"), "Data_Received"), Some(0.0));
    }

    #[test]
    fn test_write_then_read_counts_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Sensor_Message_Counts.csv");

        let mut table = CountTable::new(FeatureLayout::for_subtypes(&["DAO"]));
        table.rows.insert(NodeId::new("S-1"), vec![1, 2, 3]);
        write_counts(&path, &table).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("NODE,DAO_Received,DAO_Sent,Data_Received"));

        let read = read_counts(&path).unwrap();
        assert_eq!(read, table.to_feature_table());
    }

    #[test]
    fn test_header_only_node_column_rejected() {
        let err = read_counts_from("NODE\nS-1\n".as_bytes(), "bad").unwrap_err();
        assert!(matches!(err, PipelineError::SchemaValidation { .. }));
    }
}

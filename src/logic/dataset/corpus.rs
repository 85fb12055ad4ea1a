//! Corpus - normalized rows of every run, concatenated in run order

use super::matrix::{FeatureMatrix, Provenance};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::features::{FeatureLayout, FeatureTable};
use crate::logic::run::RunId;

#[derive(Debug, Clone)]
pub struct Corpus {
    layout: FeatureLayout,
    rows: Vec<Vec<f64>>,
    provenance: Vec<Provenance>,
}

impl Corpus {
    pub fn new(layout: FeatureLayout) -> Self {
        Self {
            layout,
            rows: Vec::new(),
            provenance: Vec::new(),
        }
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn provenance(&self) -> &[Provenance] {
        &self.provenance
    }

    /// Append one run's normalized table. Rows keep the table's node order;
    /// a table with other feature columns is rejected.
    pub fn append_run(&mut self, run: &RunId, table: &FeatureTable) -> PipelineResult<usize> {
        if table.layout != self.layout {
            return Err(PipelineError::schema(
                run.as_str(),
                format!(
                    "feature columns [{}] do not match corpus layout [{}]",
                    table.layout.columns().join(","),
                    self.layout.columns().join(",")
                ),
            ));
        }

        for (node, row) in table.nodes.iter().zip(table.values.rows()) {
            self.rows.push(row.to_vec());
            self.provenance.push(Provenance {
                node: node.clone(),
                run: run.clone(),
            });
        }
        Ok(table.node_count())
    }

    pub fn to_matrix(&self) -> FeatureMatrix {
        FeatureMatrix {
            columns: self.layout.columns().to_vec(),
            rows: self.rows.clone(),
            provenance: Some(self.provenance.clone()),
            labels: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::trace::NodeId;

    fn run_table(layout: &FeatureLayout, nodes: &[&str]) -> FeatureTable {
        let rows: Vec<Vec<f64>> = nodes.iter().map(|_| vec![1.0; layout.len()]).collect();
        FeatureTable::from_rows(
            layout.clone(),
            nodes.iter().map(|n| NodeId::new(n)).collect(),
            &rows,
        )
    }

    #[test]
    fn test_concatenates_positionally() {
        let layout = FeatureLayout::for_subtypes(&["DAO", "DIO"]);
        let mut corpus = Corpus::new(layout.clone());

        corpus.append_run(&RunId::new("run-1"), &run_table(&layout, &["S-1", "S-2"])).unwrap();
        corpus.append_run(&RunId::new("run-2"), &run_table(&layout, &["S-1"])).unwrap();

        assert_eq!(corpus.len(), 3);
        let tags: Vec<(&str, &str)> = corpus
            .provenance()
            .iter()
            .map(|p| (p.run.as_str(), p.node.as_str()))
            .collect();
        assert_eq!(tags, vec![("run-1", "S-1"), ("run-1", "S-2"), ("run-2", "S-1")]);
    }

    #[test]
    fn test_rejects_other_layout() {
        let mut corpus = Corpus::new(FeatureLayout::for_subtypes(&["DAO", "DIO"]));
        let other = FeatureLayout::for_subtypes(&["DAO"]);
        let err = corpus
            .append_run(&RunId::new("run-x"), &run_table(&other, &["S-1"]))
            .unwrap_err();

        assert!(matches!(err, PipelineError::SchemaValidation { .. }));
        assert!(corpus.is_empty());
    }
}

//! Feature Aggregator
//!
//! Merges the control and data tallies of one run into a node × feature
//! count table. Every node seen by any counter gets a full row; gaps are 0.

use std::collections::BTreeMap;

use super::control::ControlCounts;
use super::data::DataCounts;
use super::layout::{received_column, sent_column, FeatureLayout};
use super::table::FeatureTable;
use crate::constants::DATA_RECEIVED_COLUMN;
use crate::logic::trace::NodeId;

/// Integer counts for one run, rows in natural node order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountTable {
    pub layout: FeatureLayout,
    pub rows: BTreeMap<NodeId, Vec<u64>>,
}

impl CountTable {
    pub fn new(layout: FeatureLayout) -> Self {
        Self {
            layout,
            rows: BTreeMap::new(),
        }
    }

    pub fn get(&self, node: &NodeId, column: &str) -> Option<u64> {
        let index = self.layout.index_of(column)?;
        self.rows.get(node).and_then(|row| row.get(index)).copied()
    }

    pub fn node_count(&self) -> usize {
        self.rows.len()
    }

    fn row_mut(&mut self, node: &NodeId) -> &mut Vec<u64> {
        let width = self.layout.len();
        self.rows
            .entry(node.clone())
            .or_insert_with(|| vec![0; width])
    }

    /// Same table as floating point values, ready for normalization
    pub fn to_feature_table(&self) -> FeatureTable {
        let nodes: Vec<NodeId> = self.rows.keys().cloned().collect();
        let values: Vec<Vec<f64>> = self
            .rows
            .values()
            .map(|row| row.iter().map(|&v| v as f64).collect())
            .collect();
        FeatureTable::from_rows(self.layout.clone(), nodes, &values)
    }
}

pub struct FeatureAggregator {
    layout: FeatureLayout,
}

impl FeatureAggregator {
    pub fn new(layout: FeatureLayout) -> Self {
        Self { layout }
    }

    pub fn for_subtypes<S: AsRef<str>>(subtypes: &[S]) -> Self {
        Self::new(FeatureLayout::for_subtypes(subtypes))
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn aggregate(&self, control: &[ControlCounts], data: &DataCounts) -> CountTable {
        let mut table = CountTable::new(self.layout.clone());

        for counts in control {
            let sent_idx = self.layout.index_of(&sent_column(&counts.subtype));
            let received_idx = self.layout.index_of(&received_column(&counts.subtype));

            let (Some(sent_idx), Some(received_idx)) = (sent_idx, received_idx) else {
                tracing::warn!(subtype = %counts.subtype, "Subtype not in feature layout, ignoring");
                continue;
            };

            for (node, &n) in &counts.sent {
                table.row_mut(node)[sent_idx] += n;
            }
            for (node, &n) in &counts.received {
                table.row_mut(node)[received_idx] += n;
            }
        }

        if let Some(data_idx) = self.layout.index_of(DATA_RECEIVED_COLUMN) {
            for (node, &n) in &data.received {
                table.row_mut(node)[data_idx] += n;
            }
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(subtype: &str, sent: &[(&str, u64)], received: &[(&str, u64)]) -> ControlCounts {
        ControlCounts {
            subtype: subtype.to_string(),
            sent: sent.iter().map(|(n, c)| (NodeId::new(n), *c)).collect(),
            received: received.iter().map(|(n, c)| (NodeId::new(n), *c)).collect(),
        }
    }

    #[test]
    fn test_zero_fill_and_union_of_nodes() {
        let aggregator = FeatureAggregator::for_subtypes(&["DAO", "DIO"]);
        let dao = counts("DAO", &[("S-1", 3)], &[]);
        let dio = counts("DIO", &[("S-2", 1)], &[("S-1", 4)]);
        let data = DataCounts {
            received: [(NodeId::new("S-3"), 0), (NodeId::new("S-2"), 5)]
                .into_iter()
                .collect(),
        };

        let table = aggregator.aggregate(&[dao, dio], &data);
        let s1 = NodeId::new("S-1");
        let s2 = NodeId::new("S-2");
        let s3 = NodeId::new("S-3");

        assert_eq!(table.node_count(), 3);
        assert_eq!(table.get(&s1, "DAO_Sent"), Some(3));
        assert_eq!(table.get(&s1, "DAO_Received"), Some(0));
        assert_eq!(table.get(&s1, "DIO_Received"), Some(4));
        assert_eq!(table.get(&s1, "Data_Received"), Some(0));
        assert_eq!(table.get(&s2, "DIO_Sent"), Some(1));
        assert_eq!(table.get(&s2, "Data_Received"), Some(5));
        assert_eq!(table.rows[&s3], vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_unknown_subtype_ignored() {
        let aggregator = FeatureAggregator::for_subtypes(&["DAO"]);
        let dis = counts("DIS", &[("S-1", 1)], &[]);
        let table = aggregator.aggregate(&[dis], &DataCounts::default());
        assert_eq!(table.node_count(), 0);
    }

    #[test]
    fn test_rows_in_natural_order() {
        let aggregator = FeatureAggregator::for_subtypes(&["DAO"]);
        let dao = counts("DAO", &[("S-10", 1), ("S-2", 1), ("S-1", 1)], &[]);
        let table = aggregator.aggregate(&[dao], &DataCounts::default());

        let order: Vec<&str> = table.rows.keys().map(|n| n.as_str()).collect();
        assert_eq!(order, vec!["S-1", "S-2", "S-10"]);
    }
}

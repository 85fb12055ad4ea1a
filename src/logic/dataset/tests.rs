//! Corpus building from counts artifacts on disk

use super::*;
use crate::logic::features::table::{read_counts, write_counts};
use crate::logic::features::{CountTable, FeatureLayout};
use crate::logic::run::RunId;
use crate::logic::trace::NodeId;

fn counts(rows: &[(&str, Vec<u64>)]) -> CountTable {
    let mut table = CountTable::new(FeatureLayout::for_subtypes(&["DAO", "DIO"]));
    for (node, row) in rows {
        table.rows.insert(NodeId::new(node), row.clone());
    }
    table
}

#[test]
fn test_runs_to_labeled_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let run1 = dir.path().join("run-1.csv");
    let run2 = dir.path().join("run-2.csv");

    write_counts(&run1, &counts(&[("S-1", vec![2, 4, 0, 1, 3]), ("S-2", vec![1, 2, 0, 2, 6])])).unwrap();
    write_counts(&run2, &counts(&[("S-1", vec![0, 0, 0, 0, 0])])).unwrap();

    let layout = FeatureLayout::for_subtypes(&["DAO", "DIO"]);
    let normalizer = Normalizer::new(NormalizeAxis::Feature, 2);
    let mut corpus = Corpus::new(layout);
    for (name, path) in [("run-1", &run1), ("run-2", &run2)] {
        let table = normalizer.normalize(&read_counts(path).unwrap());
        corpus.append_run(&RunId::new(name), &table).unwrap();
    }

    let mut book = LabelBook::default();
    book.insert(RunId::new("run-1"), NodeId::new("S-2"), Label::Malicious);
    let ds = DatasetAssembler::assemble(&corpus, Some(&book)).unwrap();

    let labeled = ds.labeled.unwrap();
    assert_eq!(labeled.len(), 3);
    // run-1 features scaled per column over its two nodes
    assert_eq!(labeled.rows[0], vec![1.0, 1.0, 0.0, 0.5, 0.5]);
    assert_eq!(labeled.rows[1], vec![0.5, 0.5, 0.0, 1.0, 1.0]);
    // all-zero run stays zero
    assert_eq!(labeled.rows[2], vec![0.0; 5]);
    assert_eq!(
        labeled.labels.unwrap(),
        vec![Label::Benign, Label::Malicious, Label::Benign]
    );
}

#[test]
fn test_normalized_max_is_one_per_feature() {
    let table = counts(&[("S-1", vec![3, 9, 1, 0, 7]), ("S-2", vec![5, 2, 0, 0, 7]), ("S-3", vec![1, 1, 1, 0, 2])])
        .to_feature_table();
    let normalized = Normalizer::default().normalize(&table);

    for column in normalized.values.columns() {
        let max = column.iter().copied().fold(0.0f64, f64::max);
        let raw_nonzero = max > 0.0;
        if raw_nonzero {
            assert!((max - 1.0).abs() <= 0.01);
        } else {
            assert!(column.iter().all(|v| *v == 0.0));
        }
    }
}

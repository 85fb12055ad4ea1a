use super::*;
use crate::error::PipelineError;
use crate::logic::dataset::{FeatureMatrix, Label};

fn columns() -> Vec<String> {
    vec!["DAO_Sent".into(), "DIO_Sent".into(), "Data_Received".into()]
}

/// Two well separated clusters, six rows each
fn training() -> FeatureMatrix {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..6 {
        let jitter = i as f64 * 0.01;
        rows.push(vec![0.05 + jitter, 0.12 - jitter, 0.9 - jitter]);
        labels.push(Label::Benign);
        rows.push(vec![0.95 - jitter, 0.88 + jitter, 0.1 + jitter]);
        labels.push(Label::Malicious);
    }
    FeatureMatrix::new(columns(), rows).with_labels(labels)
}

fn test_matrix() -> FeatureMatrix {
    FeatureMatrix::new(
        columns(),
        vec![vec![0.0, 0.1, 1.0], vec![1.0, 0.9, 0.0], vec![0.08, 0.12, 0.88]],
    )
}

#[test]
fn test_every_variant_labels_every_row() {
    let ensemble = ClassifierEnsemble::new(VariantConfig::defaults());
    let outcomes = ensemble.run(&training(), &test_matrix()).unwrap();

    assert_eq!(outcomes.len(), 4);
    for outcome in &outcomes {
        let matrix = outcome.result.as_ref().unwrap();
        assert_eq!(matrix.len(), 3, "{}", outcome.name);
        assert_eq!(matrix.columns, columns());
        assert_eq!(matrix.labels.as_ref().unwrap().len(), 3);
    }
}

#[test]
fn test_separable_data_classified() {
    let ensemble = ClassifierEnsemble::new(vec![
        VariantConfig::new("NaiveBayes", Algorithm::GaussianNaiveBayes),
        VariantConfig::new("KNN", Algorithm::KNearestNeighbors { k: 3 }),
    ]);
    let outcomes = ensemble.run(&training(), &test_matrix()).unwrap();

    for outcome in outcomes {
        let labels = outcome.result.unwrap().labels.unwrap();
        assert_eq!(
            labels,
            vec![Label::Benign, Label::Malicious, Label::Benign],
            "{}",
            outcome.name
        );
    }
}

#[test]
fn test_single_class_fails_only_affected_variants() {
    let mut single = training();
    single.labels = Some(vec![Label::Benign; single.len()]);

    let ensemble = ClassifierEnsemble::new(VariantConfig::defaults());
    let outcomes = ensemble.run(&single, &test_matrix()).unwrap();

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.is_ok())
        .map(|o| o.name.as_str())
        .collect();
    assert_eq!(failed, vec!["SupportVectorMachine", "LogisticRegression"]);
    assert!(matches!(
        outcomes[0].result,
        Err(PipelineError::Computation { .. })
    ));
}

#[test]
fn test_knn_k_larger_than_training() {
    let ensemble = ClassifierEnsemble::new(vec![VariantConfig::new(
        "KNN",
        Algorithm::KNearestNeighbors { k: 50 },
    )]);
    let outcomes = ensemble.run(&training(), &test_matrix()).unwrap();
    assert!(matches!(
        outcomes[0].result,
        Err(PipelineError::Computation { .. })
    ));
}

#[test]
fn test_schema_mismatch_blocks_ensemble() {
    let test = FeatureMatrix::new(vec!["DAO_Sent".into()], vec![vec![1.0]]);
    let ensemble = ClassifierEnsemble::new(VariantConfig::defaults());
    let err = ensemble.run(&training(), &test).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaValidation { .. }));
}

#[test]
fn test_unlabeled_training_rejected() {
    let ensemble = ClassifierEnsemble::new(VariantConfig::defaults());
    let err = ensemble
        .run(&training().features_only(), &test_matrix())
        .unwrap_err();
    assert!(matches!(err, PipelineError::SchemaValidation { .. }));
}

#[test]
fn test_run_and_write_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let ensemble = ClassifierEnsemble::new(vec![VariantConfig::new(
        "NaiveBayes",
        Algorithm::GaussianNaiveBayes,
    )]);
    let outcomes = ensemble
        .run_and_write(&training(), &test_matrix(), dir.path())
        .unwrap();

    let path = outcomes[0].artifact.as_ref().unwrap();
    assert!(path.ends_with("NaiveBayes.csv"));
    let read = FeatureMatrix::read(path).unwrap();
    assert_eq!(read.len(), 3);
    assert!(read.labels.is_some());
    assert!(read.provenance.is_none());
}

#[test]
fn test_constant_column_within_class() {
    // DAO_Sent is 0 for every benign row
    let training = FeatureMatrix::new(
        vec!["DAO_Sent".into(), "DIO_Sent".into()],
        vec![vec![0.0, 0.2], vec![0.0, 0.4], vec![1.0, 0.9], vec![0.5, 1.0]],
    )
    .with_labels(vec![Label::Benign, Label::Benign, Label::Malicious, Label::Malicious]);
    let test = FeatureMatrix::new(
        vec!["DAO_Sent".into(), "DIO_Sent".into()],
        vec![vec![0.0, 0.3], vec![0.8, 0.95]],
    );

    let ensemble = ClassifierEnsemble::new(VariantConfig::defaults());
    let outcomes = ensemble.run(&training, &test).unwrap();
    assert_eq!(outcomes.len(), 4);

    let nb = outcomes.iter().find(|o| o.name == "NaiveBayes").unwrap();
    let labels = nb.result.as_ref().unwrap().labels.clone().unwrap();
    assert_eq!(labels, vec![Label::Benign, Label::Malicious]);

    // k = 5 with four training rows fails on its own
    let knn = outcomes.iter().find(|o| o.name == "K-NearestNeighbour").unwrap();
    assert!(matches!(knn.result, Err(PipelineError::Computation { .. })));
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 3);
}

//! Integration tests for the training pipeline

use gradecast::prelude::*;
use gradecast::schema::CATEGORICAL_FEATURES;
use gradecast::training::ModelArtifact;

fn quick_config() -> TrainConfig {
    TrainConfig {
        n_estimators: 25,
        cv_folds: 3,
        ..TrainConfig::default()
    }
}

#[test]
fn test_end_to_end_training_run() {
    let df = StudentGenerator::new(42).generate(400).unwrap();
    let output = Trainer::new(quick_config()).train(&df).unwrap();

    // The generator's score is mostly linear in the features, so even a
    // small forest separates the classes well above chance.
    assert!(
        output.report.accuracy > 0.6,
        "accuracy {} too low",
        output.report.accuracy
    );
    assert_eq!(output.report.confusion.total(), 80);
    assert_eq!(output.encoders.len(), CATEGORICAL_FEATURES.len());
    assert_eq!(output.artifact.feature_names, FEATURE_NAMES.to_vec());
}

#[test]
fn test_training_reproducible_for_same_seed() {
    // Full default hyperparameters at N=1000, the configuration the
    // shipped artifacts are trained with
    let df = StudentGenerator::new(7).generate(1000).unwrap();

    let a = Trainer::new(TrainConfig::default()).train(&df).unwrap();
    let b = Trainer::new(TrainConfig::default()).train(&df).unwrap();

    assert_eq!(a.report.accuracy, b.report.accuracy);
    assert_eq!(a.report.cv.scores, b.report.cv.scores);
    assert_eq!(a.report.confusion, b.report.confusion);
}

#[test]
fn test_cv_scores_have_expected_fold_count() {
    let df = StudentGenerator::new(42).generate(300).unwrap();
    let config = TrainConfig {
        n_estimators: 15,
        cv_folds: 5,
        ..TrainConfig::default()
    };
    let output = Trainer::new(config).train(&df).unwrap();

    assert_eq!(output.report.cv.scores.len(), 5);
    assert!(output.report.cv.mean > 0.5);
    for score in &output.report.cv.scores {
        assert!((0.0..=1.0).contains(score));
    }
}

#[test]
fn test_importances_cover_schema_and_sum_to_one() {
    let df = StudentGenerator::new(42).generate(300).unwrap();
    let output = Trainer::new(quick_config()).train(&df).unwrap();

    let ranked = &output.report.ranked_importances;
    assert_eq!(ranked.len(), FEATURE_NAMES.len());

    let total: f64 = ranked.iter().map(|f| f.importance).sum();
    assert!((total - 1.0).abs() < 1e-9);

    let values: Vec<f64> = ranked.iter().map(|f| f.importance).collect();
    assert!(values.windows(2).all(|w| w[0] >= w[1]), "not sorted descending");
}

#[test]
fn test_invalid_test_fraction_rejected() {
    let df = StudentGenerator::new(42).generate(100).unwrap();
    let config = TrainConfig {
        test_fraction: 1.0,
        ..quick_config()
    };
    let err = Trainer::new(config).train(&df).unwrap_err();
    assert!(matches!(err, GradecastError::ConfigError(_)));
}

#[test]
fn test_artifact_roundtrip_preserves_predictions() {
    let df = StudentGenerator::new(42).generate(250).unwrap();
    let output = Trainer::new(quick_config()).train(&df).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    let encoders_path = dir.path().join("encoders.json");
    output.artifact.save(&model_path).unwrap();
    output.encoders.save(&encoders_path).unwrap();

    let loaded = ModelArtifact::load(&model_path).unwrap();
    let before = InferenceEngine::new(output.artifact, output.encoders);
    let after = InferenceEngine::from_files(&model_path, &encoders_path).unwrap();

    assert_eq!(loaded.feature_names, FEATURE_NAMES.to_vec());

    let record = StudentRecord::from_json(serde_json::json!({
        "age": 16, "sex": "F", "studyTime": 3, "motherEdu": 3, "fatherEdu": 2
    }))
    .unwrap();
    let p_before = before.predict(&record).unwrap();
    let p_after = after.predict(&record).unwrap();
    assert_eq!(p_before.probability.pass, p_after.probability.pass);
    assert_eq!(p_before.prediction, p_after.prediction);
}

//! End-to-end tests of the training pipeline.
//!
//! Each test writes synthetic survey rows to a temporary CSV, runs the
//! pipeline against it and inspects the report and the written artifact.

use std::path::Path;

use obesity_ensemble::data::N_CLASSES;
use obesity_ensemble::model::MemberSpec;
use obesity_ensemble::pipeline::{self, PipelineError, TrainedArtifact};
use obesity_ensemble::testing::{synthetic_records, write_csv};
use obesity_ensemble::{
    ConfigError, DatasetLoadError, DatasetLoader, GBDTParams, MemberConfig, PipelineConfig,
    RandomForestParams, SplitError, Verbosity,
};

// =============================================================================
// Helpers
// =============================================================================

/// The reference member line-up with fewer trees.
fn quick_members() -> Vec<MemberConfig> {
    vec![
        MemberConfig::new("lgbm", MemberSpec::Gbdt(GBDTParams { n_trees: 15, ..GBDTParams::lgbm() })),
        MemberConfig::new("xgb", MemberSpec::Gbdt(GBDTParams { n_trees: 15, ..GBDTParams::xgb() })),
        MemberConfig::new(
            "rf",
            MemberSpec::RandomForest(RandomForestParams { n_trees: 20, ..Default::default() }),
        ),
    ]
}

fn config_in(dir: &Path, n_threads: usize) -> PipelineConfig {
    PipelineConfig::builder()
        .data_path(dir.join("data/raw/train.csv"))
        .model_path(dir.join("models/new_model.sav"))
        .members(quick_members())
        .n_threads(n_threads)
        .verbosity(Verbosity::Silent)
        .build()
        .expect("valid config")
}

fn write_dataset(dir: &Path, n: usize, seed: u64) {
    let path = dir.join("data/raw/train.csv");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    write_csv(&path, &synthetic_records(n, seed)).unwrap();
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn run_trains_and_writes_artifact() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), 700, 42);
    let config = config_in(dir.path(), 1);

    let report = pipeline::run(&config).unwrap();

    assert_eq!(report.n_test, 140);
    assert_eq!(report.n_train, 560);
    assert_eq!(report.class_counts, vec![100; N_CLASSES]);
    assert_eq!(report.model_path, config.model_path);
    assert_eq!(
        report.member_accuracies.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
        ["lgbm", "xgb", "rf"]
    );
    // BMI bands make the classes learnable well above chance (1/7).
    assert!(report.accuracy > 0.4, "accuracy {}", report.accuracy);

    let artifact = TrainedArtifact::load(&config.model_path).unwrap();
    assert_eq!(artifact.metadata().accuracy, report.accuracy);
    assert_eq!(artifact.metadata().n_test, report.n_test);
    assert_eq!(artifact.ensemble().n_members(), 3);
}

#[test]
fn loaded_artifact_reproduces_predictions() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), 350, 7);
    let config = config_in(dir.path(), 1);
    pipeline::run(&config).unwrap();

    // The CSV round-trip is lossless, so in-memory training sees the same rows.
    let records = DatasetLoader::training().load(&config.data_path).unwrap();
    let (trained, _) = pipeline::train(&records, &config).unwrap();
    let loaded = TrainedArtifact::load(&config.model_path).unwrap();
    assert_eq!(loaded, trained);

    let fresh = synthetic_records(50, 99);
    assert_eq!(loaded.predict_proba_records(&fresh).unwrap(), trained.predict_proba_records(&fresh).unwrap());
    assert_eq!(loaded.predict_labels(&fresh).unwrap(), trained.predict_labels(&fresh).unwrap());
}

#[test]
fn results_do_not_depend_on_thread_count() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), 350, 11);
    let records = DatasetLoader::training().load(dir.path().join("data/raw/train.csv")).unwrap();

    let (sequential, seq_report) = pipeline::train(&records, &config_in(dir.path(), 1)).unwrap();
    let (parallel, par_report) = pipeline::train(&records, &config_in(dir.path(), 4)).unwrap();

    assert_eq!(seq_report, par_report);
    assert_eq!(sequential.to_bytes().unwrap(), parallel.to_bytes().unwrap());
}

#[test]
fn inference_file_without_target_predicts() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), 350, 5);
    let config = config_in(dir.path(), 1);
    pipeline::run(&config).unwrap();

    let mut unlabeled = synthetic_records(20, 123);
    for record in &mut unlabeled {
        record.nobeyesdad = None;
    }
    let path = dir.path().join("test.csv");
    write_csv(&path, &unlabeled).unwrap();

    let records = DatasetLoader::inference().load(&path).unwrap();
    let artifact = TrainedArtifact::load(&config.model_path).unwrap();
    let codes = artifact.predict_records(&records).unwrap();
    assert_eq!(codes.len(), 20);
    assert!(codes.iter().all(|&c| (c as usize) < N_CLASSES));
}

#[test]
fn missing_dataset_fails_before_training() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 1);

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Load(DatasetLoadError::FileNotFound { .. })), "got {err:?}");
    assert!(!config.model_path.exists());
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), 70, 1);
    let mut config = config_in(dir.path(), 1);
    config.test_size = 1.5;

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Config(ConfigError::InvalidTestSize(_))), "got {err:?}");
}

#[test]
fn singleton_class_cannot_be_stratified() {
    let dir = tempfile::tempdir().unwrap();
    let mut records = synthetic_records(140, 2);
    // Keep a single Obesity_Type_III row.
    let mut kept_one = false;
    records.retain(|r| {
        if r.nobeyesdad.as_deref() != Some("Obesity_Type_III") {
            return true;
        }
        !std::mem::replace(&mut kept_one, true)
    });
    let path = dir.path().join("data/raw/train.csv");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    write_csv(&path, &records).unwrap();

    let err = pipeline::run(&config_in(dir.path(), 1)).unwrap_err();
    assert!(matches!(err, PipelineError::Split(SplitError::ClassTooSmall { class: 6, count: 1 })), "got {err:?}");
}

//! Integration tests for the native artifact format.
//!
//! Builds a small artifact in memory, then checks the file round-trip and
//! that damaged files are rejected with the matching error.

use obesity_ensemble::model::MemberSpec;
use obesity_ensemble::persist::native::{CURRENT_VERSION_MAJOR, HEADER_SIZE, MAGIC};
use obesity_ensemble::pipeline::{self, TrainedArtifact};
use obesity_ensemble::testing::synthetic_records;
use obesity_ensemble::{
    DeserializeError, GBDTParams, MemberConfig, PipelineConfig, RandomForestParams, Verbosity,
};

fn artifact() -> TrainedArtifact {
    let config = PipelineConfig::builder()
        .members(vec![
            MemberConfig::new("xgb", MemberSpec::Gbdt(GBDTParams { n_trees: 5, ..GBDTParams::xgb() })),
            MemberConfig::new(
                "rf",
                MemberSpec::RandomForest(RandomForestParams { n_trees: 5, ..Default::default() }),
            ),
        ])
        .n_threads(1)
        .verbosity(Verbosity::Silent)
        .build()
        .unwrap();
    pipeline::train(&synthetic_records(210, 17), &config).unwrap().0
}

fn decode_err(bytes: &[u8]) -> DeserializeError {
    TrainedArtifact::from_bytes(bytes).expect_err("damaged artifact must not load")
}

#[test]
fn save_then_load_is_lossless() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/models/new_model.sav");
    let original = artifact();

    original.save(&path).unwrap();
    let loaded = TrainedArtifact::load(&path).unwrap();
    assert_eq!(loaded, original);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], MAGIC);
    assert_eq!(bytes, original.to_bytes().unwrap());
}

#[test]
fn save_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.sav");
    std::fs::write(&path, b"stale contents").unwrap();

    artifact().save(&path).unwrap();
    assert!(TrainedArtifact::load(&path).is_ok());

    // No temporary files are left next to the artifact.
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn header_records_model_shape() {
    let original = artifact();
    let bytes = original.to_bytes().unwrap();
    let u32_at = |offset: usize| u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap());

    assert_eq!(bytes[4], CURRENT_VERSION_MAJOR);
    assert_eq!(u32_at(12) as usize, bytes.len() - HEADER_SIZE);
    assert_eq!(u32_at(20), 9);
    assert_eq!(u32_at(24), 7);
    assert_eq!(u32_at(28), 2);
}

#[test]
fn rejects_wrong_magic() {
    let mut bytes = artifact().to_bytes().unwrap();
    bytes[..4].copy_from_slice(b"PK\x03\x04");
    assert!(matches!(decode_err(&bytes), DeserializeError::NotAnArtifact));
}

#[test]
fn rejects_newer_major_version() {
    let mut bytes = artifact().to_bytes().unwrap();
    bytes[4] = CURRENT_VERSION_MAJOR + 1;
    assert!(matches!(decode_err(&bytes), DeserializeError::UnsupportedVersion { .. }));
}

#[test]
fn rejects_truncated_file() {
    let bytes = artifact().to_bytes().unwrap();

    let err = decode_err(&bytes[..bytes.len() - 10]);
    assert!(
        matches!(err, DeserializeError::Truncated { expected, actual } if expected == bytes.len() && actual == bytes.len() - 10),
        "got {err:?}"
    );
    assert!(matches!(decode_err(&bytes[..HEADER_SIZE / 2]), DeserializeError::Truncated { .. }));
    assert!(matches!(decode_err(&[]), DeserializeError::Truncated { .. }));
}

#[test]
fn rejects_corrupted_payload() {
    let mut bytes = artifact().to_bytes().unwrap();
    let mid = HEADER_SIZE + (bytes.len() - HEADER_SIZE) / 2;
    bytes[mid] ^= 0xFF;
    assert!(matches!(decode_err(&bytes), DeserializeError::ChecksumMismatch { .. }));
}

#[test]
fn rejects_trailing_bytes() {
    let mut bytes = artifact().to_bytes().unwrap();
    bytes.extend_from_slice(&[0, 0, 0]);
    assert!(matches!(decode_err(&bytes), DeserializeError::CorruptPayload(_)));
}

#[test]
fn rejects_header_disagreeing_with_payload() {
    let mut bytes = artifact().to_bytes().unwrap();
    // Claim 3 members; the checksum covers only the payload.
    bytes[28..32].copy_from_slice(&3u32.to_le_bytes());
    assert!(matches!(decode_err(&bytes), DeserializeError::CorruptPayload(_)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TrainedArtifact::load(dir.path().join("absent.sav")).unwrap_err();
    assert!(matches!(err, DeserializeError::Io(_)));
}

//! Artifact persistence.
//!
//! Artifacts are written in the native format ([`native`]): a checksummed
//! header followed by a Postcard [`ArtifactPayload`]. Files are replaced
//! atomically: the bytes go to a temporary file in the destination directory,
//! which is synced and then renamed over the target.
//!
//! Loading verifies the header, the checksum and the structure of every
//! tree before handing the payload out.

pub mod native;
mod payload;

use std::fs;
use std::io::Write;
use std::path::Path;

pub use native::{DeserializeError, SerializeError};
pub use payload::{ArtifactMetadata, ArtifactPayload, ArtifactV1};
use payload::ArtifactPayloadRef;

use crate::model::Classifier;
use native::{FormatFlags, FormatHeader};

/// Encode an artifact to bytes.
pub fn to_bytes(artifact: &ArtifactV1) -> Result<Vec<u8>, SerializeError> {
    let ensemble = &artifact.ensemble;
    let mut header = FormatHeader::new(
        ensemble.n_features() as u32,
        ensemble.n_classes() as u32,
        ensemble.n_members() as u32,
    );
    if artifact.transformer.is_fitted() {
        header.flags.set(FormatFlags::HAS_TRANSFORMER);
    }
    native::serialize(header, &ArtifactPayloadRef::V1(artifact))
}

/// Decode and validate an artifact from bytes.
pub fn from_bytes(bytes: &[u8]) -> Result<ArtifactV1, DeserializeError> {
    let (header, payload): (FormatHeader, ArtifactPayload) = native::deserialize(bytes)?;
    let ArtifactPayload::V1(artifact) = payload;
    validate(&header, &artifact)?;
    Ok(artifact)
}

/// Atomically write an artifact to `path`, creating parent directories.
pub fn save(path: &Path, artifact: &ArtifactV1) -> Result<(), SerializeError> {
    let bytes = to_bytes(artifact)?;

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut file = tempfile::NamedTempFile::new_in(parent)?;
    file.write_all(&bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| SerializeError::Io(e.error))?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "artifact written");
    Ok(())
}

/// Read and validate an artifact from `path`.
pub fn load(path: &Path) -> Result<ArtifactV1, DeserializeError> {
    let bytes = fs::read(path)?;
    let artifact = from_bytes(&bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "artifact loaded");
    Ok(artifact)
}

fn validate(header: &FormatHeader, artifact: &ArtifactV1) -> Result<(), DeserializeError> {
    let corrupt = |msg: String| DeserializeError::CorruptPayload(msg);
    let ensemble = &artifact.ensemble;

    let counts = [
        ("features", header.num_features as usize, ensemble.n_features()),
        ("classes", header.num_classes as usize, ensemble.n_classes()),
        ("members", header.num_members as usize, ensemble.n_members()),
        ("feature names", ensemble.n_features(), artifact.metadata.feature_names.len()),
    ];
    for (what, expected, found) in counts {
        if expected != found {
            return Err(corrupt(format!("{what}: header says {expected}, payload has {found}")));
        }
    }
    if header.flags.contains(FormatFlags::HAS_TRANSFORMER) != artifact.transformer.is_fitted() {
        return Err(corrupt("transformer flag disagrees with payload".into()));
    }

    ensemble.validate().map_err(|e| corrupt(e.to_string()))?;

    for (name, model) in ensemble.members() {
        model.validate().map_err(|e| corrupt(format!("member '{name}': {e}")))?;
    }
    Ok(())
}

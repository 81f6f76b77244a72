//! Artifact serialization
//!
//! Each artifact is a bincode-encoded [`SerializedArtifact`] envelope whose
//! payload is the bincode encoding of the value itself.

use crate::config::PipelineConfig;
use crate::error::{Result, StressError};
use crate::preprocessing::StandardScaler;
use crate::training::TrainedClassifier;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What an artifact file contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Classifier,
    Scaler,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Classifier => write!(f, "classifier"),
            ArtifactKind::Scaler => write!(f, "scaler"),
        }
    }
}

/// Serializable artifact wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedArtifact {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u32,
    pub kind: ArtifactKind,
    /// Crate version that wrote the file
    pub written_by: String,
    /// Serialized value
    pub payload: Vec<u8>,
    /// Checksum for integrity verification
    pub checksum: u64,
}

impl SerializedArtifact {
    /// Magic bytes for artifact files
    pub const MAGIC: [u8; 4] = [b'O', b'C', b'S', b'T'];
    /// Current format version
    pub const VERSION: u32 = 1;

    /// Wrap an encoded payload
    pub fn new(kind: ArtifactKind, payload: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&payload);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            kind,
            written_by: env!("CARGO_PKG_VERSION").to_string(),
            payload,
            checksum,
        }
    }

    /// Compute checksum using FNV-1a hash
    fn compute_checksum(data: &[u8]) -> u64 {
        const FNV_OFFSET: u64 = 14695981039346656037;
        const FNV_PRIME: u64 = 1099511628211;

        let mut hash = FNV_OFFSET;
        for byte in data {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }

    /// Verify checksum
    pub fn verify_checksum(&self) -> bool {
        Self::compute_checksum(&self.payload) == self.checksum
    }

    /// Reject foreign, future or damaged envelopes
    fn check(&self, expected: ArtifactKind) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(StressError::Serialization("not an artifact file (bad magic)".to_string()));
        }
        if self.format_version > Self::VERSION {
            return Err(StressError::Serialization(format!(
                "unsupported format version {} (max {})",
                self.format_version,
                Self::VERSION
            )));
        }
        if self.kind != expected {
            return Err(StressError::Serialization(format!(
                "expected a {} artifact, found a {} artifact",
                expected, self.kind
            )));
        }
        if !self.verify_checksum() {
            return Err(StressError::Serialization("checksum mismatch".to_string()));
        }
        Ok(())
    }
}

/// Encode `value` and write it to `path` inside an envelope
pub fn write_artifact<T: Serialize>(path: &Path, kind: ArtifactKind, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let payload = bincode::serialize(value)
        .map_err(|e| StressError::Serialization(format!("Failed to serialize {}: {}", kind, e)))?;
    let envelope = SerializedArtifact::new(kind, payload);
    let bytes = bincode::serialize(&envelope)?;

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;

    debug!(path = %path.display(), kind = %kind, bytes = bytes.len(), "Wrote artifact");
    Ok(())
}

/// Read an envelope from `path`, verify it and decode its payload
pub fn read_artifact<T: DeserializeOwned>(path: &Path, kind: ArtifactKind) -> Result<T> {
    if !path.exists() {
        return Err(StressError::ModelFileMissing {
            path: path.to_path_buf(),
        });
    }

    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;

    let envelope: SerializedArtifact = bincode::deserialize(&bytes).map_err(|e| {
        StressError::Serialization(format!("{}: cannot decode envelope: {}", path.display(), e))
    })?;
    envelope.check(kind)?;

    bincode::deserialize(&envelope.payload).map_err(|e| {
        StressError::Serialization(format!("{}: cannot decode {}: {}", path.display(), kind, e))
    })
}

/// The two artifact files a trained pipeline needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    model_path: PathBuf,
    scaler_path: PathBuf,
}

impl ArtifactStore {
    pub fn new(model_path: impl Into<PathBuf>, scaler_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            scaler_path: scaler_path.into(),
        }
    }

    /// Store using the default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::from_config(&PipelineConfig::default().with_model_dir(dir.as_ref()))
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.model_path(), config.scaler_path())
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn scaler_path(&self) -> &Path {
        &self.scaler_path
    }

    /// Both files are present
    pub fn exists(&self) -> bool {
        self.model_path.exists() && self.scaler_path.exists()
    }

    /// Persist classifier and scaler, creating the model directory if needed
    pub fn save(&self, classifier: &TrainedClassifier, scaler: &StandardScaler) -> Result<()> {
        write_artifact(&self.model_path, ArtifactKind::Classifier, classifier)?;
        write_artifact(&self.scaler_path, ArtifactKind::Scaler, scaler)?;
        info!(
            model = %self.model_path.display(),
            scaler = %self.scaler_path.display(),
            "Saved model artifacts"
        );
        Ok(())
    }

    /// Load both artifacts; a missing file yields `ModelFileMissing`
    pub fn load(&self) -> Result<(TrainedClassifier, StandardScaler)> {
        let classifier: TrainedClassifier = read_artifact(&self.model_path, ArtifactKind::Classifier)?;
        let scaler: StandardScaler = read_artifact(&self.scaler_path, ArtifactKind::Scaler)?;
        info!(
            model = %self.model_path.display(),
            params = %classifier.params(),
            "Loaded model artifacts"
        );
        Ok((classifier, scaler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn fitted_scaler() -> StandardScaler {
        let mut scaler = StandardScaler::new(vec!["a".to_string(), "b".to_string()]);
        scaler.fit(&array![[1.0, 2.0], [3.0, 5.0], [4.0, 9.0]]).unwrap();
        scaler
    }

    #[test]
    fn test_checksum() {
        let a = SerializedArtifact::new(ArtifactKind::Scaler, vec![1, 2, 3]);
        assert!(a.verify_checksum());

        let mut b = a.clone();
        b.payload[0] = 9;
        assert!(!b.verify_checksum());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/scaler.bin");
        let scaler = fitted_scaler();

        write_artifact(&path, ArtifactKind::Scaler, &scaler).unwrap();
        let loaded: StandardScaler = read_artifact(&path, ArtifactKind::Scaler).unwrap();
        assert_eq!(loaded, scaler);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin");
        let err = read_artifact::<StandardScaler>(&path, ArtifactKind::Scaler).unwrap_err();
        assert!(matches!(err, StressError::ModelFileMissing { path: p } if p == path));
    }

    #[test]
    fn test_wrong_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.bin");
        write_artifact(&path, ArtifactKind::Scaler, &fitted_scaler()).unwrap();

        let err = read_artifact::<StandardScaler>(&path, ArtifactKind::Classifier).unwrap_err();
        assert!(matches!(err, StressError::Serialization(_)));
    }

    #[test]
    fn test_corrupted_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.bin");
        write_artifact(&path, ArtifactKind::Scaler, &fitted_scaler()).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 12;
        bytes[last] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        let err = read_artifact::<StandardScaler>(&path, ArtifactKind::Scaler).unwrap_err();
        assert!(matches!(err, StressError::Serialization(_)));

        fs::write(&path, b"garbage").unwrap();
        let err = read_artifact::<StandardScaler>(&path, ArtifactKind::Scaler).unwrap_err();
        assert!(matches!(err, StressError::Serialization(_)));
    }
}

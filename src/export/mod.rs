//! Model persistence
//!
//! The classifier and the scaler are stored as two separate files so the
//! scaler fitted at training time is the one used at inference.

mod serializer;

pub use serializer::{read_artifact, write_artifact, ArtifactKind, ArtifactStore, SerializedArtifact};

//! Highlights, locations and the artifacts they point at

mod artifact;
mod store;
mod types;

pub use artifact::{Artifact, ArtifactKind, ArtifactStore, MemoryArtifactStore, StoreError};
pub use store::HighlightStore;
pub use types::{DocumentLocation, Highlight, HighlightColor};

//! Artifacts produced by selections and captures
//!
//! An artifact is what ends up on the canvas. Highlights are keyed by the
//! artifact id only, so nothing in the coordinate core needs to know which
//! kind of artifact it is looking at.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use super::types::DocumentLocation;
use crate::capture::ImageBlob;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Text copied out of a document
    Snippet {
        text: String,
        location: DocumentLocation,
    },
    /// Free-standing note, not anchored to a document
    Note {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    /// Rasterized region of a document
    ImageCapture {
        image: ImageBlob,
        location: DocumentLocation,
    },
}

impl ArtifactKind {
    /// Location on the source document, if the artifact has one
    pub fn location(&self) -> Option<&DocumentLocation> {
        match self {
            ArtifactKind::Snippet { location, .. } => Some(location),
            ArtifactKind::ImageCapture { location, .. } => Some(location),
            ArtifactKind::Note { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Snippet { .. } => "snippet",
            ArtifactKind::Note { .. } => "note",
            ArtifactKind::ImageCapture { .. } => "image capture",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ArtifactKind,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("artifact {id} not found")]
    NotFound { id: String },

    #[error("{detail}")]
    Backend { detail: String },
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend {
            detail: msg.into(),
        }
    }
}

/// Persistence collaborator that owns artifacts
pub trait ArtifactStore {
    /// Persist a new artifact and return its id
    fn create_artifact(
        &mut self,
        document_id: Option<&str>,
        kind: ArtifactKind,
    ) -> Result<String, StoreError>;

    fn delete_artifact(&mut self, id: &str) -> Result<(), StoreError>;
}

/// In-process artifact store with generated ids
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: HashMap<String, Artifact>,
    order: Vec<String>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Artifact> {
        self.artifacts.get(id)
    }

    /// Artifacts in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.order.iter().filter_map(|id| self.artifacts.get(id))
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Load artifacts previously written with [`save_to_file`](Self::save_to_file).
    /// A missing file yields an empty store.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifacts from {path:?}"))?;
        let artifacts: Vec<Artifact> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifacts in {path:?}"))?;
        let mut store = Self::new();
        for artifact in artifacts {
            store.order.push(artifact.id.clone());
            store.artifacts.insert(artifact.id.clone(), artifact);
        }
        info!("Loaded {} artifacts from {path:?}", store.len());
        Ok(store)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let artifacts: Vec<&Artifact> = self.iter().collect();
        let content = serde_json::to_string_pretty(&artifacts)?;
        fs::write(path, content).with_context(|| format!("Failed to write {path:?}"))?;
        Ok(())
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn create_artifact(
        &mut self,
        document_id: Option<&str>,
        kind: ArtifactKind,
    ) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        info!("Created {} artifact {id}", kind.label());
        let artifact = Artifact {
            id: id.clone(),
            document_id: document_id.map(str::to_string),
            created_at: Utc::now(),
            kind,
        };
        self.artifacts.insert(id.clone(), artifact);
        self.order.push(id.clone());
        Ok(id)
    }

    fn delete_artifact(&mut self, id: &str) -> Result<(), StoreError> {
        if self.artifacts.remove(id).is_none() {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        self.order.retain(|other| other != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::DocRect;

    fn snippet() -> ArtifactKind {
        ArtifactKind::Snippet {
            text: "coordinate reconciliation".into(),
            location: DocumentLocation::from_rect(0, DocRect::new(10.0, 700.0, 120.0, 14.0)),
        }
    }

    #[test]
    fn create_and_delete() {
        let mut store = MemoryArtifactStore::new();
        let id = store.create_artifact(Some("paper.pdf"), snippet()).unwrap();
        assert_eq!(store.get(&id).unwrap().document_id.as_deref(), Some("paper.pdf"));
        store.delete_artifact(&id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.delete_artifact(&id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn iter_keeps_creation_order() {
        let mut store = MemoryArtifactStore::new();
        let a = store.create_artifact(Some("paper.pdf"), snippet()).unwrap();
        let b = store
            .create_artifact(
                None,
                ArtifactKind::Note {
                    text: "follow up".into(),
                    color: Some("yellow".into()),
                },
            )
            .unwrap();
        let ids: Vec<_> = store.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn kind_tag_is_flattened_into_artifact() {
        let artifact = Artifact {
            id: "n1".into(),
            document_id: None,
            created_at: Utc::now(),
            kind: ArtifactKind::Note {
                text: "hi".into(),
                color: None,
            },
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["kind"], "note");
        assert_eq!(json["text"], "hi");
        let back: Artifact = serde_json::from_value(json).unwrap();
        assert_eq!(back, artifact);
    }

    #[test]
    fn file_round_trip_keeps_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("artifacts.json");
        let mut store = MemoryArtifactStore::new();
        let a = store.create_artifact(Some("paper.pdf"), snippet()).unwrap();
        let b = store.create_artifact(Some("paper.pdf"), snippet()).unwrap();
        store.save_to_file(&path).unwrap();

        let loaded = MemoryArtifactStore::load_from_file(&path).unwrap();
        let ids: Vec<_> = loaded.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let loaded = MemoryArtifactStore::load_from_file(&dir.path().join("none.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn notes_have_no_location() {
        let note = ArtifactKind::Note {
            text: "x".into(),
            color: None,
        };
        assert!(note.location().is_none());
        assert!(snippet().location().is_some());
    }
}

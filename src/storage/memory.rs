use crate::error::{Result, StudioError};
use crate::models::{Format, GeneratedArtifact, UsageRecord};
use crate::storage::traits::{ArtifactStore, UsageStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory store keyed by session, used for anonymous callers and tests.
/// The caller's allowance is enforced by the entitlement gate, not here.
#[derive(Default)]
pub struct MemoryStore {
    artifacts: Mutex<Vec<OwnedArtifact>>,
    usage: Mutex<HashMap<String, UsageRecord>>,
}

struct OwnedArtifact {
    owner: String,
    artifact: GeneratedArtifact,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn save(&self, artifact: &GeneratedArtifact, owner: &str) -> Result<String> {
        let mut artifacts = self
            .artifacts
            .lock()
            .map_err(|_| StudioError::StorageError("artifact store poisoned".into()))?;
        artifacts.push(OwnedArtifact {
            owner: owner.to_string(),
            artifact: artifact.clone(),
        });
        Ok(artifact.id.clone())
    }

    async fn list(&self, owner: &str) -> Result<Vec<GeneratedArtifact>> {
        let artifacts = self
            .artifacts
            .lock()
            .map_err(|_| StudioError::StorageError("artifact store poisoned".into()))?;
        Ok(artifacts
            .iter()
            .filter(|entry| entry.owner == owner)
            .map(|entry| entry.artifact.clone())
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut artifacts = self
            .artifacts
            .lock()
            .map_err(|_| StudioError::StorageError("artifact store poisoned".into()))?;
        let before = artifacts.len();
        artifacts.retain(|entry| entry.artifact.id != id);
        Ok(artifacts.len() < before)
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn usage_for(&self, owner: &str) -> Result<UsageRecord> {
        let usage = self
            .usage
            .lock()
            .map_err(|_| StudioError::StorageError("usage store poisoned".into()))?;
        Ok(usage.get(owner).copied().unwrap_or_default())
    }

    async fn record_artifact(&self, owner: &str, format: Format) -> Result<()> {
        // Read-then-increment under one lock so overlapping batches from the
        // same caller never undercount.
        let mut usage = self
            .usage
            .lock()
            .map_err(|_| StudioError::StorageError("usage store poisoned".into()))?;
        usage
            .entry(owner.to_string())
            .or_default()
            .record(format.is_square());
        Ok(())
    }
}

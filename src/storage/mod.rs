pub mod memory;
pub mod rest;
pub mod traits;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::models::{Format, GeneratedArtifact, UsageRecord};
use std::sync::Arc;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use traits::{ArtifactStore, CreativeStore, UsageStore};

/// Store facade that selects a backend from configuration: the REST backend
/// when a base URL is configured, otherwise the in-memory session store.
pub struct StoreManager {
    backend: Arc<dyn CreativeStore>,
}

impl StoreManager {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let backend: Arc<dyn CreativeStore> = if config.base_url.is_some() {
            Arc::new(RestStore::new(config)?)
        } else {
            Arc::new(MemoryStore::new())
        };
        Ok(Self { backend })
    }

    /// Wrap a custom backend (used by tests and embedders).
    pub fn with_backend(backend: Arc<dyn CreativeStore>) -> Self {
        Self { backend }
    }

    pub async fn save(&self, artifact: &GeneratedArtifact, owner: &str) -> Result<String> {
        self.backend.save(artifact, owner).await
    }

    pub async fn list(&self, owner: &str) -> Result<Vec<GeneratedArtifact>> {
        self.backend.list(owner).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.backend.delete(id).await
    }

    pub async fn usage_for(&self, owner: &str) -> Result<UsageRecord> {
        self.backend.usage_for(owner).await
    }

    pub async fn record_artifact(&self, owner: &str, format: Format) -> Result<()> {
        self.backend.record_artifact(owner, format).await
    }
}

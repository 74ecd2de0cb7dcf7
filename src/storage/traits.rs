use crate::error::Result;
use crate::models::{Format, GeneratedArtifact, UsageRecord};
use async_trait::async_trait;

/// Persistence for generated creatives, keyed by owner (account id, or a
/// browser/session key for anonymous callers).
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist one artifact and return its stored id.
    async fn save(&self, artifact: &GeneratedArtifact, owner: &str) -> Result<String>;
    async fn list(&self, owner: &str) -> Result<Vec<GeneratedArtifact>>;
    /// Returns false when the id was not found.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Per-caller generation counters. `record_artifact` must be atomic per
/// owner so overlapping batches never undercount.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn usage_for(&self, owner: &str) -> Result<UsageRecord>;
    async fn record_artifact(&self, owner: &str, format: Format) -> Result<()>;
}

/// Combined store surface the pipeline works against.
pub trait CreativeStore: ArtifactStore + UsageStore {}

impl<T: ArtifactStore + UsageStore> CreativeStore for T {}

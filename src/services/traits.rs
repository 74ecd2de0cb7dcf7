use crate::error::Result;
use crate::models::SizeBucket;
use async_trait::async_trait;

/// Image-generation capability: prompt in, artifact URL out. Implementations
/// must be cancel-safe; the pipeline drops the future on timeout.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn generate(&self, prompt: &str, size: SizeBucket) -> Result<String>;
}

/// Text-generation capability: system + user instruction in, raw text out.
#[async_trait]
pub trait TextService: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

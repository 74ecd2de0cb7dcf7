use crate::models::{AdCopy, Format};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One generated creative for one format. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub id: String,
    pub format: Format,
    /// A real generated asset URL, a data URL, or a placeholder URL.
    pub url: String,
    pub is_fallback: bool,
    /// Human-readable reason when `is_fallback` is true.
    pub fallback_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedArtifact {
    pub fn generated(format: Format, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            format,
            url: url.into(),
            is_fallback: false,
            fallback_reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn fallback(format: Format, url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            format,
            url: url.into(),
            is_fallback: true,
            fallback_reason: Some(reason.into()),
            created_at: Utc::now(),
        }
    }
}

/// Overall outcome of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// At least one artifact is a real generation.
    Succeeded,
    /// Artifacts were produced but every one is a placeholder.
    Degraded,
    /// No artifact was produced at all.
    Failed,
}

/// Result of one batch invocation: artifacts in request order plus the copy
/// and any non-fatal warnings collected along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub artifacts: Vec<GeneratedArtifact>,
    pub success_count: usize,
    pub failure_count: usize,
    pub copy: Option<AdCopy>,
    pub status: BatchStatus,
    pub warnings: Vec<String>,
}

impl BatchResult {
    /// Status policy: succeeded needs a real generation; placeholder-only
    /// batches report degraded rather than success or hard failure.
    pub fn status_for(artifacts: &[GeneratedArtifact]) -> BatchStatus {
        if artifacts.iter().any(|a| !a.is_fallback) {
            BatchStatus::Succeeded
        } else if !artifacts.is_empty() {
            BatchStatus::Degraded
        } else {
            BatchStatus::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_requires_a_real_generation_for_success() {
        let real = GeneratedArtifact::generated(Format::Square, "https://cdn/x.png");
        let substitute = GeneratedArtifact::fallback(Format::Story, "https://ph/x", "timed out");

        assert_eq!(
            BatchResult::status_for(&[real.clone(), substitute.clone()]),
            BatchStatus::Succeeded
        );
        assert_eq!(
            BatchResult::status_for(&[substitute]),
            BatchStatus::Degraded
        );
        assert_eq!(BatchResult::status_for(&[]), BatchStatus::Failed);
    }
}

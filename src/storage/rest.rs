use crate::config::StoreConfig;
use crate::error::{Result, StudioError};
use crate::models::{Format, GeneratedArtifact, UsageRecord};
use crate::storage::traits::{ArtifactStore, UsageStore};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

/// HTTP persistence backend for authenticated callers.
pub struct RestStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .ok_or_else(|| StudioError::ConfigError("Store base URL is required".into()))?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ArtifactStore for RestStore {
    async fn save(&self, artifact: &GeneratedArtifact, owner: &str) -> Result<String> {
        let payload = json!({
            "owner": owner,
            "artifact": artifact,
        });

        let response = self
            .request(self.client.post(format!("{}/creatives", self.base_url)))
            .json(&payload)
            .send()
            .await
            .map_err(|e| StudioError::StorageError(format!("save failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StudioError::StorageError(format!(
                "save failed: {}",
                error_text
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StudioError::StorageError(format!("save response: {}", e)))?;

        Ok(body
            .get("id")
            .and_then(|id| id.as_str())
            .unwrap_or(&artifact.id)
            .to_string())
    }

    async fn list(&self, owner: &str) -> Result<Vec<GeneratedArtifact>> {
        let response = self
            .request(self.client.get(format!("{}/creatives", self.base_url)))
            .query(&[("owner", owner)])
            .send()
            .await
            .map_err(|e| StudioError::StorageError(format!("list failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StudioError::StorageError(format!(
                "list failed: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StudioError::StorageError(format!("list response: {}", e)))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let response = self
            .request(
                self.client
                    .delete(format!("{}/creatives/{}", self.base_url, id)),
            )
            .send()
            .await
            .map_err(|e| StudioError::StorageError(format!("delete failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => {
                let error_text = response.text().await.unwrap_or_default();
                Err(StudioError::StorageError(format!(
                    "delete failed: {}",
                    error_text
                )))
            }
        }
    }
}

#[async_trait]
impl UsageStore for RestStore {
    async fn usage_for(&self, owner: &str) -> Result<UsageRecord> {
        let response = self
            .request(
                self.client
                    .get(format!("{}/usage/{}", self.base_url, owner)),
            )
            .send()
            .await
            .map_err(|e| StudioError::StorageError(format!("usage read failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(UsageRecord::default());
        }
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StudioError::StorageError(format!(
                "usage read failed: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StudioError::StorageError(format!("usage response: {}", e)))
    }

    async fn record_artifact(&self, owner: &str, format: Format) -> Result<()> {
        // The backend applies the increment atomically per owner.
        let payload = json!({
            "format": format,
            "square": format.is_square(),
        });

        let response = self
            .request(
                self.client
                    .post(format!("{}/usage/{}/increment", self.base_url, owner)),
            )
            .json(&payload)
            .send()
            .await
            .map_err(|e| StudioError::StorageError(format!("usage increment failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StudioError::StorageError(format!(
                "usage increment failed: {}",
                error_text
            )));
        }
        Ok(())
    }
}

use crate::config::ImageServiceConfig;
use crate::error::{Result, StudioError};
use crate::models::SizeBucket;
use crate::services::traits::ImageService;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_MODEL: &str = "image-alpha-001";

/// HTTP image-generation client. Accepts responses carrying either an asset
/// URL or inline base64 image data (returned as a data URL).
pub struct HttpImageService {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpImageService {
    pub fn new(config: ImageServiceConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| StudioError::ConfigError("Image service endpoint is required".into()))?;

        Ok(Self {
            client: Client::new(),
            endpoint,
            api_key: config.api_key,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

#[async_trait]
impl ImageService for HttpImageService {
    async fn generate(&self, prompt: &str, size: SizeBucket) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": size.as_str(),
        });

        log::info!("Generating image with model: {}", self.model);
        log::debug!("Image prompt ({} chars)", prompt.len());

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("image service: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StudioError::ResponseError(format!("image service: {}", e)))?;

        if !status.is_success() {
            return Err(StudioError::ResponseError(extract_error_message(
                status.as_u16(),
                &text,
            )));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| StudioError::ResponseError(format!("image service: {}", e)))?;

        first_image_url(&body)
            .ok_or_else(|| StudioError::ResponseError("no output returned".into()))
    }
}

/// Pull the first usable image out of a generation response: a `url` field,
/// or inline `b64_json` data wrapped as a data URL.
fn first_image_url(body: &Value) -> Option<String> {
    let item = body.get("data")?.get(0)?;

    if let Some(url) = item.get("url").and_then(|u| u.as_str()) {
        if !url.is_empty() {
            return Some(url.to_string());
        }
    }
    if let Some(b64) = item.get("b64_json").and_then(|b| b.as_str()) {
        if !b64.is_empty() {
            return Some(format!("data:image/png;base64,{}", b64));
        }
    }
    None
}

/// Extract a readable message from an HTTP error body. Tries the common
/// `{"error":{"message":...}}` and `{"message":...}` shapes before falling
/// back to a bounded snippet of the raw body.
pub(crate) fn extract_error_message(status: u16, body_text: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return format!("HTTP {}: {}", status, msg);
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return format!("HTTP {}: {}", status, msg);
        }
    }

    let trimmed = body_text.trim();
    let snippet: String = trimmed.chars().take(400).collect();
    if snippet.len() < trimmed.len() {
        format!("HTTP {}: {}...", status, snippet)
    } else {
        format!("HTTP {}: {}", status, snippet)
    }
}

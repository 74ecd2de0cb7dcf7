use crate::config::TextServiceConfig;
use crate::error::{Result, StudioError};
use crate::services::image::extract_error_message;
use crate::services::traits::TextService;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_MODEL: &str = "copy-large-001";

/// HTTP text-generation client speaking the common chat-completions wire
/// shape: system + user messages in, `choices[0].message.content` out.
pub struct HttpTextService {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpTextService {
    pub fn new(config: TextServiceConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| StudioError::ConfigError("Text service endpoint is required".into()))?;

        Ok(Self {
            client: Client::new(),
            endpoint,
            api_key: config.api_key,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

#[async_trait]
impl TextService for HttpTextService {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "temperature": 0.7
        });

        log::info!("Generating copy with model: {}", self.model);

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("text service: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StudioError::ResponseError(format!("text service: {}", e)))?;

        if !status.is_success() {
            return Err(StudioError::ResponseError(extract_error_message(
                status.as_u16(),
                &text,
            )));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| StudioError::ResponseError(format!("text service: {}", e)))?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                StudioError::ResponseError(
                    "text response missing choices[0].message.content".into(),
                )
            })
    }
}

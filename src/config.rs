use std::env;
use std::time::Duration;

/// Image-generation service settings.
#[derive(Debug, Clone, Default)]
pub struct ImageServiceConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ImageServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        ImageServiceConfig {
            endpoint: env::var("IMAGE_SERVICE_URL").ok(),
            api_key: env::var("IMAGE_SERVICE_API_KEY").ok(),
            model: env::var("IMAGE_SERVICE_MODEL").ok(),
            timeout_secs: env::var("IMAGE_SERVICE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(45))
    }
}

/// Text-generation service settings.
#[derive(Debug, Clone, Default)]
pub struct TextServiceConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl TextServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        TextServiceConfig {
            endpoint: env::var("TEXT_SERVICE_URL").ok(),
            api_key: env::var("TEXT_SERVICE_API_KEY").ok(),
            model: env::var("TEXT_SERVICE_MODEL").ok(),
            timeout_secs: env::var("TEXT_SERVICE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(20))
    }
}

/// Persistence backend settings. Without a base URL the in-memory
/// session-keyed store is used.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        StoreConfig {
            base_url: env::var("STORE_URL").ok(),
            token: env::var("STORE_TOKEN").ok(),
        }
    }

    pub fn with_credentials(mut self, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self.token = Some(token.into());
        self
    }
}

/// Per-tier generation allowances.
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Square-format cap for anonymous callers.
    pub anonymous_square_cap: u32,
    /// Aggregate cap for authenticated free-tier callers.
    pub free_total_cap: u32,
    /// Monthly aggregate cap for the limited paid tier.
    pub limited_total_cap: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            anonymous_square_cap: 3,
            free_total_cap: 10,
            limited_total_cap: 100,
        }
    }
}

impl LimitsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        LimitsConfig {
            anonymous_square_cap: env_u32("LIMIT_ANONYMOUS_SQUARE", defaults.anonymous_square_cap),
            free_total_cap: env_u32("LIMIT_FREE_TOTAL", defaults.free_total_cap),
            limited_total_cap: env_u32("LIMIT_PAID_TOTAL", defaults.limited_total_cap),
        }
    }

    pub fn with_anonymous_square_cap(mut self, cap: u32) -> Self {
        self.anonymous_square_cap = cap;
        self
    }

    pub fn with_free_total_cap(mut self, cap: u32) -> Self {
        self.free_total_cap = cap;
        self
    }

    pub fn with_limited_total_cap(mut self, cap: u32) -> Self {
        self.limited_total_cap = cap;
        self
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Top-level configuration for a [`StudioClient`](crate::pipeline::StudioClient).
#[derive(Debug, Clone, Default)]
pub struct StudioConfig {
    pub image: ImageServiceConfig,
    pub text: TextServiceConfig,
    pub store: StoreConfig,
    pub limits: LimitsConfig,
}

impl StudioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        StudioConfig {
            image: ImageServiceConfig::from_env(),
            text: TextServiceConfig::from_env(),
            store: StoreConfig::from_env(),
            limits: LimitsConfig::from_env(),
        }
    }

    pub fn with_image(mut self, config: ImageServiceConfig) -> Self {
        self.image = config;
        self
    }

    pub fn with_text(mut self, config: TextServiceConfig) -> Self {
        self.text = config;
        self
    }

    pub fn with_store(mut self, config: StoreConfig) -> Self {
        self.store = config;
        self
    }

    pub fn with_limits(mut self, config: LimitsConfig) -> Self {
        self.limits = config;
        self
    }
}

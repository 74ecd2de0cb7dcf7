use serde::{Deserialize, Serialize};

/// Structured brand signals extracted from a brand's website. Produced once
/// per session by the brand resolver and consumed read-only afterwards.
/// Empty string fields mean the signal was not found on the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandContext {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub h1_text: String,
    pub h2_text: String,
    /// First ~1000 characters of paragraph text.
    pub paragraph_sample: String,
    /// Up to 5 distinct color tokens (hex or rgb/rgba) found in styles.
    pub colors: Vec<String>,
    pub favicon_url: Option<String>,
    pub source_url: String,
}

impl BrandContext {
    /// A short business description usable inside a generation prompt:
    /// meta description when present, otherwise the paragraph sample.
    pub fn business_summary(&self) -> &str {
        if !self.description.trim().is_empty() {
            &self.description
        } else {
            &self.paragraph_sample
        }
    }
}

/// User-owned persistent brand preferences. Created and edited outside the
/// generation core; read-only input here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandSettings {
    pub logo_url: Option<String>,
    /// Up to 3 brand colors.
    pub colors: Vec<String>,
    pub tone: Option<String>,
    pub voice: Option<String>,
}

impl BrandSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logo(mut self, url: impl Into<String>) -> Self {
        self.logo_url = Some(url.into());
        self
    }

    pub fn with_colors(mut self, colors: Vec<String>) -> Self {
        self.colors = colors;
        self.colors.truncate(3);
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }
}

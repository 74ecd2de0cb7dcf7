use crate::error::{Result, StudioError};
use crate::models::{BrandContext, BrandSettings, CallerIdentity, Format};
use serde::{Deserialize, Serialize};

pub const MAX_BULLETS: usize = 3;

/// Everything one batch invocation needs: the creative intent, the requested
/// output formats (order is significant) and the optional enrichment inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub intent: String,
    /// Display label for the batch; also embedded into placeholder assets.
    pub label: Option<String>,
    pub formats: Vec<Format>,
    pub tone: Option<String>,
    pub call_to_action: Option<String>,
    pub offer: Option<String>,
    /// Up to 3 short bullet points; blank ones are dropped at prompt time.
    pub bullets: Vec<String>,
    /// Website to analyze for brand signals before generating.
    pub brand_url: Option<String>,
    /// Pre-resolved brand context; skips resolution when present.
    pub brand_context: Option<BrandContext>,
    pub brand_settings: Option<BrandSettings>,
    pub want_copy: bool,
    pub caller: CallerIdentity,
}

impl GenerationRequest {
    pub fn new(intent: impl Into<String>, formats: Vec<Format>, caller: CallerIdentity) -> Self {
        Self {
            intent: intent.into(),
            label: None,
            formats,
            tone: None,
            call_to_action: None,
            offer: None,
            bullets: Vec::new(),
            brand_url: None,
            brand_context: None,
            brand_settings: None,
            want_copy: false,
            caller,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn with_call_to_action(mut self, cta: impl Into<String>) -> Self {
        self.call_to_action = Some(cta.into());
        self
    }

    pub fn with_offer(mut self, offer: impl Into<String>) -> Self {
        self.offer = Some(offer.into());
        self
    }

    pub fn with_bullets(mut self, bullets: Vec<String>) -> Self {
        self.bullets = bullets;
        self.bullets.truncate(MAX_BULLETS);
        self
    }

    pub fn with_brand_url(mut self, url: impl Into<String>) -> Self {
        self.brand_url = Some(url.into());
        self
    }

    pub fn with_brand_context(mut self, context: BrandContext) -> Self {
        self.brand_context = Some(context);
        self
    }

    pub fn with_brand_settings(mut self, settings: BrandSettings) -> Self {
        self.brand_settings = Some(settings);
        self
    }

    pub fn with_copy(mut self) -> Self {
        self.want_copy = true;
        self
    }

    /// Field-level validation, checked before any outbound call.
    pub fn validate(&self) -> Result<()> {
        if self.intent.trim().is_empty() {
            return Err(StudioError::ValidationError {
                field: "intent",
                message: "must not be empty".to_string(),
            });
        }
        if self.formats.is_empty() {
            return Err(StudioError::ValidationError {
                field: "formats",
                message: "at least one format is required".to_string(),
            });
        }
        Ok(())
    }

    /// Label used for placeholder assets: the explicit label, else the intent.
    pub fn placeholder_label(&self) -> &str {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label,
            _ => &self.intent,
        }
    }

    /// Bullet points that actually carry text, capped at 3.
    pub fn effective_bullets(&self) -> Vec<&str> {
        self.bullets
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .take(MAX_BULLETS)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CallerTier;

    fn caller() -> CallerIdentity {
        CallerIdentity::new("user-1", CallerTier::PaidUnlimited)
    }

    #[test]
    fn validates_intent_and_formats() {
        let ok = GenerationRequest::new("Summer sale", vec![Format::Square], caller());
        assert!(ok.validate().is_ok());

        let err = GenerationRequest::new("   ", vec![Format::Square], caller())
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            StudioError::ValidationError { field: "intent", .. }
        ));

        let err = GenerationRequest::new("Summer sale", vec![], caller())
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            StudioError::ValidationError { field: "formats", .. }
        ));
    }

    #[test]
    fn drops_blank_bullets_and_caps_at_three() {
        let request = GenerationRequest::new("x", vec![Format::Square], caller()).with_bullets(
            vec![
                " free shipping ".to_string(),
                "".to_string(),
                "30-day returns".to_string(),
                "extra".to_string(),
            ],
        );
        assert_eq!(
            request.effective_bullets(),
            vec!["free shipping", "30-day returns"]
        );
    }

    #[test]
    fn placeholder_label_falls_back_to_intent() {
        let request = GenerationRequest::new("Sneaker launch", vec![Format::Square], caller());
        assert_eq!(request.placeholder_label(), "Sneaker launch");
        let request = request.with_label("Spring Drop");
        assert_eq!(request.placeholder_label(), "Spring Drop");
    }
}

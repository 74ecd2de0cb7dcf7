//! Batch orchestration: gate, enrich, generate per format, persist, report.
//!
//! The coordinator favors visible output over hard failure. With valid input
//! and sufficient entitlement a batch always returns one artifact per
//! requested format, real or placeholder, and never propagates a collaborator
//! failure to the caller.

use crate::config::{LimitsConfig, StudioConfig};
use crate::error::{Result, StudioError};
use crate::fallback;
use crate::gate::{self, GateDecision};
use crate::logger;
use crate::models::{
    BatchResult, BrandContext, Format, GeneratedArtifact, GenerationRequest, UsageRecord,
};
use crate::progress::ProgressEstimator;
use crate::services::{
    BrandResolution, BrandResolver, CopyClient, HttpImageService, HttpTextService, ImageService,
    TextService,
};
use crate::storage::{CreativeStore, StoreManager};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(45);
const DEFAULT_TEXT_TIMEOUT: Duration = Duration::from_secs(20);

/// Composite client owning the generation services, the store and the batch
/// coordinator.
pub struct StudioClient {
    image: Arc<dyn ImageService>,
    copy: CopyClient,
    brand: BrandResolver,
    store: StoreManager,
    limits: LimitsConfig,
    progress: ProgressEstimator,
    image_timeout: Duration,
}

impl StudioClient {
    /// Build a client with the HTTP service implementations.
    pub fn new(config: StudioConfig) -> Result<Self> {
        let image = Arc::new(HttpImageService::new(config.image.clone())?);
        let text: Arc<dyn TextService> = Arc::new(HttpTextService::new(config.text.clone())?);

        Ok(Self {
            image,
            copy: CopyClient::new(text, config.text.timeout()),
            brand: BrandResolver::new(),
            store: StoreManager::new(config.store)?,
            limits: config.limits,
            progress: ProgressEstimator::new(),
            image_timeout: config.image.timeout(),
        })
    }

    /// Build a client over custom service implementations. This is the seam
    /// tests and embedders use to supply their own collaborators.
    pub fn with_services(
        image: Arc<dyn ImageService>,
        text: Arc<dyn TextService>,
        store: Arc<dyn CreativeStore>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            image,
            copy: CopyClient::new(text, DEFAULT_TEXT_TIMEOUT),
            brand: BrandResolver::new(),
            store: StoreManager::with_backend(store),
            limits,
            progress: ProgressEstimator::new(),
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
        }
    }

    pub fn with_image_timeout(mut self, timeout: Duration) -> Self {
        self.image_timeout = timeout;
        self
    }

    /// Named aspect-ratio formats with their output dimensions.
    pub fn supported_formats() -> Vec<(String, (u32, u32))> {
        Format::named()
            .iter()
            .map(|f| (f.to_string(), f.dimensions()))
            .collect()
    }

    /// Run one generation batch: entitlement gate, optional brand analysis,
    /// optional ad copy, then one image per requested format in order.
    ///
    /// Only input validation errors and entitlement denials surface as
    /// `Err`; every collaborator failure degrades to a placeholder artifact
    /// or fallback value plus a warning on the result.
    pub async fn run_batch(&self, request: GenerationRequest) -> Result<BatchResult> {
        request.validate()?;
        let _timer = logger::timer("generation batch");

        let usage = match self.store.usage_for(&request.caller.id).await {
            Ok(usage) => usage,
            Err(e) => {
                // A flaky usage backend must not block generation; the gate
                // still enforces format policy.
                log::warn!("Usage read failed for {}: {}", request.caller.id, e);
                UsageRecord::default()
            }
        };

        if let GateDecision::Denied(reason) =
            gate::check(request.caller.tier, &request.formats, &usage, &self.limits)
        {
            log::info!("Batch denied for {}: {}", request.caller.id, reason);
            return Err(StudioError::Denied(reason));
        }

        let mut warnings: Vec<String> = Vec::new();

        let brand_context = self.resolve_brand(&request, &mut warnings).await;

        let copy = if request.want_copy {
            let (copy, warning) = self
                .copy
                .generate_copy(
                    &request.intent,
                    brand_context.as_ref(),
                    request.brand_settings.as_ref(),
                )
                .await;
            warnings.extend(warning);
            Some(copy)
        } else {
            None
        };

        let label = request.placeholder_label().to_string();
        let mut artifacts: Vec<GeneratedArtifact> = Vec::with_capacity(request.formats.len());

        // Formats are processed sequentially and in request order; a failed
        // format never aborts the rest of the batch.
        for format in &request.formats {
            let prompt = build_image_prompt(&request, *format, brand_context.as_ref());
            let handle = self.progress.start();
            let artifact = self.generate_artifact(&prompt, *format, &label).await;

            if artifact.is_fallback {
                handle.stop();
                if let Some(reason) = &artifact.fallback_reason {
                    warnings.push(format!("{} used a placeholder: {}", format, reason));
                }
            } else {
                handle.finish();
                // Fire-and-forget relative to the user-visible result: the
                // artifact is valid and displayable even if it was not saved.
                if let Err(e) = self.store.save(&artifact, &request.caller.id).await {
                    log::warn!("Artifact {} not saved: {}", artifact.id, e);
                }
                if let Err(e) = self
                    .store
                    .record_artifact(&request.caller.id, *format)
                    .await
                {
                    log::warn!("Usage not recorded for {}: {}", request.caller.id, e);
                }
            }

            artifacts.push(artifact);
        }

        let success_count = artifacts.iter().filter(|a| !a.is_fallback).count();
        let failure_count = artifacts.len() - success_count;
        let status = BatchResult::status_for(&artifacts);

        log::info!(
            "Batch finished: {} ok, {} substituted, status {:?}",
            success_count,
            failure_count,
            status
        );

        Ok(BatchResult {
            artifacts,
            success_count,
            failure_count,
            copy,
            status,
            warnings,
        })
    }

    /// Saved creatives for one caller.
    pub async fn list_creatives(&self, owner: &str) -> Result<Vec<GeneratedArtifact>> {
        self.store.list(owner).await
    }

    /// Delete a saved creative; false when the id was unknown.
    pub async fn delete_creative(&self, id: &str) -> Result<bool> {
        self.store.delete(id).await
    }

    async fn resolve_brand(
        &self,
        request: &GenerationRequest,
        warnings: &mut Vec<String>,
    ) -> Option<BrandContext> {
        if let Some(context) = &request.brand_context {
            return Some(context.clone());
        }
        let url = request.brand_url.as_deref()?;

        match self.brand.resolve(url).await {
            BrandResolution::Resolved(context) => Some(context),
            BrandResolution::Unavailable(reason) => {
                log::warn!("Brand analysis unavailable: {}", reason);
                warnings.push(format!("brand analysis skipped: {}", reason));
                None
            }
        }
    }

    /// One image-generation attempt. Every failure branch substitutes a
    /// placeholder; this never returns an error.
    async fn generate_artifact(
        &self,
        prompt: &str,
        format: Format,
        label: &str,
    ) -> GeneratedArtifact {
        let call = self.image.generate(prompt, format.size_bucket());
        match tokio::time::timeout(self.image_timeout, call).await {
            Err(_) => substitute(format, label, "image generation timed out"),
            Ok(Err(e)) => substitute(format, label, &e.to_string()),
            Ok(Ok(url)) if url.trim().is_empty() => substitute(format, label, "no output returned"),
            Ok(Ok(url)) => GeneratedArtifact::generated(format, url),
        }
    }
}

fn substitute(format: Format, label: &str, reason: &str) -> GeneratedArtifact {
    log::warn!("Substituting placeholder for {}: {}", format, reason);
    let asset = fallback::synthesize(format, label);
    GeneratedArtifact::fallback(format, asset.url, reason)
}

/// Assemble the image prompt: base framing for the format class, then tone,
/// call to action, offer, bullet points, brand settings and brand context.
fn build_image_prompt(
    request: &GenerationRequest,
    format: Format,
    brand: Option<&BrandContext>,
) -> String {
    let mut prompt = if format.is_display_size() {
        let (w, h) = format.dimensions();
        format!(
            "Design a professional display-network ad creative sized {}x{} pixels for: {}.",
            w,
            h,
            request.intent.trim()
        )
    } else {
        format!(
            "Design a professional social media ad creative with a {} aspect ratio for: {}.",
            format,
            request.intent.trim()
        )
    };

    if let Some(tone) = request.tone.as_deref().filter(|t| !t.trim().is_empty()) {
        prompt.push_str(&format!(" The tone should be {}.", tone.trim()));
    }
    if let Some(cta) = request
        .call_to_action
        .as_deref()
        .filter(|c| !c.trim().is_empty())
    {
        prompt.push_str(&format!(
            " Feature the call to action \"{}\" prominently.",
            cta.trim()
        ));
    }
    if let Some(offer) = request.offer.as_deref().filter(|o| !o.trim().is_empty()) {
        prompt.push_str(&format!(" Highlight the offer \"{}\".", offer.trim()));
    }

    let bullets = request.effective_bullets();
    if !bullets.is_empty() {
        prompt.push_str(&format!(" Include these selling points: {}.", bullets.join("; ")));
    }

    if let Some(settings) = &request.brand_settings {
        if !settings.colors.is_empty() {
            prompt.push_str(&format!(" Use the brand colors {}.", settings.colors.join(", ")));
        }
        if let Some(tone) = settings.tone.as_deref().filter(|t| !t.trim().is_empty()) {
            prompt.push_str(&format!(" Match the brand's {} tone.", tone.trim()));
        }
        if let Some(voice) = settings.voice.as_deref().filter(|v| !v.trim().is_empty()) {
            prompt.push_str(&format!(" Brand voice: {}.", voice.trim()));
        }
    }

    if let Some(brand) = brand {
        let summary = brand.business_summary().trim();
        if !summary.is_empty() {
            prompt.push_str(&format!(" The business: {}.", summary));
        }
        if !brand.colors.is_empty() {
            prompt.push_str(&format!(
                " Draw from the website color palette: {}.",
                brand.colors.join(", ")
            ));
        }
        if !brand.h1_text.trim().is_empty() {
            prompt.push_str(&format!(" Site messaging: {}.", brand.h1_text.trim()));
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AdCopy, BatchStatus, CallerIdentity, CallerTier, SizeBucket,
    };
    use crate::storage::{ArtifactStore, MemoryStore, UsageStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockImages {
        fail_buckets: Vec<SizeBucket>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockImages {
        fn ok() -> Self {
            Self::failing(vec![])
        }

        fn failing(fail_buckets: Vec<SizeBucket>) -> Self {
            Self {
                fail_buckets,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImageService for MockImages {
        async fn generate(&self, prompt: &str, size: SizeBucket) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail_buckets.contains(&size) {
                Err(StudioError::ResponseError("render pool exhausted".into()))
            } else {
                Ok(format!("https://cdn.example/out-{}.png", n))
            }
        }
    }

    struct StalledImages;

    #[async_trait]
    impl ImageService for StalledImages {
        async fn generate(&self, _prompt: &str, _size: SizeBucket) -> Result<String> {
            std::future::pending().await
        }
    }

    struct MockText(Option<String>);

    #[async_trait]
    impl TextService for MockText {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            match &self.0 {
                Some(text) => Ok(text.clone()),
                None => Err(StudioError::ResponseError("model offline".into())),
            }
        }
    }

    /// MemoryStore wrapper whose artifact writes always fail.
    struct BrokenSaves(MemoryStore);

    #[async_trait]
    impl crate::storage::ArtifactStore for BrokenSaves {
        async fn save(&self, _artifact: &GeneratedArtifact, _owner: &str) -> Result<String> {
            Err(StudioError::StorageError("disk full".into()))
        }
        async fn list(&self, owner: &str) -> Result<Vec<GeneratedArtifact>> {
            self.0.list(owner).await
        }
        async fn delete(&self, id: &str) -> Result<bool> {
            self.0.delete(id).await
        }
    }

    #[async_trait]
    impl crate::storage::UsageStore for BrokenSaves {
        async fn usage_for(&self, owner: &str) -> Result<UsageRecord> {
            self.0.usage_for(owner).await
        }
        async fn record_artifact(&self, owner: &str, format: Format) -> Result<()> {
            self.0.record_artifact(owner, format).await
        }
    }

    fn caller() -> CallerIdentity {
        CallerIdentity::new("acct-1", CallerTier::PaidUnlimited)
    }

    fn client_with(
        image: Arc<MockImages>,
        store: Arc<MemoryStore>,
    ) -> StudioClient {
        StudioClient::with_services(
            image,
            Arc::new(MockText(None)),
            store,
            LimitsConfig::default(),
        )
    }

    #[tokio::test]
    async fn returns_one_artifact_per_format_in_request_order() {
        let image = Arc::new(MockImages::ok());
        let store = Arc::new(MemoryStore::new());
        let client = client_with(image.clone(), store.clone());

        let formats = vec![Format::Story, Format::Square, Format::Pixels(300, 250)];
        let request = GenerationRequest::new("Summer sale for sneakers", formats.clone(), caller());
        let result = client.run_batch(request).await.unwrap();

        assert_eq!(result.artifacts.len(), 3);
        for (artifact, format) in result.artifacts.iter().zip(&formats) {
            assert_eq!(artifact.format, *format);
            assert!(!artifact.is_fallback);
        }
        assert_eq!(result.success_count, 3);
        assert_eq!(result.failure_count, 0);
        assert_eq!(result.status, BatchStatus::Succeeded);

        // Every success was persisted and counted, square metered separately.
        assert_eq!(store.list("acct-1").await.unwrap().len(), 3);
        let usage = store.usage_for("acct-1").await.unwrap();
        assert_eq!(usage.total, 3);
        assert_eq!(usage.square, 1);
    }

    #[tokio::test]
    async fn mixed_failure_keeps_order_and_succeeds() {
        // 16:9 maps to the horizontal bucket; 1:1 and 300x250 to square.
        let image = Arc::new(MockImages::failing(vec![SizeBucket::Horizontal]));
        let store = Arc::new(MemoryStore::new());
        let client = client_with(image, store.clone());

        let request = GenerationRequest::new(
            "Summer sale for sneakers",
            vec![Format::Square, Format::Landscape, Format::Pixels(300, 250)],
            caller(),
        );
        let result = client.run_batch(request).await.unwrap();

        assert_eq!(result.artifacts.len(), 3);
        assert!(!result.artifacts[0].is_fallback);
        assert!(result.artifacts[1].is_fallback);
        assert!(!result.artifacts[2].is_fallback);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 1);
        assert_eq!(result.status, BatchStatus::Succeeded);

        let reason = result.artifacts[1].fallback_reason.as_deref().unwrap();
        assert!(reason.contains("render pool exhausted"));
        assert!(result.warnings.iter().any(|w| w.contains("16:9")));

        // The substituted format was neither saved nor counted.
        assert_eq!(store.list("acct-1").await.unwrap().len(), 2);
        assert_eq!(store.usage_for("acct-1").await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn every_failure_yields_a_placeholder_with_deterministic_dimensions() {
        let image = Arc::new(MockImages::failing(vec![
            SizeBucket::Square,
            SizeBucket::Vertical,
            SizeBucket::Horizontal,
        ]));
        let store = Arc::new(MemoryStore::new());
        let client = client_with(image, store);

        let request = GenerationRequest::new(
            "Summer sale for sneakers",
            vec![Format::Square, Format::Story],
            caller(),
        );
        let result = client.run_batch(request).await.unwrap();

        assert_eq!(result.status, BatchStatus::Degraded);
        assert!(result.artifacts.iter().all(|a| a.is_fallback));
        assert!(result.artifacts[0].url.contains("800x800"));
        assert!(result.artifacts[1].url.contains("720x1280"));
        assert!(result
            .artifacts
            .iter()
            .all(|a| !a.fallback_reason.as_deref().unwrap_or("").is_empty()));
    }

    #[tokio::test]
    async fn timeout_substitutes_a_placeholder() {
        let store = Arc::new(MemoryStore::new());
        let client = StudioClient::with_services(
            Arc::new(StalledImages),
            Arc::new(MockText(None)),
            store,
            LimitsConfig::default(),
        )
        .with_image_timeout(Duration::from_millis(50));

        let request =
            GenerationRequest::new("Summer sale", vec![Format::Square], caller());
        let result = client.run_batch(request).await.unwrap();

        assert!(result.artifacts[0].is_fallback);
        assert!(result.artifacts[0]
            .fallback_reason
            .as_deref()
            .unwrap()
            .contains("timed out"));
    }

    #[tokio::test]
    async fn copy_is_present_even_when_the_text_service_is_down() {
        let image = Arc::new(MockImages::ok());
        let store = Arc::new(MemoryStore::new());
        let client = client_with(image, store);

        let request = GenerationRequest::new(
            "Summer sale for sneakers",
            vec![Format::Square],
            caller(),
        )
        .with_copy();
        let result = client.run_batch(request).await.unwrap();

        assert_eq!(result.copy, Some(AdCopy::fallback()));
        assert!(result.warnings.iter().any(|w| w.contains("fallback")));
        assert_eq!(result.status, BatchStatus::Succeeded);
    }

    #[tokio::test]
    async fn denial_blocks_before_any_generation_call() {
        let image = Arc::new(MockImages::ok());
        let store = Arc::new(MemoryStore::new());
        // Anonymous caller has already produced three square artifacts.
        for _ in 0..3 {
            store.record_artifact("session-9", Format::Square).await.unwrap();
        }
        let client = client_with(image.clone(), store);

        let request = GenerationRequest::new(
            "one more",
            vec![Format::Square],
            CallerIdentity::anonymous("session-9"),
        );
        let err = client.run_batch(request).await.unwrap_err();

        match err {
            StudioError::Denied(reason) => {
                assert!(reason.to_string().contains("square"));
            }
            other => panic!("expected denial, got {}", other),
        }
        assert_eq!(image.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn validation_errors_are_field_level() {
        let client = client_with(Arc::new(MockImages::ok()), Arc::new(MemoryStore::new()));
        let request = GenerationRequest::new("", vec![Format::Square], caller());
        let err = client.run_batch(request).await.unwrap_err();
        assert!(matches!(
            err,
            StudioError::ValidationError { field: "intent", .. }
        ));
    }

    #[tokio::test]
    async fn persistence_failure_does_not_fail_the_batch() {
        let client = StudioClient::with_services(
            Arc::new(MockImages::ok()),
            Arc::new(MockText(None)),
            Arc::new(BrokenSaves(MemoryStore::new())),
            LimitsConfig::default(),
        );

        let request = GenerationRequest::new("sale", vec![Format::Square], caller());
        let result = client.run_batch(request).await.unwrap();

        assert_eq!(result.status, BatchStatus::Succeeded);
        assert!(!result.artifacts[0].is_fallback);
    }

    #[tokio::test]
    async fn unreachable_brand_site_is_a_warning_not_a_failure() {
        let image = Arc::new(MockImages::ok());
        let store = Arc::new(MemoryStore::new());
        let client = client_with(image, store);

        let request = GenerationRequest::new("sale", vec![Format::Square], caller())
            .with_brand_url("::definitely not a url::");
        let result = client.run_batch(request).await.unwrap();

        assert_eq!(result.status, BatchStatus::Succeeded);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("brand analysis skipped")));
    }

    #[tokio::test]
    async fn prompt_carries_the_enrichment_in_order() {
        let image = Arc::new(MockImages::ok());
        let store = Arc::new(MemoryStore::new());
        let client = client_with(image.clone(), store);

        let request = GenerationRequest::new(
            "Summer sale for sneakers",
            vec![Format::Pixels(300, 250)],
            caller(),
        )
        .with_tone("energetic")
        .with_call_to_action("Shop Now")
        .with_offer("20% off this week")
        .with_bullets(vec!["free returns".to_string(), "".to_string()]);

        client.run_batch(request).await.unwrap();

        let prompts = image.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("300x250 pixels"));
        assert!(prompt.contains("energetic"));
        assert!(prompt.contains("\"Shop Now\""));
        assert!(prompt.contains("\"20% off this week\""));
        assert!(prompt.contains("free returns"));

        let cta_at = prompt.find("Shop Now").unwrap();
        let offer_at = prompt.find("20% off").unwrap();
        let tone_at = prompt.find("energetic").unwrap();
        assert!(tone_at < cta_at && cta_at < offer_at);
    }

    #[test]
    fn supported_formats_lists_named_ratios() {
        let formats = StudioClient::supported_formats();
        assert_eq!(formats.len(), 5);
        assert!(formats.contains(&("1:1".to_string(), (800, 800))));
    }
}

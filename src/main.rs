use adforge::{
    CallerIdentity, CallerTier, Format, GenerationRequest, StudioClient, StudioConfig,
};
use base64::Engine;
use futures::StreamExt;
use std::env;
use std::fs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file first
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    adforge::logger::init_with_config(
        adforge::logger::LoggerConfig::development().with_level(adforge::logger::LogLevel::Debug),
    )?;

    log::info!("🔍 Checking service environment...");

    match env::var("IMAGE_SERVICE_URL") {
        Ok(url) => log::info!("IMAGE_SERVICE_URL: {}", url),
        Err(_) => log::warn!("⚠️  IMAGE_SERVICE_URL not set, image generation will fall back to placeholders"),
    }
    match env::var("TEXT_SERVICE_URL") {
        Ok(url) => log::info!("TEXT_SERVICE_URL: {}", url),
        Err(_) => log::warn!("⚠️  TEXT_SERVICE_URL not set, ad copy will use fallback text"),
    }
    if env::var("STORE_URL").is_err() {
        log::info!("STORE_URL not set, using in-memory session store");
    }

    let mut config = StudioConfig::from_env();
    // Unreachable endpoints still produce a usable batch: every failed call
    // is substituted with a placeholder.
    if config.image.endpoint.is_none() {
        config.image = config.image.with_endpoint("http://localhost:9701/v1/images");
    }
    if config.text.endpoint.is_none() {
        config.text = config.text.with_endpoint("http://localhost:9702/v1/chat");
    }

    log::info!("🔄 Creating studio client...");
    let client = match StudioClient::new(config) {
        Ok(client) => {
            log::info!("✅ Studio client initialized successfully");
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize studio client: {}", e);
            return Err(e.into());
        }
    };

    log::info!("📐 Supported ad formats:");
    for (name, (width, height)) in StudioClient::supported_formats() {
        log::info!("  {} -> {}x{}", name, width, height);
    }

    // Standalone look at the progress stream before the real batch.
    log::info!("📊 Sampling the progress stream...");
    let estimator = adforge::ProgressEstimator::new();
    let mut handle = estimator.start();
    if let Some(updates) = handle.updates() {
        let mut stream = updates.take(4);
        while let Some(value) = stream.next().await {
            log::info!("  progress: {:.1}%", value);
        }
    }
    let final_progress = handle.finish();
    log::info!("  progress: {:.1}%", final_progress);

    // One end-to-end batch.
    log::info!("🎨 Running a generation batch...");

    let caller = CallerIdentity::new("demo-account", CallerTier::PaidUnlimited);
    let mut request = GenerationRequest::new(
        "Launch campaign for a hand-roasted coffee subscription",
        vec![Format::Square, Format::Story, Format::Pixels(300, 250)],
        caller,
    )
    .with_label("Roast & Post")
    .with_tone("warm and confident")
    .with_call_to_action("Start Your Subscription")
    .with_offer("First bag free")
    .with_bullets(vec![
        "Freshly roasted weekly".to_string(),
        "Cancel anytime".to_string(),
    ])
    .with_copy();

    if let Ok(brand_url) = env::var("BRAND_URL") {
        log::info!("🌐 Brand analysis enabled for: {}", brand_url);
        request = request.with_brand_url(brand_url);
    }

    let result = match client.run_batch(request).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("❌ Batch failed: {}", e);
            return Err(e.into());
        }
    };

    log::info!(
        "✅ Batch complete: {} generated, {} substituted, status {:?}",
        result.success_count,
        result.failure_count,
        result.status
    );
    for warning in &result.warnings {
        log::warn!("⚠️  {}", warning);
    }

    if let Some(copy) = &result.copy {
        log::info!("📝 Primary text: {}", copy.primary_text);
        for headline in &copy.headlines {
            log::info!("  headline: {}", headline);
        }
        for description in &copy.descriptions {
            log::info!("  description: {}", description);
        }
    }

    for artifact in &result.artifacts {
        log::info!(
            "🖼️  {} -> {} (fallback: {})",
            artifact.format,
            if artifact.url.starts_with("data:") {
                "<inline image data>"
            } else {
                artifact.url.as_str()
            },
            artifact.is_fallback
        );

        // Inline results come back as PNG data URLs; save those to disk.
        if let Some(b64) = artifact.url.strip_prefix("data:image/png;base64,") {
            let filename = format!(
                "creative_{}_{}.png",
                artifact.format.to_string().replace(':', "x"),
                chrono::Utc::now().timestamp()
            );
            match base64::engine::general_purpose::STANDARD.decode(b64) {
                Ok(image_bytes) => match fs::write(&filename, image_bytes) {
                    Ok(_) => log::info!("💾 Image saved to: {}", filename),
                    Err(e) => log::error!("❌ Failed to save image: {}", e),
                },
                Err(e) => log::error!("❌ Failed to decode base64 image: {}", e),
            }
        }
    }

    log::info!("📚 Saved creatives for demo-account:");
    match client.list_creatives("demo-account").await {
        Ok(creatives) => {
            for creative in creatives {
                log::info!("  {} ({})", creative.id, creative.format);
            }
        }
        Err(e) => log::warn!("⚠️  Could not list creatives: {}", e),
    }

    log::info!("🎉 Done");
    Ok(())
}

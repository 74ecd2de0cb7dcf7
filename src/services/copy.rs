use crate::models::{
    AdCopy, BrandContext, BrandSettings, DESCRIPTION_COUNT, DESCRIPTION_MAX, HEADLINE_COUNT,
    HEADLINE_MAX, PRIMARY_TEXT_MAX,
};
use crate::services::traits::TextService;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

const MAX_ATTEMPTS: usize = 2;
const RETRY_DELAY_MS: u64 = 600;

/// Ad-copy generation step. Builds the structured-copy prompt, calls the
/// text service under a timeout with a bounded retry, and parses the first
/// balanced JSON block out of the response. Substitutes the fixed fallback
/// copy on any failure: this step returns copy plus an optional warning and
/// never errors.
pub struct CopyClient {
    service: Arc<dyn TextService>,
    timeout: Duration,
}

impl CopyClient {
    pub fn new(service: Arc<dyn TextService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub async fn generate_copy(
        &self,
        intent: &str,
        brand_context: Option<&BrandContext>,
        brand_settings: Option<&BrandSettings>,
    ) -> (AdCopy, Option<String>) {
        let system = build_system_instruction(brand_settings);
        let user = build_user_instruction(intent, brand_context);

        let mut last_error = String::new();
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(retry_delay()).await;
                log::debug!("Retrying copy generation (attempt {})", attempt + 1);
            }

            match tokio::time::timeout(self.timeout, self.service.complete(&system, &user)).await
            {
                Err(_) => {
                    // A timeout already consumed the step's latency budget;
                    // do not retry it.
                    last_error = "copy generation timed out".to_string();
                    break;
                }
                Ok(Err(e)) => {
                    last_error = e.to_string();
                }
                Ok(Ok(raw)) => match parse_copy(&raw) {
                    Some(copy) => return (copy, None),
                    None => {
                        last_error = "copy response had no parseable structure".to_string();
                    }
                },
            }
        }

        log::warn!("Copy generation fell back: {}", last_error);
        (
            AdCopy::fallback(),
            Some(format!("ad copy used fallback text: {}", last_error)),
        )
    }
}

fn retry_delay() -> Duration {
    let jitter: u64 = rand::thread_rng().gen_range(0..200);
    Duration::from_millis(RETRY_DELAY_MS + jitter)
}

fn build_system_instruction(brand_settings: Option<&BrandSettings>) -> String {
    let mut instruction = String::from(
        "You are a senior performance-marketing copywriter. \
         Write concise, high-converting ad copy.",
    );

    if let Some(settings) = brand_settings {
        if let Some(voice) = settings.voice.as_deref().filter(|v| !v.trim().is_empty()) {
            instruction.push_str(&format!(" Write in this brand voice: {}.", voice.trim()));
        }
        if let Some(tone) = settings.tone.as_deref().filter(|t| !t.trim().is_empty()) {
            instruction.push_str(&format!(" Keep a {} tone.", tone.trim()));
        }
    }

    instruction.push_str(&format!(
        " Produce exactly 1 primary text (at most {} characters), \
         {} headlines (at most {} characters each) and \
         {} descriptions (at most {} characters each). \
         Respond with only a JSON object of the form \
         {{\"primary_text\": string, \"headlines\": [string], \"descriptions\": [string]}} \
         and nothing else.",
        PRIMARY_TEXT_MAX, HEADLINE_COUNT, HEADLINE_MAX, DESCRIPTION_COUNT, DESCRIPTION_MAX
    ));
    instruction
}

fn build_user_instruction(intent: &str, brand_context: Option<&BrandContext>) -> String {
    let mut instruction = format!("Write ad copy for: {}", intent.trim());

    if let Some(context) = brand_context {
        let summary = context.business_summary().trim();
        if !summary.is_empty() {
            instruction.push_str(&format!("\nAbout the business: {}", summary));
        }
        if !context.keywords.trim().is_empty() {
            instruction.push_str(&format!("\nBrand keywords: {}", context.keywords.trim()));
        }
        if !context.h1_text.trim().is_empty() {
            instruction.push_str(&format!(
                "\nKey messaging from their site: {}",
                context.h1_text.trim()
            ));
        }
    }

    instruction
}

/// Two-stage parse: locate the first balanced `{...}` region in free-form
/// model output, then strict-parse it and normalize the shape. `None` routes
/// the caller to the fixed fallback.
fn parse_copy(raw: &str) -> Option<AdCopy> {
    let block = extract_json_block(raw)?;
    let copy: AdCopy = serde_json::from_str(block).ok()?;
    if copy.headlines.is_empty() {
        return None;
    }
    Some(copy.normalized())
}

/// Find the first syntactically-complete `{...}` block, tolerating string
/// literals that contain braces.
fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

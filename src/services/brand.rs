use crate::models::BrandContext;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const PARAGRAPH_SAMPLE_CHARS: usize = 1000;
const MAX_COLORS: usize = 5;

/// Outcome of brand resolution. Unavailability is a soft failure: callers
/// proceed without enrichment.
#[derive(Debug, Clone)]
pub enum BrandResolution {
    Resolved(BrandContext),
    Unavailable(String),
}

/// Fetches a brand's website once and extracts structured signals for
/// prompt enrichment. Every extraction failure is absorbed: once the page
/// was fetched, partial (even empty) fields are acceptable.
pub struct BrandResolver {
    client: Client,
}

impl BrandResolver {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!("adforge/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    pub async fn resolve(&self, url: &str) -> BrandResolution {
        let parsed = match validate_url(url) {
            Ok(parsed) => parsed,
            Err(reason) => return BrandResolution::Unavailable(reason),
        };

        log::info!("Analyzing brand site: {}", parsed);

        // Single attempt, no retry.
        let response = match self.client.get(parsed.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                return BrandResolution::Unavailable(format!("site fetch failed: {}", e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return BrandResolution::Unavailable(format!(
                "site returned HTTP {}",
                status.as_u16()
            ));
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                return BrandResolution::Unavailable(format!("site body unreadable: {}", e));
            }
        };

        BrandResolution::Resolved(extract_brand_context(&html, &parsed))
    }
}

impl Default for BrandResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Syntax check only; no network call is made for a malformed URL.
fn validate_url(url: &str) -> std::result::Result<Url, String> {
    let parsed = Url::parse(url.trim()).map_err(|e| format!("invalid URL: {}", e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(format!("unsupported URL scheme '{}'", other)),
    }
}

static TAG_BLOCK_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["script", "style", "noscript", "iframe"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}>")).expect("static regex")
        })
        .collect()
});

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("static regex"));
static H1_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("static regex"));
static H2_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h2[^>]*>(.*?)</h2>").expect("static regex"));
static P_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("static regex"));
static META_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("static regex"));
static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("static regex"));
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)([a-z-]+)\s*=\s*["']([^"']*)["']"#).expect("static regex")
});
static INNER_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static STYLE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>(.*?)</style>").expect("static regex"));
static STYLE_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)style\s*=\s*["']([^"']*)["']"#).expect("static regex"));
static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#(?:[0-9a-fA-F]{8}|[0-9a-fA-F]{6}|[0-9a-fA-F]{3,4})\b").expect("static regex")
});
static RGB_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)rgba?\([^)]*\)").expect("static regex"));

pub(crate) fn extract_brand_context(html: &str, base: &Url) -> BrandContext {
    // Colors come from style attributes and <style> blocks, so collect them
    // before the non-content stripping removes style elements.
    let colors = extract_colors(html);
    let favicon_url = extract_favicon(html, base);
    let description = meta_content(html, "description");
    let keywords = meta_content(html, "keywords");

    let mut content = html.to_string();
    for re in TAG_BLOCK_RES.iter() {
        content = re.replace_all(&content, " ").into_owned();
    }

    let title = TITLE_RE
        .captures(&content)
        .map(|c| clean_text(&c[1]))
        .unwrap_or_default();
    let h1_text = joined_captures(&H1_RE, &content);
    let h2_text = joined_captures(&H2_RE, &content);

    let mut paragraph_sample = String::new();
    for capture in P_RE.captures_iter(&content) {
        let text = clean_text(&capture[1]);
        if text.is_empty() {
            continue;
        }
        if !paragraph_sample.is_empty() {
            paragraph_sample.push(' ');
        }
        paragraph_sample.push_str(&text);
        if paragraph_sample.chars().count() >= PARAGRAPH_SAMPLE_CHARS {
            paragraph_sample = paragraph_sample
                .chars()
                .take(PARAGRAPH_SAMPLE_CHARS)
                .collect();
            break;
        }
    }

    BrandContext {
        title,
        description,
        keywords,
        h1_text,
        h2_text,
        paragraph_sample,
        colors,
        favicon_url,
        source_url: base.to_string(),
    }
}

fn joined_captures(re: &Regex, content: &str) -> String {
    re.captures_iter(content)
        .map(|c| clean_text(&c[1]))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip inner markup, decode the common entities and collapse whitespace.
fn clean_text(fragment: &str) -> String {
    let text = INNER_TAG_RE.replace_all(fragment, " ");
    let text = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content of `<meta name="..." content="...">`, tolerating any attribute
/// order.
fn meta_content(html: &str, name: &str) -> String {
    for tag in META_RE.find_iter(html) {
        let mut tag_name = None;
        let mut content = None;
        for attr in ATTR_RE.captures_iter(tag.as_str()) {
            match attr[1].to_ascii_lowercase().as_str() {
                "name" | "property" => tag_name = Some(attr[2].to_ascii_lowercase()),
                "content" => content = Some(attr[2].to_string()),
                _ => {}
            }
        }
        if tag_name.as_deref() == Some(name) {
            if let Some(content) = content {
                return clean_text(&content);
            }
        }
    }
    String::new()
}

/// Up to 5 distinct color-like tokens from inline styles and `<style>`
/// blocks, in document order.
fn extract_colors(html: &str) -> Vec<String> {
    let mut style_text = String::new();
    for capture in STYLE_BLOCK_RE.captures_iter(html) {
        style_text.push_str(&capture[1]);
        style_text.push(' ');
    }
    for capture in STYLE_ATTR_RE.captures_iter(html) {
        style_text.push_str(&capture[1]);
        style_text.push(' ');
    }

    let mut colors: Vec<String> = Vec::new();
    let mut push = |token: String| {
        if colors.len() < MAX_COLORS && !colors.contains(&token) {
            colors.push(token);
        }
    };
    for m in HEX_COLOR_RE.find_iter(&style_text) {
        push(m.as_str().to_ascii_lowercase());
    }
    for m in RGB_COLOR_RE.find_iter(&style_text) {
        push(m.as_str().to_ascii_lowercase().replace(' ', ""));
    }
    colors
}

/// Favicon href resolved to an absolute URL against the page.
fn extract_favicon(html: &str, base: &Url) -> Option<String> {
    for tag in LINK_RE.find_iter(html) {
        let mut rel = None;
        let mut href = None;
        for attr in ATTR_RE.captures_iter(tag.as_str()) {
            match attr[1].to_ascii_lowercase().as_str() {
                "rel" => rel = Some(attr[2].to_ascii_lowercase()),
                "href" => href = Some(attr[2].to_string()),
                _ => {}
            }
        }
        if rel.map_or(false, |r| r.contains("icon")) {
            if let Some(href) = href {
                if let Ok(resolved) = base.join(&href) {
                    return Some(resolved.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html><head>
        <title>Acme &amp; Co</title>
        <meta content="Handmade goods since 1984" name="description">
        <meta name="keywords" content="handmade, leather, goods">
        <link rel="shortcut icon" href="/static/favicon.ico">
        <style>.hero { background: #FF8800; color: rgb(12, 34, 56); }</style>
        </head><body>
        <script>var accent = "#deadbe";</script>
        <h1>Crafted to <em>last</em></h1>
        <h2>Our story</h2><h2>Our promise</h2>
        <div style="border-color: #ff8800; background: #123456"></div>
        <p>Every item is cut and stitched by hand.</p>
        <p>Free shipping worldwide.</p>
        <noscript><p>Enable JavaScript</p></noscript>
        </body></html>"##;

    fn base() -> Url {
        Url::parse("https://acme.example/shop/").unwrap()
    }

    #[test]
    fn rejects_bad_urls_without_fetching() {
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("ftp://acme.example").is_err());
        assert!(validate_url("https://acme.example").is_ok());
    }

    #[test]
    fn extracts_head_signals() {
        let context = extract_brand_context(PAGE, &base());
        assert_eq!(context.title, "Acme & Co");
        assert_eq!(context.description, "Handmade goods since 1984");
        assert_eq!(context.keywords, "handmade, leather, goods");
        assert_eq!(
            context.favicon_url.as_deref(),
            Some("https://acme.example/static/favicon.ico")
        );
    }

    #[test]
    fn extracts_heading_and_paragraph_text() {
        let context = extract_brand_context(PAGE, &base());
        assert_eq!(context.h1_text, "Crafted to last");
        assert_eq!(context.h2_text, "Our story Our promise");
        assert!(context
            .paragraph_sample
            .starts_with("Every item is cut and stitched by hand."));
        assert!(context.paragraph_sample.contains("Free shipping"));
        // Content inside noscript must not leak into the sample.
        assert!(!context.paragraph_sample.contains("Enable JavaScript"));
    }

    #[test]
    fn collects_distinct_colors_from_styles_only() {
        let context = extract_brand_context(PAGE, &base());
        assert_eq!(
            context.colors,
            vec!["#ff8800", "#123456", "rgb(12,34,56)"]
        );
        // Script content is not a style source.
        assert!(!context.colors.contains(&"#deadbe".to_string()));
    }

    #[test]
    fn caps_colors_at_five() {
        let html: String = (0..8)
            .map(|i| format!(r#"<div style="color: #11223{}"></div>"#, i))
            .collect();
        let context = extract_brand_context(&html, &base());
        assert_eq!(context.colors.len(), 5);
    }

    #[test]
    fn missing_signals_become_empty_fields() {
        let context = extract_brand_context("<html><body>hi</body></html>", &base());
        assert!(context.title.is_empty());
        assert!(context.description.is_empty());
        assert!(context.colors.is_empty());
        assert!(context.favicon_url.is_none());
        assert_eq!(context.source_url, "https://acme.example/shop/");
    }

    #[tokio::test]
    async fn invalid_url_is_a_soft_failure() {
        let resolver = BrandResolver::new();
        match resolver.resolve("::not-a-url::").await {
            BrandResolution::Unavailable(reason) => {
                assert!(reason.contains("invalid URL"));
            }
            BrandResolution::Resolved(_) => panic!("expected soft failure"),
        }
    }
}

use serde::{Deserialize, Serialize};

pub const PRIMARY_TEXT_MAX: usize = 125;
pub const HEADLINE_MAX: usize = 30;
pub const DESCRIPTION_MAX: usize = 30;
pub const HEADLINE_COUNT: usize = 5;
pub const DESCRIPTION_COUNT: usize = 2;

/// Structured ad copy. Always present after the copy step — either produced
/// by the text service or the fixed fallback; never absent downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdCopy {
    /// Primary text, at most 125 characters.
    #[serde(alias = "primaryText", alias = "primary")]
    pub primary_text: String,
    /// Exactly 5 headlines, each at most 30 characters.
    pub headlines: Vec<String>,
    /// Exactly 2 descriptions, each at most 30 characters.
    pub descriptions: Vec<String>,
}

const FALLBACK_HEADLINES: [&str; HEADLINE_COUNT] = [
    "Discover Something New",
    "Quality You Can Trust",
    "Limited Time Offer",
    "Shop the Collection",
    "Don't Miss Out",
];

const FALLBACK_DESCRIPTIONS: [&str; DESCRIPTION_COUNT] = ["Learn more today.", "Get started now."];

impl AdCopy {
    /// The fixed structural fallback used when the text service fails,
    /// times out, or returns something unparseable.
    pub fn fallback() -> Self {
        Self {
            primary_text: "Find out what makes us different. Great products, made for you."
                .to_string(),
            headlines: FALLBACK_HEADLINES.iter().map(|s| s.to_string()).collect(),
            descriptions: FALLBACK_DESCRIPTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Enforce the structural constraints: clamp field lengths, drop blank
    /// entries and pad or truncate to exactly 5 headlines / 2 descriptions.
    pub fn normalized(mut self) -> Self {
        self.primary_text = truncate_chars(self.primary_text.trim(), PRIMARY_TEXT_MAX);
        if self.primary_text.is_empty() {
            self.primary_text = Self::fallback().primary_text;
        }

        self.headlines = normalize_list(self.headlines, HEADLINE_MAX, &FALLBACK_HEADLINES);
        self.descriptions =
            normalize_list(self.descriptions, DESCRIPTION_MAX, &FALLBACK_DESCRIPTIONS);
        self
    }
}

fn normalize_list(values: Vec<String>, max_len: usize, pad_from: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = values
        .into_iter()
        .map(|v| truncate_chars(v.trim(), max_len))
        .filter(|v| !v.is_empty())
        .collect();

    for filler in pad_from {
        if out.len() >= pad_from.len() {
            break;
        }
        if !out.iter().any(|v| v == filler) {
            out.push(filler.to_string());
        }
    }
    out.truncate(pad_from.len());
    out
}

/// Truncate to at most `max` characters on a char boundary.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}

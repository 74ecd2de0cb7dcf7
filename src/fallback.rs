//! Placeholder asset synthesis.
//!
//! When a real image-generation call fails or is unavailable, the pipeline
//! substitutes a deterministic placeholder so a batch can never terminate
//! without something to show the caller.

use crate::models::Format;

const LABEL_MAX_CHARS: usize = 48;
const DEFAULT_LABEL: &str = "Ad Creative";
const PLACEHOLDER_HOST: &str = "https://placehold.co";

/// Descriptor for a synthesized stand-in asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderAsset {
    pub width: u32,
    pub height: u32,
    pub label: String,
    pub url: String,
}

/// Produce a placeholder descriptor for the given format and label text.
/// Pure: no I/O, no failure mode, identical inputs yield identical output.
pub fn synthesize(format: Format, label: &str) -> PlaceholderAsset {
    let (width, height) = format.dimensions();
    let label = sanitize_label(label);
    let url = format!(
        "{}/{}x{}/png?text={}",
        PLACEHOLDER_HOST,
        width,
        height,
        label.replace(' ', "+")
    );

    PlaceholderAsset {
        width,
        height,
        label,
        url,
    }
}

/// Keep only characters safe to embed in a placeholder URL and cap the
/// length. Runs of dropped characters collapse to a single space.
fn sanitize_label(label: &str) -> String {
    let mut out = String::new();
    let mut last_was_space = true;
    for c in label.chars() {
        if c.is_alphanumeric() {
            out.push(c);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
        if out.chars().count() >= LABEL_MAX_CHARS {
            break;
        }
    }

    let out = out.trim().to_string();
    if out.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        out
    }
}

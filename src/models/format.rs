use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A requested output shape: a named aspect ratio or explicit pixel
/// dimensions parsed from a `"WxH"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Format {
    /// 1:1 — feed square, the only format available to metered tiers.
    Square,
    /// 4:5 — portrait feed.
    Portrait,
    /// 9:16 — story / vertical video cover.
    Story,
    /// 16:9 — landscape.
    Landscape,
    /// 1.91:1 — link preview banner.
    LinkPreview,
    /// Explicit display-network pixel dimensions, e.g. 300x250.
    Pixels(u32, u32),
}

/// Image-service-supported output sizes. The service has no arbitrary-size
/// support, so every [`Format`] maps to the nearest bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBucket {
    Square,
    Vertical,
    Horizontal,
}

impl SizeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeBucket::Square => "1024x1024",
            SizeBucket::Vertical => "1024x1792",
            SizeBucket::Horizontal => "1792x1024",
        }
    }
}

const MAX_PIXEL_DIMENSION: u32 = 4096;

impl Format {
    /// Deterministic pixel dimensions for this format. Named ratios use the
    /// standard creative sizes; pixel formats are their own dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Format::Square => (800, 800),
            Format::Portrait => (800, 1000),
            Format::Story => (720, 1280),
            Format::Landscape => (1280, 720),
            Format::LinkPreview => (1200, 628),
            Format::Pixels(w, h) => (*w, *h),
        }
    }

    /// Nearest image-service size bucket. Pixel-dimension formats always map
    /// to the square bucket.
    pub fn size_bucket(&self) -> SizeBucket {
        match self {
            Format::Square | Format::Portrait | Format::Pixels(_, _) => SizeBucket::Square,
            Format::Story => SizeBucket::Vertical,
            Format::Landscape | Format::LinkPreview => SizeBucket::Horizontal,
        }
    }

    /// Whether this is the metered 1:1 format.
    pub fn is_square(&self) -> bool {
        matches!(self, Format::Square)
    }

    /// Whether this format targets display-network placements (explicit
    /// pixel dimensions) rather than social aspect ratios.
    pub fn is_display_size(&self) -> bool {
        matches!(self, Format::Pixels(_, _))
    }

    /// All named aspect-ratio formats.
    pub fn named() -> &'static [Format] {
        &[
            Format::Square,
            Format::Portrait,
            Format::Story,
            Format::Landscape,
            Format::LinkPreview,
        ]
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Square => write!(f, "1:1"),
            Format::Portrait => write!(f, "4:5"),
            Format::Story => write!(f, "9:16"),
            Format::Landscape => write!(f, "16:9"),
            Format::LinkPreview => write!(f, "1.91:1"),
            Format::Pixels(w, h) => write!(f, "{}x{}", w, h),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "1:1" => return Ok(Format::Square),
            "4:5" => return Ok(Format::Portrait),
            "9:16" => return Ok(Format::Story),
            "16:9" => return Ok(Format::Landscape),
            "1.91:1" => return Ok(Format::LinkPreview),
            _ => {}
        }

        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("unrecognized format '{}'", s))?;
        let w: u32 = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid width in '{}'", s))?;
        let h: u32 = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid height in '{}'", s))?;

        if w == 0 || h == 0 {
            return Err(format!("zero dimension in '{}'", s));
        }
        if w > MAX_PIXEL_DIMENSION || h > MAX_PIXEL_DIMENSION {
            return Err(format!(
                "dimensions in '{}' exceed {}px",
                s, MAX_PIXEL_DIMENSION
            ));
        }

        Ok(Format::Pixels(w, h))
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.to_string()
    }
}

impl TryFrom<String> for Format {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_ratios() {
        assert_eq!("1:1".parse::<Format>().unwrap(), Format::Square);
        assert_eq!("9:16".parse::<Format>().unwrap(), Format::Story);
        assert_eq!("1.91:1".parse::<Format>().unwrap(), Format::LinkPreview);
    }

    #[test]
    fn parses_pixel_dimensions() {
        assert_eq!("300x250".parse::<Format>().unwrap(), Format::Pixels(300, 250));
        assert_eq!("728X90".parse::<Format>().unwrap(), Format::Pixels(728, 90));
    }

    #[test]
    fn rejects_malformed_formats() {
        assert!("".parse::<Format>().is_err());
        assert!("3:2".parse::<Format>().is_err());
        assert!("300x".parse::<Format>().is_err());
        assert!("0x250".parse::<Format>().is_err());
        assert!("99999x10".parse::<Format>().is_err());
    }

    #[test]
    fn dimensions_are_deterministic() {
        assert_eq!(Format::Square.dimensions(), (800, 800));
        assert_eq!(Format::Story.dimensions(), (720, 1280));
        assert_eq!(Format::LinkPreview.dimensions(), (1200, 628));
        assert_eq!(Format::Pixels(300, 250).dimensions(), (300, 250));
    }

    #[test]
    fn pixel_formats_bucket_to_square() {
        assert_eq!(Format::Pixels(300, 250).size_bucket(), SizeBucket::Square);
        assert_eq!(Format::Pixels(160, 600).size_bucket(), SizeBucket::Square);
        assert_eq!(Format::Story.size_bucket(), SizeBucket::Vertical);
        assert_eq!(Format::Landscape.size_bucket(), SizeBucket::Horizontal);
    }

    #[test]
    fn round_trips_through_display() {
        for format in Format::named() {
            assert_eq!(format.to_string().parse::<Format>().unwrap(), *format);
        }
    }
}

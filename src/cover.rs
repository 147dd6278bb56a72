//! Core data model: image formats, candidates, selection requests

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source trust ranking, lower = more trusted
pub type SourceQuality = u8;

/// Recognized cover image formats
///
/// An image whose format cannot be recognized is never represented; it is
/// a terminal failure for that candidate during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
}

impl CoverImageFormat {
    /// Canonical file extension
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }

    /// Parse from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Guess the format from a URL's path extension, ignoring query strings
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = path.rsplit('.').next()?;
        Self::from_extension(ext)
    }
}

impl fmt::Display for CoverImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A cover art option as reported by one source, before resolution
///
/// Immutable once produced by the orchestrator: sources fill in the
/// descriptive fields, the orchestrator assigns `discovery_index` when it
/// flattens all source results into one batch.
#[derive(Debug, Clone)]
pub struct RawCandidate {
    /// Download URLs, first preferred; later entries are fallbacks
    pub urls: Vec<String>,
    /// Optional small preview URL
    pub thumbnail_url: Option<String>,
    /// Pixel size declared by the source, if any
    pub declared_size: Option<(u32, u32)>,
    /// Total byte size declared by the source, if any
    pub declared_byte_size: Option<u64>,
    /// Format implied by the source (usually from the URL extension)
    pub declared_format: Option<CoverImageFormat>,
    /// Originating source name
    pub source_name: &'static str,
    /// Source trust ranking, lower = more trusted
    pub source_quality: SourceQuality,
    /// Stable position in the flattened batch, assigned at creation time
    /// (source registration order, then within-source order) so downstream
    /// tie-breaks are deterministic regardless of resolution completion
    /// order
    pub discovery_index: usize,
}

/// A candidate with confirmed format and dimensions
///
/// Invariant: `width > 0 && height > 0`. Candidates that cannot be
/// resolved are dropped during resolution, never carried downstream.
#[derive(Debug, Clone)]
pub struct ResolvedCandidate {
    /// Download URLs, first preferred
    pub urls: Vec<String>,
    /// Optional small preview URL
    pub thumbnail_url: Option<String>,
    /// Measured (or trusted-declared) image format
    pub format: CoverImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Total byte size if known (declared or from Content-Length)
    pub byte_size: Option<u64>,
    /// Originating source name
    pub source_name: &'static str,
    /// Source trust ranking, lower = more trusted
    pub source_quality: SourceQuality,
    /// Stable discovery position inherited from the raw candidate
    pub discovery_index: usize,
    /// True when format/dimensions were taken from source-declared
    /// metadata without byte-level verification
    pub declared_size_trusted: bool,
}

impl ResolvedCandidate {
    /// Total pixel count
    pub fn pixel_area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Aspect ratio deviation from 1:1 as `|w - h| / max(w, h)`
    ///
    /// 0.0 is a perfect square, values approach 1.0 for extreme ratios.
    pub fn squareness(&self) -> f64 {
        let max = self.width.max(self.height);
        if max == 0 {
            return 0.0;
        }
        f64::from(self.width.abs_diff(self.height)) / f64::from(max)
    }

    /// Exact 1:1 aspect ratio
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

/// Immutable input to one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRequest {
    /// Album or release title
    pub album: String,
    /// Artist name
    pub artist: String,
    /// Format the caller wants to end up with
    pub target_format: CoverImageFormat,
    /// Minimum acceptable dimension in pixels (applies to both axes)
    pub min_size: Option<u32>,
    /// Maximum acceptable dimension in pixels (applies to both axes)
    pub max_size: Option<u32>,
    /// Demote non-square candidates below every square one, regardless
    /// of how they score on the other ranking tiers
    pub require_square: bool,
}

impl SelectionRequest {
    pub fn new(
        album: impl Into<String>,
        artist: impl Into<String>,
        target_format: CoverImageFormat,
    ) -> Self {
        Self {
            album: album.into(),
            artist: artist.into(),
            target_format,
            min_size: None,
            max_size: None,
            require_square: false,
        }
    }

    /// Reject malformed requests before any network work begins
    pub fn validate(&self) -> Result<(), Error> {
        if self.album.trim().is_empty() {
            return Err(Error::InvalidRequest("empty album title".to_string()));
        }
        if self.artist.trim().is_empty() {
            return Err(Error::InvalidRequest("empty artist name".to_string()));
        }
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(Error::InvalidRequest(format!(
                    "min size {min} exceeds max size {max}"
                )));
            }
        }
        Ok(())
    }
}

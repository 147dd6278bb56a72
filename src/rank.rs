//! Candidate ranking
//!
//! Orders the deduplicated batch best-first by a strict tier sequence:
//! format acceptability, size compliance, squareness, pixel area, source
//! trust. Each tier only breaks ties left by the previous one, so a huge
//! non-square image never beats a correctly square smaller one, and
//! source trust never overrides a format mismatch. When the request
//! demands square art, every non-square candidate sinks below every
//! square one before any of those tiers apply.
//!
//! The sort is stable: candidates tied on every tier keep their relative
//! order from the deduplicator's output.

use crate::cover::{ResolvedCandidate, SelectionRequest};

/// Fixed-point scale for squareness so the key stays totally ordered
const SQUARENESS_SCALE: f64 = 10_000.0;

/// Derived ordering key, a pure function of one candidate and the active
/// request constraints; computed for sorting and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComparisonKey {
    /// 1 when the request demands square and the candidate is not;
    /// violators rank below every compliant candidate no matter how
    /// they score on the remaining tiers
    square_violation: u8,
    /// 0 = requested format, 1 = convertible other format
    format_rank: u8,
    /// 0 = within requested min/max bounds, 1 = outside
    bounds_rank: u8,
    /// Pixel distance back to the nearest bound, 0 when in bounds
    bounds_distance: u64,
    /// Aspect deviation from 1:1, fixed-point; smaller is squarer
    squareness: u32,
    /// Inverted pixel area so larger images order first
    area_inverted: u64,
    /// Source trust, lower = more trusted
    source_quality: u8,
}

impl ComparisonKey {
    pub fn new(candidate: &ResolvedCandidate, request: &SelectionRequest) -> Self {
        let format_rank = u8::from(candidate.format != request.target_format);
        let bounds_distance = bounds_distance(candidate, request);
        let squareness =
            (candidate.squareness() * SQUARENESS_SCALE).round() as u32;

        Self {
            square_violation: u8::from(request.require_square && !candidate.is_square()),
            format_rank,
            bounds_rank: u8::from(bounds_distance > 0),
            bounds_distance,
            squareness,
            area_inverted: u64::MAX - candidate.pixel_area(),
            source_quality: candidate.source_quality,
        }
    }
}

/// Total pixel shortfall/excess relative to the requested bounds,
/// summed over both axes; zero when the candidate is in bounds
fn bounds_distance(candidate: &ResolvedCandidate, request: &SelectionRequest) -> u64 {
    let mut distance = 0u64;
    if let Some(min) = request.min_size {
        distance += u64::from(min.saturating_sub(candidate.width));
        distance += u64::from(min.saturating_sub(candidate.height));
    }
    if let Some(max) = request.max_size {
        distance += u64::from(candidate.width.saturating_sub(max));
        distance += u64::from(candidate.height.saturating_sub(max));
    }
    distance
}

/// Order candidates best-first under the request's constraints
pub fn rank(
    mut candidates: Vec<ResolvedCandidate>,
    request: &SelectionRequest,
) -> Vec<ResolvedCandidate> {
    candidates.sort_by_cached_key(|c| ComparisonKey::new(c, request));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::CoverImageFormat;

    fn candidate(
        source: &'static str,
        quality: u8,
        width: u32,
        height: u32,
        format: CoverImageFormat,
    ) -> ResolvedCandidate {
        ResolvedCandidate {
            urls: vec![format!("http://{source}.example/cover.{}", format.extension())],
            thumbnail_url: None,
            format,
            width,
            height,
            byte_size: None,
            source_name: source,
            source_quality: quality,
            discovery_index: 0,
            declared_size_trusted: false,
        }
    }

    fn png_request() -> SelectionRequest {
        SelectionRequest::new("Master of Puppets", "Metallica", CoverImageFormat::Png)
    }

    #[test]
    fn test_target_format_beats_source_trust() {
        // The JPEG comes from a more trusted source and has more pixels,
        // but format acceptability is the top tier
        let ranked = rank(
            vec![
                candidate("jpeg_src", 0, 1200, 800, CoverImageFormat::Jpeg),
                candidate("png_src", 1, 600, 600, CoverImageFormat::Png),
            ],
            &png_request(),
        );
        assert_eq!(ranked[0].format, CoverImageFormat::Png);
        assert_eq!(ranked[1].format, CoverImageFormat::Jpeg);
    }

    #[test]
    fn test_in_bounds_beats_out_of_bounds() {
        let mut request = png_request();
        request.min_size = Some(500);
        request.max_size = Some(1000);
        let ranked = rank(
            vec![
                candidate("huge", 0, 2000, 2000, CoverImageFormat::Png),
                candidate("fits", 0, 600, 600, CoverImageFormat::Png),
                candidate("tiny", 0, 100, 100, CoverImageFormat::Png),
            ],
            &request,
        );
        assert_eq!(ranked[0].source_name, "fits");
        // Among out-of-bounds, closer to the bounds ranks higher:
        // huge is 2*1000 px over, tiny is 2*400 px under
        assert_eq!(ranked[1].source_name, "tiny");
        assert_eq!(ranked[2].source_name, "huge");
    }

    #[test]
    fn test_square_beats_larger_non_square() {
        let ranked = rank(
            vec![
                candidate("wide", 0, 2000, 1000, CoverImageFormat::Png),
                candidate("square", 0, 500, 500, CoverImageFormat::Png),
            ],
            &png_request(),
        );
        assert_eq!(ranked[0].source_name, "square");
    }

    #[test]
    fn test_area_breaks_squareness_tie() {
        let ranked = rank(
            vec![
                candidate("small", 0, 500, 500, CoverImageFormat::Png),
                candidate("large", 0, 1000, 1000, CoverImageFormat::Png),
            ],
            &png_request(),
        );
        assert_eq!(ranked[0].source_name, "large");
    }

    #[test]
    fn test_source_quality_is_last_tier() {
        let ranked = rank(
            vec![
                candidate("less_trusted", 3, 600, 600, CoverImageFormat::Png),
                candidate("trusted", 0, 600, 600, CoverImageFormat::Png),
            ],
            &png_request(),
        );
        assert_eq!(ranked[0].source_name, "trusted");
    }

    #[test]
    fn test_require_square_exiles_non_square() {
        let mut request = png_request();
        request.require_square = true;
        let ranked = rank(
            vec![
                candidate("near_square", 0, 1000, 990, CoverImageFormat::Png),
                candidate("square", 2, 300, 300, CoverImageFormat::Png),
            ],
            &request,
        );
        assert_eq!(ranked[0].source_name, "square");
    }

    #[test]
    fn test_require_square_overrides_every_other_tier() {
        // The non-square candidate wins every other tier: requested
        // format, inside the size bounds, more pixels, better source.
        // With square art demanded it still sinks below the square
        // out-of-bounds one.
        let mut request = png_request();
        request.require_square = true;
        request.min_size = Some(500);
        let ranked = rank(
            vec![
                candidate("nonsquare_inbounds", 0, 600, 550, CoverImageFormat::Png),
                candidate("square_undersized", 2, 300, 300, CoverImageFormat::Jpeg),
            ],
            &request,
        );
        assert_eq!(ranked[0].source_name, "square_undersized");
        assert_eq!(ranked[1].source_name, "nonsquare_inbounds");
    }

    #[test]
    fn test_stability_on_full_tie() {
        let ranked = rank(
            vec![
                candidate("first", 1, 600, 600, CoverImageFormat::Png),
                candidate("second", 1, 600, 600, CoverImageFormat::Png),
            ],
            &png_request(),
        );
        assert_eq!(ranked[0].source_name, "first");
        assert_eq!(ranked[1].source_name, "second");
    }
}

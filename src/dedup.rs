//! Candidate deduplication
//!
//! Different sources routinely hand back the same underlying image under
//! different URLs. Identity is a cheap heuristic rather than content
//! hashing: two candidates with identical measured dimensions are
//! treated as the same image. The policy constant below documents that
//! the match is exact; any looser tolerance would be an extension.

use crate::cover::ResolvedCandidate;
use std::collections::HashMap;
use tracing::debug;

/// Maximum per-axis pixel difference for two candidates to be merged.
/// Zero: only exact dimension matches are duplicates.
pub const DIMENSION_TOLERANCE: u32 = 0;

/// Merge candidates that are the same underlying image
///
/// Within each duplicate group, keeps the candidate with the best
/// (lowest) source quality; ties fall to the larger declared byte size
/// (assumed higher fidelity encode), then to the earliest discovery
/// index. Output preserves first-seen order. Deterministic for any
/// arrival order because candidates carry stable discovery indices.
pub fn dedupe(mut candidates: Vec<ResolvedCandidate>) -> Vec<ResolvedCandidate> {
    // Normalize arrival order so "first seen" means discovery order
    candidates.sort_by_key(|c| c.discovery_index);

    let before = candidates.len();
    let mut by_dimensions: HashMap<(u32, u32), usize> = HashMap::new();
    let mut kept: Vec<ResolvedCandidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match by_dimensions.entry((candidate.width, candidate.height)) {
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(candidate);
            }
            std::collections::hash_map::Entry::Occupied(slot) => {
                let current = &mut kept[*slot.get()];
                if prefer_challenger(current, &candidate) {
                    debug!(
                        width = candidate.width,
                        height = candidate.height,
                        kept = candidate.source_name,
                        dropped = current.source_name,
                        "Merged duplicate candidates"
                    );
                    *current = candidate;
                }
            }
        }
    }

    if kept.len() < before {
        debug!(before, after = kept.len(), "Deduplicated candidate batch");
    }
    kept
}

/// True when the later-seen `challenger` should replace the `incumbent`
fn prefer_challenger(incumbent: &ResolvedCandidate, challenger: &ResolvedCandidate) -> bool {
    if challenger.source_quality != incumbent.source_quality {
        return challenger.source_quality < incumbent.source_quality;
    }
    // Unknown byte size loses to any known one
    challenger.byte_size.unwrap_or(0) > incumbent.byte_size.unwrap_or(0)
    // Equal on both counts: incumbent stays, first seen wins
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
        byte_size: Option<u64>,
        discovery_index: usize,
    ) -> ResolvedCandidate {
        ResolvedCandidate {
            urls: vec![format!("http://{source}.example/{width}x{height}.jpg")],
            thumbnail_url: None,
            format: CoverImageFormat::Jpeg,
            width,
            height,
            byte_size,
            source_name: source,
            source_quality: quality,
            discovery_index,
            declared_size_trusted: false,
        }
    }

    #[test]
    fn test_lower_weight_wins() {
        let merged = dedupe(vec![
            candidate("lastfm", 2, 600, 600, None, 0),
            candidate("itunes", 0, 600, 600, None, 1),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source_name, "itunes");
    }

    #[test]
    fn test_byte_size_breaks_weight_tie() {
        let merged = dedupe(vec![
            candidate("a", 1, 600, 600, Some(80_000), 0),
            candidate("b", 1, 600, 600, Some(200_000), 1),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source_name, "b");
    }

    #[test]
    fn test_first_seen_breaks_full_tie() {
        let merged = dedupe(vec![
            candidate("a", 1, 600, 600, None, 0),
            candidate("b", 1, 600, 600, None, 1),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source_name, "a");
    }

    #[test]
    fn test_different_dimensions_not_merged() {
        let merged = dedupe(vec![
            candidate("a", 0, 600, 600, None, 0),
            candidate("a", 0, 601, 600, None, 1),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_deterministic_for_any_arrival_order() {
        let forward = dedupe(vec![
            candidate("a", 1, 600, 600, None, 0),
            candidate("b", 1, 600, 600, None, 1),
            candidate("c", 0, 500, 500, None, 2),
        ]);
        let shuffled = dedupe(vec![
            candidate("c", 0, 500, 500, None, 2),
            candidate("b", 1, 600, 600, None, 1),
            candidate("a", 1, 600, 600, None, 0),
        ]);
        let names = |v: &[ResolvedCandidate]| {
            v.iter().map(|c| c.source_name).collect::<Vec<_>>()
        };
        assert_eq!(names(&forward), names(&shuffled));
        assert_eq!(names(&forward), vec!["a", "c"]);
    }

    #[test]
    fn test_output_preserves_first_seen_order() {
        let merged = dedupe(vec![
            candidate("a", 0, 300, 300, None, 0),
            candidate("b", 0, 600, 600, None, 1),
            candidate("c", 0, 300, 300, None, 2),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].width, 300);
        assert_eq!(merged[1].width, 600);
    }
}

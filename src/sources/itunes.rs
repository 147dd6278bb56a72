//! iTunes Search API cover source
//!
//! Album search via the keyless iTunes Search API. Artwork URLs come
//! back as 100x100 thumbnails; the CDN serves larger renditions when the
//! size segment of the URL is rewritten, which is what every candidate
//! here relies on.

use super::{build_http_client, CoverSource};
use crate::cover::{CoverImageFormat, RawCandidate, SourceQuality};
use crate::error::SourceError;
use serde::Deserialize;
use std::time::Duration;

const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";
const RESULT_LIMIT: u32 = 10;

/// Artwork sizes requested by rewriting the thumbnail URL
const ARTWORK_SIZES: [u32; 2] = [600, 1200];

/// iTunes search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<AlbumResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlbumResult {
    #[serde(default)]
    artwork_url_60: Option<String>,
    #[serde(default)]
    artwork_url_100: Option<String>,
}

/// iTunes Search API client
pub struct ItunesSource {
    http_client: reqwest::Client,
}

impl ItunesSource {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            http_client: build_http_client(Duration::from_secs(30))?,
        })
    }
}

#[async_trait::async_trait]
impl CoverSource for ItunesSource {
    fn name(&self) -> &'static str {
        "iTunes"
    }

    fn quality(&self) -> SourceQuality {
        0
    }

    async fn search(&self, album: &str, artist: &str) -> Result<Vec<RawCandidate>, SourceError> {
        let term = format!("{artist} {album}");
        let limit = RESULT_LIMIT.to_string();
        tracing::debug!(term = %term, "Querying iTunes Search API");

        let response = self
            .http_client
            .get(ITUNES_SEARCH_URL)
            .query(&[
                ("media", "music"),
                ("entity", "album"),
                ("limit", limit.as_str()),
                ("term", term.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(status.as_u16(), body));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let mut candidates = Vec::new();
        for result in &parsed.results {
            let Some(base) = result.artwork_url_100.as_deref() else {
                continue;
            };
            for size in ARTWORK_SIZES {
                let Some(url) = rewrite_artwork_url(base, size) else {
                    continue;
                };
                candidates.push(RawCandidate {
                    declared_format: CoverImageFormat::from_url(&url),
                    urls: vec![url],
                    thumbnail_url: result.artwork_url_60.clone(),
                    declared_size: Some((size, size)),
                    declared_byte_size: None,
                    source_name: self.name(),
                    source_quality: self.quality(),
                    discovery_index: 0,
                });
            }
        }

        tracing::info!(
            term = %term,
            albums = parsed.results.len(),
            candidates = candidates.len(),
            "iTunes search complete"
        );
        Ok(candidates)
    }
}

/// Rewrite the `100x100bb` segment of an artwork URL to another square
/// rendition; the CDN scales on demand
fn rewrite_artwork_url(url: &str, size: u32) -> Option<String> {
    if !url.contains("100x100") {
        return None;
    }
    Some(url.replace("100x100", &format!("{size}x{size}")))
}

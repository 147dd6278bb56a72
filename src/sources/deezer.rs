//! Deezer album search cover source
//!
//! Keyless JSON API. Each album hit carries four square cover
//! renditions with known sizes, so candidates from this source arrive
//! with declared dimensions.

use super::{build_http_client, CoverSource};
use crate::cover::{CoverImageFormat, RawCandidate, SourceQuality};
use crate::error::SourceError;
use serde::Deserialize;
use std::time::Duration;

const DEEZER_SEARCH_URL: &str = "https://api.deezer.com/search/album";
const RESULT_LIMIT: usize = 5;

/// Deezer search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Vec<AlbumResult>,
}

#[derive(Debug, Deserialize)]
struct AlbumResult {
    #[serde(default)]
    cover_small: Option<String>,
    #[serde(default)]
    cover_medium: Option<String>,
    #[serde(default)]
    cover_big: Option<String>,
    #[serde(default)]
    cover_xl: Option<String>,
}

impl AlbumResult {
    /// Cover renditions largest-first with their fixed pixel sizes
    fn renditions(&self) -> impl Iterator<Item = (&str, u32)> {
        [
            (self.cover_xl.as_deref(), 1000),
            (self.cover_big.as_deref(), 500),
            (self.cover_medium.as_deref(), 250),
        ]
        .into_iter()
        .filter_map(|(url, size)| url.map(|u| (u, size)))
    }
}

/// Deezer album search client
pub struct DeezerSource {
    http_client: reqwest::Client,
}

impl DeezerSource {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            http_client: build_http_client(Duration::from_secs(30))?,
        })
    }
}

#[async_trait::async_trait]
impl CoverSource for DeezerSource {
    fn name(&self) -> &'static str {
        "Deezer"
    }

    fn quality(&self) -> SourceQuality {
        1
    }

    async fn search(&self, album: &str, artist: &str) -> Result<Vec<RawCandidate>, SourceError> {
        let query = format!("artist:\"{artist}\" album:\"{album}\"");
        tracing::debug!(query = %query, "Querying Deezer album search");

        let response = self
            .http_client
            .get(DEEZER_SEARCH_URL)
            .query(&[("q", query.as_str())])
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
        for result in parsed.data.iter().take(RESULT_LIMIT) {
            for (url, size) in result.renditions() {
                candidates.push(RawCandidate {
                    declared_format: CoverImageFormat::from_url(url),
                    urls: vec![url.to_string()],
                    thumbnail_url: result.cover_small.clone(),
                    declared_size: Some((size, size)),
                    declared_byte_size: None,
                    source_name: self.name(),
                    source_quality: self.quality(),
                    discovery_index: 0,
                });
            }
        }

        tracing::info!(
            query = %query,
            albums = parsed.data.len(),
            candidates = candidates.len(),
            "Deezer search complete"
        );
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "data": [{
                "title": "Vespertine",
                "cover_small": "https://cdn/56x56.jpg",
                "cover_medium": "https://cdn/250x250.jpg",
                "cover_big": "https://cdn/500x500.jpg",
                "cover_xl": "https://cdn/1000x1000.jpg"
            }],
            "total": 1
        }"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.len(), 1);

        let renditions: Vec<_> = parsed.data[0].renditions().collect();
        assert_eq!(renditions.len(), 3);
        // Largest first
        assert_eq!(renditions[0].1, 1000);
        assert!(renditions[0].0.contains("1000x1000"));
    }

    #[test]
    fn test_missing_renditions_skipped() {
        let body = r#"{"data": [{"title": "X", "cover_big": "https://cdn/500x500.jpg"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let renditions: Vec<_> = parsed.data[0].renditions().collect();
        assert_eq!(renditions, vec![("https://cdn/500x500.jpg", 500)]);
    }

    #[test]
    fn test_client_creation() {
        assert!(DeezerSource::new().is_ok());
    }
}

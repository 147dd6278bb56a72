//! Cover art sources
//!
//! Each source queries one external search service and reports raw
//! candidate descriptors. Sources are independent: a failing source
//! contributes zero candidates and never aborts the batch.

pub mod deezer;
pub mod itunes;

pub use deezer::DeezerSource;
pub use itunes::ItunesSource;

use crate::cover::{RawCandidate, SourceQuality};
use crate::error::SourceError;

const USER_AGENT: &str = concat!("coverscout/", env!("CARGO_PKG_VERSION"));

/// A cover art search service
///
/// Implementations perform one search call per pipeline run and map the
/// service's response into `RawCandidate`s. `discovery_index` on the
/// produced candidates is left at zero; the orchestrator assigns stable
/// indices when it flattens all source results.
#[async_trait::async_trait]
pub trait CoverSource: Send + Sync {
    /// Source name for provenance and logging
    fn name(&self) -> &'static str;

    /// Trust ranking for candidates from this source, lower = more trusted
    fn quality(&self) -> SourceQuality;

    /// Search for cover art for the given album and artist
    async fn search(&self, album: &str, artist: &str) -> Result<Vec<RawCandidate>, SourceError>;
}

/// Build the reqwest client shared by the bundled connectors
pub(crate) fn build_http_client(timeout: std::time::Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::Network(e.to_string()))
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::cover::CoverImageFormat;
    use std::time::Duration;

    /// Source returning a fixed candidate list
    pub struct StaticSource {
        pub name: &'static str,
        pub quality: SourceQuality,
        pub candidates: Vec<RawCandidate>,
    }

    impl StaticSource {
        pub fn new(
            name: &'static str,
            quality: SourceQuality,
            candidates: Vec<RawCandidate>,
        ) -> Self {
            Self {
                name,
                quality,
                candidates,
            }
        }
    }

    #[async_trait::async_trait]
    impl CoverSource for StaticSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn quality(&self) -> SourceQuality {
            self.quality
        }

        async fn search(
            &self,
            _album: &str,
            _artist: &str,
        ) -> Result<Vec<RawCandidate>, SourceError> {
            Ok(self.candidates.clone())
        }
    }

    /// Source that always fails
    pub struct FailingSource;

    #[async_trait::async_trait]
    impl CoverSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn quality(&self) -> SourceQuality {
            9
        }

        async fn search(
            &self,
            _album: &str,
            _artist: &str,
        ) -> Result<Vec<RawCandidate>, SourceError> {
            Err(SourceError::Api(500, "mock outage".to_string()))
        }
    }

    /// Source that never answers, for deadline tests
    pub struct HangingSource;

    #[async_trait::async_trait]
    impl CoverSource for HangingSource {
        fn name(&self) -> &'static str {
            "hanging"
        }

        fn quality(&self) -> SourceQuality {
            9
        }

        async fn search(
            &self,
            _album: &str,
            _artist: &str,
        ) -> Result<Vec<RawCandidate>, SourceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    /// Candidate with declared metadata, resolvable without network I/O
    pub fn declared_candidate(
        name: &'static str,
        quality: SourceQuality,
        width: u32,
        height: u32,
        format: CoverImageFormat,
    ) -> RawCandidate {
        RawCandidate {
            urls: vec![format!(
                "http://mock.invalid/{name}/{width}x{height}.{}",
                format.extension()
            )],
            thumbnail_url: None,
            declared_size: Some((width, height)),
            declared_byte_size: None,
            declared_format: Some(format),
            source_name: name,
            source_quality: quality,
            discovery_index: 0,
        }
    }
}

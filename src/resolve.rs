//! Candidate resolution
//!
//! Turns a raw candidate descriptor into a fully measured one, either by
//! trusting source-declared metadata or by streaming just enough bytes
//! through the sniffer. A candidate that cannot be resolved is silently
//! dropped; resolution failures are never fatal to the batch and a
//! failed candidate is never retried.

use crate::cover::{RawCandidate, ResolvedCandidate};
use crate::error::Error;
use crate::sniff::{MetadataSniffer, SniffedImage};
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

/// Which candidate properties must be confirmed from real bytes
///
/// When a property is not required and the source already declared it,
/// resolution short-circuits without any network access.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RequiredChecks {
    /// Image format must be sniffed, not trusted
    pub format: bool,
    /// Pixel dimensions must be sniffed, not trusted
    pub dimensions: bool,
}

impl RequiredChecks {
    /// Verify everything from real bytes
    pub const ALL: Self = Self {
        format: true,
        dimensions: true,
    };

    /// Trust whatever the source declared
    pub const NONE: Self = Self {
        format: false,
        dimensions: false,
    };
}

impl Default for RequiredChecks {
    fn default() -> Self {
        Self::ALL
    }
}

/// Resolves raw candidates by metadata trust or streamed sniffing
pub struct CandidateResolver {
    http_client: reqwest::Client,
    sniff_cap: usize,
}

impl CandidateResolver {
    pub fn new(sniff_cap: usize) -> Result<Self, Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("coverscout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http_client,
            sniff_cap,
        })
    }

    /// Resolve one candidate
    ///
    /// `None` means the candidate is unusable (sniff failure, network
    /// error, zero dimensions); the caller simply omits it from the
    /// batch.
    pub async fn resolve(
        &self,
        raw: RawCandidate,
        checks: RequiredChecks,
    ) -> Option<ResolvedCandidate> {
        let sniff_needed = checks.format
            || checks.dimensions
            || raw.declared_format.is_none()
            || raw.declared_size.is_none();

        if !sniff_needed {
            // Declared metadata covers everything the caller requires
            let (width, height) = raw.declared_size?;
            if width == 0 || height == 0 {
                return None;
            }
            return Some(ResolvedCandidate {
                format: raw.declared_format?,
                width,
                height,
                byte_size: raw.declared_byte_size,
                declared_size_trusted: true,
                urls: raw.urls,
                thumbnail_url: raw.thumbnail_url,
                source_name: raw.source_name,
                source_quality: raw.source_quality,
                discovery_index: raw.discovery_index,
            });
        }

        // Try each URL in preference order; first conclusive sniff wins
        for url in &raw.urls {
            match self.sniff_url(url).await {
                Ok((img, content_length)) => {
                    return Some(ResolvedCandidate {
                        format: img.format,
                        width: img.width,
                        height: img.height,
                        byte_size: raw.declared_byte_size.or(content_length),
                        declared_size_trusted: false,
                        urls: raw.urls.clone(),
                        thumbnail_url: raw.thumbnail_url.clone(),
                        source_name: raw.source_name,
                        source_quality: raw.source_quality,
                        discovery_index: raw.discovery_index,
                    });
                }
                Err(reason) => {
                    debug!(
                        url = %url,
                        source = raw.source_name,
                        reason = %reason,
                        "Candidate sniff failed, discarding"
                    );
                }
            }
        }
        None
    }

    /// Stream the URL through the sniffer, stopping at the first
    /// conclusion; dropping the response early releases the connection
    async fn sniff_url(&self, url: &str) -> Result<(SniffedImage, Option<u64>), String> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let content_length = response.content_length();
        let mut sniffer = MetadataSniffer::with_cap(self.sniff_cap);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            match sniffer.push(&chunk) {
                Ok(Some(img)) => {
                    debug!(
                        url = %url,
                        bytes = sniffer.bytes_buffered(),
                        format = %img.format,
                        width = img.width,
                        height = img.height,
                        "Sniffed image metadata"
                    );
                    return Ok((img, content_length));
                }
                Ok(None) => {}
                Err(e) => return Err(e.to_string()),
            }
        }
        Err(sniffer.finish().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::CoverImageFormat;

    fn declared_raw() -> RawCandidate {
        RawCandidate {
            urls: vec!["http://unreachable.invalid/cover.jpg".to_string()],
            thumbnail_url: None,
            declared_size: Some((600, 600)),
            declared_byte_size: Some(150_000),
            declared_format: Some(CoverImageFormat::Jpeg),
            source_name: "test",
            source_quality: 1,
            discovery_index: 3,
        }
    }

    #[tokio::test]
    async fn test_short_circuit_without_network() {
        // The URL host is unreachable; success proves no I/O happened
        let resolver = CandidateResolver::new(1024).unwrap();
        let resolved = resolver
            .resolve(declared_raw(), RequiredChecks::NONE)
            .await
            .expect("declared metadata should resolve without I/O");

        assert!(resolved.declared_size_trusted);
        assert_eq!(resolved.format, CoverImageFormat::Jpeg);
        assert_eq!((resolved.width, resolved.height), (600, 600));
        assert_eq!(resolved.byte_size, Some(150_000));
        assert_eq!(resolved.discovery_index, 3);
    }

    #[tokio::test]
    async fn test_zero_declared_dimensions_discarded() {
        let resolver = CandidateResolver::new(1024).unwrap();
        let mut raw = declared_raw();
        raw.declared_size = Some((0, 600));
        assert!(resolver.resolve(raw, RequiredChecks::NONE).await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_url_discarded() {
        let resolver = CandidateResolver::new(1024).unwrap();
        let mut raw = declared_raw();
        raw.declared_size = None; // force a sniff against a dead host
        assert!(resolver.resolve(raw, RequiredChecks::NONE).await.is_none());
    }
}

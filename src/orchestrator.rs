//! Multi-source query orchestration
//!
//! Fans one search out to every configured source concurrently, then
//! resolves the flattened candidate batch with bounded concurrency.
//! Failure isolation throughout: a failing or timed-out source
//! contributes zero candidates, a failing resolution drops one
//! candidate, and the global deadline cancels whatever is still pending
//! while keeping everything already resolved.

use crate::config::PipelineConfig;
use crate::cover::{RawCandidate, ResolvedCandidate, SelectionRequest};
use crate::error::Error;
use crate::resolve::CandidateResolver;
use crate::sources::CoverSource;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs source fan-out and bounded candidate resolution
pub struct SourceQueryOrchestrator {
    sources: Vec<Arc<dyn CoverSource>>,
    resolver: CandidateResolver,
    config: PipelineConfig,
}

impl SourceQueryOrchestrator {
    pub fn new(sources: Vec<Arc<dyn CoverSource>>, config: PipelineConfig) -> Result<Self, Error> {
        let resolver = CandidateResolver::new(config.sniff_cap_bytes)?;
        Ok(Self {
            sources,
            resolver,
            config,
        })
    }

    /// Query all sources and resolve their candidates
    ///
    /// Output order carries no ranking meaning; candidates are returned
    /// in discovery order so downstream tie-breaks are deterministic.
    /// Returns within the configured global deadline plus a small
    /// scheduling overhead, with whatever resolved in time.
    pub async fn query(&self, request: &SelectionRequest) -> Vec<ResolvedCandidate> {
        let cancel = CancellationToken::new();
        let deadline = self.config.global_deadline();
        {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    () = tokio::time::sleep(deadline) => token.cancel(),
                    () = token.cancelled() => {}
                }
            });
        }

        let raw = self.fan_out(request, &cancel).await;
        debug!(candidates = raw.len(), "Flattened raw candidates from all sources");

        let checks = self.config.required_checks;
        let resolution_timeout = self.config.resolution_timeout();
        let mut resolved: Vec<ResolvedCandidate> = stream::iter(raw)
            .map(|candidate| {
                let resolver = &self.resolver;
                async move {
                    match timeout(resolution_timeout, resolver.resolve(candidate, checks)).await {
                        Ok(result) => result,
                        Err(_) => {
                            debug!("Candidate resolution timed out, discarding");
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.config.max_parallel_resolutions.max(1))
            .take_until(cancel.clone().cancelled_owned())
            .filter_map(|result| async move { result })
            .collect()
            .await;

        // Stop the deadline timer task
        cancel.cancel();

        // Completion order is arbitrary; restore discovery order
        resolved.sort_by_key(|c| c.discovery_index);
        resolved
    }

    /// One concurrent search per source, each independently failing or
    /// timing out without affecting the others
    async fn fan_out(
        &self,
        request: &SelectionRequest,
        cancel: &CancellationToken,
    ) -> Vec<RawCandidate> {
        let source_timeout = self.config.source_timeout();
        let searches = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            let album = request.album.clone();
            let artist = request.artist.clone();
            let cancel = cancel.clone();
            async move {
                let name = source.name();
                let search = timeout(source_timeout, source.search(&album, &artist));
                let outcome = tokio::select! {
                    result = search => result,
                    () = cancel.cancelled() => {
                        warn!(source = name, "Global deadline hit during source search");
                        return Vec::new();
                    }
                };
                match outcome {
                    Ok(Ok(candidates)) => {
                        debug!(source = name, count = candidates.len(), "Source search complete");
                        candidates
                    }
                    Ok(Err(e)) => {
                        warn!(source = name, error = %e, "Source search failed, contributing zero candidates");
                        Vec::new()
                    }
                    Err(_) => {
                        warn!(source = name, "Source search timed out");
                        Vec::new()
                    }
                }
            }
        });

        // Flatten in source registration order and assign stable
        // discovery indices at creation time, not resolution time
        let mut flat = Vec::new();
        for candidates in join_all(searches).await {
            for mut candidate in candidates {
                candidate.discovery_index = flat.len();
                flat.push(candidate);
            }
        }
        flat
    }
}

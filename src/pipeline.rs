//! Selection pipeline
//!
//! Composes orchestration, deduplication and ranking into the single
//! entry point callers use. Degraded conditions (sources down, deadline
//! hit) yield a shorter result list, never an error; only a malformed
//! request is surfaced as a hard failure.

use crate::config::PipelineConfig;
use crate::cover::{ResolvedCandidate, SelectionRequest};
use crate::dedup;
use crate::error::Result;
use crate::orchestrator::SourceQueryOrchestrator;
use crate::rank;
use crate::sources::CoverSource;
use std::sync::Arc;
use tracing::info;

/// End-to-end cover art selection
pub struct SelectionPipeline {
    orchestrator: SourceQueryOrchestrator,
}

impl SelectionPipeline {
    pub fn new(sources: Vec<Arc<dyn CoverSource>>, config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            orchestrator: SourceQueryOrchestrator::new(sources, config)?,
        })
    }

    /// Run one selection: query every source, resolve, dedupe, rank
    ///
    /// Returns candidates best-first. An empty list means nothing
    /// usable was found in time.
    ///
    /// # Errors
    /// `Error::InvalidRequest` when the request fails validation;
    /// everything below that degrades to fewer candidates instead.
    pub async fn select(&self, request: &SelectionRequest) -> Result<Vec<ResolvedCandidate>> {
        request.validate()?;

        let resolved = self.orchestrator.query(request).await;
        let deduped = dedup::dedupe(resolved);
        let ranked = rank::rank(deduped, request);

        info!(
            album = %request.album,
            artist = %request.artist,
            candidates = ranked.len(),
            best = ranked
                .first()
                .and_then(|c| c.urls.first())
                .map_or("none", String::as_str),
            "Cover art selection complete"
        );
        Ok(ranked)
    }
}

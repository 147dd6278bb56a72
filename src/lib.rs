//! coverscout - multi-source album cover art discovery engine
//!
//! Queries several independent cover art services concurrently, determines
//! each candidate image's true format and dimensions from a small byte
//! prefix (no full downloads), merges near-identical candidates found
//! through different services, and returns a best-first ordered list.
//!
//! The caller picks the winner from the ranked list and downloads its full
//! bytes; transport for that final download, re-encoding and persistence
//! are out of scope here.
//!
//! # Pipeline
//! ```text
//! sources (fan-out) -> resolver (sniff) -> dedup -> rank
//! ```
//!
//! # Example
//! ```rust,ignore
//! use coverscout::{
//!     CoverImageFormat, PipelineConfig, SelectionPipeline, SelectionRequest,
//!     sources::{DeezerSource, ItunesSource},
//! };
//! use std::sync::Arc;
//!
//! let pipeline = SelectionPipeline::new(
//!     vec![Arc::new(ItunesSource::new()?), Arc::new(DeezerSource::new()?)],
//!     PipelineConfig::default(),
//! )?;
//! let request = SelectionRequest::new("Master of Puppets", "Metallica", CoverImageFormat::Png);
//! let ranked = pipeline.select(&request).await?;
//! if let Some(best) = ranked.first() {
//!     println!("{} {}x{} from {}", best.format, best.width, best.height, best.source_name);
//! }
//! ```

pub mod config;
pub mod cover;
pub mod dedup;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod rank;
pub mod resolve;
pub mod sniff;
pub mod sources;

pub use crate::config::PipelineConfig;
pub use crate::cover::{
    CoverImageFormat, RawCandidate, ResolvedCandidate, SelectionRequest, SourceQuality,
};
pub use crate::error::{Error, SniffError, SourceError};
pub use crate::pipeline::SelectionPipeline;
pub use crate::resolve::RequiredChecks;
pub use crate::sources::CoverSource;

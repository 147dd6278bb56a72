//! Pipeline tunables
//!
//! All timeouts are per-unit: one source query, one candidate
//! resolution, one whole pipeline call. Defaults are generous enough for
//! slow CDNs while keeping the global deadline the binding bound.

use crate::resolve::RequiredChecks;
use serde::Deserialize;
use std::time::Duration;

/// Configuration for one `SelectionPipeline`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Timeout for one source's search call, in milliseconds
    pub source_timeout_ms: u64,
    /// Timeout for one candidate's resolution, in milliseconds
    pub resolution_timeout_ms: u64,
    /// Deadline for the whole pipeline call, in milliseconds; on expiry
    /// the pipeline returns whatever resolved in time
    pub global_deadline_ms: u64,
    /// Maximum simultaneous in-flight candidate resolutions
    pub max_parallel_resolutions: usize,
    /// Hard cap on bytes buffered while sniffing one candidate
    pub sniff_cap_bytes: usize,
    /// Which candidate properties must be confirmed from real bytes
    /// rather than trusted from source-declared metadata
    pub required_checks: RequiredChecks,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: 10_000,
            resolution_timeout_ms: 10_000,
            global_deadline_ms: 30_000,
            max_parallel_resolutions: 8,
            sniff_cap_bytes: crate::sniff::DEFAULT_SNIFF_CAP,
            required_checks: RequiredChecks::ALL,
        }
    }
}

impl PipelineConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    pub fn resolution_timeout(&self) -> Duration {
        Duration::from_millis(self.resolution_timeout_ms)
    }

    pub fn global_deadline(&self) -> Duration {
        Duration::from_millis(self.global_deadline_ms)
    }
}

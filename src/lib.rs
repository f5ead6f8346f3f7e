// src/lib.rs
// Public library surface for integration tests and the `fuse` binary.

pub mod allocator;
pub mod batch;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod quality;
pub mod result;
pub mod sanitize;
pub mod scorers;
pub mod source;

// ---- Re-exports for stable public API ----
pub use crate::allocator::{AllocationResult, DynamicWeightAllocator, WeightAllocation};
pub use crate::config::FusionConfig;
pub use crate::engine::{FusionEngine, FusionInput};
pub use crate::quality::{Grade, QualityAssessment, QualityAssessor, SourceSample};
pub use crate::result::{FusionResult, SentimentLabel};
pub use crate::source::{
    CategoryCounts, Event, EventKind, MlTradingSignal, NewsSummary, ProfessionalSummary, Relevance,
    SocialSummary, SourceKind,
};

use std::sync::Arc;
use tracing::info;

/// Build an engine from the default config locations
/// (`$FUSION_CONFIG_PATH` → `config/fusion.toml` → `config/fusion.json` → built-ins).
pub fn engine_from_env() -> anyhow::Result<FusionEngine> {
    let cfg = config::load_default()?;
    info!(
        target: "fusion",
        min_multiplier = cfg.multiplier.min,
        max_multiplier = cfg.multiplier.max,
        "fusion engine ready"
    );
    Ok(FusionEngine::new(Arc::new(cfg)))
}

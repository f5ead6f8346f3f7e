//! Sub-scorers turning a source's raw summary into one scalar sentiment.
//!
//! All three are pure functions; the engine calls them once per fusion.

pub mod event_impact;
pub mod momentum;
pub mod volume;

pub use event_impact::EventImpactScorer;
pub use momentum::momentum_score;
pub use volume::volume_weighted_score;

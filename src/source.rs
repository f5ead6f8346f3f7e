//! # Sources
//! The seven fixed sentiment contributors and the per-source summaries that
//! upstream collaborators hand to the engine.
//!
//! Every summary is optional at the call site: `None` means "source not
//! available this cycle" and is never an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed set of fusion sources. Serialized as the stable snake_case keys
/// consumed by persistence and dashboards (`news`, `professional_api`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    News,
    Social,
    ProfessionalApi,
    Events,
    Volume,
    Momentum,
    MlTrading,
}

impl SourceKind {
    pub const ALL: [SourceKind; 7] = [
        SourceKind::News,
        SourceKind::Social,
        SourceKind::ProfessionalApi,
        SourceKind::Events,
        SourceKind::Volume,
        SourceKind::Momentum,
        SourceKind::MlTrading,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::News => "news",
            SourceKind::Social => "social",
            SourceKind::ProfessionalApi => "professional_api",
            SourceKind::Events => "events",
            SourceKind::Volume => "volume",
            SourceKind::Momentum => "momentum",
            SourceKind::MlTrading => "ml_trading",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positive/neutral/negative histogram of classified samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryCounts {
    #[serde(default)]
    pub positive: i64,
    #[serde(default)]
    pub neutral: i64,
    #[serde(default)]
    pub negative: i64,
}

impl CategoryCounts {
    pub fn new(positive: i64, neutral: i64, negative: i64) -> Self {
        Self {
            positive,
            neutral,
            negative,
        }
    }
}

/// Aggregated independent news-text sentiment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsSummary {
    pub sample_count: i64,
    pub average_sentiment: f64,
    /// Number of independent scoring methods that contributed (lexicon, transformer, ...).
    #[serde(default)]
    pub method_diversity: i64,
    /// Informational only; the quality assessor uses the confidence passed by the caller.
    #[serde(default)]
    pub classifier_confidence: Option<f64>,
    #[serde(default)]
    pub categories: CategoryCounts,
}

/// Aggregated social-forum sentiment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialSummary {
    pub sample_count: i64,
    pub average_sentiment: f64,
}

/// Professional news-sentiment API reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalSummary {
    pub sentiment_score: f64,
    /// Number of articles behind the score, when the provider reports it.
    #[serde(default)]
    pub article_count: Option<i64>,
}

/// Short-term ML trading model output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MlTradingSignal {
    pub score: f64,
}

/// Kinds of detected corporate events. Each one has a configured
/// `(base_impact, daily_decay_rate)` profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Earnings,
    Guidance,
    MergerAcquisition,
    ProductLaunch,
    Partnership,
    Dividend,
    ManagementChange,
    Regulatory,
    Lawsuit,
    Investigation,
    Scandal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    Low,
    #[default]
    Medium,
    High,
}

/// A single detected event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub relevance: Relevance,
    /// Directional/strength modifier from the detector (e.g. -1.0 for an earnings miss).
    #[serde(default = "default_context_modifier")]
    pub context_modifier: f64,
}

fn default_context_modifier() -> f64 {
    1.0
}

impl Event {
    pub fn new(kind: EventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            timestamp,
            relevance: Relevance::Medium,
            context_modifier: 1.0,
        }
    }

    pub fn relevance(mut self, relevance: Relevance) -> Self {
        self.relevance = relevance;
        self
    }

    pub fn modifier(mut self, context_modifier: f64) -> Self {
        self.context_modifier = context_modifier;
        self
    }
}

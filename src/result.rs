//! result.rs — Výstup fúze: skóre, confidence a kompletní audit vah.
//!
//! The serialized field names (`overall_sentiment`, `sentiment_components`,
//! `weights`, `weight_changes`, `quality_assessments`, `base_weights`, ...)
//! are read by persistence and dashboard consumers; keep them stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::quality::{Grade, QualityAssessment};
use crate::source::SourceKind;

/// Coarse reading of the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    VeryBullish,
    Bullish,
    Neutral,
    Bearish,
    VeryBearish,
}

impl SentimentLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.5 {
            SentimentLabel::VeryBullish
        } else if score >= 0.15 {
            SentimentLabel::Bullish
        } else if score <= -0.5 {
            SentimentLabel::VeryBearish
        } else if score <= -0.15 {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// Kompletní výsledek jedné fúze včetně explainability.
/// Immutable once produced; callers persist it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    /// Finální skóre v intervalu <-1.0, 1.0>.
    #[serde(rename = "overall_sentiment")]
    pub score: f64,
    pub label: SentimentLabel,
    /// Jistota v intervalu <0.0, 1.0>.
    pub confidence: f64,
    /// Weighted blend before market context and confidence scaling.
    pub raw_score: f64,
    /// Market-context multiplier as actually applied (after clamping).
    pub market_context: f64,
    /// Per-source scalar sentiment fed into the blend.
    pub component_scores: BTreeMap<SourceKind, f64>,
    /// Per-source `weight * score`.
    #[serde(rename = "sentiment_components", alias = "components")]
    pub component_contributions: BTreeMap<SourceKind, f64>,
    #[serde(rename = "weights")]
    pub weights_used: BTreeMap<SourceKind, f64>,
    pub base_weights: BTreeMap<SourceKind, f64>,
    pub multipliers: BTreeMap<SourceKind, f64>,
    /// Percentage change of each dynamic weight against its base weight.
    pub weight_changes: BTreeMap<SourceKind, f64>,
    #[serde(rename = "quality_assessments")]
    pub quality_report: BTreeMap<SourceKind, QualityAssessment>,
    pub sources_available: usize,
    /// Mean quality score of the available sources (0 when none).
    pub data_quality: f64,
}

impl FusionResult {
    pub fn weight_sum(&self) -> f64 {
        self.weights_used.values().sum()
    }

    pub fn grade(&self, kind: SourceKind) -> Grade {
        self.quality_report
            .get(&kind)
            .map(|q| q.grade)
            .unwrap_or(Grade::F)
    }
}

//! # Fusion Engine
//! Pure, testable logic that maps per-source summaries → `FusionResult`.
//! No I/O, no hidden state: identical input gives an identical result, and
//! one engine can be shared across threads/tasks for many symbols.
//!
//! Pipeline: quality assessment → sub-scorers → dynamic weights → weighted
//! blend → market context → confidence scaling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::allocator::DynamicWeightAllocator;
use crate::config::{tier_bonus, FusionConfig};
use crate::quality::{QualityAssessment, QualityAssessor, SourceSample};
use crate::result::{FusionResult, SentimentLabel};
use crate::sanitize;
use crate::scorers::{event_impact, momentum_score, volume_weighted_score, EventImpactScorer};
use crate::source::{Event, MlTradingSignal, NewsSummary, ProfessionalSummary, SocialSummary, SourceKind};

/// Everything one fusion call looks at. Any summary may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionInput {
    pub news: Option<NewsSummary>,
    pub social: Option<SocialSummary>,
    pub professional: Option<ProfessionalSummary>,
    pub events: Vec<Event>,
    /// Trailing fused sentiment, oldest first.
    pub sentiment_history: Vec<f64>,
    pub ml_trading: Option<MlTradingSignal>,
    /// External regime multiplier (>1 in high-volatility regimes).
    pub market_context: f64,
    pub classifier_confidence: f64,
    pub ml_confidence: f64,
    /// Reference time for event decay. Defaults to the newest event.
    pub as_of: Option<DateTime<Utc>>,
}

impl Default for FusionInput {
    fn default() -> Self {
        Self {
            news: None,
            social: None,
            professional: None,
            events: Vec::new(),
            sentiment_history: Vec::new(),
            ml_trading: None,
            market_context: 1.0,
            classifier_confidence: 0.0,
            ml_confidence: 0.0,
            as_of: None,
        }
    }
}

impl FusionInput {
    fn reference_time(&self) -> DateTime<Utc> {
        self.as_of
            .or_else(|| self.events.iter().map(|e| e.timestamp).max())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct FusionEngine {
    config: Arc<FusionConfig>,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new(FusionConfig::shared_default())
    }
}

impl FusionEngine {
    pub fn new(config: Arc<FusionConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Quality of every source for this input.
    pub fn assess_all(&self, input: &FusionInput) -> BTreeMap<SourceKind, QualityAssessment> {
        let assessor = QualityAssessor::new(&self.config);
        let samples = [
            (SourceSample::News(input.news.as_ref()), input.classifier_confidence),
            (SourceSample::Social(input.social.as_ref()), 0.0),
            (SourceSample::Professional(input.professional.as_ref()), 0.0),
            (SourceSample::Events(&input.events), 0.0),
            (SourceSample::Volume(input.news.as_ref()), 0.0),
            (SourceSample::Momentum(&input.sentiment_history), 0.0),
            (SourceSample::MlTrading(input.ml_trading.is_some()), input.ml_confidence),
        ];
        samples
            .into_iter()
            .map(|(s, aux)| (s.kind(), assessor.assess(s, aux)))
            .collect()
    }

    /// Scalar sentiment of every source; absent sources contribute 0.
    pub fn component_scores(&self, input: &FusionInput) -> BTreeMap<SourceKind, f64> {
        let as_of = input.reference_time();
        SourceKind::ALL
            .iter()
            .map(|&k| {
                let s = match k {
                    SourceKind::News => input
                        .news
                        .as_ref()
                        .map(|n| sanitize::sentiment("news.average_sentiment", n.average_sentiment))
                        .unwrap_or(0.0),
                    SourceKind::Social => input
                        .social
                        .as_ref()
                        .map(|n| sanitize::sentiment("social.average_sentiment", n.average_sentiment))
                        .unwrap_or(0.0),
                    SourceKind::ProfessionalApi => input
                        .professional
                        .as_ref()
                        .map(|p| sanitize::sentiment("professional.sentiment_score", p.sentiment_score))
                        .unwrap_or(0.0),
                    SourceKind::Events => {
                        EventImpactScorer::new(&self.config.events).score(&input.events, as_of)
                    }
                    SourceKind::Volume => input.news.as_ref().map(volume_weighted_score).unwrap_or(0.0),
                    SourceKind::Momentum => momentum_score(&input.sentiment_history),
                    SourceKind::MlTrading => input
                        .ml_trading
                        .map(|m| sanitize::sentiment("ml_trading.score", m.score))
                        .unwrap_or(0.0),
                };
                (k, s)
            })
            .collect()
    }

    /// Capped additive confidence from sample volumes and auxiliary confidences.
    /// Classifier confidence only counts with a news summary, model confidence
    /// only with an ML signal.
    pub fn confidence(&self, input: &FusionInput) -> f64 {
        let tiers = &self.config.confidence;
        let news_n = input
            .news
            .as_ref()
            .map(|n| sanitize::count("news.sample_count", n.sample_count))
            .unwrap_or(0);
        let social_n = input
            .social
            .as_ref()
            .map(|n| sanitize::count("social.sample_count", n.sample_count))
            .unwrap_or(0);
        let events_n = event_impact::distinct_count(&input.events);

        let mut total = tier_bonus(&tiers.news_samples, news_n as f64)
            + tier_bonus(&tiers.social_samples, social_n as f64)
            + tier_bonus(&tiers.events, events_n as f64);
        if input.news.is_some() {
            let c = sanitize::unit("classifier_confidence", input.classifier_confidence);
            total += tier_bonus(&tiers.classifier, c);
        }
        if input.ml_trading.is_some() {
            let c = sanitize::unit("ml_confidence", input.ml_confidence);
            total += tier_bonus(&tiers.ml, c);
        }
        total.clamp(0.0, 1.0)
    }

    pub fn fuse(&self, input: &FusionInput) -> FusionResult {
        crate::metrics::ensure_described();
        let cfg = &*self.config;

        // 1) Quality + per-source scalars
        let quality_report = self.assess_all(input);
        let component_scores = self.component_scores(input);

        // 2) Dynamic weights
        let allocation =
            DynamicWeightAllocator::new(cfg.multiplier).allocate(&cfg.base_weights, &quality_report);
        let weights_used = allocation.dynamic_weights();

        // 3) Weighted blend
        let component_contributions: BTreeMap<SourceKind, f64> = SourceKind::ALL
            .iter()
            .map(|k| (*k, weights_used[k] * component_scores[k]))
            .collect();
        let raw_score: f64 = component_contributions.values().sum();

        // 4) Market context
        let market_context =
            sanitize::bounded("market_context", input.market_context, 0.0, cfg.market.max_context);

        // 5) + 6) Confidence scaling
        let confidence = self.confidence(input);
        let score = (raw_score * market_context * (0.7 + 0.3 * confidence)).clamp(-1.0, 1.0);

        let available: Vec<f64> = quality_report
            .values()
            .filter(|q| q.is_available())
            .map(|q| q.score)
            .collect();
        let sources_available = available.len();
        let data_quality = if available.is_empty() {
            0.0
        } else {
            available.iter().sum::<f64>() / available.len() as f64
        };

        crate::metrics::record_fusion(score, confidence, SourceKind::ALL.len() - sources_available);
        debug!(
            target: "fusion",
            score, confidence, raw_score, market_context, sources_available,
            "fusion complete"
        );

        FusionResult {
            score,
            label: SentimentLabel::from_score(score),
            confidence,
            raw_score,
            market_context,
            component_scores,
            component_contributions,
            weights_used,
            base_weights: allocation.base_weights(),
            multipliers: allocation.multipliers(),
            weight_changes: allocation.changes_pct(),
            quality_report,
            sources_available,
            data_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CategoryCounts, EventKind};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 16, 10, 0, 0).unwrap()
    }

    fn bullish() -> FusionInput {
        FusionInput {
            news: Some(NewsSummary {
                sample_count: 25,
                average_sentiment: 0.3,
                method_diversity: 3,
                classifier_confidence: Some(0.85),
                categories: CategoryCounts::new(18, 5, 2),
            }),
            social: Some(SocialSummary {
                sample_count: 20,
                average_sentiment: 0.25,
            }),
            professional: Some(ProfessionalSummary {
                sentiment_score: 0.4,
                article_count: Some(30),
            }),
            events: vec![Event::new(EventKind::Earnings, t0() - Duration::days(1))],
            sentiment_history: vec![0.1, 0.1, 0.1, 0.15, 0.2, 0.25, 0.3],
            ml_trading: Some(MlTradingSignal { score: 0.2 }),
            market_context: 1.0,
            classifier_confidence: 0.85,
            ml_confidence: 0.8,
            as_of: Some(t0()),
        }
    }

    #[test]
    fn bullish_inputs_give_positive_score() {
        let r = FusionEngine::default().fuse(&bullish());
        assert!(r.score > 0.0);
        assert!(r.confidence > 0.5);
        assert!((r.weight_sum() - 1.0).abs() < 1e-6);
        assert_eq!(r.sources_available, 7);
    }

    #[test]
    fn contributions_sum_to_raw_score() {
        let r = FusionEngine::default().fuse(&bullish());
        let s: f64 = r.component_contributions.values().sum();
        assert!((s - r.raw_score).abs() < 1e-12);
    }

    #[test]
    fn confidence_tiers_add_up() {
        let e = FusionEngine::default();
        // news 25 → .25, social 20 → .15, events 1 → .10, classifier .85 → .20, ml .8 → .20
        assert!((e.confidence(&bullish()) - 0.90).abs() < 1e-12);
        assert_eq!(e.confidence(&FusionInput::default()), 0.0);
    }

    #[test]
    fn market_context_scales_and_is_bounded() {
        let e = FusionEngine::default();
        let base = e.fuse(&bullish());

        let mut hot = bullish();
        hot.market_context = 1.5;
        let r = e.fuse(&hot);
        assert!((r.score - (base.score * 1.5).min(1.0)).abs() < 1e-12);

        hot.market_context = 50.0;
        assert_eq!(e.fuse(&hot).market_context, 2.0);

        hot.market_context = -1.0;
        let zeroed = e.fuse(&hot);
        assert_eq!(zeroed.market_context, 0.0);
        assert_eq!(zeroed.score, 0.0);
    }

    #[test]
    fn as_of_defaults_to_newest_event() {
        let e = FusionEngine::default();
        let mut input = FusionInput {
            events: vec![Event::new(EventKind::Earnings, t0())],
            ..Default::default()
        };
        let implicit = e.component_scores(&input)[&SourceKind::Events];
        input.as_of = Some(t0());
        let explicit = e.component_scores(&input)[&SourceKind::Events];
        assert_eq!(implicit, explicit);
        assert!((explicit - 0.30).abs() < 1e-12);
    }

    #[test]
    fn news_only_input_is_not_diluted_by_absent_sources() {
        let e = FusionEngine::default();
        let input = FusionInput {
            news: Some(NewsSummary {
                sample_count: 25,
                average_sentiment: 0.8,
                method_diversity: 3,
                classifier_confidence: Some(1.0),
                categories: CategoryCounts::new(25, 0, 0),
            }),
            classifier_confidence: 1.0,
            ..Default::default()
        };
        let r = e.fuse(&input);

        // news and the news-derived volume signal carry the whole blend
        for k in SourceKind::ALL {
            if matches!(k, SourceKind::News | SourceKind::Volume) {
                assert!(r.weights_used[&k] > 0.0, "{k}");
            } else {
                assert_eq!(r.weights_used[&k], 0.0, "{k}");
            }
        }
        assert!((r.weight_sum() - 1.0).abs() < 1e-9);
        assert!((r.raw_score - 0.8).abs() < 1e-9);
        // confidence: 25 samples → .25, classifier 1.0 → .20
        assert!((r.confidence - 0.45).abs() < 1e-12);
        assert!((r.score - 0.8 * (0.7 + 0.3 * 0.45)).abs() < 1e-9);
    }

    #[test]
    fn ml_confidence_ignored_without_signal() {
        let e = FusionEngine::default();
        let input = FusionInput {
            ml_confidence: 0.95,
            classifier_confidence: 0.95,
            ..Default::default()
        };
        assert_eq!(e.confidence(&input), 0.0);
    }
}

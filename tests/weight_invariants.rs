// tests/weight_invariants.rs
//
// Seeded random inputs: whatever the engine is fed, the allocation must stay
// normalized and bounded, and the fused outputs must stay in range.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;

use sentiment_fusion::config::BaseWeights;
use sentiment_fusion::{
    CategoryCounts, DynamicWeightAllocator, Event, EventKind, FusionConfig, FusionEngine,
    FusionInput, MlTradingSignal, NewsSummary, ProfessionalSummary, QualityAssessment, Relevance,
    SocialSummary, SourceKind,
};

const CASES: usize = 500;

const KINDS: [EventKind; 11] = [
    EventKind::Earnings,
    EventKind::Guidance,
    EventKind::MergerAcquisition,
    EventKind::ProductLaunch,
    EventKind::Partnership,
    EventKind::Dividend,
    EventKind::ManagementChange,
    EventKind::Regulatory,
    EventKind::Lawsuit,
    EventKind::Investigation,
    EventKind::Scandal,
];

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 20, 9, 0, 0).unwrap()
}

// Occasionally out of range or non-finite.
fn noisy(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    match rng.random_range(0..20) {
        0 => f64::NAN,
        1 => f64::INFINITY,
        2 => -f64::INFINITY,
        3 => rng.random_range(-50.0..50.0),
        _ => rng.random_range(lo..hi),
    }
}

fn random_input(rng: &mut StdRng) -> FusionInput {
    let news = rng.random_bool(0.8).then(|| NewsSummary {
        sample_count: rng.random_range(-5..80),
        average_sentiment: noisy(rng, -1.0, 1.0),
        method_diversity: rng.random_range(-1..6),
        classifier_confidence: Some(rng.random_range(0.0..1.0)),
        categories: CategoryCounts::new(
            rng.random_range(-2..30),
            rng.random_range(0..30),
            rng.random_range(0..30),
        ),
    });
    let social = rng.random_bool(0.7).then(|| SocialSummary {
        sample_count: rng.random_range(-5..60),
        average_sentiment: noisy(rng, -1.0, 1.0),
    });
    let professional = rng.random_bool(0.6).then(|| ProfessionalSummary {
        sentiment_score: noisy(rng, -1.0, 1.0),
        article_count: rng.random_bool(0.5).then(|| rng.random_range(-3..50)),
    });
    let n_events = rng.random_range(0..9);
    let events = (0..n_events)
        .map(|_| {
            let kind = KINDS[rng.random_range(0..KINDS.len())];
            // includes a few timestamps after `as_of`
            let at = t0() - Duration::minutes(rng.random_range(-600..30 * 24 * 60));
            let relevance = match rng.random_range(0..3) {
                0 => Relevance::Low,
                1 => Relevance::Medium,
                _ => Relevance::High,
            };
            Event::new(kind, at)
                .relevance(relevance)
                .modifier(rng.random_range(0.0..2.5))
        })
        .collect();
    let history_len = rng.random_range(0..12);
    let sentiment_history = (0..history_len).map(|_| noisy(rng, -1.0, 1.0)).collect();

    FusionInput {
        news,
        social,
        professional,
        events,
        sentiment_history,
        ml_trading: rng
            .random_bool(0.5)
            .then(|| MlTradingSignal { score: noisy(rng, -1.0, 1.0) }),
        market_context: noisy(rng, 0.0, 3.0),
        classifier_confidence: noisy(rng, 0.0, 1.0),
        ml_confidence: noisy(rng, 0.0, 1.0),
        as_of: rng.random_bool(0.9).then(t0),
    }
}

#[test]
fn fused_outputs_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(0x5eed_f00d);
    let engine = FusionEngine::default();
    let cfg = FusionConfig::default();

    for i in 0..CASES {
        let input = random_input(&mut rng);
        let r = engine.fuse(&input);

        assert!((r.weight_sum() - 1.0).abs() < 1e-6, "case {i}: sum {}", r.weight_sum());
        assert!((-1.0..=1.0).contains(&r.score), "case {i}: score {}", r.score);
        assert!((0.0..=1.0).contains(&r.confidence), "case {i}: confidence {}", r.confidence);
        assert!(r.raw_score.is_finite(), "case {i}");
        assert!((0.0..=cfg.market.max_context).contains(&r.market_context), "case {i}");
        assert!((0.0..=1.0).contains(&r.data_quality), "case {i}");
        for k in SourceKind::ALL {
            let m = r.multipliers[&k];
            assert!(m >= cfg.multiplier.min && m <= cfg.multiplier.max, "case {i}: {k} multiplier {m}");
            assert!(r.weights_used[&k] >= 0.0, "case {i}: {k}");
            if r.sources_available > 0 && !r.quality_report[&k].is_available() {
                assert_eq!(r.weights_used[&k], 0.0, "case {i}: absent {k} kept weight");
            }
            assert!((0.0..=1.0).contains(&r.quality_report[&k].score), "case {i}: {k}");
            assert!((-1.0..=1.0).contains(&r.component_scores[&k]), "case {i}: {k}");
        }
        assert_eq!(r, engine.fuse(&input), "case {i}: not deterministic");
    }
}

#[test]
fn multiplier_is_monotone_in_quality() {
    let mut rng = StdRng::seed_from_u64(7);
    let alloc = DynamicWeightAllocator::default();
    for _ in 0..CASES {
        let a: f64 = rng.random_range(0.0..1.0);
        let b: f64 = rng.random_range(0.0..1.0);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        assert!(alloc.multiplier(lo) <= alloc.multiplier(hi), "{lo} → {hi}");
    }
}

fn assessment(score: f64) -> QualityAssessment {
    QualityAssessment {
        score,
        grade: FusionConfig::default().grades.grade(score),
        metrics: BTreeMap::new(),
        issues: Vec::new(),
    }
}

#[test]
fn better_quality_never_shrinks_own_share() {
    let mut rng = StdRng::seed_from_u64(99);
    let alloc = DynamicWeightAllocator::default();
    let base = BaseWeights::default();

    for _ in 0..CASES {
        let mut report: BTreeMap<SourceKind, QualityAssessment> = SourceKind::ALL
            .iter()
            .map(|k| (*k, assessment(rng.random_range(0.0..1.0))))
            .collect();
        let target = SourceKind::ALL[rng.random_range(0..SourceKind::ALL.len())];
        let before = alloc.allocate(&base, &report);

        let bumped = (report[&target].score + rng.random_range(0.0..0.5)).min(1.0);
        report.insert(target, assessment(bumped));
        let after = alloc.allocate(&base, &report);

        assert!(
            after.dynamic_weight(target) + 1e-12 >= before.dynamic_weight(target),
            "{target}: {} → {}",
            before.dynamic_weight(target),
            after.dynamic_weight(target)
        );
        let sum: f64 = after.dynamic_weights().values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }
}

#[test]
fn uniform_quality_keeps_base_weights() {
    let alloc = DynamicWeightAllocator::default();
    let base = BaseWeights::default();
    for q in [0.0, 0.3, 0.5, 0.77, 1.0] {
        let report: BTreeMap<SourceKind, QualityAssessment> =
            SourceKind::ALL.iter().map(|k| (*k, assessment(q))).collect();
        let out = alloc.allocate(&base, &report);
        for k in SourceKind::ALL {
            assert!((out.dynamic_weight(k) - base.get(k)).abs() < 1e-12, "q={q} {k}");
        }
    }
}

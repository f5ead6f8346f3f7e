//! # Quality assessment
//! Scores how *reliable* each source's current sample is, independent of the
//! sign of its sentiment. One assessor per [`SourceKind`]; all of them share
//! the grade helper and the `issues` vocabulary below.
//!
//! Absent input is a first-class case: score 0, grade F, `source_unavailable`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{FusionConfig, QualityParams};
use crate::source::{Event, NewsSummary, ProfessionalSummary, SocialSummary, SourceKind};
use crate::{sanitize, scorers};

pub const ISSUE_UNAVAILABLE: &str = "source_unavailable";
pub const ISSUE_LOW_VOLUME: &str = "low_sample_volume";
pub const ISSUE_LOW_DIVERSITY: &str = "low_method_diversity";
pub const ISSUE_LOW_CLASSIFIER: &str = "low_classifier_confidence";
pub const ISSUE_WEAK_SIGNAL: &str = "weak_signal";
pub const ISSUE_FEW_EVENTS: &str = "few_events";
pub const ISSUE_LOW_MODEL: &str = "low_model_confidence";
pub const ISSUE_SHORT_HISTORY: &str = "insufficient_history";
pub const ISSUE_LOW_AGREEMENT: &str = "low_category_agreement";

/// Sub-metrics below this flag an issue.
const ISSUE_CUTOFF: f64 = 0.5;

/// Ordered best → worst, so `Grade::A < Grade::F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub score: f64,
    pub grade: Grade,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl QualityAssessment {
    pub fn unavailable() -> Self {
        Self {
            score: 0.0,
            grade: Grade::F,
            metrics: BTreeMap::new(),
            issues: vec![ISSUE_UNAVAILABLE.to_string()],
        }
    }

    pub fn is_available(&self) -> bool {
        !self.issues.iter().any(|i| i == ISSUE_UNAVAILABLE)
    }
}

/// The inputs a single assessor may look at.
#[derive(Debug, Clone, Copy)]
pub enum SourceSample<'a> {
    News(Option<&'a NewsSummary>),
    Social(Option<&'a SocialSummary>),
    Professional(Option<&'a ProfessionalSummary>),
    Events(&'a [Event]),
    /// Derived from the news summary.
    Volume(Option<&'a NewsSummary>),
    Momentum(&'a [f64]),
    /// Only the externally supplied confidence matters; `false` = no model output.
    MlTrading(bool),
}

impl SourceSample<'_> {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceSample::News(_) => SourceKind::News,
            SourceSample::Social(_) => SourceKind::Social,
            SourceSample::Professional(_) => SourceKind::ProfessionalApi,
            SourceSample::Events(_) => SourceKind::Events,
            SourceSample::Volume(_) => SourceKind::Volume,
            SourceSample::Momentum(_) => SourceKind::Momentum,
            SourceSample::MlTrading(_) => SourceKind::MlTrading,
        }
    }
}

/// Stateless assessor bound to a config.
#[derive(Debug, Clone, Copy)]
pub struct QualityAssessor<'a> {
    cfg: &'a FusionConfig,
}

impl<'a> QualityAssessor<'a> {
    pub fn new(cfg: &'a FusionConfig) -> Self {
        Self { cfg }
    }

    /// Assess one source. `aux_confidence` is the classifier confidence for
    /// news and the model confidence for ML trading; other kinds ignore it.
    pub fn assess(&self, sample: SourceSample<'_>, aux_confidence: f64) -> QualityAssessment {
        let q = &self.cfg.quality;
        let draft = match sample {
            SourceSample::Events([]) | SourceSample::Momentum([]) => {
                return QualityAssessment::unavailable()
            }
            SourceSample::News(Some(s)) => news(q, s, aux_confidence),
            SourceSample::Social(Some(s)) => social(q, s),
            SourceSample::Professional(Some(s)) => professional(q, s),
            SourceSample::Events(events) => event_quality(events),
            SourceSample::Volume(Some(s)) => volume(q, s),
            SourceSample::Momentum(series) => momentum(q, series),
            SourceSample::MlTrading(true) => ml(aux_confidence),
            SourceSample::News(None)
            | SourceSample::Social(None)
            | SourceSample::Professional(None)
            | SourceSample::Volume(None)
            | SourceSample::MlTrading(false) => return QualityAssessment::unavailable(),
        };
        self.finish(draft)
    }

    fn finish(&self, d: Draft) -> QualityAssessment {
        let score = d.score.clamp(0.0, 1.0);
        QualityAssessment {
            score,
            grade: self.cfg.grades.grade(score),
            metrics: d.metrics,
            issues: d.issues,
        }
    }
}

#[derive(Debug, Default)]
struct Draft {
    score: f64,
    metrics: BTreeMap<String, f64>,
    issues: Vec<String>,
}

impl Draft {
    fn metric(&mut self, name: &str, value: f64) -> f64 {
        self.metrics.insert(name.to_string(), value);
        value
    }

    /// Record a sub-score and flag `issue` when it drags quality down.
    fn sub(&mut self, name: &str, value: f64, issue: &str) -> f64 {
        if value < ISSUE_CUTOFF {
            self.issues.push(issue.to_string());
        }
        self.metric(name, value)
    }
}

fn saturating(count: u64, saturation: f64) -> f64 {
    (count as f64 / saturation).min(1.0)
}

fn news(q: &QualityParams, s: &NewsSummary, classifier_confidence: f64) -> Draft {
    let mut d = Draft::default();
    let n = sanitize::count("news.sample_count", s.sample_count);
    let methods = sanitize::count("news.method_diversity", s.method_diversity);
    let volume = d.sub("volume_score", saturating(n, q.news_saturation), ISSUE_LOW_VOLUME);
    let diversity = d.sub(
        "diversity_score",
        saturating(methods, q.method_saturation),
        ISSUE_LOW_DIVERSITY,
    );
    let confidence = d.sub(
        "confidence_score",
        sanitize::unit("classifier_confidence", classifier_confidence),
        ISSUE_LOW_CLASSIFIER,
    );
    d.metric("sample_count", n as f64);
    d.score = 0.4 * volume + 0.3 * diversity + 0.3 * confidence;
    d
}

fn social(q: &QualityParams, s: &SocialSummary) -> Draft {
    let mut d = Draft::default();
    let n = sanitize::count("social.sample_count", s.sample_count);
    let volume = d.sub("volume_score", saturating(n, q.social_saturation), ISSUE_LOW_VOLUME);
    d.metric("sample_count", n as f64);
    d.score = q.social_ceiling * volume;
    d
}

fn professional(q: &QualityParams, s: &ProfessionalSummary) -> Draft {
    let mut d = Draft::default();
    let sentiment = sanitize::sentiment("professional.sentiment_score", s.sentiment_score);
    let magnitude = d.metric(
        "magnitude_score",
        (sentiment.abs() / q.professional_magnitude_span).min(1.0),
    );
    let articles = s
        .article_count
        .map(|c| sanitize::count("professional.article_count", c))
        .unwrap_or(0);
    d.metric("article_count", articles as f64);

    let mut score = q.professional_floor + (1.0 - q.professional_floor) * magnitude;
    if sentiment.abs() < q.weak_signal_threshold && articles == 0 {
        score -= q.weak_signal_penalty;
        d.issues.push(ISSUE_WEAK_SIGNAL.to_string());
    }
    d.score = score;
    d
}

fn event_quality(events: &[Event]) -> Draft {
    let mut d = Draft::default();
    let n = scorers::event_impact::distinct_count(events);
    d.metric("event_count", n as f64);
    // 1 event → 0.5, 3 → 0.875, 4 → 0.9375
    let score = 1.0 - 0.5f64.powi(n.min(64) as i32);
    d.sub("coverage_score", score, ISSUE_FEW_EVENTS);
    d.score = score;
    d
}

fn volume(q: &QualityParams, s: &NewsSummary) -> Draft {
    let mut d = Draft::default();
    let n = sanitize::count("news.sample_count", s.sample_count);
    let volume = d.sub("volume_score", saturating(n, q.volume_saturation), ISSUE_LOW_VOLUME);
    let unanimity = d.sub(
        "unanimity",
        scorers::volume::unanimity(&s.categories),
        ISSUE_LOW_AGREEMENT,
    );
    d.score = 0.7 * volume + 0.3 * unanimity;
    d
}

fn momentum(q: &QualityParams, series: &[f64]) -> Draft {
    let mut d = Draft::default();
    let len = series.len();
    d.metric("observations", len as f64);
    let score = if len < scorers::momentum::SHORT_WINDOW {
        0.0
    } else {
        (len as f64 / q.momentum_saturation).min(1.0)
    };
    d.sub("history_score", score, ISSUE_SHORT_HISTORY);
    d.score = score;
    d
}

fn ml(confidence: f64) -> Draft {
    let mut d = Draft::default();
    let c = d.sub(
        "model_confidence",
        sanitize::unit("ml_confidence", confidence),
        ISSUE_LOW_MODEL,
    );
    d.score = c;
    d
}

//! # Fusion configuration
//!
//! Every tunable of the engine lives here: base weights, grade cut points,
//! the multiplier band, quality saturation points, the event decay table and
//! the confidence tiers. The config is loaded once at process start
//! (see [`load`]) and shared read-only afterwards.
//!
//! All sections are `#[serde(default)]`, so a config file only needs the
//! values it wants to override.

pub mod load;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::quality::Grade;
use crate::source::{EventKind, Relevance, SourceKind};

pub use load::{load_default, load_from, ENV_CONFIG_PATH};

/// Tolerance used when checking that weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

static SHARED_DEFAULT: Lazy<Arc<FusionConfig>> = Lazy::new(|| Arc::new(FusionConfig::default()));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub base_weights: BaseWeights,
    pub grades: GradeThresholds,
    pub multiplier: MultiplierBand,
    pub quality: QualityParams,
    pub events: EventTable,
    pub confidence: ConfidenceTiers,
    pub market: MarketContext,
}

impl FusionConfig {
    /// Process-wide immutable defaults.
    pub fn shared_default() -> Arc<FusionConfig> {
        SHARED_DEFAULT.clone()
    }

    /// Reject configurations that would break the engine's invariants.
    pub fn validate(&self) -> Result<()> {
        self.base_weights.validate()?;
        self.grades.validate()?;
        self.multiplier.validate()?;
        self.quality.validate()?;
        self.events.validate()?;
        self.confidence.validate()?;
        if !(self.market.max_context.is_finite() && self.market.max_context > 0.0) {
            bail!(
                "market.max_context must be positive, got {}",
                self.market.max_context
            );
        }
        Ok(())
    }
}

/* ----------------------------
Base weights
---------------------------- */

/// Fixed allocation before quality adjustment. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseWeights {
    pub news: f64,
    pub social: f64,
    pub professional_api: f64,
    pub events: f64,
    pub volume: f64,
    pub momentum: f64,
    pub ml_trading: f64,
}

impl Default for BaseWeights {
    fn default() -> Self {
        Self {
            news: 0.25,
            social: 0.15,
            professional_api: 0.20,
            events: 0.15,
            volume: 0.10,
            momentum: 0.05,
            ml_trading: 0.10,
        }
    }
}

impl BaseWeights {
    pub fn get(&self, kind: SourceKind) -> f64 {
        match kind {
            SourceKind::News => self.news,
            SourceKind::Social => self.social,
            SourceKind::ProfessionalApi => self.professional_api,
            SourceKind::Events => self.events,
            SourceKind::Volume => self.volume,
            SourceKind::Momentum => self.momentum,
            SourceKind::MlTrading => self.ml_trading,
        }
    }

    pub fn total(&self) -> f64 {
        SourceKind::ALL.iter().map(|k| self.get(*k)).sum()
    }

    fn validate(&self) -> Result<()> {
        for kind in SourceKind::ALL {
            let w = self.get(kind);
            if !(w.is_finite() && w > 0.0) {
                bail!("base weight for {kind} must be positive, got {w}");
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            bail!("base weights must sum to 1.0, got {total:.6}");
        }
        Ok(())
    }
}

/* ----------------------------
Grades
---------------------------- */

/// Minimum quality score for each grade; anything below `d` is `F`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeThresholds {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            a: 0.80,
            b: 0.60,
            c: 0.40,
            d: 0.20,
        }
    }
}

impl GradeThresholds {
    /// Map a quality score to a grade. Monotonic: a higher score never gets a worse grade.
    pub fn grade(&self, score: f64) -> Grade {
        if score >= self.a {
            Grade::A
        } else if score >= self.b {
            Grade::B
        } else if score >= self.c {
            Grade::C
        } else if score >= self.d {
            Grade::D
        } else {
            Grade::F
        }
    }

    fn validate(&self) -> Result<()> {
        let ordered = self.a <= 1.0 && self.a > self.b && self.b > self.c && self.c > self.d;
        if !ordered || self.d <= 0.0 {
            bail!(
                "grade thresholds must satisfy 1 >= a > b > c > d > 0, got a={} b={} c={} d={}",
                self.a,
                self.b,
                self.c,
                self.d
            );
        }
        Ok(())
    }
}

/* ----------------------------
Multiplier band
---------------------------- */

/// `multiplier = clamp(1 + sensitivity * (quality - 0.5), min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplierBand {
    pub min: f64,
    pub max: f64,
    pub sensitivity: f64,
}

impl Default for MultiplierBand {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 1.5,
            sensitivity: 1.2,
        }
    }
}

impl MultiplierBand {
    fn validate(&self) -> Result<()> {
        if !(self.min > 0.0 && self.min <= 1.0 && self.max >= 1.0 && self.max.is_finite()) {
            bail!(
                "multiplier band must satisfy 0 < min <= 1 <= max, got [{}, {}]",
                self.min,
                self.max
            );
        }
        if !(self.sensitivity.is_finite() && self.sensitivity >= 0.0) {
            bail!("multiplier sensitivity must be >= 0, got {}", self.sensitivity);
        }
        Ok(())
    }
}

/* ----------------------------
Quality assessor parameters
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityParams {
    /// News sample count at which the volume sub-score saturates.
    pub news_saturation: f64,
    /// Number of independent scoring methods that counts as full diversity.
    pub method_saturation: f64,
    pub social_saturation: f64,
    /// Social never grades above this, even at saturation.
    pub social_ceiling: f64,
    /// Starting quality of any present professional reading.
    pub professional_floor: f64,
    /// |sentiment| at which the professional magnitude bonus is full.
    pub professional_magnitude_span: f64,
    /// Below this |sentiment| an uncorroborated professional reading is penalized.
    pub weak_signal_threshold: f64,
    pub weak_signal_penalty: f64,
    pub volume_saturation: f64,
    /// History length at which momentum quality saturates.
    pub momentum_saturation: f64,
}

impl Default for QualityParams {
    fn default() -> Self {
        Self {
            news_saturation: 25.0,
            method_saturation: 3.0,
            social_saturation: 20.0,
            social_ceiling: 0.80,
            professional_floor: 0.80,
            professional_magnitude_span: 0.30,
            weak_signal_threshold: 0.05,
            weak_signal_penalty: 0.10,
            volume_saturation: 20.0,
            momentum_saturation: 7.0,
        }
    }
}

impl QualityParams {
    fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("news_saturation", self.news_saturation),
            ("method_saturation", self.method_saturation),
            ("social_saturation", self.social_saturation),
            ("professional_magnitude_span", self.professional_magnitude_span),
            ("volume_saturation", self.volume_saturation),
            ("momentum_saturation", self.momentum_saturation),
        ] {
            if !(v.is_finite() && v > 0.0) {
                bail!("quality.{name} must be positive, got {v}");
            }
        }
        for (name, v) in [
            ("social_ceiling", self.social_ceiling),
            ("professional_floor", self.professional_floor),
            ("weak_signal_threshold", self.weak_signal_threshold),
            ("weak_signal_penalty", self.weak_signal_penalty),
        ] {
            if !(0.0..=1.0).contains(&v) {
                bail!("quality.{name} must be within [0, 1], got {v}");
            }
        }
        Ok(())
    }
}

/* ----------------------------
Event decay table
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventProfile {
    pub kind: EventKind,
    pub base_impact: f64,
    /// Fraction of impact retained per day (0 < rate <= 1).
    pub daily_decay: f64,
}

impl EventProfile {
    const fn new(kind: EventKind, base_impact: f64, daily_decay: f64) -> Self {
        Self {
            kind,
            base_impact,
            daily_decay,
        }
    }
}

const DEFAULT_PROFILES: [EventProfile; 11] = [
    EventProfile::new(EventKind::Earnings, 0.30, 0.95),
    EventProfile::new(EventKind::Guidance, 0.25, 0.93),
    EventProfile::new(EventKind::MergerAcquisition, 0.35, 0.97),
    EventProfile::new(EventKind::ProductLaunch, 0.20, 0.92),
    EventProfile::new(EventKind::Partnership, 0.15, 0.90),
    EventProfile::new(EventKind::Dividend, 0.10, 0.95),
    EventProfile::new(EventKind::ManagementChange, -0.10, 0.90),
    EventProfile::new(EventKind::Regulatory, -0.30, 0.90),
    EventProfile::new(EventKind::Lawsuit, -0.25, 0.92),
    EventProfile::new(EventKind::Investigation, -0.40, 0.85),
    EventProfile::new(EventKind::Scandal, -0.50, 0.85),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceMultipliers {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for RelevanceMultipliers {
    fn default() -> Self {
        Self {
            low: 0.7,
            medium: 1.0,
            high: 1.2,
        }
    }
}

impl RelevanceMultipliers {
    pub fn get(&self, r: Relevance) -> f64 {
        match r {
            Relevance::Low => self.low,
            Relevance::Medium => self.medium,
            Relevance::High => self.high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTable {
    pub profiles: Vec<EventProfile>,
    pub relevance: RelevanceMultipliers,
    /// Events (by magnitude) that count at full weight before diminishing returns.
    pub full_weight_events: usize,
}

impl Default for EventTable {
    fn default() -> Self {
        Self {
            profiles: DEFAULT_PROFILES.to_vec(),
            relevance: RelevanceMultipliers::default(),
            full_weight_events: 3,
        }
    }
}

impl EventTable {
    /// Profile for `kind`; falls back to the built-in entry when the table omits it.
    pub fn profile(&self, kind: EventKind) -> EventProfile {
        self.profiles
            .iter()
            .chain(DEFAULT_PROFILES.iter())
            .find(|p| p.kind == kind)
            .copied()
            .unwrap_or(EventProfile::new(kind, 0.0, 1.0))
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for p in &self.profiles {
            if !seen.insert(p.kind) {
                bail!("duplicate event profile for {:?}", p.kind);
            }
            if !(p.base_impact.is_finite() && (-1.0..=1.0).contains(&p.base_impact)) {
                bail!("event {:?}: base_impact must be within [-1, 1]", p.kind);
            }
            if !(p.daily_decay > 0.0 && p.daily_decay <= 1.0) {
                bail!("event {:?}: daily_decay must be within (0, 1]", p.kind);
            }
        }
        let r = self.relevance;
        if !(r.low > 0.0 && r.low <= r.medium && r.medium <= r.high && r.high.is_finite()) {
            bail!("relevance multipliers must satisfy 0 < low <= medium <= high");
        }
        Ok(())
    }
}

/* ----------------------------
Confidence tiers
---------------------------- */

/// `value >= min` earns `bonus`; the highest matching tier wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub min: f64,
    pub bonus: f64,
}

const fn tier(min: f64, bonus: f64) -> Tier {
    Tier { min, bonus }
}

/// Bonus for `value` from a tier list (order does not matter).
pub fn tier_bonus(tiers: &[Tier], value: f64) -> f64 {
    tiers
        .iter()
        .filter(|t| value >= t.min)
        .map(|t| t.bonus)
        .fold(0.0, f64::max)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceTiers {
    pub news_samples: Vec<Tier>,
    pub social_samples: Vec<Tier>,
    pub events: Vec<Tier>,
    pub classifier: Vec<Tier>,
    pub ml: Vec<Tier>,
}

impl Default for ConfidenceTiers {
    fn default() -> Self {
        Self {
            news_samples: vec![tier(20.0, 0.25), tier(10.0, 0.15), tier(5.0, 0.10), tier(1.0, 0.05)],
            social_samples: vec![tier(20.0, 0.15), tier(10.0, 0.10), tier(5.0, 0.05)],
            events: vec![tier(3.0, 0.15), tier(1.0, 0.10)],
            classifier: vec![tier(0.8, 0.20), tier(0.6, 0.15), tier(0.4, 0.10)],
            ml: vec![tier(0.8, 0.20), tier(0.6, 0.10), tier(0.4, 0.05)],
        }
    }
}

impl ConfidenceTiers {
    fn validate(&self) -> Result<()> {
        for (name, tiers) in [
            ("news_samples", &self.news_samples),
            ("social_samples", &self.social_samples),
            ("events", &self.events),
            ("classifier", &self.classifier),
            ("ml", &self.ml),
        ] {
            // Higher thresholds must never pay less than lower ones.
            let mut sorted = tiers.clone();
            sorted.sort_by(|a, b| a.min.total_cmp(&b.min));
            for t in &sorted {
                if !(t.min.is_finite() && t.bonus.is_finite() && t.bonus >= 0.0) {
                    bail!("confidence.{name}: invalid tier {:?}", t);
                }
            }
            if sorted.windows(2).any(|w| w[1].bonus < w[0].bonus) {
                bail!("confidence.{name}: bonuses must increase with the threshold");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketContext {
    /// Upper bound for the external market-context multiplier.
    pub max_context: f64,
}

impl Default for MarketContext {
    fn default() -> Self {
        Self { max_context: 2.0 }
    }
}

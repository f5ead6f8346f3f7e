//! # Dynamic weight allocation
//!
//! Quality → bounded multiplier → reweighted base allocation → renormalized
//! so the dynamic weights sum to exactly one.
//!
//! - `multiplier = clamp(1 + sensitivity * (quality - 0.5), min, max)`; quality
//!   0.5 keeps the base weight, the band stops any present source from being
//!   zeroed out or dominating.
//! - A source that is unavailable this cycle drops out of the blend (weight 0,
//!   change -100 %); renormalization hands its share to the present sources.
//! - Renormalization couples sources: one source's quality change moves the
//!   others' final weights slightly even though their multipliers are fixed.
//! - All sources present with the same multiplier, or none present at all:
//!   the base weights come back unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{BaseWeights, MultiplierBand, WEIGHT_SUM_TOLERANCE};
use crate::quality::QualityAssessment;
use crate::source::SourceKind;

/// Audit entry for one source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightAllocation {
    pub base_weight: f64,
    pub dynamic_weight: f64,
    pub multiplier: f64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub allocations: BTreeMap<SourceKind, WeightAllocation>,
}

impl AllocationResult {
    pub fn dynamic_weight(&self, kind: SourceKind) -> f64 {
        self.allocations
            .get(&kind)
            .map(|a| a.dynamic_weight)
            .unwrap_or(0.0)
    }

    pub fn dynamic_weights(&self) -> BTreeMap<SourceKind, f64> {
        self.project(|a| a.dynamic_weight)
    }

    pub fn base_weights(&self) -> BTreeMap<SourceKind, f64> {
        self.project(|a| a.base_weight)
    }

    pub fn multipliers(&self) -> BTreeMap<SourceKind, f64> {
        self.project(|a| a.multiplier)
    }

    pub fn changes_pct(&self) -> BTreeMap<SourceKind, f64> {
        self.project(|a| a.change_pct)
    }

    fn project(&self, f: impl Fn(&WeightAllocation) -> f64) -> BTreeMap<SourceKind, f64> {
        self.allocations.iter().map(|(k, a)| (*k, f(a))).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DynamicWeightAllocator {
    band: MultiplierBand,
}

impl DynamicWeightAllocator {
    pub fn new(band: MultiplierBand) -> Self {
        Self { band }
    }

    /// Bounded, non-decreasing function of quality; 0.5 → 1.0.
    pub fn multiplier(&self, quality: f64) -> f64 {
        let q = if quality.is_finite() {
            quality.clamp(0.0, 1.0)
        } else {
            0.0
        };
        (1.0 + self.band.sensitivity * (q - 0.5)).clamp(self.band.min, self.band.max)
    }

    /// Sources missing from `assessments` count as unavailable. Unavailable
    /// sources still report their (floor) multiplier but end with weight 0.
    pub fn allocate(
        &self,
        base: &BaseWeights,
        assessments: &BTreeMap<SourceKind, QualityAssessment>,
    ) -> AllocationResult {
        let base_total = base.total();
        let base_norm: BTreeMap<SourceKind, f64> = SourceKind::ALL
            .iter()
            .map(|&k| {
                // Already-normalized weights are kept bit-for-bit.
                let w = if (base_total - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
                    base.get(k)
                } else if base_total > 0.0 {
                    base.get(k) / base_total
                } else {
                    1.0 / SourceKind::ALL.len() as f64
                };
                (k, w)
            })
            .collect();

        let multipliers: BTreeMap<SourceKind, f64> = SourceKind::ALL
            .iter()
            .map(|&k| {
                let q = assessments.get(&k).map(|a| a.score).unwrap_or(0.0);
                (k, self.multiplier(q))
            })
            .collect();

        let available: BTreeMap<SourceKind, bool> = SourceKind::ALL
            .iter()
            .map(|&k| (k, assessments.get(&k).is_some_and(|a| a.is_available())))
            .collect();

        // Unavailable sources take no part in the blend; their share goes to the rest.
        let raw: BTreeMap<SourceKind, f64> = base_norm
            .iter()
            .map(|(k, w)| (*k, if available[k] { w * multipliers[k] } else { 0.0 }))
            .collect();
        let raw_total: f64 = raw.values().sum();

        let first = multipliers[&SourceKind::News];
        let uniform = available.values().all(|a| *a)
            && multipliers.values().all(|m| (m - first).abs() < 1e-12);

        let dynamic: BTreeMap<SourceKind, f64> = if uniform || !(raw_total > 0.0) {
            base_norm.clone()
        } else {
            raw.iter().map(|(k, r)| (*k, r / raw_total)).collect()
        };

        let allocations = SourceKind::ALL
            .iter()
            .map(|&k| {
                let b = base_norm[&k];
                let d = dynamic[&k];
                let change_pct = if b > 0.0 { (d - b) / b * 100.0 } else { 0.0 };
                (
                    k,
                    WeightAllocation {
                        base_weight: b,
                        dynamic_weight: d,
                        multiplier: multipliers[&k],
                        change_pct,
                    },
                )
            })
            .collect();

        AllocationResult { allocations }
    }
}

impl Default for DynamicWeightAllocator {
    fn default() -> Self {
        Self::new(MultiplierBand::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::Grade;

    fn qa(score: f64) -> QualityAssessment {
        QualityAssessment {
            score,
            grade: Grade::C,
            metrics: BTreeMap::new(),
            issues: Vec::new(),
        }
    }

    fn all(score: f64) -> BTreeMap<SourceKind, QualityAssessment> {
        SourceKind::ALL.iter().map(|&k| (k, qa(score))).collect()
    }

    fn sum(r: &AllocationResult) -> f64 {
        r.allocations.values().map(|a| a.dynamic_weight).sum()
    }

    #[test]
    fn neutral_quality_is_identity() {
        let a = DynamicWeightAllocator::default();
        assert!((a.multiplier(0.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn multiplier_is_clamped() {
        let a = DynamicWeightAllocator::default();
        assert_eq!(a.multiplier(0.0), 0.5);
        assert_eq!(a.multiplier(1.0), 1.5);
        assert_eq!(a.multiplier(f64::NAN), 0.5);
        assert_eq!(a.multiplier(42.0), 1.5);
    }

    #[test]
    fn empty_assessments_return_base() {
        let a = DynamicWeightAllocator::default();
        let base = BaseWeights::default();
        let r = a.allocate(&base, &BTreeMap::new());
        for k in SourceKind::ALL {
            let al = r.allocations[&k];
            assert_eq!(al.dynamic_weight, al.base_weight);
            assert_eq!(al.change_pct, 0.0);
        }
        assert!((sum(&r) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_quality_returns_base() {
        let a = DynamicWeightAllocator::default();
        let base = BaseWeights::default();
        for q in [0.0, 0.3, 0.9] {
            let r = a.allocate(&base, &all(q));
            for k in SourceKind::ALL {
                assert_eq!(r.allocations[&k].dynamic_weight, base.get(k));
            }
        }
    }

    #[test]
    fn better_source_gains_and_others_shift() {
        let a = DynamicWeightAllocator::default();
        let base = BaseWeights::default();
        let mut qs = all(0.5);
        qs.insert(SourceKind::News, qa(0.9));
        let r = a.allocate(&base, &qs);

        assert!(r.allocations[&SourceKind::News].change_pct > 0.0);
        // untouched sources keep multiplier 1.0 but lose share through normalization
        let social = r.allocations[&SourceKind::Social];
        assert!((social.multiplier - 1.0).abs() < 1e-12);
        assert!(social.dynamic_weight < social.base_weight);
        assert!((sum(&r) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn change_pct_matches_definition() {
        let a = DynamicWeightAllocator::default();
        let base = BaseWeights::default();
        let mut qs = all(0.4);
        qs.insert(SourceKind::Events, qa(1.0));
        let r = a.allocate(&base, &qs);
        for al in r.allocations.values() {
            let expected = (al.dynamic_weight - al.base_weight) / al.base_weight * 100.0;
            assert!((al.change_pct - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn absent_source_is_fully_redistributed() {
        let a = DynamicWeightAllocator::default();
        let base = BaseWeights::default();
        let mut qs = all(0.5);
        qs.insert(SourceKind::ProfessionalApi, QualityAssessment::unavailable());
        let r = a.allocate(&base, &qs);

        let pro = r.allocations[&SourceKind::ProfessionalApi];
        assert_eq!(pro.dynamic_weight, 0.0);
        assert_eq!(pro.change_pct, -100.0);
        // audit still shows the floor multiplier
        assert_eq!(pro.multiplier, 0.5);

        // present sources share the freed 0.20 in proportion to their base weights
        let present = 1.0 - base.professional_api;
        for k in SourceKind::ALL.iter().filter(|k| **k != SourceKind::ProfessionalApi) {
            let al = r.allocations[k];
            assert!((al.dynamic_weight - al.base_weight / present).abs() < 1e-12, "{k}");
        }
        assert!((sum(&r) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_entry_counts_as_absent() {
        let a = DynamicWeightAllocator::default();
        let base = BaseWeights::default();
        let mut qs = all(0.9);
        qs.remove(&SourceKind::Momentum);
        let r = a.allocate(&base, &qs);
        assert_eq!(r.dynamic_weight(SourceKind::Momentum), 0.0);
        assert!(r.dynamic_weight(SourceKind::News) > base.news);
        assert!((sum(&r) - 1.0).abs() < 1e-9);
    }
}

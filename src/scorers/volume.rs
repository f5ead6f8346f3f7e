//! Volume-weighted news score with an entropy-based unanimity factor.
//!
//! `score = average_sentiment * min(n / 10, 1) * (0.7 + 0.3 * unanimity)`

use crate::sanitize;
use crate::source::{CategoryCounts, NewsSummary};

/// Sample count at which the volume factor saturates.
const VOLUME_SATURATION: f64 = 10.0;

/// `1 - H / ln(3)` over the positive/neutral/negative histogram.
/// 1.0 = every sample in one category, 0.0 = uniform spread (or no samples).
pub fn unanimity(c: &CategoryCounts) -> f64 {
    let counts = [
        sanitize::count("categories.positive", c.positive),
        sanitize::count("categories.neutral", c.neutral),
        sanitize::count("categories.negative", c.negative),
    ];
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let entropy: f64 = counts
        .iter()
        .filter(|&&n| n > 0)
        .map(|&n| {
            let p = n as f64 / total as f64;
            -p * p.ln()
        })
        .sum();
    (1.0 - entropy / 3f64.ln()).clamp(0.0, 1.0)
}

pub fn volume_weighted_score(s: &NewsSummary) -> f64 {
    let n = sanitize::count("news.sample_count", s.sample_count);
    if n == 0 {
        return 0.0;
    }
    let avg = sanitize::sentiment("news.average_sentiment", s.average_sentiment);
    let volume = (n as f64 / VOLUME_SATURATION).min(1.0);
    avg * volume * (0.7 + 0.3 * unanimity(&s.categories))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(n: i64, avg: f64, c: CategoryCounts) -> NewsSummary {
        NewsSummary {
            sample_count: n,
            average_sentiment: avg,
            method_diversity: 1,
            classifier_confidence: None,
            categories: c,
        }
    }

    #[test]
    fn unanimity_extremes() {
        assert!((unanimity(&CategoryCounts::new(10, 0, 0)) - 1.0).abs() < 1e-12);
        assert!(unanimity(&CategoryCounts::new(5, 5, 5)).abs() < 1e-12);
        assert_eq!(unanimity(&CategoryCounts::default()), 0.0);
    }

    #[test]
    fn unanimous_signal_is_reinforced() {
        let agreed = volume_weighted_score(&summary(20, 0.5, CategoryCounts::new(20, 0, 0)));
        let split = volume_weighted_score(&summary(20, 0.5, CategoryCounts::new(8, 6, 6)));
        assert!((agreed - 0.5).abs() < 1e-12);
        assert!(split < agreed);
        assert!(split >= 0.5 * 0.7 - 1e-12);
    }

    #[test]
    fn low_volume_is_discounted() {
        let s = volume_weighted_score(&summary(5, 0.4, CategoryCounts::new(5, 0, 0)));
        assert!((s - 0.2).abs() < 1e-12);
    }

    #[test]
    fn zero_volume_and_all_neutral() {
        assert_eq!(volume_weighted_score(&summary(0, 0.9, CategoryCounts::default())), 0.0);
        let neutral = volume_weighted_score(&summary(12, 0.0, CategoryCounts::new(0, 12, 0)));
        assert_eq!(neutral, 0.0);
    }
}

//! Input sanitation for upstream summaries.
//!
//! Upstream collaborators occasionally hand us negative counts, sentiment
//! outside `[-1, 1]` or NaN. None of that may fail a fusion call: values are
//! clamped to the nearest valid bound (non-finite → 0), a warning is logged
//! and `fusion_input_clamped_total{field=...}` is bumped.

use metrics::counter;
use tracing::warn;

/// Clamp a sentiment value into `[-1.0, 1.0]`.
pub fn sentiment(field: &'static str, x: f64) -> f64 {
    bounded(field, x, -1.0, 1.0)
}

/// Clamp a probability/confidence into `[0.0, 1.0]`.
pub fn unit(field: &'static str, x: f64) -> f64 {
    bounded(field, x, 0.0, 1.0)
}

/// Non-negative count. Negative values become 0.
pub fn count(field: &'static str, n: i64) -> u64 {
    if n < 0 {
        report(field, n as f64, 0.0);
        0
    } else {
        n as u64
    }
}

/// Clamp into `[lo, hi]`, mapping non-finite input to `0.0` (or the bound nearest to it).
pub fn bounded(field: &'static str, x: f64, lo: f64, hi: f64) -> f64 {
    if !x.is_finite() {
        let fallback = 0.0f64.clamp(lo, hi);
        report(field, x, fallback);
        return fallback;
    }
    let c = x.clamp(lo, hi);
    if c != x {
        report(field, x, c);
    }
    c
}

fn report(field: &'static str, raw: f64, clamped: f64) {
    warn!(target: "fusion", field, raw, clamped, "malformed input clamped");
    counter!("fusion_input_clamped_total", "field" => field).increment(1);
}

//! Moving-average momentum over the trailing sentiment history.

use crate::sanitize;

pub const SHORT_WINDOW: usize = 3;
pub const LONG_WINDOW: usize = 7;
const MAX_MOMENTUM: f64 = 0.5;

/// `clamp(2 * (ma3 - ma7), -0.5, 0.5)`; `series` is oldest first.
/// Fewer than three observations yield 0. With fewer than seven, the long
/// average uses whatever is available.
pub fn momentum_score(series: &[f64]) -> f64 {
    if series.len() < SHORT_WINDOW {
        return 0.0;
    }
    let short = tail_mean(series, SHORT_WINDOW);
    let long = tail_mean(series, LONG_WINDOW);
    (2.0 * (short - long)).clamp(-MAX_MOMENTUM, MAX_MOMENTUM)
}

fn tail_mean(series: &[f64], window: usize) -> f64 {
    let tail = &series[series.len().saturating_sub(window)..];
    let sum: f64 = tail
        .iter()
        .map(|&x| sanitize::sentiment("sentiment_history", x))
        .sum();
    sum / tail.len() as f64
}

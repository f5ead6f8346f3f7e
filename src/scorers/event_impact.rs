//! # Event impact
//! Converts detected corporate events into one decayed, relevance-weighted
//! scalar in `[-1, 1]`.
//!
//! Per event: `base_impact * daily_decay^days * context_modifier * relevance`.
//! Repeated reports of one event (same kind and timestamp) count once, both
//! here and in quality/confidence.
//! Contributions are ranked by magnitude; the first `full_weight_events`
//! count fully, the k-th one beyond that is scaled by `1 / (k + 1)` so a
//! burst of small headlines cannot swamp the score.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::warn;

use crate::config::EventTable;
use crate::sanitize;
use crate::source::Event;

const SECS_PER_DAY: f64 = 86_400.0;

/// Number of distinct events (same kind at the same instant counts once).
pub fn distinct_count(events: &[Event]) -> usize {
    events
        .iter()
        .map(|e| (e.kind, e.timestamp))
        .collect::<BTreeSet<_>>()
        .len()
}

#[derive(Debug, Clone, Copy)]
pub struct EventImpactScorer<'a> {
    table: &'a EventTable,
}

impl<'a> EventImpactScorer<'a> {
    pub fn new(table: &'a EventTable) -> Self {
        Self { table }
    }

    /// Impact of a single event as seen at `as_of`, before diminishing returns.
    pub fn contribution(&self, event: &Event, as_of: DateTime<Utc>) -> f64 {
        let profile = self.table.profile(event.kind);
        let days = days_since(event.timestamp, as_of);
        let modifier = sanitize::bounded("event.context_modifier", event.context_modifier, -2.0, 2.0);
        profile.base_impact
            * profile.daily_decay.powf(days)
            * modifier
            * self.table.relevance.get(event.relevance)
    }

    pub fn score(&self, events: &[Event], as_of: DateTime<Utc>) -> f64 {
        if events.is_empty() {
            return 0.0;
        }
        // Same kind at the same instant is one event; the first report wins.
        let mut seen = BTreeSet::new();
        let mut contributions: Vec<f64> = events
            .iter()
            .filter(|e| seen.insert((e.kind, e.timestamp)))
            .map(|e| self.contribution(e, as_of))
            .collect();
        contributions.sort_by(|a, b| b.abs().total_cmp(&a.abs()));

        let full = self.table.full_weight_events;
        let total: f64 = contributions
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i < full {
                    *c
                } else {
                    let k = (i - full + 1) as f64;
                    c / (k + 1.0)
                }
            })
            .sum();
        total.clamp(-1.0, 1.0)
    }
}

/// Fractional days between `ts` and `as_of`. Future timestamps count as 0.
fn days_since(ts: DateTime<Utc>, as_of: DateTime<Utc>) -> f64 {
    let secs = (as_of - ts).num_milliseconds() as f64 / 1000.0;
    if secs < 0.0 {
        warn!(target: "fusion", event_ts = %ts, %as_of, "event timestamp in the future; treating as fresh");
        return 0.0;
    }
    secs / SECS_PER_DAY
}

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Fails if another recorder is already installed.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        // Descriptions emitted before the recorder existed went nowhere.
        describe();
        Ok(Self { handle })
    }

    /// Prometheus exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// One-time metrics registration (so series show up in the exposition).
pub(crate) fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(describe);
}

fn describe() {
    describe_counter!("fusion_runs_total", "Completed fusion calls.");
    describe_counter!(
        "fusion_input_clamped_total",
        "Malformed upstream values clamped to a valid bound."
    );
    describe_gauge!(
        "fusion_sources_unavailable",
        "Sources absent in the most recent fusion."
    );
    describe_histogram!("fusion_confidence", "Confidence of fused results.");
    describe_histogram!("fusion_final_score", "Final fused sentiment score.");
}

pub(crate) fn record_fusion(score: f64, confidence: f64, unavailable: usize) {
    counter!("fusion_runs_total").increment(1);
    gauge!("fusion_sources_unavailable").set(unavailable as f64);
    histogram!("fusion_confidence").record(confidence);
    histogram!("fusion_final_score").record(score);
}

//! `fuse` — Demo entrypoint
//! Reads one `FusionInput` as JSON (file argument or stdin), fuses it with the
//! configured engine and prints the `FusionResult` as pretty JSON.
//!
//! Env:
//!   FUSION_CONFIG_PATH  config file (TOML/JSON), see config/fusion.toml
//!   RUST_LOG            log filter (default `fusion=info,warn`)
//!   FUSION_LOG_JSON=1   JSON log lines
//!   FUSION_METRICS=1    dump Prometheus exposition to stderr after fusing

use anyhow::{Context, Result};
use std::io::Read;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentiment_fusion::{engine_from_env, metrics::Metrics, FusionInput};

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().is_some_and(|v| v == "1")
}

/// Logs go to stderr so stdout stays clean JSON.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fusion=info,warn"));

    if env_flag("FUSION_LOG_JSON") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn read_input(path: Option<String>) -> Result<FusionInput> {
    let raw = match path {
        Some(p) => std::fs::read_to_string(&p).with_context(|| format!("reading input {p}"))?,
        None => {
            let mut s = String::new();
            std::io::stdin()
                .read_to_string(&mut s)
                .context("reading input from stdin")?;
            s
        }
    };
    let mut input: FusionInput = serde_json::from_str(&raw).context("parsing FusionInput JSON")?;
    if input.as_of.is_none() {
        input.as_of = Some(chrono::Utc::now());
    }
    Ok(input)
}

fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = if env_flag("FUSION_METRICS") {
        Some(Metrics::init()?)
    } else {
        None
    };

    let engine = engine_from_env()?;
    let input = read_input(std::env::args().nth(1))?;
    let result = engine.fuse(&input);

    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(m) = metrics {
        eprintln!("{}", m.render());
    }
    Ok(())
}

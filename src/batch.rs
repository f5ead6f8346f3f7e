//! Multi-symbol fusion on the tokio runtime.
//!
//! The engine itself is synchronous and pure; this module is where the I/O
//! side plugs in. A [`SignalProvider`] (news/forum/professional collectors,
//! injected by the caller) produces one `FusionInput` per symbol, each symbol
//! runs in its own task with its own fetch timeout, and a failing symbol
//! never takes the others down.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::engine::{FusionEngine, FusionInput};
use crate::result::FusionResult;

/// Upstream collaborator that assembles the per-source summaries for a symbol.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<FusionInput>;
    fn name(&self) -> &'static str;
}

#[derive(Debug)]
pub struct SymbolFusion {
    pub symbol: String,
    pub outcome: Result<FusionResult>,
}

/// Fetch + fuse every symbol concurrently. Output order matches `symbols`.
pub async fn fuse_symbols(
    engine: Arc<FusionEngine>,
    provider: Arc<dyn SignalProvider>,
    symbols: &[String],
    fetch_timeout: Duration,
) -> Vec<SymbolFusion> {
    let mut set = JoinSet::new();
    for (idx, symbol) in symbols.iter().cloned().enumerate() {
        let engine = engine.clone();
        let provider = provider.clone();
        set.spawn(async move {
            let outcome = match tokio::time::timeout(fetch_timeout, provider.fetch(&symbol)).await {
                Ok(Ok(input)) => Ok(engine.fuse(&input)),
                Ok(Err(e)) => Err(e.context(format!("{} fetch failed for {symbol}", provider.name()))),
                Err(_) => Err(anyhow!(
                    "{} fetch timed out for {symbol} after {}ms",
                    provider.name(),
                    fetch_timeout.as_millis()
                )),
            };
            (idx, SymbolFusion { symbol, outcome })
        });
    }

    let mut slots: Vec<Option<SymbolFusion>> = symbols.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, res)) => {
                if let Err(e) = &res.outcome {
                    warn!(target: "fusion", symbol = %res.symbol, "symbol skipped: {e:#}");
                }
                slots[idx] = Some(res);
            }
            Err(e) => warn!(target: "fusion", "fusion task aborted: {e}"),
        }
    }

    let out: Vec<SymbolFusion> = slots
        .into_iter()
        .zip(symbols)
        .map(|(slot, symbol)| {
            slot.unwrap_or_else(|| SymbolFusion {
                symbol: symbol.clone(),
                outcome: Err(anyhow!("fusion task for {symbol} did not complete")),
            })
        })
        .collect();

    let ok = out.iter().filter(|s| s.outcome.is_ok()).count();
    info!(target: "fusion", total = out.len(), ok, provider = provider.name(), "batch fusion finished");
    out
}

/// Fuse already-collected inputs on the blocking pool.
pub async fn fuse_many(
    engine: Arc<FusionEngine>,
    inputs: Vec<(String, FusionInput)>,
) -> Result<Vec<(String, FusionResult)>> {
    tokio::task::spawn_blocking(move || {
        inputs
            .into_iter()
            .map(|(symbol, input)| {
                let r = engine.fuse(&input);
                (symbol, r)
            })
            .collect()
    })
    .await
    .context("fusion worker panicked")
}

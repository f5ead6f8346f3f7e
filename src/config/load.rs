// src/config/load.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::FusionConfig;

pub const ENV_CONFIG_PATH: &str = "FUSION_CONFIG_PATH";

const DEFAULT_TOML: &str = "config/fusion.toml";
const DEFAULT_JSON: &str = "config/fusion.json";

/// Load and validate a config from an explicit path. Supports TOML or JSON.
pub fn load_from(path: &Path) -> Result<FusionConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading fusion config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing fusion config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid fusion config {}", path.display()))?;
    info!(target: "fusion", path = %path.display(), "fusion config loaded");
    Ok(cfg)
}

/// Load config using env var + fallbacks:
/// 1) $FUSION_CONFIG_PATH (must exist)
/// 2) config/fusion.toml
/// 3) config/fusion.json
/// 4) built-in defaults
pub fn load_default() -> Result<FusionConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_TOML);
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON);
    if json_p.exists() {
        return load_from(&json_p);
    }
    Ok(FusionConfig::default())
}

impl FusionConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        load_from(path)
    }

    pub fn load_default() -> Result<Self> {
        load_default()
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<FusionConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).map_err(Into::into);
    }
    if hint_ext == "toml" {
        return toml::from_str(s).map_err(Into::into);
    }
    // Unknown extension: JSON first (a TOML parser would choke on `{`), then TOML.
    match serde_json::from_str::<FusionConfig>(s) {
        Ok(cfg) => Ok(cfg),
        Err(json_err) => toml::from_str(s)
            .map_err(|toml_err| anyhow!("unsupported config format (json: {json_err}; toml: {toml_err})")),
    }
}

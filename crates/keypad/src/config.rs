//! Keypad controller configuration.
//!
//! §6 of the specification names `CENCON_CONFIG`/`CENCON_DB`/`PWRCON_CONFIG`
//! but is silent on the keypad's own environment variable — configuration
//! loading is explicitly out of scope beyond "the schemas enumerated"
//! (§1). This implementation resolves that silence, consistent with the
//! other two services, by introducing `KEYPAD_CONFIG` pointing at a single
//! JSON document carrying this service's own secret, the peer's base URL,
//! and the peer's secret (recorded in DESIGN.md).

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Process-level configuration, parsed from CLI args/env vars.
#[derive(Debug, Clone, clap::Parser)]
pub struct KeypadArgs {
    /// Path to the JSON configuration document.
    #[arg(long, env = "KEYPAD_CONFIG")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawKeypadFileConfig {
    host: String,
    port: u16,
    authorisation_key: String,
    central_base_url: String,
    central_authorisation_key: String,
    #[serde(default)]
    outbound_timeout_secs: Option<u64>,
}

/// Fully parsed keypad-controller configuration.
#[derive(Debug, Clone)]
pub struct KeypadFileConfig {
    pub host: String,
    pub port: u16,
    pub authorisation_key: String,
    pub central_base_url: String,
    pub central_authorisation_key: String,
    pub outbound_timeout: Duration,
}

/// Load the configuration document. Any parse or schema error is fatal at
/// boot, per §7.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<KeypadFileConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw: RawKeypadFileConfig = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;

    Ok(KeypadFileConfig {
        host: raw.host,
        port: raw.port,
        authorisation_key: raw.authorisation_key,
        central_base_url: raw.central_base_url,
        central_authorisation_key: raw.central_authorisation_key,
        outbound_timeout: Duration::from_secs(raw.outbound_timeout_secs.unwrap_or(3)),
    })
}

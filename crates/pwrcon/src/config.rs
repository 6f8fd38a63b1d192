//! Power console configuration.
//!
//! §6 names `PWRCON_CONFIG` but, like the keypad's own config path, is
//! silent on its schema — the console's own configuration parsing is
//! explicitly out of scope (§1) beyond the schemas §6 enumerates. This
//! document carries the two peers' base URLs/secrets and the poll
//! cadence (recorded in DESIGN.md).

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, clap::Parser)]
pub struct PwrconArgs {
    /// Path to the JSON configuration document.
    #[arg(long, env = "PWRCON_CONFIG")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPwrconFileConfig {
    central_base_url: String,
    central_authorisation_key: String,
    keypad_base_url: String,
    keypad_authorisation_key: String,
    #[serde(default)]
    poll_interval_secs: Option<u64>,
    #[serde(default)]
    outbound_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct PwrconFileConfig {
    pub central_base_url: String,
    pub central_authorisation_key: String,
    pub keypad_base_url: String,
    pub keypad_authorisation_key: String,
    pub poll_interval: Duration,
    pub outbound_timeout: Duration,
}

/// Load the configuration document. Any parse or schema error is fatal at
/// boot, per §7.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<PwrconFileConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw: RawPwrconFileConfig = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;

    Ok(PwrconFileConfig {
        central_base_url: raw.central_base_url,
        central_authorisation_key: raw.central_authorisation_key,
        keypad_base_url: raw.keypad_base_url,
        keypad_authorisation_key: raw.keypad_authorisation_key,
        poll_interval: Duration::from_secs(raw.poll_interval_secs.unwrap_or(5)),
        outbound_timeout: Duration::from_secs(raw.outbound_timeout_secs.unwrap_or(3)),
    })
}

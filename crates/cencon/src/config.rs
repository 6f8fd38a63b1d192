//! Central controller configuration: the `clap`-parsed process arguments
//! (§6 environment variables) and the JSON configuration file schemas for
//! device types, devices, and failed-attempt responses.
//!
//! The distilled spec treats "device types", "devices", and "failed-attempt
//! responses" as three separate configuration schemas (§6) without saying
//! how they are split across files. This implementation resolves that by
//! having `CENCON_CONFIG` point at one JSON document carrying all three
//! plus the service's own host/port/secret/keypad-peer settings — recorded
//! as an Open Question resolution in DESIGN.md.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Process-level configuration, parsed from CLI args/env vars.
#[derive(Debug, Clone, clap::Parser)]
pub struct CenconArgs {
    /// Path to the JSON configuration document (device types, devices,
    /// failed-attempt responses, host/port/secrets).
    #[arg(long, env = "CENCON_CONFIG")]
    pub config: PathBuf,

    /// Path to the SQLite key-code database.
    #[arg(long, env = "CENCON_DB")]
    pub db: PathBuf,
}

/// The fixed GPIO pin-label enumeration (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum PinLabel {
    GPIO05,
    GPIO06,
    GPIO14,
    GPIO15,
    GPIO18,
    GPIO23,
    GPIO24,
    GPIO25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hardware {
    Sensor,
    Siren,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTypeConfig {
    pub name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinConfig {
    pub io_pin: PinLabel,
    pub identifier: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    pub device_type: String,
    pub hardware: Hardware,
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub pins: Vec<PinConfig>,
    pub trigger_grace_period_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawActionParam {
    key: String,
    value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    action_type: String,
    #[serde(default)]
    parameters: Vec<RawActionParam>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFailedAttemptEntry {
    attempt_no: u32,
    actions: Vec<RawAction>,
}

/// A single side effect of a consecutive-failed-attempt count (§4.5.1).
#[derive(Debug, Clone, PartialEq)]
pub enum FailedAttemptAction {
    DisableKeyPad { lock_time_secs: i64 },
    TriggerAlarm,
    ResetAttemptAccount,
}

impl TryFrom<RawAction> for FailedAttemptAction {
    type Error = anyhow::Error;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        match raw.action_type.as_str() {
            "disableKeyPad" => {
                let lock_time_secs = raw
                    .parameters
                    .iter()
                    .find(|p| p.key == "lockTime")
                    .and_then(|p| p.value.as_i64())
                    .ok_or_else(|| anyhow::anyhow!("disableKeyPad action missing lockTime"))?;
                Ok(Self::DisableKeyPad { lock_time_secs })
            }
            "triggerAlarm" => Ok(Self::TriggerAlarm),
            "resetAttemptAccount" => Ok(Self::ResetAttemptAccount),
            other => anyhow::bail!("unknown failed-attempt actionType: {other}"),
        }
    }
}

/// `attempt_no -> actions`, loaded once and immutable at runtime.
#[derive(Debug, Clone, Default)]
pub struct FailedAttemptResponses(pub HashMap<u32, Vec<FailedAttemptAction>>);

impl FailedAttemptResponses {
    pub fn get(&self, attempt_no: u32) -> Option<&[FailedAttemptAction]> {
        self.0.get(&attempt_no).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCenconFileConfig {
    host: String,
    port: u16,
    authorisation_key: String,
    keypad_base_url: String,
    keypad_authorisation_key: String,
    #[serde(default)]
    outbound_timeout_secs: Option<u64>,
    device_types: Vec<DeviceTypeConfig>,
    devices: Vec<DeviceConfig>,
    #[serde(default)]
    failed_attempt_responses: Vec<RawFailedAttemptEntry>,
}

/// Fully parsed and validated central-controller configuration.
#[derive(Debug, Clone)]
pub struct CenconFileConfig {
    pub host: String,
    pub port: u16,
    pub authorisation_key: String,
    pub keypad_base_url: String,
    pub keypad_authorisation_key: String,
    pub outbound_timeout: Duration,
    pub device_types: Vec<DeviceTypeConfig>,
    pub devices: Vec<DeviceConfig>,
    pub failed_attempt_responses: FailedAttemptResponses,
}

/// Load and validate the configuration document. Any parse or schema error
/// is fatal at boot, per §7.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<CenconFileConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw: RawCenconFileConfig = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;

    let mut responses = HashMap::new();
    for entry in raw.failed_attempt_responses {
        anyhow::ensure!(
            (1..=100).contains(&entry.attempt_no),
            "attemptNo {} out of range 1-100",
            entry.attempt_no
        );
        let actions = entry
            .actions
            .into_iter()
            .map(FailedAttemptAction::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        responses.insert(entry.attempt_no, actions);
    }

    Ok(CenconFileConfig {
        host: raw.host,
        port: raw.port,
        authorisation_key: raw.authorisation_key,
        keypad_base_url: raw.keypad_base_url,
        keypad_authorisation_key: raw.keypad_authorisation_key,
        outbound_timeout: Duration::from_secs(raw.outbound_timeout_secs.unwrap_or(3)),
        device_types: raw.device_types,
        devices: raw.devices,
        failed_attempt_responses: FailedAttemptResponses(responses),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_attempt_no_out_of_range() -> anyhow::Result<()> {
        let json = serde_json::json!({
            "host": "127.0.0.1", "port": 8080,
            "authorisationKey": "k", "keypadBaseUrl": "http://x",
            "keypadAuthorisationKey": "k2",
            "deviceTypes": [], "devices": [],
            "failedAttemptResponses": [{"attemptNo": 101, "actions": []}],
        });
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, json.to_string())?;
        assert!(load_config(&path).is_err());
        Ok(())
    }

    #[test]
    fn parses_disable_keypad_action() -> anyhow::Result<()> {
        let json = serde_json::json!({
            "host": "127.0.0.1", "port": 8080,
            "authorisationKey": "k", "keypadBaseUrl": "http://x",
            "keypadAuthorisationKey": "k2",
            "deviceTypes": [], "devices": [],
            "failedAttemptResponses": [{
                "attemptNo": 3,
                "actions": [{"actionType": "disableKeyPad", "parameters": [{"key": "lockTime", "value": 30}]}],
            }],
        });
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, json.to_string())?;
        let cfg = load_config(&path)?;
        assert_eq!(
            cfg.failed_attempt_responses.get(3),
            Some(&[FailedAttemptAction::DisableKeyPad { lock_time_secs: 30 }][..])
        );
        Ok(())
    }
}

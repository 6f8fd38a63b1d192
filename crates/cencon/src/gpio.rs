//! Emulated GPIO backend (§6): pin state lives in a JSON file
//! `{GPIOnn: {State: "high"|"low"}}`, rescanned when its content hash
//! changes so externally-simulated sensor input is picked up without a
//! dedicated filesystem watcher thread (which would break the
//! single-threaded cooperative model of §5).

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::PinLabel;

pub trait GpioBackend: Send {
    fn read(&mut self, pin: PinLabel) -> bool;
    fn write(&mut self, pin: PinLabel, high: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireState {
    High,
    Low,
}

impl From<bool> for WireState {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<WireState> for bool {
    fn from(state: WireState) -> Self {
        matches!(state, WireState::High)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PinFileEntry {
    #[serde(rename = "State")]
    state: WireState,
}

/// Emulated GPIO backend reading/writing the pin-state JSON file.
pub struct EmulatedGpio {
    path: PathBuf,
    last_hash: Option<[u8; 32]>,
    state: HashMap<PinLabel, bool>,
}

impl EmulatedGpio {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let mut gpio = Self { path, last_hash: None, state: HashMap::new() };
        gpio.rescan_if_changed()?;
        Ok(gpio)
    }

    fn rescan_if_changed(&mut self) -> anyhow::Result<()> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Ok(()), // file absent: treat as all-low, unchanged
        };
        let hash: [u8; 32] = Sha256::digest(&bytes).into();
        if self.last_hash == Some(hash) {
            return Ok(());
        }
        let parsed: HashMap<String, PinFileEntry> = serde_json::from_slice(&bytes)?;
        self.state = parsed
            .into_iter()
            .filter_map(|(label, entry)| pin_label_from_str(&label).map(|p| (p, entry.state.into())))
            .collect();
        self.last_hash = Some(hash);
        Ok(())
    }

    fn persist(&mut self) {
        let map: HashMap<&'static str, PinFileEntry> = self
            .state
            .iter()
            .map(|(label, high)| (pin_label_str(*label), PinFileEntry { state: (*high).into() }))
            .collect();
        if let Ok(bytes) = serde_json::to_vec_pretty(&map) {
            if std::fs::write(&self.path, &bytes).is_ok() {
                let hash: [u8; 32] = Sha256::digest(&bytes).into();
                self.last_hash = Some(hash);
            }
        }
    }
}

impl GpioBackend for EmulatedGpio {
    fn read(&mut self, pin: PinLabel) -> bool {
        let _ = self.rescan_if_changed();
        self.state.get(&pin).copied().unwrap_or(false)
    }

    fn write(&mut self, pin: PinLabel, high: bool) {
        self.state.insert(pin, high);
        self.persist();
    }
}

fn pin_label_str(pin: PinLabel) -> &'static str {
    match pin {
        PinLabel::GPIO05 => "GPIO05",
        PinLabel::GPIO06 => "GPIO06",
        PinLabel::GPIO14 => "GPIO14",
        PinLabel::GPIO15 => "GPIO15",
        PinLabel::GPIO18 => "GPIO18",
        PinLabel::GPIO23 => "GPIO23",
        PinLabel::GPIO24 => "GPIO24",
        PinLabel::GPIO25 => "GPIO25",
    }
}

fn pin_label_from_str(s: &str) -> Option<PinLabel> {
    Some(match s {
        "GPIO05" => PinLabel::GPIO05,
        "GPIO06" => PinLabel::GPIO06,
        "GPIO14" => PinLabel::GPIO14,
        "GPIO15" => PinLabel::GPIO15,
        "GPIO18" => PinLabel::GPIO18,
        "GPIO23" => PinLabel::GPIO23,
        "GPIO24" => PinLabel::GPIO24,
        "GPIO25" => PinLabel::GPIO25,
        _ => return None,
    })
}

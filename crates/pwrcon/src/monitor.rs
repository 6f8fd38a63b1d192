//! Operator monitoring poll: health + console-log snapshots from both
//! peers, printed as a summary. The drawing of an actual operator window
//! is out of scope (§1) — this is the ambient polling loop that would
//! feed one.

use shedcommon::auth::AUTH_HEADER;
use shedcommon::wire::{HealthStatus, RequestLogsResponse};

pub struct Peer {
    pub name: &'static str,
    pub base_url: String,
    pub authorisation_key: String,
    pub health_path: &'static str,
}

pub struct PeerSnapshot {
    pub name: &'static str,
    pub health: anyhow::Result<String>,
    pub new_log_count: anyhow::Result<usize>,
}

pub struct Monitor {
    client: reqwest::Client,
    central: Peer,
    keypad: Peer,
    central_last_timestamp: f64,
    keypad_last_timestamp: f64,
}

impl Monitor {
    pub fn new(client: reqwest::Client, central: Peer, keypad: Peer) -> Self {
        Self { client, central, keypad, central_last_timestamp: 0.0, keypad_last_timestamp: 0.0 }
    }

    async fn fetch_health(&self, peer: &Peer) -> anyhow::Result<String> {
        let url = format!("{}{}", peer.base_url, peer.health_path);
        let resp = self.client.get(&url).header(AUTH_HEADER, &peer.authorisation_key).send().await?;
        let status: HealthStatus = resp.error_for_status()?.json().await?;
        Ok(status.health)
    }

    async fn fetch_new_logs(&self, peer: &Peer, since: f64) -> anyhow::Result<RequestLogsResponse> {
        let url = format!("{}/retrieveConsoleLogs", peer.base_url);
        let resp = self
            .client
            .post(&url)
            .header(AUTH_HEADER, &peer.authorisation_key)
            .json(&serde_json::json!({ "startTimestamp": since }))
            .send()
            .await?;
        Ok(resp.error_for_status()?.json().await?)
    }

    /// One monitoring pass: fetch health + new logs from both peers.
    pub async fn poll_once(&mut self) -> Vec<PeerSnapshot> {
        let central_health = self.fetch_health(&self.central).await;
        let keypad_health = self.fetch_health(&self.keypad).await;

        let central_logs = self.fetch_new_logs(&self.central, self.central_last_timestamp).await;
        let keypad_logs = self.fetch_new_logs(&self.keypad, self.keypad_last_timestamp).await;

        let central_new_log_count = central_logs.map(|r| {
            self.central_last_timestamp = r.last_timestamp.max(self.central_last_timestamp);
            r.entries.len()
        });
        let keypad_new_log_count = keypad_logs.map(|r| {
            self.keypad_last_timestamp = r.last_timestamp.max(self.keypad_last_timestamp);
            r.entries.len()
        });

        vec![
            PeerSnapshot { name: self.central.name, health: central_health, new_log_count: central_new_log_count },
            PeerSnapshot { name: self.keypad.name, health: keypad_health, new_log_count: keypad_new_log_count },
        ]
    }
}

/// Log each peer snapshot at the level its outcome deserves.
pub fn report(snapshots: &[PeerSnapshot]) {
    for snapshot in snapshots {
        match (&snapshot.health, &snapshot.new_log_count) {
            (Ok(health), Ok(count)) => {
                tracing::info!(peer = snapshot.name, health, new_logs = count, "peer reachable");
            }
            (health, logs) => {
                tracing::warn!(
                    peer = snapshot.name,
                    health = ?health.as_ref().err().map(|e| e.to_string()),
                    logs = ?logs.as_ref().err().map(|e| e.to_string()),
                    "peer unreachable or returned an error"
                );
            }
        }
    }
}

//! Ties the panel state machine, the digit-entry buffer, and the two
//! outbound calls to the central controller (the reconnect probe and
//! submitted key sequences) into one collaborator, mirroring the shape of
//! the central controller's `StateManager`.

use std::sync::Arc;

use reqwest::StatusCode;
use tokio::sync::Mutex;

use shedcommon::auth::AUTH_HEADER;

use crate::digits::DigitBuffer;
use crate::panel::{Panel, TickOutcome};

pub struct KeypadAgent {
    pub panel: Panel,
    pub digits: DigitBuffer,
    client: reqwest::Client,
    central_base_url: String,
    central_authorisation_key: String,
    probe_unreachable_logged: Mutex<bool>,
}

impl KeypadAgent {
    pub fn new(client: reqwest::Client, central_base_url: String, central_authorisation_key: String) -> Arc<Self> {
        Arc::new(Self {
            panel: Panel::new(),
            digits: DigitBuffer::new(),
            client,
            central_base_url,
            central_authorisation_key,
            probe_unreachable_logged: Mutex::new(false),
        })
    }

    /// One 10 ms panel tick: advance the panel state machine and the
    /// digit-entry timer, issuing whatever outbound call the panel
    /// transition calls for.
    pub async fn tick(self: &Arc<Self>, now: f64) {
        if self.digits.check_timeout(now).await {
            tracing::debug!("key sequence timer expired, buffer cleared");
        }

        match self.panel.tick(now).await {
            TickOutcome::Redrawn(state) => {
                tracing::info!(?state, "panel redrawn");
            }
            TickOutcome::SendReconnectProbe => {
                self.send_reconnect_probe().await;
            }
            TickOutcome::Idle => {}
        }
    }

    /// §4.7: outbound "please respond" probe, sent to the central
    /// controller's `/pleaseRespondToKeypad`.
    async fn send_reconnect_probe(self: &Arc<Self>) {
        let url = format!("{}/pleaseRespondToKeypad", self.central_base_url);
        let result = self.client.post(&url).header(AUTH_HEADER, &self.central_authorisation_key).send().await;

        match result {
            Ok(resp) if resp.status() == StatusCode::OK => {
                tracing::info!("reconnect probe delivered to central controller");
                *self.probe_unreachable_logged.lock().await = false;
            }
            Ok(resp) if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN => {
                tracing::error!(status = %resp.status(), "central controller rejected reconnect probe: configuration error");
            }
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "unexpected reconnect probe response");
            }
            Err(err) => {
                let mut logged = self.probe_unreachable_logged.lock().await;
                if !*logged {
                    tracing::error!(err = %err, "unable to connect to central controller for reconnect probe");
                    *logged = true;
                }
            }
        }
    }

    /// §4.7.1 `GO`: submit the buffered sequence to the central
    /// controller's `/receiveKeyCode`.
    pub async fn press_go(self: &Arc<Self>) {
        let Some(key_sequence) = self.digits.press_go().await else {
            return;
        };
        let url = format!("{}/receiveKeyCode", self.central_base_url);
        let result = self
            .client
            .post(&url)
            .header(AUTH_HEADER, &self.central_authorisation_key)
            .json(&serde_json::json!({ "keySequence": key_sequence }))
            .send()
            .await;

        match result {
            Ok(resp) if resp.status() == StatusCode::OK => {
                tracing::info!("key sequence submitted");
            }
            Ok(resp) if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN => {
                tracing::error!(status = %resp.status(), "central controller rejected key sequence: configuration error");
            }
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "unexpected key-code submission response");
            }
            Err(err) => {
                tracing::error!(err = %err, "unable to connect to central controller for key-code submission");
            }
        }
    }

    pub async fn press_digit(self: &Arc<Self>, digit: char, now: f64) {
        self.digits.press_digit(digit, now).await;
    }

    pub async fn press_reset(self: &Arc<Self>) {
        self.digits.press_reset().await;
    }

    /// Inbound `/receiveCentralControllerPing` (§4.7.2).
    pub async fn receive_central_controller_ping(self: &Arc<Self>) {
        self.panel.receive_ping().await;
    }

    /// Inbound `/receiveKeypadLock` (§4.7.2).
    pub async fn receive_keypad_lock(self: &Arc<Self>, unlock_deadline: i64) {
        self.panel.receive_lock(unlock_deadline).await;
    }

    #[cfg(test)]
    pub async fn panel_state(self: &Arc<Self>) -> crate::panel::PanelState {
        self.panel.current().await
    }
}

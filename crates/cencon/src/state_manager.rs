//! The alarm state machine, failed-attempt response engine, and the two
//! outbound HTTP calls to the keypad (§4.5).

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use tokio::sync::Mutex;

use shedcommon::auth::AUTH_HEADER;
use shedcommon::event::{Event, EventBus, EventKind};

use crate::config::{FailedAttemptAction, FailedAttemptResponses};
use crate::keycode_store::KeyCodeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Deactivated,
    Activated,
    Triggered,
}

struct Inner {
    alarm_state: AlarmState,
    failed_entry_attempts: u32,
    ping_unreachable_logged: bool,
    lock_unreachable_logged: bool,
}

pub struct StateManager {
    inner: Mutex<Inner>,
    keycode_store: KeyCodeStore,
    failed_attempt_responses: FailedAttemptResponses,
    client: reqwest::Client,
    keypad_base_url: String,
    keypad_authorisation_key: String,
}

fn now_secs() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

impl StateManager {
    pub fn new(
        keycode_store: KeyCodeStore,
        failed_attempt_responses: FailedAttemptResponses,
        client: reqwest::Client,
        keypad_base_url: String,
        keypad_authorisation_key: String,
    ) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                alarm_state: AlarmState::Deactivated,
                failed_entry_attempts: 0,
                ping_unreachable_logged: false,
                lock_unreachable_logged: false,
            }),
            keycode_store,
            failed_attempt_responses,
            client,
            keypad_base_url,
            keypad_authorisation_key,
        })
    }

    #[cfg(test)]
    pub async fn alarm_state(&self) -> AlarmState {
        self.inner.lock().await.alarm_state
    }

    #[cfg(test)]
    pub async fn failed_entry_attempts(&self) -> u32 {
        self.inner.lock().await.failed_entry_attempts
    }

    /// Register this component's four event handlers on the bus.
    pub async fn register_handlers(self: &Arc<Self>, bus: &Arc<EventBus>) {
        let sm = Arc::clone(self);
        bus.register(EventKind::KeypadKeyCodeEntered, move |bus, event| {
            let sm = Arc::clone(&sm);
            async move {
                if let Event::KeypadKeyCodeEntered { key_sequence } = event {
                    sm.handle_key_code(&bus, &key_sequence).await;
                }
            }
        })
        .await;

        let sm = Arc::clone(self);
        bus.register(EventKind::SensorDeviceStateChange, move |bus, event| {
            let sm = Arc::clone(&sm);
            async move {
                if let Event::SensorDeviceStateChange { device_name, triggered } = event {
                    sm.handle_sensor_change(&bus, &device_name, triggered).await;
                }
            }
        })
        .await;

        let sm = Arc::clone(self);
        bus.register(EventKind::KeypadApiSendAlivePing, move |bus, event| {
            let sm = Arc::clone(&sm);
            async move {
                if matches!(event, Event::KeypadApiSendAlivePing) {
                    sm.send_alive_ping(&bus).await;
                }
            }
        })
        .await;

        let sm = Arc::clone(self);
        bus.register(EventKind::KeypadApiSendKeypadLock, move |bus, event| {
            let sm = Arc::clone(&sm);
            async move {
                if let Event::KeypadApiSendKeypadLock { lock_time } = event {
                    sm.send_keypad_lock(&bus, lock_time).await;
                }
            }
        })
        .await;
    }

    /// §4.5.1 — key-code handling.
    async fn handle_key_code(self: &Arc<Self>, bus: &Arc<EventBus>, key_sequence: &str) {
        let record = self.keycode_store.lookup(key_sequence).await;
        let now = now_secs();

        if record.is_some() {
            let mut inner = self.inner.lock().await;
            inner.failed_entry_attempts = 0;
            let previous = inner.alarm_state;
            match previous {
                AlarmState::Triggered => {
                    inner.alarm_state = AlarmState::Deactivated;
                    drop(inner);
                    bus.queue(Event::DeactivateSiren).await;
                    bus.queue(Event::AlarmDeactivated).await;
                }
                AlarmState::Deactivated => {
                    inner.alarm_state = AlarmState::Activated;
                    drop(inner);
                    bus.queue(Event::AlarmActivated { activation_timestamp: now, no_grace_time: false }).await;
                }
                AlarmState::Activated => {
                    inner.alarm_state = AlarmState::Deactivated;
                    drop(inner);
                    bus.queue(Event::AlarmDeactivated).await;
                }
            }
        } else {
            let attempt_no = {
                let mut inner = self.inner.lock().await;
                inner.failed_entry_attempts += 1;
                inner.failed_entry_attempts
            };
            if let Some(actions) = self.failed_attempt_responses.get(attempt_no) {
                for action in actions.iter().cloned() {
                    self.execute_failed_attempt_action(bus, action, now).await;
                }
            }
        }
    }

    async fn execute_failed_attempt_action(self: &Arc<Self>, bus: &Arc<EventBus>, action: FailedAttemptAction, now: f64) {
        match action {
            FailedAttemptAction::DisableKeyPad { lock_time_secs } => {
                bus.queue(Event::KeypadApiSendKeypadLock { lock_time: now as i64 + lock_time_secs }).await;
            }
            FailedAttemptAction::TriggerAlarm => {
                let mut inner = self.inner.lock().await;
                if inner.alarm_state != AlarmState::Triggered {
                    inner.alarm_state = AlarmState::Triggered;
                    drop(inner);
                    bus.queue(Event::AlarmActivated { activation_timestamp: now, no_grace_time: true }).await;
                    bus.queue(Event::ActivateSiren).await;
                }
            }
            FailedAttemptAction::ResetAttemptAccount => {
                self.inner.lock().await.failed_entry_attempts = 0;
            }
        }
    }

    /// §4.5.2 — sensor handling.
    async fn handle_sensor_change(self: &Arc<Self>, bus: &Arc<EventBus>, device_name: &str, triggered: bool) {
        let mut inner = self.inner.lock().await;
        match inner.alarm_state {
            AlarmState::Deactivated => {
                tracing::debug!(device = device_name, triggered, "sensor change while deactivated, ignoring");
            }
            AlarmState::Triggered => {
                tracing::debug!(device = device_name, triggered, "sensor change while already triggered, ignoring");
            }
            AlarmState::Activated => {
                inner.alarm_state = AlarmState::Triggered;
                drop(inner);
                bus.queue(Event::ActivateSiren).await;
            }
        }
    }

    /// §4.5.3 — outbound `SendAlivePingMsg`.
    async fn send_alive_ping(self: &Arc<Self>, bus: &Arc<EventBus>) {
        let url = format!("{}/receiveCentralControllerPing", self.keypad_base_url);
        let result =
            self.client.post(&url).header(AUTH_HEADER, &self.keypad_authorisation_key).send().await;

        match result {
            Ok(resp) if resp.status() == StatusCode::OK => {
                tracing::info!("alive ping delivered to keypad");
                self.inner.lock().await.ping_unreachable_logged = false;
            }
            Ok(resp) if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN => {
                tracing::error!(status = %resp.status(), "keypad rejected alive ping: configuration error, not retrying");
            }
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "unexpected alive ping response, not retrying");
            }
            Err(err) => {
                let mut inner = self.inner.lock().await;
                if !inner.ping_unreachable_logged {
                    tracing::error!(err = %err, "unable to connect to keypad for alive ping");
                    inner.ping_unreachable_logged = true;
                }
                drop(inner);
                bus.queue(Event::KeypadApiSendAlivePing).await;
            }
        }
    }

    /// §4.5.4 — outbound `SendKeypadLockedMsg`.
    async fn send_keypad_lock(self: &Arc<Self>, bus: &Arc<EventBus>, lock_time: i64) {
        let url = format!("{}/receiveKeypadLock", self.keypad_base_url);
        let result = self
            .client
            .post(&url)
            .header(AUTH_HEADER, &self.keypad_authorisation_key)
            .json(&serde_json::json!({ "lockTime": lock_time }))
            .send()
            .await;

        match result {
            Ok(resp) if resp.status() == StatusCode::OK => {
                tracing::info!(lock_time, "keypad lock delivered");
                self.inner.lock().await.lock_unreachable_logged = false;
            }
            Ok(resp) if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN => {
                tracing::error!(status = %resp.status(), "keypad rejected lock request: configuration error, not retrying");
            }
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "unexpected keypad lock response, not retrying");
            }
            Err(err) => {
                let mut inner = self.inner.lock().await;
                if !inner.lock_unreachable_logged {
                    tracing::error!(err = %err, "unable to connect to keypad for lock request");
                    inner.lock_unreachable_logged = true;
                }
                drop(inner);
                bus.queue(Event::KeypadApiSendKeypadLock { lock_time }).await;
            }
        }
    }

    /// Entry point for the HTTP layer: translate an inbound key sequence
    /// into an event on the bus.
    pub async fn submit_key_code(bus: &Arc<EventBus>, key_sequence: String) {
        bus.queue(Event::KeypadKeyCodeEntered { key_sequence }).await;
    }

    /// Entry point for the HTTP layer: translate an inbound keypad ping
    /// request into an event on the bus.
    pub async fn submit_alive_ping_request(bus: &Arc<EventBus>) {
        bus.queue(Event::KeypadApiSendAlivePing).await;
    }
}

//! The keypad's local panel state machine (§4.7): which drawing surface
//! is visible, and the comms-lost reconnect probe cadence. This machine
//! never drives alarm logic — it only selects a surface and transmits key
//! sequences, mirroring the central controller's `StateManager` in shape
//! (a `Mutex`-guarded `Inner`, driven from exactly one worker loop) but
//! carrying none of the alarm semantics.

use tokio::sync::Mutex;

/// Retry cadence for the comms-lost reconnect probe (§3 invariant).
pub const COMM_LOST_RETRY_INTERVAL_SECS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelState {
    Keypad,
    /// Carries the absolute wall-clock unlock deadline (§3).
    KeypadIsLocked { unlock_deadline: i64 },
    CommunicationsLost,
}

/// What the worker loop should do as a result of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Idle,
    Redrawn(PanelState),
    SendReconnectProbe,
}

struct Inner {
    current: PanelState,
    /// Mirrors the source system's `new_panel`: the surface an inbound
    /// handler wants adopted. Equal to `current` until a handler diverges
    /// it; the tick loop adopts and resyncs it.
    pending: PanelState,
    last_reconnect: f64,
}

pub struct Panel {
    inner: Mutex<Inner>,
}

impl Panel {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                current: PanelState::CommunicationsLost,
                pending: PanelState::CommunicationsLost,
                last_reconnect: 0.0,
            }),
        }
    }

    pub async fn current(&self) -> PanelState {
        self.inner.lock().await.current
    }

    /// §4.7.2 `/receiveCentralControllerPing`: only meaningful while
    /// comms are lost.
    pub async fn receive_ping(&self) {
        let mut inner = self.inner.lock().await;
        if inner.current == PanelState::CommunicationsLost {
            inner.pending = PanelState::Keypad;
        }
    }

    /// §4.7.2 `/receiveKeypadLock`.
    pub async fn receive_lock(&self, unlock_deadline: i64) {
        self.inner.lock().await.pending = PanelState::KeypadIsLocked { unlock_deadline };
    }

    /// One pass of the panel tick (§4.7).
    pub async fn tick(&self, now: f64) -> TickOutcome {
        let mut inner = self.inner.lock().await;

        if inner.pending != inner.current {
            inner.current = inner.pending;
            return TickOutcome::Redrawn(inner.current);
        }

        match inner.current {
            PanelState::KeypadIsLocked { unlock_deadline } if now >= unlock_deadline as f64 => {
                inner.current = PanelState::Keypad;
                inner.pending = PanelState::Keypad;
                TickOutcome::Redrawn(PanelState::Keypad)
            }
            PanelState::CommunicationsLost if now > inner.last_reconnect + COMM_LOST_RETRY_INTERVAL_SECS => {
                inner.last_reconnect = now;
                TickOutcome::SendReconnectProbe
            }
            _ => TickOutcome::Idle,
        }
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

//! Keypad digit-entry buffer (§4.7.1): the local sequence buffer and its
//! 5 s sequence timer. Pure state, no I/O — the outbound `/receiveKeyCode`
//! POST is issued by the caller once `press_go` yields a sequence.

use tokio::sync::Mutex;

const SEQUENCE_TIMER_SECS: f64 = 5.0;

struct Inner {
    buffer: String,
    timer_deadline: Option<f64>,
}

pub struct DigitBuffer {
    inner: Mutex<Inner>,
}

impl DigitBuffer {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner { buffer: String::new(), timer_deadline: None }) }
    }

    /// A digit was pressed locally. Starts the 5 s sequence timer on the
    /// first digit of a new entry.
    pub async fn press_digit(&self, digit: char, now: f64) {
        let mut inner = self.inner.lock().await;
        if inner.buffer.is_empty() {
            inner.timer_deadline = Some(now + SEQUENCE_TIMER_SECS);
        }
        inner.buffer.push(digit);
    }

    /// `Reset` was pressed: clear the buffer without sending.
    pub async fn press_reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.buffer.clear();
        inner.timer_deadline = None;
    }

    /// `GO` was pressed: stop the timer, clear the buffer, and hand back
    /// the sequence to submit. `None` if nothing was entered.
    pub async fn press_go(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        inner.timer_deadline = None;
        if inner.buffer.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut inner.buffer))
    }

    /// Called on every panel tick: if the sequence timer has expired,
    /// clear the buffer (without sending) and report that it happened.
    pub async fn check_timeout(&self, now: f64) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.timer_deadline {
            Some(deadline) if now >= deadline => {
                inner.buffer.clear();
                inner.timer_deadline = None;
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub async fn buffered(&self) -> String {
        self.inner.lock().await.buffer.clone()
    }
}

impl Default for DigitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

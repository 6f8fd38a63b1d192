//! Shared outbound HTTP client construction.
//!
//! Grounded on the teacher's `upstream::client::UpstreamClient`: a bounded
//! timeout on every outbound call, since §5 requires outbound calls from
//! the State Manager / Keypad to be bounded so the worker loop never stalls
//! past its tick cadence indefinitely.

use std::time::Duration;

/// Default bound on outbound HTTP calls (state-manager pings, keypad lock
/// pushes, keypad key-code submissions).
pub const DEFAULT_OUTBOUND_TIMEOUT: Duration = Duration::from_secs(3);

pub fn build_client(timeout: Duration) -> reqwest::Client {
    // Idempotent: returns Err if a provider is already installed, which we ignore.
    let _ = rustls::crypto::ring::default_provider().install_default();
    reqwest::Client::builder().timeout(timeout).build().unwrap_or_else(|_| reqwest::Client::new())
}

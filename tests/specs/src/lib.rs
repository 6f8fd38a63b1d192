// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `cencon` and `keypad-controller` binaries as
//! subprocesses and exercises them over HTTP, mirroring the teacher's
//! `coop-specs` pattern of driving the real binary rather than an
//! in-process router.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Once};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::routing::any;
use axum::Router;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls. Safe to call
/// multiple times — only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

fn workspace_binary(name: &str) -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join(name)
}

pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// Seed a fresh SQLite key-code database with one entry, creating the
/// `KeyCodes` table the same way `cencon::keycode_store` does.
pub async fn seed_keycode_db(path: &Path, key_sequence: &str, is_master_key: bool) -> anyhow::Result<()> {
    let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    sqlx::query("CREATE TABLE IF NOT EXISTS KeyCodes (KeyCode TEXT PRIMARY KEY, IsMasterKey BOOLEAN NOT NULL)")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO KeyCodes (KeyCode, IsMasterKey) VALUES (?1, ?2)")
        .bind(key_sequence)
        .bind(is_master_key)
        .execute(&pool)
        .await?;
    pool.close().await;
    Ok(())
}

/// A running `cencon` process that is killed on drop.
pub struct CenconProcess {
    child: Child,
    port: u16,
    pub authorisation_key: String,
    _dir: tempfile::TempDir,
}

impl CenconProcess {
    /// Start `cencon` with a config wired to the given keypad peer.
    pub async fn start(keypad_base_url: &str, keypad_authorisation_key: &str) -> anyhow::Result<Self> {
        ensure_crypto();
        let dir = tempfile::tempdir()?;
        let port = free_port()?;
        let authorisation_key = "central-test-secret".to_string();
        let db_path = dir.path().join("codes.db");
        seed_keycode_db(&db_path, "1234", false).await?;

        let config = serde_json::json!({
            "host": "127.0.0.1",
            "port": port,
            "authorisationKey": authorisation_key,
            "keypadBaseUrl": keypad_base_url,
            "keypadAuthorisationKey": keypad_authorisation_key,
            "deviceTypes": [],
            "devices": [],
            "failedAttemptResponses": [
                {"attemptNo": 3, "actions": [{"actionType": "disableKeyPad", "parameters": [{"key": "lockTime", "value": 30}]}]},
            ],
        });
        let config_path = dir.path().join("cencon.json");
        std::fs::write(&config_path, config.to_string())?;

        let binary = workspace_binary("cencon");
        anyhow::ensure!(binary.exists(), "cencon binary not found at {}", binary.display());
        let child = Command::new(&binary)
            .env("CENCON_CONFIG", &config_path)
            .env("CENCON_DB", &db_path)
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child, port, authorisation_key, _dir: dir })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        wait_healthy(&self.base_url(), "/_health_status", &self.authorisation_key, timeout).await
    }
}

impl Drop for CenconProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// A running `keypad-controller` process that is killed on drop.
pub struct KeypadProcess {
    child: Child,
    port: u16,
    pub authorisation_key: String,
    _dir: tempfile::TempDir,
}

impl KeypadProcess {
    pub fn start(central_base_url: &str, central_authorisation_key: &str) -> anyhow::Result<Self> {
        ensure_crypto();
        let dir = tempfile::tempdir()?;
        let port = free_port()?;
        let authorisation_key = "keypad-test-secret".to_string();

        let config = serde_json::json!({
            "host": "127.0.0.1",
            "port": port,
            "authorisationKey": authorisation_key,
            "centralBaseUrl": central_base_url,
            "centralAuthorisationKey": central_authorisation_key,
        });
        let config_path = dir.path().join("keypad.json");
        std::fs::write(&config_path, config.to_string())?;

        let binary = workspace_binary("keypad-controller");
        anyhow::ensure!(binary.exists(), "keypad-controller binary not found at {}", binary.display());
        let child = Command::new(&binary)
            .env("KEYPAD_CONFIG", &config_path)
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child, port, authorisation_key, _dir: dir })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        wait_healthy(&self.base_url(), "/_healthStatus", &self.authorisation_key, timeout).await
    }
}

impl Drop for KeypadProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// One inbound call captured by a [`RecordingPeer`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub auth_header: Option<String>,
    pub body: serde_json::Value,
}

/// A tiny in-process HTTP server that records every request it receives,
/// standing in for whichever peer the binary under test is not.
pub struct RecordingPeer {
    base_url: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    shutdown: CancellationToken,
}

impl RecordingPeer {
    pub async fn start() -> anyhow::Result<Self> {
        let calls: Arc<Mutex<Vec<RecordedCall>>> = Arc::new(Mutex::new(Vec::new()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();

        let router = Router::new().route("/{*path}", any(record_handler)).with_state(Arc::clone(&calls));

        let shutdown = CancellationToken::new();
        let shutdown_signal = shutdown.clone();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal.cancelled_owned()).await;
        });

        Ok(Self { base_url: format!("http://127.0.0.1:{port}"), calls, shutdown })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn wait_for_call(&self, path: &str, timeout: Duration) -> anyhow::Result<RecordedCall> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(call) = self.calls().await.into_iter().find(|c| c.path == path) {
                return Ok(call);
            }
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("no call to {path} recorded within {timeout:?}");
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl Drop for RecordingPeer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn record_handler(State(calls): State<Arc<Mutex<Vec<RecordedCall>>>>, req: Request) -> StatusCode {
    let path = req.uri().path().to_string();
    let auth_header =
        req.headers().get(shedcommon::auth::AUTH_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string);
    let body_bytes = axum::body::to_bytes(req.into_body(), 1 << 20).await.unwrap_or_default();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);
    calls.lock().await.push(RecordedCall { path, auth_header, body });
    StatusCode::OK
}

async fn wait_healthy(base_url: &str, path: &str, auth_key: &str, timeout: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let url = format!("{base_url}{path}");
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("{url} did not become healthy within {timeout:?}");
        }
        if let Ok(resp) = client.get(&url).header(shedcommon::auth::AUTH_HEADER, auth_key).send().await {
            if resp.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

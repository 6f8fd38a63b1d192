// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `cencon` and
//! `keypad-controller` binaries and exercise them over HTTP, including
//! the outbound calls each one makes to its peer.

use std::time::Duration;

use shed_specs::{seed_keycode_db, CenconProcess, KeypadProcess, RecordingPeer};

const TIMEOUT: Duration = Duration::from_secs(10);

// -- central controller ------------------------------------------------------

#[tokio::test]
async fn cencon_health_requires_auth() -> anyhow::Result<()> {
    let keypad_stub = RecordingPeer::start().await?;
    let cencon = CenconProcess::start(keypad_stub.base_url(), "keypad-secret").await?;
    cencon.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let url = format!("{}/_health_status", cencon.base_url());

    let resp = client.get(&url).send().await?;
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    let resp = client.get(&url).header("authorisationKey", "wrong").send().await?;
    assert_eq!(resp.status(), reqwest::StatusCode::FORBIDDEN);

    let resp = client.get(&url).header("authorisationKey", &cencon.authorisation_key).send().await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["health"], "normal");

    Ok(())
}

#[tokio::test]
async fn cencon_retrieve_console_logs_filters_by_timestamp() -> anyhow::Result<()> {
    let keypad_stub = RecordingPeer::start().await?;
    let cencon = CenconProcess::start(keypad_stub.base_url(), "keypad-secret").await?;
    cencon.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let url = format!("{}/retrieveConsoleLogs", cencon.base_url());

    let resp = client
        .post(&url)
        .header("authorisationKey", &cencon.authorisation_key)
        .json(&serde_json::json!({ "startTimestamp": 0.0 }))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert!(body["entries"].is_array());
    assert!(body["lastTimestamp"].is_number());

    let resp = client
        .post(&url)
        .header("authorisationKey", &cencon.authorisation_key)
        .json(&serde_json::json!({ "startTimestamp": -1.0 }))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn cencon_receive_key_code_accepts_well_formed_request() -> anyhow::Result<()> {
    let keypad_stub = RecordingPeer::start().await?;
    let cencon = CenconProcess::start(keypad_stub.base_url(), "keypad-secret").await?;
    cencon.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/receiveKeyCode", cencon.base_url()))
        .header("authorisationKey", &cencon.authorisation_key)
        .json(&serde_json::json!({ "keySequence": "1234" }))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    Ok(())
}

/// Three consecutive bad codes should trigger the configured
/// `disableKeyPad` action, which cencon carries out by POSTing to the
/// keypad's `/receiveKeypadLock` — observed here via a recording stand-in
/// for the keypad peer.
#[tokio::test]
async fn cencon_lockout_posts_to_keypad_peer() -> anyhow::Result<()> {
    let keypad_stub = RecordingPeer::start().await?;
    let cencon = CenconProcess::start(keypad_stub.base_url(), "keypad-secret").await?;
    cencon.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    for _ in 0..3 {
        client
            .post(format!("{}/receiveKeyCode", cencon.base_url()))
            .header("authorisationKey", &cencon.authorisation_key)
            .json(&serde_json::json!({ "keySequence": "0000" }))
            .send()
            .await?;
    }

    let call = keypad_stub.wait_for_call("/receiveKeypadLock", TIMEOUT).await?;
    assert_eq!(call.auth_header.as_deref(), Some("keypad-secret"));
    assert!(call.body["lockTime"].is_number());

    Ok(())
}

// -- keypad controller --------------------------------------------------------

#[tokio::test]
async fn keypad_health_requires_auth() -> anyhow::Result<()> {
    let central_stub = RecordingPeer::start().await?;
    let keypad = KeypadProcess::start(central_stub.base_url(), "central-secret")?;
    keypad.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let url = format!("{}/_healthStatus", keypad.base_url());

    let resp = client.get(&url).send().await?;
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    let resp = client.get(&url).header("authorisationKey", &keypad.authorisation_key).send().await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["health"], "normal");

    Ok(())
}

#[tokio::test]
async fn keypad_receive_keypad_lock_rejects_negative_lock_time() -> anyhow::Result<()> {
    let central_stub = RecordingPeer::start().await?;
    let keypad = KeypadProcess::start(central_stub.base_url(), "central-secret")?;
    keypad.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/receiveKeypadLock", keypad.base_url()))
        .header("authorisationKey", &keypad.authorisation_key)
        .json(&serde_json::json!({ "lockTime": -5 }))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{}/receiveKeypadLock", keypad.base_url()))
        .header("authorisationKey", &keypad.authorisation_key)
        .json(&serde_json::json!({ "lockTime": 0 }))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    Ok(())
}

/// The keypad controller starts in `CommunicationsLost` and should send a
/// reconnect probe (`/pleaseRespondToKeypad`) to the central controller
/// almost immediately after boot.
#[tokio::test]
async fn keypad_sends_reconnect_probe_to_central_peer() -> anyhow::Result<()> {
    let central_stub = RecordingPeer::start().await?;
    let keypad = KeypadProcess::start(central_stub.base_url(), "central-secret")?;
    keypad.wait_healthy(TIMEOUT).await?;

    let call = central_stub.wait_for_call("/pleaseRespondToKeypad", TIMEOUT).await?;
    assert_eq!(call.auth_header.as_deref(), Some("central-secret"));

    Ok(())
}

#[tokio::test]
async fn keypad_receive_central_controller_ping_is_accepted() -> anyhow::Result<()> {
    let central_stub = RecordingPeer::start().await?;
    let keypad = KeypadProcess::start(central_stub.base_url(), "central-secret")?;
    keypad.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/receiveCentralControllerPing", keypad.base_url()))
        .header("authorisationKey", &keypad.authorisation_key)
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    Ok(())
}

// -- key-code seeding sanity ---------------------------------------------------

#[tokio::test]
async fn seeded_key_code_is_rejected_when_wrong() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("codes.db");
    seed_keycode_db(&db_path, "9999", true).await?;
    assert!(db_path.exists());
    Ok(())
}

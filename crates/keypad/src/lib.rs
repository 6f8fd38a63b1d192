// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keypad controller: the panel state machine, its comms-lost reconnect
//! loop, the digit-entry buffer, and the inbound/outbound HTTP surfaces
//! that tie it to the central controller.

pub mod agent;
pub mod config;
pub mod digits;
pub mod error;
pub mod http;
pub mod panel;
pub mod worker;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use shedcommon::httpclient::build_client;
use shedcommon::logstore::LogStore;
use shedcommon::tracing_sink::LogStoreLayer;

use crate::agent::KeypadAgent;
use crate::config::KeypadArgs;
use crate::http::AppState;
use crate::worker::Worker;

/// Run the keypad controller until shutdown.
pub async fn run(args: KeypadArgs, logs: Arc<LogStore>) -> anyhow::Result<()> {
    let file_config = config::load_config(&args.config)?;

    let client = build_client(file_config.outbound_timeout);
    let agent = KeypadAgent::new(
        client,
        file_config.central_base_url.clone(),
        file_config.central_authorisation_key.clone(),
    );

    let shutdown = CancellationToken::new();
    let worker = Worker::new(Arc::clone(&agent), shutdown.clone());

    let app_state = Arc::new(AppState {
        agent: Arc::clone(&agent),
        logs,
        authorisation_key: file_config.authorisation_key.clone(),
    });

    let worker_handle = tokio::spawn(Worker::run(Arc::clone(&worker)));

    let router = http::build_router(Arc::clone(&app_state));
    let addr = format!("{}:{}", file_config.host, file_config.port);
    tracing::info!(%addr, "keypad controller listening");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    worker_handle.await?;
    Ok(())
}

/// Install a `tracing` subscriber that also mirrors events into `logs`, for
/// `/retrieveConsoleLogs`.
pub fn init_tracing(logs: Arc<LogStore>) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(LogStoreLayer::new(logs))
        .init();
}

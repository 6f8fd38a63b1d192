// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Central controller: the authoritative alarm state machine, failed-attempt
//! response engine, and hardware device plug-in layer.

pub mod config;
pub mod device;
pub mod error;
pub mod gpio;
pub mod http;
pub mod keycode_store;
pub mod state_manager;
pub mod worker;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use shedcommon::httpclient::build_client;
use shedcommon::logstore::LogStore;
use shedcommon::tracing_sink::LogStoreLayer;

use crate::config::CenconArgs;
use crate::device::DeviceManager;
use crate::gpio::EmulatedGpio;
use crate::http::AppState;
use crate::keycode_store::KeyCodeStore;
use crate::state_manager::StateManager;
use crate::worker::Worker;

const GPIO_STATE_FILE: &str = "cencon-gpio.json";

/// Run the central controller until shutdown.
pub async fn run(args: CenconArgs, logs: Arc<LogStore>) -> anyhow::Result<()> {
    let file_config = config::load_config(&args.config)?;

    let keycode_store = KeyCodeStore::connect(&args.db).await?;

    let mut gpio = EmulatedGpio::open(std::env::temp_dir().join(GPIO_STATE_FILE))?;

    let mut device_manager = DeviceManager::new();
    device_manager.load_devices(&file_config.device_types, &file_config.devices, &mut gpio);

    let client = build_client(file_config.outbound_timeout);
    let state_manager = StateManager::new(
        keycode_store,
        file_config.failed_attempt_responses.clone(),
        client,
        file_config.keypad_base_url.clone(),
        file_config.keypad_authorisation_key.clone(),
    );

    let bus = shedcommon::event::EventBus::new();
    state_manager.register_handlers(&bus).await;

    let shutdown = CancellationToken::new();
    let worker = Worker::new(device_manager, Box::new(gpio), shutdown.clone());
    worker.register_handlers(&bus).await;

    let app_state = Arc::new(AppState {
        bus: Arc::clone(&bus),
        state_manager,
        logs,
        authorisation_key: file_config.authorisation_key.clone(),
    });

    let worker_handle = tokio::spawn(Worker::run(Arc::clone(&worker), Arc::clone(&bus)));

    let router = http::build_router(Arc::clone(&app_state));
    let addr = format!("{}:{}", file_config.host, file_config.port);
    tracing::info!(%addr, "central controller listening");
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

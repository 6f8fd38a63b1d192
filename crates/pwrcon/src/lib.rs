// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Power console: the operator monitoring surface. The graphical window
//! itself is out of scope (§1) — this crate is the ambient polling loop
//! and configuration/log plumbing a real operator window would sit on.

pub mod config;
pub mod monitor;

use shedcommon::httpclient::build_client;

use crate::config::PwrconArgs;
use crate::monitor::{Monitor, Peer};

/// Poll both peers on `poll_interval` until cancelled (ctrl-c).
pub async fn run(args: PwrconArgs) -> anyhow::Result<()> {
    let config = config::load_config(&args.config)?;

    let client = build_client(config.outbound_timeout);
    let central = Peer {
        name: "central-controller",
        base_url: config.central_base_url,
        authorisation_key: config.central_authorisation_key,
        health_path: "/_health_status",
    };
    let keypad = Peer {
        name: "keypad-controller",
        base_url: config.keypad_base_url,
        authorisation_key: config.keypad_authorisation_key,
        health_path: "/_healthStatus",
    };
    let mut monitor = Monitor::new(client, central, keypad);

    let mut ticker = tokio::time::interval(config.poll_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshots = monitor.poll_once().await;
                monitor::report(&snapshots);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("power console shutting down");
                break;
            }
        }
    }
    Ok(())
}

pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use clap::Parser;
use tracing::error;

use keypad::config::KeypadArgs;
use shedcommon::logstore::LogStore;

const LOG_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() {
    let args = KeypadArgs::parse();
    let logs = Arc::new(LogStore::new(LOG_CAPACITY));
    keypad::init_tracing(Arc::clone(&logs));

    if let Err(e) = keypad::run(args, logs).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

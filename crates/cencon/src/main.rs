// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use clap::Parser;
use tracing::error;

use cencon::config::CenconArgs;
use shedcommon::logstore::LogStore;

const LOG_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() {
    let args = CenconArgs::parse();
    let logs = Arc::new(LogStore::new(LOG_CAPACITY));
    cencon::init_tracing(Arc::clone(&logs));

    if let Err(e) = cencon::run(args, logs).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use pwrcon::config::PwrconArgs;

#[tokio::main]
async fn main() {
    let args = PwrconArgs::parse();
    pwrcon::init_tracing();

    if let Err(e) = pwrcon::run(args).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

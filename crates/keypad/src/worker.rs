//! The 10 ms panel tick loop (§4.7).

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::agent::KeypadAgent;

const TICK_INTERVAL: Duration = Duration::from_millis(10);

pub struct Worker {
    agent: Arc<KeypadAgent>,
    shutdown: CancellationToken,
}

impl Worker {
    pub fn new(agent: Arc<KeypadAgent>, shutdown: CancellationToken) -> Arc<Self> {
        Arc::new(Self { agent, shutdown })
    }

    pub async fn run(self: Arc<Self>) {
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let now = now_secs();
            self.agent.tick(now).await;

            tokio::select! {
                _ = tokio::time::sleep(TICK_INTERVAL) => {}
                _ = self.shutdown.cancelled() => break,
            }
        }
        tracing::info!("panel tick loop shut down");
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

//! A `tracing_subscriber::Layer` that mirrors emitted events into a
//! [`LogStore`], so `retrieveConsoleLogs` can serve the same log stream an
//! operator would see on stdout.

use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::logstore::{LogLevel, LogStore};

pub struct LogStoreLayer {
    store: Arc<LogStore>,
}

impl LogStoreLayer {
    pub fn new(store: Arc<LogStore>) -> Self {
        Self { store }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

impl<S> Layer<S> for LogStoreLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.store.push(LogLevel::from(*event.metadata().level()), visitor.message);
    }
}

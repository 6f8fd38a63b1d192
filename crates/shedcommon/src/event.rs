//! The in-process event bus shared by every worker loop.
//!
//! Mirrors the teacher's single-producer/single-consumer queue discipline
//! (axum handlers enqueue, the worker loop drains) but keeps a real
//! registry of one handler per event kind rather than a broadcast channel,
//! since the closed event-kind set here has exactly one subscriber each.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;

/// The closed set of event kinds recognised by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeypadKeyCodeEntered,
    SensorDeviceStateChange,
    ActivateSiren,
    DeactivateSiren,
    AlarmActivated,
    AlarmDeactivated,
    KeypadApiSendAlivePing,
    KeypadApiSendKeypadLock,
}

/// An event queued on the bus, paired with its kind-specific body.
#[derive(Debug, Clone)]
pub enum Event {
    KeypadKeyCodeEntered { key_sequence: String },
    SensorDeviceStateChange { device_name: String, triggered: bool },
    ActivateSiren,
    DeactivateSiren,
    AlarmActivated { activation_timestamp: f64, no_grace_time: bool },
    AlarmDeactivated,
    KeypadApiSendAlivePing,
    KeypadApiSendKeypadLock { lock_time: i64 },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::KeypadKeyCodeEntered { .. } => EventKind::KeypadKeyCodeEntered,
            Self::SensorDeviceStateChange { .. } => EventKind::SensorDeviceStateChange,
            Self::ActivateSiren => EventKind::ActivateSiren,
            Self::DeactivateSiren => EventKind::DeactivateSiren,
            Self::AlarmActivated { .. } => EventKind::AlarmActivated,
            Self::AlarmDeactivated => EventKind::AlarmDeactivated,
            Self::KeypadApiSendAlivePing => EventKind::KeypadApiSendAlivePing,
            Self::KeypadApiSendKeypadLock { .. } => EventKind::KeypadApiSendKeypadLock,
        }
    }
}

/// Bus operation outcomes, matching `EventManagerStatusCode` in the source
/// system this was distilled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusStatus {
    Success,
    InvalidEventId,
    Disabled,
}

type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type HandlerFn = Arc<dyn Fn(Arc<EventBus>, Event) -> HandlerFuture + Send + Sync>;

struct Inner {
    enabled: bool,
    handlers: HashMap<EventKind, HandlerFn>,
    queue: VecDeque<Event>,
}

/// Single-threaded FIFO event dispatcher.
///
/// `queue` is safe to call concurrently from HTTP handlers; `process_next`
/// is intended to be driven from exactly one worker loop per process.
pub struct EventBus {
    inner: Mutex<Inner>,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner { enabled: true, handlers: HashMap::new(), queue: VecDeque::new() }),
        })
    }

    /// Register a handler for `kind`. Idempotent: the first registration wins.
    pub async fn register<F, Fut>(&self, kind: EventKind, handler: F)
    where
        F: Fn(Arc<EventBus>, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut inner = self.inner.lock().await;
        if let Entry::Vacant(slot) = inner.handlers.entry(kind) {
            slot.insert(Arc::new(move |bus, event| Box::pin(handler(bus, event))));
        }
    }

    /// Append an event to the tail of the queue.
    pub async fn queue(&self, event: Event) -> BusStatus {
        let mut inner = self.inner.lock().await;
        if !inner.enabled {
            return BusStatus::Disabled;
        }
        if !inner.handlers.contains_key(&event.kind()) {
            return BusStatus::InvalidEventId;
        }
        inner.queue.push_back(event);
        BusStatus::Success
    }

    /// Pop the head of the queue and invoke its handler synchronously
    /// (from the worker loop's point of view — one event per call).
    ///
    /// If the handler re-queues an event it lands at the tail, since the
    /// lock guarding the queue is released before the handler runs.
    pub async fn process_next(self: &Arc<Self>) -> BusStatus {
        let (event, handler) = {
            let mut inner = self.inner.lock().await;
            let Some(event) = inner.queue.pop_front() else {
                return BusStatus::Success;
            };
            let handler = inner.handlers.get(&event.kind()).cloned();
            (event, handler)
        };

        match handler {
            Some(handler) => {
                handler(Arc::clone(self), event).await;
                BusStatus::Success
            }
            None => BusStatus::InvalidEventId,
        }
    }

    /// Empty the queue without invoking any handlers.
    pub async fn delete_all(&self) {
        self.inner.lock().await.queue.clear();
    }

    #[cfg(test)]
    #[allow(clippy::len_without_is_empty)]
    pub async fn len(&self) -> usize {
        self.inner.lock().await.queue.len()
    }
}

//! The 100 ms worker loop (§4.2) and device event routing (§4.4).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use shedcommon::event::{Event, EventBus, EventKind};

use crate::config::Hardware;
use crate::device::DeviceManager;
use crate::gpio::GpioBackend;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

struct Devices {
    manager: DeviceManager,
    gpio: Box<dyn GpioBackend>,
}

/// Owns the live device set and the GPIO backend; registers the four
/// event kinds the Device Manager consumes (§4.4) and runs the tick loop.
pub struct Worker {
    devices: Mutex<Devices>,
    shutdown: CancellationToken,
}

impl Worker {
    pub fn new(manager: DeviceManager, gpio: Box<dyn GpioBackend>, shutdown: CancellationToken) -> Arc<Self> {
        Arc::new(Self { devices: Mutex::new(Devices { manager, gpio }), shutdown })
    }

    pub async fn register_handlers(self: &Arc<Self>, bus: &Arc<EventBus>) {
        for (kind, hardware) in [
            (EventKind::ActivateSiren, Hardware::Siren),
            (EventKind::DeactivateSiren, Hardware::Siren),
        ] {
            let worker = Arc::clone(self);
            bus.register(kind, move |bus, event| {
                let worker = Arc::clone(&worker);
                async move {
                    worker.route_to_devices(&bus, &event, hardware).await;
                }
            })
            .await;
        }

        let worker = Arc::clone(self);
        bus.register(EventKind::AlarmActivated, move |bus, event| {
            let worker = Arc::clone(&worker);
            async move {
                if let Event::AlarmActivated { no_grace_time, .. } = &event {
                    if !no_grace_time {
                        worker.route_to_devices(&bus, &event, Hardware::Sensor).await;
                    }
                }
            }
        })
        .await;

        let worker = Arc::clone(self);
        bus.register(EventKind::AlarmDeactivated, move |bus, event| {
            let worker = Arc::clone(&worker);
            async move {
                worker.route_to_devices(&bus, &event, Hardware::Sensor).await;
            }
        })
        .await;
    }

    async fn route_to_devices(self: &Arc<Self>, bus: &Arc<EventBus>, event: &Event, hardware: Hardware) {
        let now = now_secs();
        let mut devices = self.devices.lock().await;
        let Devices { manager, gpio } = &mut *devices;
        let produced = manager.route_event(event, hardware, now, gpio.as_mut());
        drop(devices);
        for produced_event in produced {
            bus.queue(produced_event).await;
        }
    }

    /// The 100 ms tick: poll devices, drain one bus event, sleep.
    pub async fn run(self: Arc<Self>, bus: Arc<EventBus>) {
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let now = now_secs();
            let produced = {
                let mut devices = self.devices.lock().await;
                let Devices { manager, gpio } = &mut *devices;
                manager.check_all(now, gpio.as_mut())
            };
            for event in produced {
                bus.queue(event).await;
            }

            bus.process_next().await;

            tokio::select! {
                _ = tokio::time::sleep(TICK_INTERVAL) => {}
                _ = self.shutdown.cancelled() => break,
            }
        }

        let mut devices = self.devices.lock().await;
        let Devices { manager, gpio } = &mut *devices;
        manager.cleanup(gpio.as_mut());
        tracing::info!("worker loop shut down, GPIO released");
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

//! The device plug-in contract (§4.3) and the device manager (§4.4).

pub mod contact_sensor;
pub mod siren;

use std::collections::HashMap;

use shedcommon::event::Event;

use crate::config::{DeviceConfig, Hardware, PinConfig};
use crate::gpio::GpioBackend;

/// Every device type implements this contract. Methods are synchronous —
/// matching the original's single-threaded polling model — and report
/// their effect as events for the caller to publish on the (async) bus.
pub trait DeviceInstance: Send {
    /// Configure pin mappings from the descriptor and perform any
    /// required idle-state GPIO writes. Returns `false` on any
    /// misconfiguration (wrong pin count, missing identifier); the caller
    /// drops the device from the live set on failure.
    fn initialise(
        &mut self,
        pins: &[PinConfig],
        trigger_grace_period_secs: Option<u64>,
        gpio: &mut dyn GpioBackend,
    ) -> bool;

    /// Called every worker tick.
    fn check_device(&mut self, now: f64, gpio: &mut dyn GpioBackend) -> Vec<Event>;

    /// Called for alarm-level events routed to this device's hardware role.
    fn receive_event(&mut self, event: &Event, now: f64, gpio: &mut dyn GpioBackend) -> Vec<Event>;

    fn cleanup(&mut self, _gpio: &mut dyn GpioBackend) {}
}

/// Construct a bare (uninitialised) instance for a known device-type name.
/// Returns `None` if the type is not in the registry — collapsing the
/// source system's "unknown type" and "wrong base class" failure modes
/// into a single "type not in registry" case (§9).
pub fn construct(type_name: &str) -> Option<Box<dyn DeviceInstance>> {
    match type_name {
        "GenericAlarmSiren" => Some(Box::new(siren::GenericAlarmSiren::default())),
        "MagneticContactSensor" => Some(Box::new(contact_sensor::MagneticContactSensor::default())),
        _ => None,
    }
}

/// Devices don't know their own configured name; the manager stamps it
/// onto any `SensorDeviceStateChange` they produce.
fn attach_device_name(event: Event, name: &str) -> Event {
    match event {
        Event::SensorDeviceStateChange { triggered, .. } => {
            Event::SensorDeviceStateChange { device_name: name.to_string(), triggered }
        }
        other => other,
    }
}

struct LiveDevice {
    name: String,
    hardware: Hardware,
    instance: Box<dyn DeviceInstance>,
}

/// Owns the live set of device instances (§4.4).
pub struct DeviceManager {
    devices: Vec<LiveDevice>,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self { devices: Vec::new() }
    }

    /// Load the device list: skip disabled entries, unknown types, and
    /// devices whose `initialise` fails. No single skip is fatal.
    pub fn load_devices(
        &mut self,
        device_types: &[crate::config::DeviceTypeConfig],
        devices: &[DeviceConfig],
        gpio: &mut dyn GpioBackend,
    ) {
        let enabled_types: HashMap<&str, bool> =
            device_types.iter().map(|t| (t.name.as_str(), t.enabled)).collect();

        for descriptor in devices {
            if !descriptor.enabled {
                tracing::debug!(device = %descriptor.name, "device disabled in configuration, skipping");
                continue;
            }
            match enabled_types.get(descriptor.device_type.as_str()) {
                Some(true) => {}
                Some(false) => {
                    tracing::warn!(device_type = %descriptor.device_type, "device type disabled, skipping device");
                    continue;
                }
                None => {
                    tracing::warn!(device_type = %descriptor.device_type, "unknown device type, skipping device");
                    continue;
                }
            }

            let Some(mut instance) = construct(&descriptor.device_type) else {
                tracing::warn!(device_type = %descriptor.device_type, "device type not in registry, skipping device");
                continue;
            };

            if !instance.initialise(&descriptor.pins, descriptor.trigger_grace_period_secs, gpio) {
                tracing::warn!(device = %descriptor.name, "device initialisation failed, skipping device");
                continue;
            }

            tracing::info!(device = %descriptor.name, hardware = ?descriptor.hardware, "device loaded");
            self.devices.push(LiveDevice {
                name: descriptor.name.clone(),
                hardware: descriptor.hardware,
                instance,
            });
        }
    }

    /// Poll every live device, collecting events to publish.
    pub fn check_all(&mut self, now: f64, gpio: &mut dyn GpioBackend) -> Vec<Event> {
        let mut out = Vec::new();
        for device in &mut self.devices {
            for event in device.instance.check_device(now, gpio) {
                out.push(attach_device_name(event, &device.name));
            }
        }
        out
    }

    /// Route an alarm-level event to every device of the given hardware role.
    pub fn route_event(
        &mut self,
        event: &Event,
        hardware: Hardware,
        now: f64,
        gpio: &mut dyn GpioBackend,
    ) -> Vec<Event> {
        let mut out = Vec::new();
        for device in &mut self.devices {
            if device.hardware == hardware {
                for produced in device.instance.receive_event(event, now, gpio) {
                    out.push(attach_device_name(produced, &device.name));
                }
            }
        }
        out
    }

    pub fn device_names(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.name.as_str()).collect()
    }

    /// Release GPIO resources at shutdown.
    pub fn cleanup(&mut self, gpio: &mut dyn GpioBackend) {
        for device in &mut self.devices {
            device.instance.cleanup(gpio);
        }
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

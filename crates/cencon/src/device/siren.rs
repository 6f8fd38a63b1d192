//! `GenericAlarmSiren` (§4.3.1): one output pin, idle HIGH, driven LOW to sound.

use shedcommon::event::Event;

use crate::config::PinLabel;
use crate::device::DeviceInstance;
use crate::gpio::GpioBackend;

#[derive(Default)]
pub struct GenericAlarmSiren {
    siren_pin: Option<PinLabel>,
}

impl DeviceInstance for GenericAlarmSiren {
    fn initialise(
        &mut self,
        pins: &[crate::config::PinConfig],
        _trigger_grace_period_secs: Option<u64>,
        gpio: &mut dyn GpioBackend,
    ) -> bool {
        if pins.len() != 1 {
            return false;
        }
        let Some(pin) = pins.iter().find(|p| p.identifier == "sirenPin") else {
            return false;
        };
        self.siren_pin = Some(pin.io_pin);
        gpio.write(pin.io_pin, true);
        true
    }

    fn check_device(&mut self, _now: f64, _gpio: &mut dyn GpioBackend) -> Vec<Event> {
        Vec::new()
    }

    fn receive_event(&mut self, event: &Event, _now: f64, gpio: &mut dyn GpioBackend) -> Vec<Event> {
        let Some(pin) = self.siren_pin else { return Vec::new() };
        match event {
            Event::ActivateSiren => gpio.write(pin, false),
            Event::DeactivateSiren => gpio.write(pin, true),
            _ => {}
        }
        Vec::new()
    }

    fn cleanup(&mut self, gpio: &mut dyn GpioBackend) {
        if let Some(pin) = self.siren_pin {
            gpio.write(pin, true);
        }
    }
}

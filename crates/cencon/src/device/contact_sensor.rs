//! `MagneticContactSensor` (§4.3.2): one input pin with pull-up, reading 1
//! (open/triggered) or 0 (closed). Runs a private per-sensor state machine
//! distinct from the global alarm state.

use shedcommon::event::Event;

use crate::config::PinLabel;
use crate::device::DeviceInstance;
use crate::gpio::GpioBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SensorState {
    AlarmInactive,
    AlarmSetPeriod,
    AlarmUnsetPeriod,
    AlarmActivate,
}

#[derive(Default)]
pub struct MagneticContactSensor {
    sensor_pin: Option<PinLabel>,
    trigger_grace_period_secs: Option<u64>,
    state: Option<SensorState>,
    triggered: bool,
    grace_timeout: Option<f64>,
    last_contact_open: Option<bool>,
}

impl MagneticContactSensor {
    fn state(&self) -> SensorState {
        self.state.unwrap_or(SensorState::AlarmInactive)
    }
}

impl DeviceInstance for MagneticContactSensor {
    fn initialise(
        &mut self,
        pins: &[crate::config::PinConfig],
        trigger_grace_period_secs: Option<u64>,
        _gpio: &mut dyn GpioBackend,
    ) -> bool {
        if pins.len() != 1 {
            return false;
        }
        let Some(pin) = pins.iter().find(|p| p.identifier == "sensorPin") else {
            return false;
        };
        self.sensor_pin = Some(pin.io_pin);
        self.trigger_grace_period_secs = trigger_grace_period_secs;
        self.state = Some(SensorState::AlarmInactive);
        true
    }

    fn check_device(&mut self, now: f64, gpio: &mut dyn GpioBackend) -> Vec<Event> {
        let Some(pin) = self.sensor_pin else { return Vec::new() };
        let contact_open = gpio.read(pin);
        let mut out = Vec::new();

        match self.state() {
            SensorState::AlarmInactive => {
                tracing::debug!(contact_open, "contact change while alarm inactive, ignoring");
            }

            SensorState::AlarmSetPeriod => {
                let deadline = self.grace_timeout.unwrap_or(f64::INFINITY);
                if now > deadline {
                    self.state = Some(SensorState::AlarmActivate);
                    if contact_open {
                        self.triggered = true;
                        out.push(Event::SensorDeviceStateChange { device_name: String::new(), triggered: true });
                    }
                }
            }

            SensorState::AlarmActivate => {
                if self.triggered {
                    // Further contact changes are ignored until AlarmDeactivated.
                } else {
                    let opened = contact_open && self.last_contact_open != Some(true);
                    if opened {
                        match self.trigger_grace_period_secs {
                            Some(secs) if secs > 0 => {
                                self.state = Some(SensorState::AlarmUnsetPeriod);
                                self.grace_timeout = Some(now + secs as f64);
                            }
                            _ => {
                                self.triggered = true;
                                out.push(Event::SensorDeviceStateChange {
                                    device_name: String::new(),
                                    triggered: true,
                                });
                            }
                        }
                    }
                }
            }

            SensorState::AlarmUnsetPeriod => {
                let deadline = self.grace_timeout.unwrap_or(f64::INFINITY);
                if now > deadline {
                    self.triggered = true;
                    self.state = Some(SensorState::AlarmActivate);
                    out.push(Event::SensorDeviceStateChange { device_name: String::new(), triggered: true });
                }
            }
        }

        self.last_contact_open = Some(contact_open);
        out
    }

    fn receive_event(&mut self, event: &Event, now: f64, _gpio: &mut dyn GpioBackend) -> Vec<Event> {
        match event {
            Event::AlarmActivated { activation_timestamp, no_grace_time: false } => {
                if self.state() == SensorState::AlarmInactive {
                    if let Some(secs) = self.trigger_grace_period_secs {
                        self.state = Some(SensorState::AlarmSetPeriod);
                        self.grace_timeout = Some(activation_timestamp + secs as f64);
                    } else {
                        self.state = Some(SensorState::AlarmActivate);
                    }
                }
                let _ = now;
            }
            Event::AlarmDeactivated => {
                self.state = Some(SensorState::AlarmInactive);
                self.triggered = false;
                self.grace_timeout = None;
                self.last_contact_open = None;
            }
            _ => {}
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PinConfig;
    use crate::gpio::EmulatedGpio;

    fn pins() -> Vec<PinConfig> {
        vec![PinConfig { io_pin: PinLabel::GPIO05, identifier: "sensorPin".into() }]
    }

    fn gpio(dir: &tempfile::TempDir) -> anyhow::Result<EmulatedGpio> {
        EmulatedGpio::open(dir.path().join("gpio.json"))
    }

    #[test]
    fn grace_period_suppresses_trigger_until_elapsed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut gpio = gpio(&dir)?;
        let mut sensor = MagneticContactSensor::default();
        assert!(sensor.initialise(&pins(), Some(10), &mut gpio));

        sensor.receive_event(
            &Event::AlarmActivated { activation_timestamp: 100.0, no_grace_time: false },
            100.0,
            &mut gpio,
        );
        assert_eq!(sensor.state(), SensorState::AlarmSetPeriod);

        gpio.write(PinLabel::GPIO05, true);
        let events = sensor.check_device(105.0, &mut gpio);
        assert!(events.is_empty());
        assert_eq!(sensor.state(), SensorState::AlarmSetPeriod);

        let events = sensor.check_device(111.0, &mut gpio);
        assert_eq!(events.len(), 1);
        assert_eq!(sensor.state(), SensorState::AlarmActivate);
        assert!(sensor.triggered);
        Ok(())
    }

    #[test]
    fn no_grace_time_event_is_ignored_by_sensor() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut gpio = gpio(&dir)?;
        let mut sensor = MagneticContactSensor::default();
        assert!(sensor.initialise(&pins(), Some(10), &mut gpio));

        sensor.receive_event(
            &Event::AlarmActivated { activation_timestamp: 100.0, no_grace_time: true },
            100.0,
            &mut gpio,
        );
        assert_eq!(sensor.state(), SensorState::AlarmInactive);
        Ok(())
    }

    #[test]
    fn triggered_ignores_further_contact_changes_until_deactivated() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut gpio = gpio(&dir)?;
        let mut sensor = MagneticContactSensor::default();
        assert!(sensor.initialise(&pins(), None, &mut gpio));

        sensor.receive_event(
            &Event::AlarmActivated { activation_timestamp: 0.0, no_grace_time: false },
            0.0,
            &mut gpio,
        );
        assert_eq!(sensor.state(), SensorState::AlarmActivate);

        gpio.write(PinLabel::GPIO05, true);
        let events = sensor.check_device(1.0, &mut gpio);
        assert_eq!(events.len(), 1);
        assert!(sensor.triggered);

        gpio.write(PinLabel::GPIO05, false);
        let events = sensor.check_device(2.0, &mut gpio);
        assert!(events.is_empty());

        sensor.receive_event(&Event::AlarmDeactivated, 3.0, &mut gpio);
        assert_eq!(sensor.state(), SensorState::AlarmInactive);
        assert!(!sensor.triggered);
        Ok(())
    }

    #[test]
    fn reclose_during_unset_period_does_not_cancel_pending_alarm() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut gpio = gpio(&dir)?;
        let mut sensor = MagneticContactSensor::default();
        assert!(sensor.initialise(&pins(), Some(10), &mut gpio));

        sensor.receive_event(
            &Event::AlarmActivated { activation_timestamp: 0.0, no_grace_time: false },
            0.0,
            &mut gpio,
        );
        assert_eq!(sensor.state(), SensorState::AlarmSetPeriod);
        let events = sensor.check_device(11.0, &mut gpio);
        assert!(events.is_empty());
        assert_eq!(sensor.state(), SensorState::AlarmActivate);

        gpio.write(PinLabel::GPIO05, true);
        let events = sensor.check_device(12.0, &mut gpio);
        assert!(events.is_empty());
        assert_eq!(sensor.state(), SensorState::AlarmUnsetPeriod);

        gpio.write(PinLabel::GPIO05, false);
        let events = sensor.check_device(13.0, &mut gpio);
        assert!(events.is_empty());
        assert_eq!(sensor.state(), SensorState::AlarmUnsetPeriod);
        assert!(!sensor.triggered);

        let events = sensor.check_device(23.0, &mut gpio);
        assert_eq!(events.len(), 1);
        assert_eq!(sensor.state(), SensorState::AlarmActivate);
        assert!(sensor.triggered);
        Ok(())
    }
}

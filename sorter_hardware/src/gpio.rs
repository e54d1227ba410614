//! Raspberry Pi GPIO encoder and actuator outputs (rppal).

use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use sorter_traits::{ActuatorLine, Encoder, Position};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::{HwError, Result};

/// Quadrature encoder counted from edge interrupts on channel A.
///
/// Counting happens on rppal's interrupt thread; `read()` only loads the
/// atomic, so it never waits on the pins.
pub struct GpioEncoder {
    count: Arc<AtomicI64>,
    // Keeps the interrupt registered for the encoder's lifetime.
    _channel_a: InputPin,
}

impl GpioEncoder {
    pub fn new(pin_a: u8, pin_b: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))?;
        let mut channel_a = gpio
            .get(pin_a)
            .map_err(|e| HwError::Gpio(format!("open encoder pin {pin_a}: {e}")))?
            .into_input_pullup();
        let channel_b = gpio
            .get(pin_b)
            .map_err(|e| HwError::Gpio(format!("open encoder pin {pin_b}: {e}")))?
            .into_input_pullup();

        let count = Arc::new(AtomicI64::new(0));
        let counter = count.clone();
        channel_a
            .set_async_interrupt(Trigger::Both, move |level: Level| {
                // A and B at the same level after an A edge means reverse travel.
                if level == channel_b.read() {
                    counter.fetch_sub(1, Ordering::Relaxed);
                } else {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
            .map_err(|e| HwError::Gpio(format!("encoder interrupt on pin {pin_a}: {e}")))?;

        tracing::info!(pin_a, pin_b, "encoder attached");
        Ok(Self {
            count,
            _channel_a: channel_a,
        })
    }
}

impl Encoder for GpioEncoder {
    fn read(&mut self) -> std::result::Result<Position, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.count.load(Ordering::Relaxed))
    }

    fn reset(
        &mut self,
        value: Position,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.count.store(value, Ordering::Relaxed);
        Ok(())
    }
}

/// Solenoid driver input; HIGH energizes the actuator.
pub struct GpioActuator {
    pin: OutputPin,
}

impl GpioActuator {
    pub fn new(pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))?;
        let pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("open actuator pin {pin}: {e}")))?
            .into_output_low();
        Ok(Self { pin })
    }
}

impl ActuatorLine for GpioActuator {
    fn set_active(
        &mut self,
        active: bool,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if active {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

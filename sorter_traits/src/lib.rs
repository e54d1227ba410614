//! Hardware seams for the sorting line.
//!
//! The core never talks to GPIO or serial ports directly; everything goes
//! through these traits so the scheduler can run against simulated parts.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Cumulative encoder pulse count; increasing values mean forward travel.
pub type Position = i64;

/// Rotary encoder on the conveyor.
pub trait Encoder {
    /// Current pulse count.
    fn read(&mut self) -> Result<Position, Box<dyn std::error::Error + Send + Sync>>;
    /// Overwrite the pulse count (used once at start-up).
    fn reset(&mut self, value: Position) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// One boolean actuator output (active = energized).
pub trait ActuatorLine {
    fn set_active(&mut self, active: bool)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Inbound channel carrying category codes from the upstream classifier.
pub trait CategoryLink {
    /// Take one pending code without blocking. `Ok(None)` means nothing is waiting.
    fn try_recv(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>>;

    /// Tell the upstream side that the controller can accept the next code.
    fn announce_ready(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

impl<T: Encoder + ?Sized> Encoder for Box<T> {
    fn read(&mut self) -> Result<Position, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
    fn reset(&mut self, value: Position) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).reset(value)
    }
}

impl<T: ActuatorLine + ?Sized> ActuatorLine for Box<T> {
    fn set_active(
        &mut self,
        active: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_active(active)
    }
}

impl<T: CategoryLink + ?Sized> CategoryLink for Box<T> {
    fn try_recv(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).try_recv()
    }
    fn announce_ready(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).announce_ready()
    }
}

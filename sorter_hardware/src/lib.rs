//! Encoder, actuator and link adapters for the sorting line.
//!
//! Simulated parts are always available; the Raspberry Pi GPIO/UART parts
//! build only with the `hardware` feature on Linux.
pub mod codec;
pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod uart;

use sorter_traits::{ActuatorLine, CategoryLink, Clock, Encoder, Position};
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

/// Conveyor moving at a constant speed, measured against a clock.
///
/// Position is a pure function of elapsed time, so reading it twice within
/// one instant returns the same value. Pair it with a `ManualClock` to run a
/// line in simulated time.
pub struct SimulatedConveyor {
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Cell<Instant>,
    base: Cell<Position>,
    pulses_per_sec: u32,
}

impl SimulatedConveyor {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, pulses_per_sec: u32) -> Rc<Self> {
        let epoch = clock.now();
        Rc::new(Self {
            clock,
            epoch: Cell::new(epoch),
            base: Cell::new(0),
            pulses_per_sec,
        })
    }

    pub fn position(&self) -> Position {
        let elapsed_ms = self.clock.ms_since(self.epoch.get());
        let travelled = i128::from(elapsed_ms) * i128::from(self.pulses_per_sec) / 1000;
        self.base
            .get()
            .saturating_add(Position::try_from(travelled).unwrap_or(Position::MAX))
    }

    fn restart_at(&self, value: Position) {
        self.epoch.set(self.clock.now());
        self.base.set(value);
    }
}

/// Simulated encoder reading a `SimulatedConveyor`.
pub struct SimulatedEncoder {
    conveyor: Rc<SimulatedConveyor>,
}

impl SimulatedEncoder {
    pub fn new(conveyor: Rc<SimulatedConveyor>) -> Self {
        Self { conveyor }
    }
}

impl Encoder for SimulatedEncoder {
    fn read(&mut self) -> Result<Position, Box<dyn std::error::Error + Send + Sync>> {
        let p = self.conveyor.position();
        tracing::trace!(position = p, "encoder (simulated)");
        Ok(p)
    }

    fn reset(&mut self, value: Position) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.conveyor.restart_at(value);
        Ok(())
    }
}

/// Observable state of a `SimulatedLine`, shared with the caller.
#[derive(Debug, Default, Clone)]
pub struct LineProbe {
    active: Rc<Cell<bool>>,
    activations: Rc<Cell<u32>>,
}

impl LineProbe {
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Number of inactive → active transitions seen so far.
    pub fn activations(&self) -> u32 {
        self.activations.get()
    }
}

/// Simulated actuator output that records its level.
pub struct SimulatedLine {
    name: &'static str,
    probe: LineProbe,
}

impl SimulatedLine {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            probe: LineProbe::default(),
        }
    }

    pub fn probe(&self) -> LineProbe {
        self.probe.clone()
    }
}

impl ActuatorLine for SimulatedLine {
    fn set_active(
        &mut self,
        active: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let was = self.probe.active.replace(active);
        if active && !was {
            self.probe
                .activations
                .set(self.probe.activations.get().saturating_add(1));
        }
        if was != active {
            tracing::debug!(line = self.name, active, "actuator (simulated)");
        }
        Ok(())
    }
}

/// Upstream classifier replayed from a recorded trace.
///
/// Each entry `(position, code)` becomes available once the conveyor has
/// reached `position`. With `require_ready`, a code is only released after
/// the controller has announced readiness, one code per announcement.
pub struct TraceLink {
    conveyor: Rc<SimulatedConveyor>,
    pending: VecDeque<(Position, u8)>,
    require_ready: bool,
    ready_tokens: u32,
}

impl TraceLink {
    pub fn new(
        conveyor: Rc<SimulatedConveyor>,
        trace: impl IntoIterator<Item = (Position, u8)>,
        require_ready: bool,
    ) -> Self {
        Self {
            conveyor,
            pending: trace.into_iter().collect(),
            require_ready,
            ready_tokens: 0,
        }
    }

    /// Codes not yet delivered.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl CategoryLink for TraceLink {
    fn try_recv(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        if self.require_ready && self.ready_tokens == 0 {
            return Ok(None);
        }
        let now = self.conveyor.position();
        match self.pending.front() {
            Some(&(at, code)) if at <= now => {
                self.pending.pop_front();
                if self.require_ready {
                    self.ready_tokens -= 1;
                }
                Ok(Some(code))
            }
            _ => Ok(None),
        }
    }

    fn announce_ready(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // The classifier answers one "ok" with at most one code.
        self.ready_tokens = 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sorter_traits::ManualClock;
    use std::time::Duration;

    #[test]
    fn conveyor_tracks_clock() {
        let clock = ManualClock::new();
        let conveyor = SimulatedConveyor::new(Arc::new(clock.clone()), 2000);
        let mut enc = SimulatedEncoder::new(conveyor);
        assert_eq!(enc.read().unwrap(), 0);
        clock.advance(Duration::from_millis(500));
        assert_eq!(enc.read().unwrap(), 1000);
        assert_eq!(enc.read().unwrap(), 1000);
        enc.reset(10).unwrap();
        assert_eq!(enc.read().unwrap(), 10);
        clock.advance(Duration::from_millis(1));
        assert_eq!(enc.read().unwrap(), 12);
    }

    #[test]
    fn line_counts_rising_edges() {
        let mut line = SimulatedLine::new("a");
        let probe = line.probe();
        line.set_active(true).unwrap();
        line.set_active(true).unwrap();
        line.set_active(false).unwrap();
        line.set_active(true).unwrap();
        assert!(probe.is_active());
        assert_eq!(probe.activations(), 2);
    }

    #[test]
    fn trace_link_releases_by_position_and_readiness() {
        let clock = ManualClock::new();
        let conveyor = SimulatedConveyor::new(Arc::new(clock.clone()), 1000);
        let mut link = TraceLink::new(conveyor, [(100, 0), (100, 2)], true);

        clock.advance(Duration::from_millis(100));
        assert_eq!(link.try_recv().unwrap(), None, "no ok yet");
        link.announce_ready().unwrap();
        link.announce_ready().unwrap();
        assert_eq!(link.try_recv().unwrap(), Some(0));
        assert_eq!(link.try_recv().unwrap(), None, "one code per ok");
        link.announce_ready().unwrap();
        assert_eq!(link.try_recv().unwrap(), Some(2));
        assert_eq!(link.remaining(), 0);
    }

    #[test]
    fn trace_link_without_handshake() {
        let clock = ManualClock::new();
        let conveyor = SimulatedConveyor::new(Arc::new(clock.clone()), 1000);
        let mut link = TraceLink::new(conveyor, [(50, 1)], false);
        assert_eq!(link.try_recv().unwrap(), None, "not reached yet");
        clock.advance(Duration::from_millis(50));
        assert_eq!(link.try_recv().unwrap(), Some(1));
    }
}

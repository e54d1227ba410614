//! Distance-based throttle for polling the category channel.

use sorter_traits::Position;

/// Opens once per `quantum` pulses of conveyor travel.
///
/// Polling at most once per quantum keeps the classifier from flooding the
/// channel and quantizes recorded positions to that resolution. A poll that
/// finds nothing still consumes the opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestGate {
    quantum: Position,
    last_polled: Position,
}

impl IngestGate {
    pub fn new(quantum: Position) -> Self {
        debug_assert!(quantum > 0, "gate quantum must be positive");
        Self {
            quantum,
            last_polled: 0,
        }
    }

    /// True when the conveyor has moved at least one quantum since the last
    /// opening; an opening records `current` as the new reference.
    pub fn should_poll(&mut self, current: Position) -> bool {
        if current.saturating_sub(self.last_polled) >= self.quantum {
            self.last_polled = current;
            true
        } else {
            false
        }
    }

    pub fn last_polled(&self) -> Position {
        self.last_polled
    }

    pub fn quantum(&self) -> Position {
        self.quantum
    }

    pub fn reset(&mut self) {
        self.last_polled = 0;
    }
}

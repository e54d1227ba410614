//! Arrival detection: fire each lane's actuator when its objects arrive.

use sorter_traits::{ActuatorLine, Position};

use crate::actuator::ActuatorTimer;
use crate::category::Category;
use crate::queue::DetectionQueue;
use crate::status::{LineStats, SortEvent};

/// Everything one category needs between the sensor and its actuator.
#[derive(Debug)]
pub struct Lane<A> {
    category: Category,
    queue: DetectionQueue,
    offset: Position,
    timer: ActuatorTimer<A>,
}

impl<A: ActuatorLine> Lane<A> {
    pub fn new(category: Category, offset: Position, line: A, pulse_width_ms: u64) -> Self {
        Self {
            category,
            queue: DetectionQueue::new(),
            offset,
            timer: ActuatorTimer::new(line, pulse_width_ms),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn offset(&self) -> Position {
        self.offset
    }

    pub fn queue(&self) -> &DetectionQueue {
        &self.queue
    }

    pub fn timer(&self) -> &ActuatorTimer<A> {
        &self.timer
    }

    /// Detections still travelling toward this lane's actuator.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_active()
    }

    /// Record a detection, reporting the in-flight one it overwrites.
    pub(crate) fn store(&mut self, position: Position) -> Option<Position> {
        let lost = self.queue.pending_at_cursor();
        self.queue.push(position);
        lost
    }

    pub(crate) fn timer_mut(&mut self) -> &mut ActuatorTimer<A> {
        &mut self.timer
    }

    pub(crate) fn reset(&mut self) {
        self.queue.clear();
    }
}

/// Scans every lane's queue against the current position.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrivalScanner;

impl ArrivalScanner {
    /// Arm the actuator of every lane holding a detection that has travelled
    /// its offset. Each arrival is consumed exactly once; a failed arm is
    /// logged and counted and the detection is not retried.
    pub fn scan<A: ActuatorLine>(
        lanes: &mut [Lane<A>],
        current: Position,
        now_ms: u64,
        events: &mut Vec<SortEvent>,
        stats: &mut LineStats,
    ) {
        for lane in lanes.iter_mut() {
            let category = lane.category;
            for detected_at in lane.queue.scan_and_consume(current, lane.offset) {
                match lane.timer.arm(now_ms) {
                    Ok(()) => {
                        tracing::info!(
                            category = %category,
                            detected_at,
                            position = current,
                            now_ms,
                            "actuator fired"
                        );
                        let ev = SortEvent::Fired {
                            category,
                            detected_at,
                            position: current,
                        };
                        stats.record(&ev);
                        events.push(ev);
                    }
                    Err(e) => {
                        stats.actuator_errors += 1;
                        tracing::error!(
                            category = %category,
                            detected_at,
                            error = %e,
                            "failed to energize actuator"
                        );
                    }
                }
            }
        }
    }
}

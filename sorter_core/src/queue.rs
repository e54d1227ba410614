//! Per-category ring buffer of detections waiting to reach their actuator.
//!
//! A slot is `Some(position)` while the object it records is still in
//! flight and `None` once it has fired or was never written, so a detection
//! at position 0 is an ordinary detection.
//!
//! Pushing never fails: the write cursor wraps and overwrites whatever it
//! lands on, including a detection that has not fired yet. Capacity is sized
//! above the number of objects that can be between sensor and actuator at
//! line speed; `pending_at_cursor()` lets the caller report the rare loss.

use std::iter::FusedIterator;

use sorter_traits::Position;

use crate::config::QUEUE_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionQueue<const N: usize = QUEUE_CAPACITY> {
    slots: [Option<Position>; N],
    cursor: usize,
}

impl<const N: usize> Default for DetectionQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DetectionQueue<N> {
    pub const fn new() -> Self {
        const { assert!(N > 0, "detection queue needs at least one slot") };
        Self {
            slots: [None; N],
            cursor: 0,
        }
    }

    /// Record a detection at the write cursor and advance it, wrapping at N.
    pub fn push(&mut self, position: Position) {
        self.slots[self.cursor] = Some(position);
        self.cursor = (self.cursor + 1) % N;
    }

    /// The unfired detection the next `push` would overwrite, if any.
    #[inline]
    pub fn pending_at_cursor(&self) -> Option<Position> {
        self.slots[self.cursor]
    }

    /// Yield and clear every detection that has travelled at least `offset`
    /// pulses by `current`.
    ///
    /// Slots are visited in index order, not arrival order. The scan is lazy:
    /// a slot is only cleared when the iterator reaches it, so dropping the
    /// iterator early leaves the remaining slots untouched.
    pub fn scan_and_consume(&mut self, current: Position, offset: Position) -> Arrivals<'_> {
        Arrivals {
            slots: &mut self.slots,
            next: 0,
            current,
            offset,
        }
    }

    /// Number of detections still in flight.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Slot the next push writes to.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Pending positions in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.slots.iter().filter_map(|s| *s)
    }

    /// Drop every pending detection and rewind the cursor.
    pub fn clear(&mut self) {
        self.slots = [None; N];
        self.cursor = 0;
    }
}

/// Iterator returned by [`DetectionQueue::scan_and_consume`].
#[derive(Debug)]
pub struct Arrivals<'a> {
    slots: &'a mut [Option<Position>],
    next: usize,
    current: Position,
    offset: Position,
}

impl Iterator for Arrivals<'_> {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        while self.next < self.slots.len() {
            let slot = &mut self.slots[self.next];
            self.next += 1;
            if let Some(p) = *slot
                && self.current >= p.saturating_add(self.offset)
            {
                *slot = None;
                return Some(p);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.slots.len() - self.next))
    }
}

impl FusedIterator for Arrivals<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_exactly_at_offset_and_only_once() {
        let mut q: DetectionQueue = DetectionQueue::new();
        q.push(1000);
        assert_eq!(q.scan_and_consume(1249, 250).collect::<Vec<_>>(), vec![]);
        assert_eq!(q.scan_and_consume(1250, 250).collect::<Vec<_>>(), vec![1000]);
        assert!(q.is_empty());
        assert_eq!(q.scan_and_consume(1300, 250).collect::<Vec<_>>(), vec![]);
    }

    #[test]
    fn position_zero_is_a_real_detection() {
        let mut q: DetectionQueue<4> = DetectionQueue::new();
        q.push(0);
        assert_eq!(q.len(), 1);
        assert_eq!(q.scan_and_consume(99, 100).count(), 0);
        assert_eq!(q.scan_and_consume(100, 100).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn wraps_and_overwrites_oldest() {
        let mut q: DetectionQueue<3> = DetectionQueue::new();
        for p in [10, 20, 30] {
            q.push(p);
        }
        assert_eq!(q.cursor(), 0);
        assert_eq!(q.pending_at_cursor(), Some(10));
        q.push(40);
        assert_eq!(q.iter().collect::<Vec<_>>(), vec![40, 20, 30]);
        // Index order, not arrival order.
        assert_eq!(
            q.scan_and_consume(1_000, 0).collect::<Vec<_>>(),
            vec![40, 20, 30]
        );
    }

    #[test]
    fn consumed_slot_is_free_for_the_cursor() {
        let mut q: DetectionQueue<2> = DetectionQueue::new();
        q.push(5);
        q.push(6);
        assert_eq!(q.scan_and_consume(5, 0).collect::<Vec<_>>(), vec![5]);
        assert_eq!(q.pending_at_cursor(), None);
    }

    #[test]
    fn dropped_scan_leaves_later_slots() {
        let mut q: DetectionQueue<3> = DetectionQueue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        let first = q.scan_and_consume(100, 0).next();
        assert_eq!(first, Some(1));
        assert_eq!(q.iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn offset_addition_saturates() {
        let mut q: DetectionQueue<1> = DetectionQueue::new();
        q.push(Position::MAX - 1);
        assert_eq!(q.scan_and_consume(Position::MAX - 1, 10).count(), 0);
        assert_eq!(q.scan_and_consume(Position::MAX, 10).count(), 1);
    }

    #[test]
    fn clear_rewinds() {
        let mut q: DetectionQueue<3> = DetectionQueue::new();
        q.push(1);
        q.push(2);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.cursor(), 0);
        assert_eq!(q.capacity(), 3);
    }
}

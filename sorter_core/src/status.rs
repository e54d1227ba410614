//! What a tick did, and what the line has done so far.

use sorter_traits::Position;

use crate::category::Category;

/// One observable outcome of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortEvent {
    /// A detection was recorded for `category` at `position`.
    Stored { category: Category, position: Position },
    /// Storing overwrote a detection that had not fired yet.
    Overwrote { category: Category, lost: Position },
    /// The classifier reported an object it could not identify.
    Unidentified { position: Position },
    /// A code outside the known set was received and ignored.
    UnknownCode { code: u8, position: Position },
    /// An actuator was energized for the object detected at `detected_at`.
    Fired {
        category: Category,
        detected_at: Position,
        position: Position,
    },
    /// An actuator was de-energized after `held_ms`.
    Released { category: Category, held_ms: u64 },
}

/// Result of one `SortScheduler::tick()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub position: Position,
    pub now_ms: u64,
    /// The ingest gate opened on this tick.
    pub polled: bool,
    pub events: Vec<SortEvent>,
}

impl TickReport {
    pub fn fired(&self) -> impl Iterator<Item = (Category, Position)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            SortEvent::Fired {
                category,
                detected_at,
                ..
            } => Some((category, detected_at)),
            _ => None,
        })
    }
}

/// Running counters for the whole line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStats {
    pub ticks: u64,
    pub polls: u64,
    pub stored: [u64; Category::COUNT],
    pub fired: [u64; Category::COUNT],
    pub overwritten: [u64; Category::COUNT],
    pub unidentified: u64,
    pub unknown_codes: u64,
    pub link_errors: u64,
    pub actuator_errors: u64,
    pub encoder_errors: u64,
}

impl LineStats {
    /// Fold one event into the counters.
    pub fn record(&mut self, event: &SortEvent) {
        match *event {
            SortEvent::Stored { category, .. } => self.stored[category.index()] += 1,
            SortEvent::Overwrote { category, .. } => self.overwritten[category.index()] += 1,
            SortEvent::Unidentified { .. } => self.unidentified += 1,
            SortEvent::UnknownCode { .. } => self.unknown_codes += 1,
            SortEvent::Fired { category, .. } => self.fired[category.index()] += 1,
            SortEvent::Released { .. } => {}
        }
    }

    pub fn total_fired(&self) -> u64 {
        self.fired.iter().sum()
    }

    pub fn total_stored(&self) -> u64 {
        self.stored.iter().sum()
    }

    pub fn total_errors(&self) -> u64 {
        self.link_errors + self.actuator_errors + self.encoder_errors
    }
}

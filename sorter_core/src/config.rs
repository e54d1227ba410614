//! Runtime configuration for the scheduler.
//!
//! Separate from the TOML schema in `sorter_config`; see `conversions` for
//! the mapping.

use sorter_traits::Position;

use crate::category::Category;
use crate::error::BuildError;

/// Slots per detection queue. Must exceed the number of objects of one
/// category that can sit between the sensor and its actuator at once.
pub const QUEUE_CAPACITY: usize = 10;

/// Line geometry and timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCfg {
    /// Minimum travel, in pulses, between two polls of the category link.
    pub quantization_pulses: Position,
    /// How long an actuator stays energized per detection.
    pub pulse_width_ms: u64,
    /// Pulses from the sensor to each category's actuator, by `Category::index()`.
    pub offsets: [Position; Category::COUNT],
    /// Send the readiness token upstream on start and after every poll.
    pub handshake: bool,
}

impl Default for LineCfg {
    fn default() -> Self {
        Self {
            quantization_pulses: sorter_config::DEFAULT_QUANTIZATION_PULSES,
            pulse_width_ms: sorter_config::DEFAULT_PULSE_WIDTH_MS,
            offsets: [
                sorter_config::DEFAULT_OFFSET_A,
                sorter_config::DEFAULT_OFFSET_B,
                sorter_config::DEFAULT_OFFSET_C,
            ],
            handshake: true,
        }
    }
}

impl LineCfg {
    #[inline]
    pub fn offset(&self, category: Category) -> Position {
        self.offsets[category.index()]
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.quantization_pulses <= 0 {
            return Err(BuildError::InvalidConfig("quantization_pulses must be > 0"));
        }
        if self.pulse_width_ms == 0 {
            return Err(BuildError::InvalidConfig("pulse_width_ms must be >= 1"));
        }
        if self.offsets.iter().any(|&o| o < 0) {
            return Err(BuildError::InvalidConfig("offsets must be >= 0"));
        }
        Ok(())
    }
}

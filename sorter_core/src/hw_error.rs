//! Maps `Box<dyn Error>` from trait boundaries to typed `SorterError`.
//!
//! With the `hardware-errors` feature, `sorter_hardware::error::HwError` is
//! downcast for a precise mapping.

use crate::error::SorterError;

/// Map a trait-boundary error to a typed `SorterError`.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SorterError {
    if let Some(se) = e.downcast_ref::<SorterError>() {
        return se.clone();
    }

    #[cfg(feature = "hardware-errors")]
    {
        use sorter_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Uart(msg) => SorterError::Link(msg.clone()),
                HwError::Disconnected => SorterError::Link(hw.to_string()),
                HwError::Io(io) => SorterError::Io(io.to_string()),
                other @ HwError::Gpio(_) => SorterError::HardwareFault(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return SorterError::Io(io.to_string());
    }
    SorterError::Hardware(e.to_string())
}

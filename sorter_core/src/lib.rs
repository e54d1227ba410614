#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Position-indexed actuation scheduling for a sorting line (hardware-agnostic).
//!
//! Objects are classified upstream and travel on a conveyor past one
//! actuator per category. The scheduler records where each object was when
//! its category arrived, and energizes the matching actuator once the
//! conveyor has carried it that category's offset further. All hardware goes
//! through `sorter_traits`.
//!
//! ## Architecture
//!
//! - **Gate**: distance-based polling of the category link (`gate`)
//! - **Queues**: fixed ring buffer of in-flight detections per category (`queue`)
//! - **Scanner**: arrival checks across all lanes (`scanner`)
//! - **Actuators**: fixed-width non-blocking pulses (`actuator`)
//! - **Scheduler**: the per-tick control flow tying them together (`scheduler`)
//! - **Runner**: the paced main loop with shutdown handling (`runner`)

pub mod actuator;
pub mod builder;
pub mod category;
pub mod config;
pub mod conversions;
pub mod error;
pub mod gate;
pub mod hw_error;
pub mod link;
pub mod mocks;
pub mod queue;
pub mod runner;
pub mod scanner;
pub mod scheduler;
pub mod status;

pub use actuator::{ActuatorState, ActuatorTimer};
pub use builder::{DynScheduler, SchedulerBuilder, build_scheduler};
pub use category::{Category, Inbound, UNIDENTIFIED_CODE};
pub use config::{LineCfg, QUEUE_CAPACITY};
pub use error::{BuildError, Report, Result, SorterError};
pub use gate::IngestGate;
pub use link::ChannelLink;
pub use queue::DetectionQueue;
pub use runner::{RunParams, RunSummary, run};
pub use scanner::{ArrivalScanner, Lane};
pub use scheduler::SortScheduler;
pub use status::{LineStats, SortEvent, TickReport};

//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "sorter", version, about = "Conveyor sorting line controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/sorter.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Log level (error|warn|info|debug|trace); RUST_LOG wins, then this,
    /// then [logging].level, then info
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the line until Ctrl-C (GPIO/UART with the `hardware` feature,
    /// otherwise a simulated belt fed with codes on stdin)
    Run {
        /// Stop after this many ticks
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
        /// Tick period in microseconds (overrides [runner].tick_us; 0 = spin)
        #[arg(long, value_name = "US")]
        tick_us: Option<u64>,
        /// Simulated belt speed in pulses per second (no-hardware builds)
        #[arg(
            long,
            value_name = "PPS",
            default_value_t = 2000,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        speed: u32,
        /// Enable real-time mode (SCHED_FIFO, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux.\n\nAttempts SCHED_FIFO priority and calls mlockall(MCL_CURRENT|MCL_FUTURE) to keep the control loop out of page faults. May require CAP_SYS_NICE / CAP_IPC_LOCK or root."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO (1..=max)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Print loop timing and line counters on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Replay a recorded detection trace on a simulated line
    Sim {
        /// Trace CSV with headers `position,code`
        #[arg(long, value_name = "FILE")]
        trace: PathBuf,
        /// Belt speed in pulses per second
        #[arg(
            long,
            value_name = "PPS",
            default_value_t = 2000,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        speed: u32,
        /// Simulated time per tick in milliseconds
        #[arg(
            long,
            value_name = "MS",
            default_value_t = 1,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        tick_ms: u64,
        /// Number of ticks (default: until the last detection has fired and released)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
    },
    /// Validate the config and run a short simulated smoke test
    SelfCheck,
    /// Print the resolved configuration
    Health,
}

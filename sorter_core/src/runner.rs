//! The line's main loop: tick until told to stop, then release everything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use sorter_traits::{ActuatorLine, CategoryLink, Encoder};

use crate::error::Result;
use crate::scheduler::SortScheduler;
use crate::status::{LineStats, TickReport};

/// How the loop is paced and when it ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunParams {
    /// Target period between tick starts; 0 spins without sleeping.
    pub tick_period_us: u64,
    /// Stop after this many ticks (None = until shutdown).
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    /// Ticks that returned an error (encoder read failures).
    pub failed_ticks: u64,
    /// Ticks that took longer than the configured period.
    pub overruns: u64,
    pub max_tick_us: u64,
    pub mean_tick_us: u64,
    pub stats: LineStats,
}

/// Run `scheduler` until `shutdown` is set or `max_ticks` is reached.
///
/// Tick errors are logged and counted, never fatal. `on_tick` sees every
/// successful tick's report. Pacing happens between ticks, through the
/// scheduler's clock, so a `ManualClock` replays the line in simulated time.
pub fn run<E, L, A>(
    scheduler: &mut SortScheduler<E, L, A>,
    params: &RunParams,
    shutdown: &AtomicBool,
    mut on_tick: impl FnMut(&TickReport),
) -> Result<RunSummary>
where
    E: Encoder,
    L: CategoryLink,
    A: ActuatorLine,
{
    let clock = scheduler.clock().clone();
    let period = Duration::from_micros(params.tick_period_us);
    scheduler.begin().wrap_err("start sorting line")?;

    let mut summary = RunSummary::default();
    let mut total_us: u128 = 0;

    while !shutdown.load(Ordering::Relaxed) {
        if params.max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }
        let start = clock.now();
        match scheduler.tick() {
            Ok(report) => on_tick(&report),
            Err(e) => {
                summary.failed_ticks += 1;
                tracing::warn!(error = %format_args!("{e:#}"), "tick failed");
            }
        }
        summary.ticks += 1;

        let took = clock.now().saturating_duration_since(start);
        let took_us = u64::try_from(took.as_micros()).unwrap_or(u64::MAX);
        summary.max_tick_us = summary.max_tick_us.max(took_us);
        total_us += took.as_micros();

        if period.is_zero() {
            std::hint::spin_loop();
        } else if took >= period {
            summary.overruns += 1;
        } else {
            clock.sleep(period - took);
        }
    }

    if summary.ticks > 0 {
        let mean = total_us / u128::from(summary.ticks);
        summary.mean_tick_us = u64::try_from(mean).unwrap_or(u64::MAX);
    }
    let released = scheduler.release_all();
    summary.stats = scheduler.stats().clone();
    tracing::info!(
        ticks = summary.ticks,
        failed_ticks = summary.failed_ticks,
        overruns = summary.overruns,
        max_tick_us = summary.max_tick_us,
        fired = summary.stats.total_fired(),
        "sorting line stopped"
    );
    released.wrap_err("release actuators at shutdown")?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_scheduler;
    use crate::config::LineCfg;
    use crate::mocks::{ManualEncoder, NoLink, SpyLine};
    use sorter_traits::{Clock, ManualClock};
    use std::sync::Arc;

    #[test]
    fn stops_at_max_ticks_and_paces_on_clock() {
        let clock = ManualClock::new();
        let start = clock.now();
        let mut s = build_scheduler(
            ManualEncoder::new(),
            NoLink,
            [SpyLine::new(), SpyLine::new(), SpyLine::new()],
            LineCfg::default(),
            Some(Arc::new(clock.clone())),
        )
        .unwrap();
        let params = RunParams {
            tick_period_us: 1_000,
            max_ticks: Some(5),
        };
        let stop = AtomicBool::new(false);
        let mut seen = 0;
        let summary = run(&mut s, &params, &stop, |_| seen += 1).unwrap();
        assert_eq!(summary.ticks, 5);
        assert_eq!(seen, 5);
        assert_eq!(summary.failed_ticks, 0);
        assert_eq!(clock.ms_since(start), 5);
    }

    #[test]
    fn shutdown_flag_ends_immediately() {
        let mut s = build_scheduler(
            ManualEncoder::new(),
            NoLink,
            [SpyLine::new(), SpyLine::new(), SpyLine::new()],
            LineCfg::default(),
            Some(Arc::new(ManualClock::new())),
        )
        .unwrap();
        let stop = AtomicBool::new(true);
        let summary = run(&mut s, &RunParams::default(), &stop, |_| {}).unwrap();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.mean_tick_us, 0);
    }
}

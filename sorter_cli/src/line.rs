//! Line assembly: simulated belts, trace replay, stdin feeding, and (with
//! the `hardware` feature) GPIO/UART parts.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::rc::Rc;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use eyre::WrapErr;
use sorter_config::{Config, TraceRow};
use sorter_core::error::SorterError;
use sorter_core::hw_error::map_hw_error;
use sorter_core::{ChannelLink, LineCfg, SortScheduler, build_scheduler};
use sorter_hardware::codec::CodeDecoder;
use sorter_hardware::error::HwError;
use sorter_hardware::{LineProbe, SimulatedConveyor, SimulatedEncoder, SimulatedLine, TraceLink};
use sorter_traits::{Clock, Position};

pub type TraceScheduler = SortScheduler<SimulatedEncoder, TraceLink, SimulatedLine>;
#[cfg_attr(all(feature = "hardware", target_os = "linux"), allow(dead_code))]
pub type StdinScheduler = SortScheduler<SimulatedEncoder, ChannelLink, SimulatedLine>;

fn sim_lines() -> ([SimulatedLine; 3], [LineProbe; 3]) {
    let lines = [
        SimulatedLine::new("a"),
        SimulatedLine::new("b"),
        SimulatedLine::new("c"),
    ];
    let probes = [lines[0].probe(), lines[1].probe(), lines[2].probe()];
    (lines, probes)
}

/// A simulated line replaying `trace` at `speed` pulses per second.
pub fn trace_line(
    cfg: &Config,
    trace: &[TraceRow],
    speed: u32,
    clock: Arc<dyn Clock + Send + Sync>,
) -> eyre::Result<(TraceScheduler, [LineProbe; 3])> {
    let conveyor = SimulatedConveyor::new(Arc::clone(&clock), speed);
    let encoder = SimulatedEncoder::new(Rc::clone(&conveyor));
    let link = TraceLink::new(
        conveyor,
        trace.iter().map(|r| (r.position, r.code)),
        cfg.link.handshake,
    );
    let (lines, probes) = sim_lines();
    let s = build_scheduler(encoder, link, lines, LineCfg::from(cfg), Some(clock))
        .wrap_err("build simulated line")?;
    Ok((s, probes))
}

/// A simulated belt whose category codes arrive on stdin.
#[cfg_attr(all(feature = "hardware", target_os = "linux"), allow(dead_code))]
pub fn stdin_line(
    cfg: &Config,
    speed: u32,
    clock: Arc<dyn Clock + Send + Sync>,
) -> eyre::Result<StdinScheduler> {
    let conveyor = SimulatedConveyor::new(Arc::clone(&clock), speed);
    let encoder = SimulatedEncoder::new(conveyor);
    let (rx, ready) = spawn_stdin_feeder()?;
    let link = ChannelLink::with_ready(rx, ready);
    let (lines, _) = sim_lines();
    build_scheduler(encoder, link, lines, LineCfg::from(cfg), Some(clock))
        .wrap_err("build stdin-fed line")
}

/// Ticks needed for every detection in `trace` to fire and release.
///
/// Each code may wait one quantum per code queued ahead of it when the
/// readiness handshake paces delivery.
pub fn ticks_to_drain(cfg: &Config, trace: &[TraceRow], speed: u32, tick_ms: u64) -> u64 {
    let last = trace.last().map_or(0, |r| r.position).max(0);
    let max_offset = cfg.offsets.a.max(cfg.offsets.b).max(cfg.offsets.c);
    let backlog = Position::try_from(trace.len()).unwrap_or(Position::MAX);
    let distance = last
        .saturating_add(max_offset)
        .saturating_add(cfg.line.quantization_pulses.saturating_mul(backlog.saturating_add(1)));
    let distance = u64::try_from(distance).unwrap_or(0);
    let travel_ms = distance.saturating_mul(1000).div_ceil(u64::from(speed.max(1)));
    let total_ms = travel_ms
        .saturating_add(cfg.line.pulse_width_ms)
        .saturating_add(1);
    total_ms.div_ceil(tick_ms.max(1)).saturating_add(1)
}

/// Decode codes from `reader` until EOF, sending each one on `tx`.
///
/// A read that returns is treated as the sender going quiet, so a bare
/// number at the end of a chunk is completed. Returns the number of codes sent.
#[cfg_attr(all(feature = "hardware", target_os = "linux"), allow(dead_code))]
pub fn feed(mut reader: impl Read, tx: &Sender<u8>) -> usize {
    let mut decoder = CodeDecoder::new();
    let mut buf = [0u8; 64];
    let mut codes = VecDeque::new();
    let mut sent = 0;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed; feeder stopping");
                break;
            }
        };
        decoder.decode_chunk(&buf[..n], &mut codes);
        for code in codes.drain(..) {
            if tx.send(code).is_err() {
                return sent;
            }
            sent += 1;
        }
    }
    tracing::debug!(sent, "stdin feeder reached EOF");
    sent
}

/// Classify a device that failed to open the same way a runtime fault on it
/// is classified: UART failures are link errors, GPIO failures hardware faults.
#[cfg_attr(not(all(feature = "hardware", target_os = "linux")), allow(dead_code))]
pub(crate) fn open_error(e: HwError) -> SorterError {
    map_hw_error(&e)
}

/// Start the stdin reader and the readiness writer (`ok` lines on stdout).
#[cfg_attr(all(feature = "hardware", target_os = "linux"), allow(dead_code))]
fn spawn_stdin_feeder() -> eyre::Result<(Receiver<u8>, Sender<()>)> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let (ready_tx, ready_rx) = crossbeam_channel::bounded::<()>(1);
    thread::Builder::new()
        .name("stdin-feeder".into())
        .spawn(move || feed(std::io::stdin().lock(), &tx))
        .wrap_err("spawn stdin feeder")?;
    thread::Builder::new()
        .name("ready-writer".into())
        .spawn(move || {
            let mut out = std::io::stdout();
            for () in ready_rx.iter() {
                if writeln!(out, "ok").and_then(|()| out.flush()).is_err() {
                    break;
                }
            }
        })
        .wrap_err("spawn readiness writer")?;
    Ok((rx, ready_tx))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod hw {
    //! Raspberry Pi line: quadrature encoder and actuators on GPIO,
    //! classifier on the UART.

    use super::open_error;
    use eyre::WrapErr;
    use sorter_config::Config;
    use sorter_core::{LineCfg, SortScheduler, build_scheduler};
    use sorter_hardware::gpio::{GpioActuator, GpioEncoder};
    use sorter_hardware::uart::UartLink;
    use sorter_traits::MonotonicClock;
    use std::sync::Arc;

    pub type HwScheduler = SortScheduler<GpioEncoder, UartLink, GpioActuator>;

    pub fn hardware_line(cfg: &Config) -> eyre::Result<HwScheduler> {
        let p = &cfg.pins;
        let encoder = GpioEncoder::new(p.encoder_a, p.encoder_b)
            .map_err(open_error)
            .wrap_err("open encoder pins")?;
        let link = UartLink::open(&cfg.link.device, cfg.link.baud)
            .map_err(open_error)
            .wrap_err_with(|| format!("open classifier link {}", cfg.link.device))?;
        let lines = [
            GpioActuator::new(p.actuator_a).map_err(open_error).wrap_err("open actuator a")?,
            GpioActuator::new(p.actuator_b).map_err(open_error).wrap_err("open actuator b")?,
            GpioActuator::new(p.actuator_c).map_err(open_error).wrap_err("open actuator c")?,
        ];
        build_scheduler(
            encoder,
            link,
            lines,
            LineCfg::from(cfg),
            Some(Arc::new(MonotonicClock::new())),
        )
        .wrap_err("build hardware line")
    }
}

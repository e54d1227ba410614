#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! `sorter`: run, simulate and check a conveyor sorting line.

mod cli;
mod error_fmt;
mod line;
mod logging;
mod report;
mod rt;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use sorter_config::{Config, TraceRow};
use sorter_core::error::SorterError;
use sorter_core::{Category, RunParams, run};
use sorter_traits::ManualClock;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    let code = match real_main(cli) {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %format_args!("{err:#}"), "command failed");
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SorterError::Config(format!("read {}: {e}", path.display())))?;
    let cfg = sorter_config::load_toml(&text)
        .map_err(|e| SorterError::Config(format!("parse {}: {e}", path.display())))?;
    cfg.validate()
        .map_err(|e| SorterError::Config(format!("{e:#}")))?;
    Ok(cfg)
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config);
    let default_logging = sorter_config::Logging::default();
    let log_cfg = cfg.as_ref().map_or(&default_logging, |c| &c.logging);
    logging::init(cli.log_level.as_deref(), log_cfg, cli.json)?;
    let cfg = cfg.wrap_err_with(|| format!("load config {}", cli.config.display()))?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run {
            max_ticks,
            tick_us,
            speed,
            rt,
            rt_prio,
            stats,
        } => cmd_run(&cfg, max_ticks, tick_us, speed, rt, rt_prio, stats, cli.json),
        Commands::Sim {
            trace,
            speed,
            tick_ms,
            ticks,
        } => {
            let rows = sorter_config::load_trace_csv(&trace)?;
            cmd_sim(&cfg, &rows, speed, tick_ms, ticks, cli.json)
        }
        Commands::SelfCheck => cmd_self_check(&cfg, cli.json),
        Commands::Health => {
            cmd_health(&cfg, cli.json);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
fn cmd_run(
    cfg: &Config,
    max_ticks: Option<u64>,
    tick_us: Option<u64>,
    speed: u32,
    rt: bool,
    rt_prio: Option<i32>,
    stats: bool,
    json: bool,
) -> eyre::Result<()> {
    rt::setup_rt_once(rt, rt_prio);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let mut params = RunParams::from(&cfg.runner);
    if let Some(us) = tick_us {
        params.tick_period_us = us;
    }
    params.max_ticks = max_ticks;

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    let mut scheduler = {
        let _ = speed;
        line::hw::hardware_line(cfg)?
    };
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    let mut scheduler = line::stdin_line(cfg, speed, Arc::new(sorter_traits::MonotonicClock::new()))?;

    tracing::info!(
        tick_period_us = params.tick_period_us,
        max_ticks = ?params.max_ticks,
        "line running; Ctrl-C to stop"
    );
    let summary = run(&mut scheduler, &params, &shutdown, |_| {})?;

    report::print_summary(&summary, json);
    if stats || cfg.runner.stats {
        report::print_stats(&summary, params.tick_period_us);
    }
    Ok(())
}

fn cmd_sim(
    cfg: &Config,
    rows: &[TraceRow],
    speed: u32,
    tick_ms: u64,
    ticks: Option<u64>,
    json: bool,
) -> eyre::Result<()> {
    let clock = ManualClock::new();
    let (mut scheduler, _) = line::trace_line(cfg, rows, speed, Arc::new(clock))?;
    let params = RunParams {
        tick_period_us: tick_ms.saturating_mul(1000),
        max_ticks: Some(ticks.unwrap_or_else(|| line::ticks_to_drain(cfg, rows, speed, tick_ms))),
    };
    tracing::info!(
        detections = rows.len(),
        speed,
        tick_ms,
        ticks = ?params.max_ticks,
        "replaying trace"
    );
    let stop = AtomicBool::new(false);
    let summary = run(&mut scheduler, &params, &stop, |r| report::print_tick(r, json))?;
    report::print_summary(&summary, json);
    Ok(())
}

fn cmd_self_check(cfg: &Config, json: bool) -> eyre::Result<()> {
    let trace: Vec<TraceRow> = Category::ALL
        .iter()
        .zip([100, 200, 300])
        .map(|(c, position)| TraceRow {
            position,
            code: c.code(),
        })
        .collect();
    let speed = 2_000;
    let (mut scheduler, probes) =
        line::trace_line(cfg, &trace, speed, Arc::new(ManualClock::new()))?;
    let params = RunParams {
        tick_period_us: 1_000,
        max_ticks: Some(line::ticks_to_drain(cfg, &trace, speed, 1)),
    };
    let summary = run(&mut scheduler, &params, &AtomicBool::new(false), |_| {})
        .wrap_err("simulated smoke run")?;

    let all_fired = summary.stats.fired == [1, 1, 1];
    let all_released = probes
        .iter()
        .all(|p| !p.is_active() && p.activations() == 1);
    if !(all_fired && all_released) {
        return Err(SorterError::State(format!(
            "smoke run fired {:?}, expected one pulse per category",
            summary.stats.fired
        )))
        .wrap_err("self-check failed");
    }

    if json {
        println!("{}", serde_json::json!({ "self_check": "ok", "ticks": summary.ticks }));
    } else {
        println!("self-check ok: config valid, simulated line fired a, b and c once each");
    }
    Ok(())
}

fn cmd_health(cfg: &Config, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "quantization_pulses": cfg.line.quantization_pulses,
                "pulse_width_ms": cfg.line.pulse_width_ms,
                "offsets": { "a": cfg.offsets.a, "b": cfg.offsets.b, "c": cfg.offsets.c },
                "link": { "device": cfg.link.device, "baud": cfg.link.baud, "handshake": cfg.link.handshake },
                "queue_capacity": sorter_core::QUEUE_CAPACITY,
                "hardware": cfg!(all(feature = "hardware", target_os = "linux")),
            })
        );
    } else {
        println!("status: ok");
        println!(
            "line: quantization {} pulses, pulse width {} ms, queue capacity {}",
            cfg.line.quantization_pulses,
            cfg.line.pulse_width_ms,
            sorter_core::QUEUE_CAPACITY
        );
        println!(
            "offsets: a={} b={} c={}",
            cfg.offsets.a, cfg.offsets.b, cfg.offsets.c
        );
        println!(
            "link: {} @ {} baud, handshake {}",
            cfg.link.device,
            cfg.link.baud,
            if cfg.link.handshake { "on" } else { "off" }
        );
    }
}

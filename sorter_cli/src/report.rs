//! Printing tick events and run summaries (text or JSON lines).

use serde_json::{Value, json};
use sorter_core::{Category, LineStats, RunSummary, SortEvent, TickReport};

fn per_category(counts: &[u64; Category::COUNT]) -> Value {
    json!({ "a": counts[0], "b": counts[1], "c": counts[2] })
}

fn per_category_text(counts: &[u64; Category::COUNT]) -> String {
    Category::ALL
        .iter()
        .map(|c| format!("{c}={}", counts[c.index()]))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn event_json(t_ms: u64, event: &SortEvent) -> Value {
    match *event {
        SortEvent::Stored { category, position } => {
            json!({ "t_ms": t_ms, "event": "stored", "category": category.name(), "position": position })
        }
        SortEvent::Overwrote { category, lost } => {
            json!({ "t_ms": t_ms, "event": "overwrote", "category": category.name(), "lost": lost })
        }
        SortEvent::Unidentified { position } => {
            json!({ "t_ms": t_ms, "event": "unidentified", "position": position })
        }
        SortEvent::UnknownCode { code, position } => {
            json!({ "t_ms": t_ms, "event": "unknown_code", "code": code, "position": position })
        }
        SortEvent::Fired {
            category,
            detected_at,
            position,
        } => json!({
            "t_ms": t_ms,
            "event": "fired",
            "category": category.name(),
            "detected_at": detected_at,
            "position": position,
        }),
        SortEvent::Released { category, held_ms } => {
            json!({ "t_ms": t_ms, "event": "released", "category": category.name(), "held_ms": held_ms })
        }
    }
}

pub fn event_text(t_ms: u64, event: &SortEvent) -> String {
    let what = match *event {
        SortEvent::Stored { category, position } => format!("stored     {category} at {position}"),
        SortEvent::Overwrote { category, lost } => {
            format!("overwrote  {category} lost detection at {lost}")
        }
        SortEvent::Unidentified { position } => format!("unidentified at {position}"),
        SortEvent::UnknownCode { code, position } => format!("unknown    code {code} at {position}"),
        SortEvent::Fired {
            category,
            detected_at,
            position,
        } => format!("fired      {category} at {position} (detected at {detected_at})"),
        SortEvent::Released { category, held_ms } => {
            format!("released   {category} after {held_ms} ms")
        }
    };
    format!("{t_ms:>8} ms  {what}")
}

/// Print every event of a tick to stdout.
pub fn print_tick(report: &TickReport, json: bool) {
    for ev in &report.events {
        if json {
            println!("{}", event_json(report.now_ms, ev));
        } else {
            println!("{}", event_text(report.now_ms, ev));
        }
    }
}

pub fn summary_json(summary: &RunSummary) -> Value {
    let s: &LineStats = &summary.stats;
    json!({
        "summary": {
            "ticks": summary.ticks,
            "failed_ticks": summary.failed_ticks,
            "overruns": summary.overruns,
            "max_tick_us": summary.max_tick_us,
            "mean_tick_us": summary.mean_tick_us,
            "polls": s.polls,
            "stored": per_category(&s.stored),
            "fired": per_category(&s.fired),
            "overwritten": per_category(&s.overwritten),
            "unidentified": s.unidentified,
            "unknown_codes": s.unknown_codes,
            "link_errors": s.link_errors,
            "actuator_errors": s.actuator_errors,
            "encoder_errors": s.encoder_errors,
        }
    })
}

/// Line counters to stdout.
pub fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        println!("{}", summary_json(summary));
        return;
    }
    let s = &summary.stats;
    println!("--- Line Summary ---");
    println!("Ticks: {} (failed {})", summary.ticks, summary.failed_ticks);
    println!("Polls: {}", s.polls);
    println!("Stored: {}", per_category_text(&s.stored));
    println!("Fired: {}", per_category_text(&s.fired));
    println!("Overwritten: {}", per_category_text(&s.overwritten));
    println!(
        "Unidentified: {}  Unknown codes: {}",
        s.unidentified, s.unknown_codes
    );
    println!(
        "Errors link/actuator/encoder: {} / {} / {}",
        s.link_errors, s.actuator_errors, s.encoder_errors
    );
}

/// Loop timing to stderr.
pub fn print_stats(summary: &RunSummary, tick_us: u64) {
    eprintln!("\n--- Sorter Stats ---");
    eprintln!("Ticks: {}", summary.ticks);
    eprintln!("Period (us): {tick_us}");
    eprintln!(
        "Tick latency mean/max (us): {} / {}",
        summary.mean_tick_us, summary.max_tick_us
    );
    eprintln!("Missed deadlines (> period): {}", summary.overruns);
    eprintln!("--------------------\n");
}

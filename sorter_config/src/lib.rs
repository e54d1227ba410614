#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and trace parsing for the sorting line.
//!
//! - `Config` and its sections are deserialized from TOML and validated once
//!   at start-up; nothing here is reloaded while the line runs.
//! - The trace CSV loader feeds the simulator with a recorded sequence of
//!   upstream classifications, keyed by encoder position.
use serde::Deserialize;

/// Encoder travel between two polls of the category channel (pulses).
pub const DEFAULT_QUANTIZATION_PULSES: i64 = 100;
/// How long an actuator stays energized per trigger.
pub const DEFAULT_PULSE_WIDTH_MS: u64 = 100;
/// Downstream distance from detection point to actuator, per category.
pub const DEFAULT_OFFSET_A: i64 = 250;
pub const DEFAULT_OFFSET_B: i64 = 500;
pub const DEFAULT_OFFSET_C: i64 = 750;

/// Upper bound accepted for `line.pulse_width_ms`.
const MAX_PULSE_WIDTH_MS: u64 = 10_000;

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Pins {
    pub encoder_a: u8,
    pub encoder_b: u8,
    pub actuator_a: u8,
    pub actuator_b: u8,
    pub actuator_c: u8,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct LineCfg {
    /// Minimum encoder advance between channel polls. Also accepts the
    /// legacy name "tamano_posicion".
    #[serde(alias = "tamano_posicion")]
    pub quantization_pulses: i64,
    pub pulse_width_ms: u64,
}

impl Default for LineCfg {
    fn default() -> Self {
        Self {
            quantization_pulses: DEFAULT_QUANTIZATION_PULSES,
            pulse_width_ms: DEFAULT_PULSE_WIDTH_MS,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Offsets {
    pub a: i64,
    pub b: i64,
    pub c: i64,
}

impl Default for Offsets {
    fn default() -> Self {
        Self {
            a: DEFAULT_OFFSET_A,
            b: DEFAULT_OFFSET_B,
            c: DEFAULT_OFFSET_C,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LinkCfg {
    /// Serial device the classifier is attached to
    pub device: String,
    pub baud: u32,
    /// Send "ok" upstream whenever the controller can take the next code
    pub handshake: bool,
}

impl Default for LinkCfg {
    fn default() -> Self {
        Self {
            device: "/dev/serial0".to_string(),
            baud: 9600,
            handshake: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct RunnerCfg {
    /// Idle time between ticks in microseconds (0 = spin)
    pub tick_us: u64,
    /// Print tick latency statistics on exit
    pub stats: bool,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub line: LineCfg,
    #[serde(default)]
    pub offsets: Offsets,
    #[serde(default)]
    pub link: LinkCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Line
        if self.line.quantization_pulses <= 0 {
            eyre::bail!("line.quantization_pulses must be > 0");
        }
        if self.line.pulse_width_ms == 0 {
            eyre::bail!("line.pulse_width_ms must be >= 1");
        }
        if self.line.pulse_width_ms > MAX_PULSE_WIDTH_MS {
            eyre::bail!("line.pulse_width_ms is unreasonably large (>10s)");
        }

        // Offsets
        for (name, v) in [
            ("a", self.offsets.a),
            ("b", self.offsets.b),
            ("c", self.offsets.c),
        ] {
            if v < 0 {
                eyre::bail!("offsets.{name} must be >= 0");
            }
        }

        // Link
        if self.link.baud == 0 {
            eyre::bail!("link.baud must be > 0");
        }
        if self.link.device.trim().is_empty() {
            eyre::bail!("link.device must not be empty");
        }

        // Pins: every line needs its own GPIO
        let pins = [
            ("encoder_a", self.pins.encoder_a),
            ("encoder_b", self.pins.encoder_b),
            ("actuator_a", self.pins.actuator_a),
            ("actuator_b", self.pins.actuator_b),
            ("actuator_c", self.pins.actuator_c),
        ];
        for (i, (name, pin)) in pins.iter().enumerate() {
            if let Some((other, _)) = pins[i + 1..].iter().find(|(_, p)| p == pin) {
                eyre::bail!("pins.{name} and pins.{other} share GPIO {pin}");
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}

/// Trace CSV schema: one upstream classification per row.
///
/// Expected headers:
/// position,code
///
/// Example:
/// position,code
/// 1000,0
/// 1400,2
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TraceRow {
    /// Encoder position at which the classifier reports the object
    pub position: i64,
    /// Category code as sent on the wire
    pub code: u8,
}

/// Parse a trace from any reader, enforcing headers and position order.
pub fn read_trace<R: std::io::Read>(reader: R) -> eyre::Result<Vec<TraceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read trace CSV headers: {e}"))?
        .clone();
    let expected = ["position", "code"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "trace CSV must have headers 'position,code', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<TraceRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<TraceRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid trace row {}: {}", idx + 2, e))?;
        if let Some(prev) = rows.last()
            && row.position < prev.position
        {
            eyre::bail!(
                "trace positions must be non-decreasing (row {}: {} < {})",
                idx + 2,
                row.position,
                prev.position
            );
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_trace_csv(path: &std::path::Path) -> eyre::Result<Vec<TraceRow>> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open trace CSV {:?}: {}", path, e))?;
    read_trace(file).map_err(|e| e.wrap_err(format!("trace CSV {}", path.display())))
}

//! Tracing subscriber setup: console layer plus optional JSON file layer.

use std::path::Path;

use eyre::WrapErr;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::FILE_GUARD;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber. Console output goes to stderr so stdout
/// stays free for reports.
pub fn init(level: Option<&str>, logging: &sorter_config::Logging, json: bool) -> eyre::Result<()> {
    let directive = level.or(logging.level.as_deref()).unwrap_or("info");
    let console_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(directive)
            .wrap_err_with(|| format!("invalid log level {directive:?}"))?,
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };
    layers.push(console);

    if let Some(file) = logging.file.as_deref() {
        let rotation = match logging.rotation.as_deref() {
            Some("daily") => Rotation::DAILY,
            Some("hourly") => Rotation::HOURLY,
            _ => Rotation::NEVER,
        };
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let Some(name) = path.file_name() else {
            eyre::bail!("logging.file {file:?} has no file name");
        };
        let appender = RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(name.to_string_lossy().into_owned())
            .build(dir)
            .wrap_err_with(|| format!("open log file {file:?}"))?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_filter = EnvFilter::try_new(directive)
            .wrap_err_with(|| format!("invalid log level {directive:?}"))?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    Registry::default()
        .with(layers)
        .try_init()
        .wrap_err("install tracing subscriber")
}

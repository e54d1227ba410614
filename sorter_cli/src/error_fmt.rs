//! Human-readable error descriptions and structured JSON error formatting.

use sorter_core::error::{BuildError, SorterError};

/// Exit code for an invalid or unreadable configuration.
pub const EXIT_CONFIG: i32 = 3;
/// Exit code for GPIO/UART initialisation failures (hardware or link).
pub const EXIT_HARDWARE: i32 = 4;

fn find<T: std::error::Error + 'static>(err: &eyre::Report) -> Option<&T> {
    err.chain().find_map(|e| e.downcast_ref::<T>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingEncoder => {
                "What happened: No encoder was wired into the scheduler.\nLikely causes: The encoder failed to initialize or was not passed to the builder.\nHow to fix: Check [pins].encoder_a/encoder_b and the GPIO permissions.".to_string()
            }
            BuildError::MissingLink => {
                "What happened: No category link was wired into the scheduler.\nLikely causes: The serial port or stdin feeder failed to start.\nHow to fix: Check [link].device and that the classifier is connected.".to_string()
            }
            BuildError::MissingActuator(c) => format!(
                "What happened: No actuator for category {c} was wired into the scheduler.\nLikely causes: The output pin failed to initialize.\nHow to fix: Check [pins].actuator_{c} in the config."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(se) = find::<SorterError>(err) {
        return match se {
            SorterError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: A typo, a missing [pins] section, or an out-of-range value.\nHow to fix: Edit the TOML config and try again (`sorter health` prints what was loaded)."
            ),
            SorterError::Hardware(msg) | SorterError::HardwareFault(msg) => format!(
                "What happened: Hardware could not be used ({msg}).\nLikely causes: Wrong pin numbers, missing GPIO/serial permissions, or a disconnected device.\nHow to fix: Fix the [pins] and [link] values; make sure the process may access /dev/gpiomem and the serial device."
            ),
            SorterError::Link(msg) => format!(
                "What happened: The classifier link failed ({msg}).\nLikely causes: Serial cable unplugged or the upstream process exited.\nHow to fix: Reconnect the classifier and restart the line."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = format!("{err:#}");
    if msg
        .to_ascii_lowercase()
        .contains("trace csv must have headers")
    {
        return "Invalid headers in trace CSV. Expected 'position,code'.".to_string();
    }

    format!(
        "Something went wrong: {msg}\nHow to fix: Re-run with --log-level=debug for details."
    )
}

/// Stable exit codes: 3 for configuration, 4 for hardware start-up, 1 otherwise.
/// (clap exits with 2 on usage errors before any of this runs.)
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(BuildError::InvalidConfig(_)) = find::<BuildError>(err) {
        return EXIT_CONFIG;
    }
    match find::<SorterError>(err) {
        Some(SorterError::Config(_)) => EXIT_CONFIG,
        Some(
            SorterError::Hardware(_) | SorterError::HardwareFault(_) | SorterError::Link(_),
        ) => EXIT_HARDWARE,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::InvalidConfig(_) => "InvalidConfig",
            _ => "Build",
        };
    }
    match find::<SorterError>(err) {
        Some(SorterError::Config(_)) => "InvalidConfig",
        Some(SorterError::Hardware(_) | SorterError::HardwareFault(_)) => "Hardware",
        Some(SorterError::Link(_)) => "Link",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;
    use sorter_hardware::error::HwError;

    #[test]
    fn config_errors_exit_3_through_context() {
        let err = Err::<(), _>(SorterError::Config("line.pulse_width_ms must be >= 1".into()))
            .wrap_err("load config")
            .unwrap_err();
        assert_eq!(exit_code_for_error(&err), EXIT_CONFIG);
        assert!(humanize(&err).contains("pulse_width_ms"));
    }

    #[test]
    fn hardware_errors_exit_4() {
        let err = eyre::Report::new(SorterError::Hardware("pin 17 busy".into()));
        assert_eq!(exit_code_for_error(&err), EXIT_HARDWARE);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Hardware");
        assert_eq!(v["exit_code"], 4);
    }

    #[test]
    fn link_open_failure_exits_4_as_link() {
        let err = Err::<(), _>(crate::line::open_error(HwError::Uart(
            "open /dev/serial0: permission denied".into(),
        )))
        .wrap_err("open classifier link /dev/serial0")
        .unwrap_err();
        assert_eq!(exit_code_for_error(&err), EXIT_HARDWARE);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Link");
        assert!(humanize(&err).contains("classifier link failed"));
    }

    #[test]
    fn untyped_errors_are_generic() {
        let err = eyre::eyre!("something odd");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).contains("something odd"));
    }
}

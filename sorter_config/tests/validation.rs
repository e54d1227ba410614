use rstest::rstest;
use sorter_config::load_toml;

const PINS: &str = r#"
[pins]
encoder_a = 2
encoder_b = 3
actuator_a = 17
actuator_b = 27
actuator_c = 22
"#;

fn with_pins(extra: &str) -> String {
    format!("{PINS}\n{extra}")
}

#[test]
fn accepts_full_config() {
    let toml = with_pins(
        r#"
[line]
quantization_pulses = 100
pulse_width_ms = 100

[offsets]
a = 250
b = 500
c = 750

[link]
device = "/dev/ttyACM0"
baud = 115200
handshake = false

[runner]
tick_us = 200
stats = true

[logging]
level = "debug"
rotation = "daily"
"#,
    );
    let cfg = load_toml(&toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.link.baud, 115_200);
    assert!(!cfg.link.handshake);
    assert!(cfg.runner.stats);
}

#[rstest]
#[case("[line]\nquantization_pulses = 0", "quantization_pulses must be > 0")]
#[case("[line]\nquantization_pulses = -5", "quantization_pulses must be > 0")]
#[case("[line]\npulse_width_ms = 0", "pulse_width_ms must be >= 1")]
#[case("[line]\npulse_width_ms = 60000", "unreasonably large")]
#[case("[offsets]\nb = -1", "offsets.b must be >= 0")]
#[case("[link]\nbaud = 0", "baud must be > 0")]
#[case("[link]\ndevice = \"  \"", "device must not be empty")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation")]
fn rejects_invalid_values(#[case] extra: &str, #[case] needle: &str) {
    let cfg = load_toml(&with_pins(extra)).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "unexpected message: {msg}");
}

#[test]
fn rejects_shared_gpio() {
    let toml = r#"
[pins]
encoder_a = 2
encoder_b = 3
actuator_a = 17
actuator_b = 17
actuator_c = 22
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("duplicate pin");
    let msg = format!("{err}");
    assert!(msg.contains("actuator_a"));
    assert!(msg.contains("actuator_b"));
    assert!(msg.contains("17"));
}

#[test]
fn zero_offset_is_allowed() {
    let cfg = load_toml(&with_pins("[offsets]\na = 0")).expect("parse TOML");
    cfg.validate().expect("zero offset is a valid (if unusual) layout");
    assert_eq!(cfg.offsets.a, 0);
    assert_eq!(cfg.offsets.b, 500);
}

use rstest::rstest;
use sorter_core::error::BuildError;
use sorter_core::mocks::{ManualEncoder, NoLink, SpyLine};
use sorter_core::{Category, DynScheduler, LineCfg};

#[rstest]
fn missing_encoder_yields_typed_build_error() {
    let err = DynScheduler::builder()
        .with_link(NoLink)
        .with_actuator(Category::A, SpyLine::new())
        .with_actuator(Category::B, SpyLine::new())
        .with_actuator(Category::C, SpyLine::new())
        .try_build()
        .expect_err("should fail with MissingEncoder");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingEncoder) => {}
        other => panic!("expected MissingEncoder, got: {other:?}"),
    }
}

#[rstest]
fn missing_link_yields_typed_build_error() {
    let err = DynScheduler::builder()
        .with_encoder(ManualEncoder::new())
        .try_build()
        .expect_err("should fail with MissingLink");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingLink)
    ));
}

#[rstest]
#[case(Category::A)]
#[case(Category::B)]
#[case(Category::C)]
fn missing_actuator_names_its_category(#[case] missing: Category) {
    let mut b = DynScheduler::builder()
        .with_encoder(ManualEncoder::new())
        .with_link(NoLink);
    for c in Category::ALL {
        if c != missing {
            b = b.with_actuator(c, SpyLine::new());
        }
    }
    let err = b.build().expect_err("should fail with MissingActuator");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingActuator(c)) => assert_eq!(*c, missing),
        other => panic!("expected MissingActuator, got: {other:?}"),
    }
}

#[rstest]
#[case(LineCfg { quantization_pulses: 0, ..LineCfg::default() })]
#[case(LineCfg { pulse_width_ms: 0, ..LineCfg::default() })]
#[case(LineCfg { offsets: [250, 500, -750], ..LineCfg::default() })]
fn invalid_config_is_rejected(#[case] cfg: LineCfg) {
    let err = DynScheduler::builder()
        .with_encoder(ManualEncoder::new())
        .with_link(NoLink)
        .with_actuator(Category::A, SpyLine::new())
        .with_actuator(Category::B, SpyLine::new())
        .with_actuator(Category::C, SpyLine::new())
        .with_config(cfg)
        .build()
        .expect_err("invalid config must not build");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
fn build_drives_every_line_inactive() {
    let lines = [SpyLine::new(), SpyLine::new(), SpyLine::new()];
    let spies: Vec<_> = lines.iter().map(SpyLine::spy).collect();
    let [a, b, c] = lines;
    let s = DynScheduler::builder()
        .with_encoder(ManualEncoder::new())
        .with_link(NoLink)
        .with_actuator(Category::A, a)
        .with_actuator(Category::B, b)
        .with_actuator(Category::C, c)
        .build()
        .unwrap();
    for spy in &spies {
        assert_eq!(spy.writes(), 1);
        assert!(!spy.level());
    }
    assert_eq!(s.cfg(), &LineCfg::default());
}

#[rstest]
fn failing_line_at_start_up_is_reported() {
    let bad = SpyLine::new();
    bad.spy().fail_next();
    let err = DynScheduler::builder()
        .with_encoder(ManualEncoder::new())
        .with_link(NoLink)
        .with_actuator(Category::A, SpyLine::new())
        .with_actuator(Category::B, bad)
        .with_actuator(Category::C, SpyLine::new())
        .build()
        .expect_err("a dead actuator line must fail the build");
    let chain = format!("{err:#}");
    assert!(chain.contains("inactive"), "{chain}");
    assert!(chain.contains("actuator b"), "{chain}");
}

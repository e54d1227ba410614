use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use sorter_core::mocks::{EncoderHandle, LineSpy, LinkHandle, ManualEncoder, QueueLink, SpyLine};
use sorter_core::{Category, LineCfg, SortEvent, SortScheduler, build_scheduler};
use sorter_traits::ManualClock;

struct Rig {
    s: SortScheduler<ManualEncoder, QueueLink, SpyLine>,
    enc: EncoderHandle,
    link: LinkHandle,
    lines: [LineSpy; 3],
    clock: ManualClock,
}

fn rig(cfg: LineCfg) -> Rig {
    let encoder = ManualEncoder::new();
    let link = QueueLink::new();
    let lines = [SpyLine::new(), SpyLine::new(), SpyLine::new()];
    let clock = ManualClock::new();
    let enc = encoder.handle();
    let link_h = link.handle();
    let spies = [lines[0].spy(), lines[1].spy(), lines[2].spy()];
    let mut s = build_scheduler(encoder, link, lines, cfg, Some(Arc::new(clock.clone()))).unwrap();
    s.begin().unwrap();
    Rig {
        s,
        enc,
        link: link_h,
        lines: spies,
        clock,
    }
}

#[rstest]
fn detection_fires_at_offset_and_releases_after_pulse() {
    let mut r = rig(LineCfg::default());
    assert_eq!(r.link.readies(), 1, "begin announces readiness");

    r.link.send(0);
    r.enc.set(100);
    let rep = r.s.tick().unwrap();
    assert!(rep.polled);
    assert_eq!(
        rep.events,
        vec![SortEvent::Stored {
            category: Category::A,
            position: 100
        }]
    );
    assert_eq!(r.link.readies(), 2);

    r.enc.set(349);
    assert!(r.s.tick().unwrap().events.is_empty());
    assert!(!r.lines[0].level());

    r.enc.set(350);
    let rep = r.s.tick().unwrap();
    assert_eq!(rep.fired().collect::<Vec<_>>(), vec![(Category::A, 100)]);
    assert!(r.lines[0].level());
    assert!(r.s.lane(Category::A).is_active());

    r.clock.advance(Duration::from_millis(99));
    assert!(r.s.tick().unwrap().events.is_empty());
    assert!(r.lines[0].level());

    r.clock.advance(Duration::from_millis(1));
    let rep = r.s.tick().unwrap();
    assert_eq!(
        rep.events,
        vec![SortEvent::Released {
            category: Category::A,
            held_ms: 100
        }]
    );
    assert!(!r.lines[0].level());

    // Consumed: no second firing further down the belt.
    r.enc.set(2_000);
    assert_eq!(r.s.tick().unwrap().fired().count(), 0);
    assert_eq!(r.lines[0].activations(), 1);
}

#[rstest]
#[case(0, Category::A, 350)]
#[case(1, Category::B, 600)]
#[case(2, Category::C, 850)]
fn each_category_fires_at_its_offset(
    #[case] code: u8,
    #[case] category: Category,
    #[case] expect_at: i64,
) {
    let mut r = rig(LineCfg::default());
    r.link.send(code);
    let mut fired_at = None;
    for step in 1..=120 {
        r.enc.set(step * 10);
        let rep = r.s.tick().unwrap();
        if let Some((c, detected)) = rep.fired().next() {
            assert_eq!(c, category);
            assert_eq!(detected, 100);
            fired_at = Some(rep.position);
            break;
        }
    }
    assert_eq!(fired_at, Some(expect_at));
    assert!(r.lines[category.index()].level());
}

#[rstest]
fn mixed_stream_fires_every_lane_in_position_order() {
    let mut r = rig(LineCfg::default());
    for code in [0, 1, 2] {
        r.link.send(code);
    }
    let mut fired = Vec::new();
    for step in 1..=150 {
        r.enc.set(step * 10);
        r.clock.advance(Duration::from_millis(1));
        let rep = r.s.tick().unwrap();
        fired.extend(rep.fired().map(|(c, p)| (c, p, rep.position)));
    }
    assert_eq!(
        fired,
        vec![
            (Category::A, 100, 350),
            (Category::B, 200, 700),
            (Category::C, 300, 1_050),
        ]
    );
    assert_eq!(r.s.stats().fired, [1, 1, 1]);
    assert_eq!(r.s.stats().stored, [1, 1, 1]);
}

#[rstest]
fn ingest_precedes_scan_within_a_tick() {
    let mut r = rig(LineCfg {
        offsets: [0, 500, 750],
        ..LineCfg::default()
    });
    r.link.send(0);
    r.enc.set(100);
    let rep = r.s.tick().unwrap();
    assert_eq!(
        rep.events,
        vec![
            SortEvent::Stored {
                category: Category::A,
                position: 100
            },
            SortEvent::Fired {
                category: Category::A,
                detected_at: 100,
                position: 100
            },
        ]
    );
}

#[rstest]
fn unidentified_and_unknown_codes_store_nothing() {
    let mut r = rig(LineCfg::default());
    r.link.send(3);
    r.link.send(9);
    r.enc.set(100);
    let rep = r.s.tick().unwrap();
    assert_eq!(rep.events, vec![SortEvent::Unidentified { position: 100 }]);
    r.enc.set(200);
    let rep = r.s.tick().unwrap();
    assert_eq!(
        rep.events,
        vec![SortEvent::UnknownCode {
            code: 9,
            position: 200
        }]
    );
    for c in Category::ALL {
        assert_eq!(r.s.lane(c).pending(), 0);
    }
    assert_eq!(r.s.stats().unidentified, 1);
    assert_eq!(r.s.stats().unknown_codes, 1);
}

#[rstest]
fn gate_limits_reads_to_one_per_quantum() {
    let mut r = rig(LineCfg::default());
    r.link.send(0);
    r.link.send(1);
    r.enc.set(100);
    r.s.tick().unwrap();
    r.enc.set(150);
    let rep = r.s.tick().unwrap();
    assert!(!rep.polled);
    assert_eq!(r.link.queued(), 1);
    r.enc.set(200);
    assert!(r.s.tick().unwrap().polled);
    assert_eq!(r.link.queued(), 0);
    assert_eq!(r.s.stats().polls, 2);
}

#[rstest]
fn full_queue_overwrites_and_reports_the_loss() {
    let mut r = rig(LineCfg {
        offsets: [100_000, 500, 750],
        ..LineCfg::default()
    });
    let mut events = Vec::new();
    for i in 1..=11 {
        r.link.send(0);
        r.enc.set(i * 100);
        events.extend(r.s.tick().unwrap().events);
    }
    assert!(events.contains(&SortEvent::Overwrote {
        category: Category::A,
        lost: 100
    }));
    assert_eq!(r.s.lane(Category::A).pending(), 10);
    assert_eq!(r.s.stats().overwritten, [1, 0, 0]);
    let pending: Vec<_> = r.s.lane(Category::A).queue().iter().collect();
    assert!(!pending.contains(&100));
}

#[rstest]
fn link_failure_is_counted_and_the_line_keeps_running() {
    let mut r = rig(LineCfg::default());
    r.link.fail_next();
    r.enc.set(100);
    let rep = r.s.tick().unwrap();
    assert!(rep.polled);
    assert!(rep.events.is_empty());
    assert_eq!(r.s.stats().link_errors, 1);
    // A failed read is not retried until the next opening.
    r.link.send(0);
    r.enc.set(150);
    assert!(r.s.tick().unwrap().events.is_empty());
    r.enc.set(200);
    assert_eq!(r.s.tick().unwrap().events.len(), 1);
}

#[rstest]
fn encoder_failure_fails_the_tick_but_still_releases() {
    let mut r = rig(LineCfg {
        offsets: [0, 500, 750],
        ..LineCfg::default()
    });
    r.link.send(0);
    r.enc.set(100);
    r.s.tick().unwrap();
    assert!(r.lines[0].level());

    r.clock.advance(Duration::from_millis(100));
    r.enc.fail_next();
    let err = r.s.tick().expect_err("encoder failure surfaces");
    assert!(format!("{err:#}").contains("read encoder"));
    assert!(!r.lines[0].level());
    assert_eq!(r.s.stats().encoder_errors, 1);
    assert_eq!(r.s.last_position(), 100);
}

#[rstest]
fn handshake_can_be_disabled() {
    let mut r = rig(LineCfg {
        handshake: false,
        ..LineCfg::default()
    });
    r.enc.set(100);
    r.s.tick().unwrap();
    assert_eq!(r.link.readies(), 0);
}

#[rstest]
fn begin_clears_state_and_release_all_drops_lines() {
    let mut r = rig(LineCfg {
        offsets: [0, 500, 750],
        ..LineCfg::default()
    });
    r.link.send(0);
    r.link.send(1);
    r.enc.set(100);
    r.s.tick().unwrap();
    r.enc.set(200);
    r.s.tick().unwrap();
    assert!(r.lines[0].level());
    assert_eq!(r.s.lane(Category::B).pending(), 1);

    r.s.release_all().unwrap();
    assert!(!r.lines[0].level());

    r.s.begin().unwrap();
    assert_eq!(r.enc.get(), 0);
    assert_eq!(r.s.lane(Category::B).pending(), 0);
    assert_eq!(r.s.stats().ticks, 0);
    assert_eq!(r.s.gate().last_polled(), 0);
}

#[rstest]
fn readiness_follows_every_poll_even_when_empty() {
    let mut r = rig(LineCfg::default());
    for step in 1..=10 {
        r.enc.set(step * 50);
        r.s.tick().unwrap();
    }
    // begin + openings at 100, 200, 300, 400, 500
    assert_eq!(r.link.readies(), 6);
    assert_eq!(r.s.stats().polls, 5);
    assert_eq!(r.s.stats().ticks, 10);
}

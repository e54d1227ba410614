use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use sorter_core::mocks::{ManualEncoder, QueueLink, SpyLine};
use sorter_core::{DetectionQueue, LineCfg, build_scheduler};
use sorter_traits::ManualClock;

fn bench_scan(c: &mut Criterion) {
    c.bench_function("queue_scan_full", |b| {
        b.iter_batched(
            || {
                let mut q: DetectionQueue = DetectionQueue::new();
                for i in 0..10 {
                    q.push(i * 100);
                }
                q
            },
            |mut q| black_box(q.scan_and_consume(black_box(500), 250).count()),
            BatchSize::SmallInput,
        );
    });
}

fn bench_tick(c: &mut Criterion) {
    let encoder = ManualEncoder::new();
    let enc = encoder.handle();
    let link = QueueLink::new();
    let codes = link.handle();
    let clock = ManualClock::new();
    let Ok(mut s) = build_scheduler(
        encoder,
        link,
        [SpyLine::new(), SpyLine::new(), SpyLine::new()],
        LineCfg::default(),
        Some(Arc::new(clock.clone())),
    ) else {
        return;
    };
    if s.begin().is_err() {
        return;
    }

    let mut pos = 0i64;
    let mut n: u8 = 0;
    c.bench_function("scheduler_tick", |b| {
        b.iter(|| {
            pos += 7;
            if pos % 100 < 7 {
                codes.send(n % 3);
                n = n.wrapping_add(1);
            }
            enc.set(pos);
            clock.advance(std::time::Duration::from_micros(500));
            black_box(s.tick().map(|r| r.events.len()).unwrap_or(0))
        });
    });
}

criterion_group!(benches, bench_scan, bench_tick);
criterion_main!(benches);

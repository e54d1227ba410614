//! The sorting line's control context.
//!
//! One `tick()` is one pass of the control flow:
//!
//! 1. read the encoder and sample the clock once,
//! 2. if the ingest gate opens, take at most one code from the link and
//!    record it in its category's queue (then announce readiness),
//! 3. scan every lane and arm the actuators whose objects have arrived,
//! 4. tick every actuator timer, releasing the ones whose pulse is over.
//!
//! Nothing in a tick blocks or sleeps. Link and actuator failures are
//! logged and counted; they never stop the line.

use std::sync::Arc;
use std::time::Instant;

use eyre::WrapErr;
use sorter_traits::{ActuatorLine, CategoryLink, Clock, Encoder, Position};

use crate::category::{Category, Inbound};
use crate::config::LineCfg;
use crate::error::Result;
use crate::gate::IngestGate;
use crate::hw_error::map_hw_error;
use crate::scanner::{ArrivalScanner, Lane};
use crate::status::{LineStats, SortEvent, TickReport};

pub struct SortScheduler<E, L, A> {
    encoder: E,
    link: L,
    lanes: [Lane<A>; Category::COUNT],
    gate: IngestGate,
    cfg: LineCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    last_position: Position,
    stats: LineStats,
}

impl<E, L, A> core::fmt::Debug for SortScheduler<E, L, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SortScheduler")
            .field("cfg", &self.cfg)
            .field("gate", &self.gate)
            .field("last_position", &self.last_position)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<E, L, A> SortScheduler<E, L, A>
where
    E: Encoder,
    L: CategoryLink,
    A: ActuatorLine,
{
    /// Assemble without validation; see `builder` for the checked paths.
    pub(crate) fn from_parts(
        encoder: E,
        link: L,
        lines: [A; Category::COUNT],
        cfg: LineCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let [a, b, c] = lines;
        let width = cfg.pulse_width_ms;
        let lanes = [
            Lane::new(Category::A, cfg.offset(Category::A), a, width),
            Lane::new(Category::B, cfg.offset(Category::B), b, width),
            Lane::new(Category::C, cfg.offset(Category::C), c, width),
        ];
        let epoch = clock.now();
        Self {
            encoder,
            link,
            lanes,
            gate: IngestGate::new(cfg.quantization_pulses),
            cfg,
            clock,
            epoch,
            last_position: 0,
            stats: LineStats::default(),
        }
    }

    /// Prepare for a run: zero the encoder, empty every queue, release every
    /// actuator, restart the clock epoch and counters, and tell the
    /// classifier the line is ready.
    pub fn begin(&mut self) -> Result<()> {
        self.encoder
            .reset(0)
            .map_err(|e| map_hw_error(&*e))
            .wrap_err("reset encoder")?;
        self.gate.reset();
        for lane in &mut self.lanes {
            lane.reset();
        }
        self.release_all()?;
        self.epoch = self.clock.now();
        self.last_position = 0;
        self.stats = LineStats::default();
        if self.cfg.handshake {
            self.link
                .announce_ready()
                .map_err(|e| map_hw_error(&*e))
                .wrap_err("announce readiness upstream")?;
        }
        tracing::info!(
            quantization_pulses = self.cfg.quantization_pulses,
            pulse_width_ms = self.cfg.pulse_width_ms,
            offset_a = self.cfg.offsets[0],
            offset_b = self.cfg.offsets[1],
            offset_c = self.cfg.offsets[2],
            handshake = self.cfg.handshake,
            "sorting line started"
        );
        Ok(())
    }

    /// Run one pass of the control loop.
    ///
    /// Fails only when the encoder cannot be read; actuator timers are still
    /// serviced on that path so no pulse outlives its width.
    pub fn tick(&mut self) -> Result<TickReport> {
        self.stats.ticks += 1;
        let read = self.encoder.read();
        let now_ms = self.clock.ms_since(self.epoch);
        let mut events = Vec::new();

        let position = match read {
            Ok(p) => p,
            Err(e) => {
                self.stats.encoder_errors += 1;
                self.service_timers(now_ms, &mut events);
                return Err(map_hw_error(&*e)).wrap_err("read encoder");
            }
        };
        self.last_position = position;
        tracing::trace!(position, now_ms, "tick");

        let polled = self.ingest(position, &mut events);
        ArrivalScanner::scan(
            &mut self.lanes,
            position,
            now_ms,
            &mut events,
            &mut self.stats,
        );
        self.service_timers(now_ms, &mut events);

        Ok(TickReport {
            position,
            now_ms,
            polled,
            events,
        })
    }

    /// Poll the link if the gate is open. Returns whether it opened.
    fn ingest(&mut self, position: Position, events: &mut Vec<SortEvent>) -> bool {
        if !self.gate.should_poll(position) {
            return false;
        }
        self.stats.polls += 1;

        match self.link.try_recv() {
            Ok(Some(code)) => self.classify(code, position, events),
            Ok(None) => {}
            Err(e) => {
                self.stats.link_errors += 1;
                tracing::warn!(error = %map_hw_error(&*e), position, "category link read failed");
            }
        }

        if self.cfg.handshake
            && let Err(e) = self.link.announce_ready()
        {
            self.stats.link_errors += 1;
            tracing::warn!(error = %map_hw_error(&*e), "readiness announcement failed");
        }
        true
    }

    fn classify(&mut self, code: u8, position: Position, events: &mut Vec<SortEvent>) {
        let ev = match Inbound::from_code(code) {
            Inbound::Category(category) => {
                if let Some(lost) = self.lanes[category.index()].store(position) {
                    tracing::warn!(
                        category = %category,
                        lost,
                        position,
                        "detection queue full; overwrote an object still in flight"
                    );
                    let ow = SortEvent::Overwrote { category, lost };
                    self.stats.record(&ow);
                    events.push(ow);
                }
                tracing::info!(category = %category, position, "detection stored");
                SortEvent::Stored { category, position }
            }
            Inbound::Unidentified => {
                tracing::info!(position, "object not identified");
                SortEvent::Unidentified { position }
            }
            Inbound::Unknown(code) => {
                tracing::warn!(code, position, "unknown category code ignored");
                SortEvent::UnknownCode { code, position }
            }
        };
        self.stats.record(&ev);
        events.push(ev);
    }

    fn service_timers(&mut self, now_ms: u64, events: &mut Vec<SortEvent>) {
        for lane in &mut self.lanes {
            let category = lane.category();
            match lane.timer_mut().tick(now_ms) {
                Ok(Some(held_ms)) => {
                    tracing::debug!(category = %category, held_ms, "actuator released");
                    events.push(SortEvent::Released { category, held_ms });
                }
                Ok(None) => {}
                Err(e) => {
                    self.stats.actuator_errors += 1;
                    tracing::error!(
                        category = %category,
                        error = %map_hw_error(&*e),
                        "failed to release actuator"
                    );
                }
            }
        }
    }

    /// Drive every actuator inactive. Every line is attempted; the first
    /// failure is returned.
    pub fn release_all(&mut self) -> Result<()> {
        let mut first_err = None;
        for lane in &mut self.lanes {
            let category = lane.category();
            if let Err(e) = lane.timer_mut().release() {
                self.stats.actuator_errors += 1;
                let err = map_hw_error(&*e);
                tracing::error!(category = %category, error = %err, "failed to release actuator");
                if first_err.is_none() {
                    first_err = Some((category, err));
                }
            }
        }
        match first_err {
            Some((category, err)) => {
                Err(err).wrap_err_with(|| format!("release actuator {category}"))
            }
            None => Ok(()),
        }
    }

    pub fn stats(&self) -> &LineStats {
        &self.stats
    }

    pub fn cfg(&self) -> &LineCfg {
        &self.cfg
    }

    pub fn lane(&self, category: Category) -> &Lane<A> {
        &self.lanes[category.index()]
    }

    pub fn lanes(&self) -> &[Lane<A>] {
        &self.lanes
    }

    pub fn gate(&self) -> &IngestGate {
        &self.gate
    }

    /// Position seen by the last successful encoder read.
    pub fn last_position(&self) -> Position {
        self.last_position
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }
}

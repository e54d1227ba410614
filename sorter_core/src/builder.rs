//! Type-state builder for the boxed scheduler and the generic
//! `build_scheduler` constructor.
//!
//! `build()` is only available once an encoder and a link are set;
//! `try_build()` is always available and reports what is missing.

use std::marker::PhantomData;
use std::sync::Arc;

use eyre::WrapErr;
use sorter_traits::{ActuatorLine, CategoryLink, Clock, Encoder, MonotonicClock};

use crate::category::Category;
use crate::config::LineCfg;
use crate::error::{BuildError, Result};
use crate::scheduler::SortScheduler;

/// Scheduler over boxed hardware parts, as assembled by `SchedulerBuilder`.
pub type DynScheduler =
    SortScheduler<Box<dyn Encoder>, Box<dyn CategoryLink>, Box<dyn ActuatorLine>>;

impl DynScheduler {
    pub fn builder() -> SchedulerBuilder<Missing, Missing> {
        SchedulerBuilder::default()
    }
}

pub struct Missing;
pub struct Set;

pub struct SchedulerBuilder<E, L> {
    encoder: Option<Box<dyn Encoder>>,
    link: Option<Box<dyn CategoryLink>>,
    actuators: [Option<Box<dyn ActuatorLine>>; Category::COUNT],
    cfg: Option<LineCfg>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    _e: PhantomData<E>,
    _l: PhantomData<L>,
}

impl Default for SchedulerBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            encoder: None,
            link: None,
            actuators: [None, None, None],
            cfg: None,
            clock: None,
            _e: PhantomData,
            _l: PhantomData,
        }
    }
}

impl<E, L> SchedulerBuilder<E, L> {
    pub fn with_actuator(
        mut self,
        category: Category,
        line: impl ActuatorLine + 'static,
    ) -> Self {
        self.actuators[category.index()] = Some(Box::new(line));
        self
    }

    pub fn with_config(mut self, cfg: LineCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }

    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<DynScheduler> {
        let encoder = self
            .encoder
            .ok_or_else(|| eyre::Report::new(BuildError::MissingEncoder))?;
        let link = self
            .link
            .ok_or_else(|| eyre::Report::new(BuildError::MissingLink))?;
        let [a, b, c] = self.actuators;
        let a = a.ok_or_else(|| eyre::Report::new(BuildError::MissingActuator(Category::A)))?;
        let b = b.ok_or_else(|| eyre::Report::new(BuildError::MissingActuator(Category::B)))?;
        let c = c.ok_or_else(|| eyre::Report::new(BuildError::MissingActuator(Category::C)))?;

        validate_and_build(
            encoder,
            link,
            [a, b, c],
            self.cfg.unwrap_or_default(),
            self.clock,
        )
    }
}

impl<L> SchedulerBuilder<Missing, L> {
    pub fn with_encoder(self, encoder: impl Encoder + 'static) -> SchedulerBuilder<Set, L> {
        SchedulerBuilder {
            encoder: Some(Box::new(encoder)),
            link: self.link,
            actuators: self.actuators,
            cfg: self.cfg,
            clock: self.clock,
            _e: PhantomData,
            _l: PhantomData,
        }
    }
}

impl<E> SchedulerBuilder<E, Missing> {
    pub fn with_link(self, link: impl CategoryLink + 'static) -> SchedulerBuilder<E, Set> {
        SchedulerBuilder {
            encoder: self.encoder,
            link: Some(Box::new(link)),
            actuators: self.actuators,
            cfg: self.cfg,
            clock: self.clock,
            _e: PhantomData,
            _l: PhantomData,
        }
    }
}

impl SchedulerBuilder<Set, Set> {
    /// Validate and build; a missing actuator fails with `BuildError::MissingActuator`.
    pub fn build(self) -> Result<DynScheduler> {
        self.try_build()
    }
}

/// Build a statically-dispatched scheduler from concrete parts.
pub fn build_scheduler<E, L, A>(
    encoder: E,
    link: L,
    lines: [A; Category::COUNT],
    cfg: LineCfg,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
) -> Result<SortScheduler<E, L, A>>
where
    E: Encoder,
    L: CategoryLink,
    A: ActuatorLine,
{
    validate_and_build(encoder, link, lines, cfg, clock)
}

fn validate_and_build<E, L, A>(
    encoder: E,
    link: L,
    lines: [A; Category::COUNT],
    cfg: LineCfg,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
) -> Result<SortScheduler<E, L, A>>
where
    E: Encoder,
    L: CategoryLink,
    A: ActuatorLine,
{
    cfg.validate()?;
    let clock = clock.unwrap_or_else(|| Arc::new(MonotonicClock::new()));
    let mut scheduler = SortScheduler::from_parts(encoder, link, lines, cfg, clock);
    scheduler
        .release_all()
        .wrap_err("drive actuators inactive at start-up")?;
    Ok(scheduler)
}

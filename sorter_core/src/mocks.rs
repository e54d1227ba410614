//! Scriptable encoder, link and actuator doubles for tests, benches and
//! dry runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use sorter_traits::{ActuatorLine, CategoryLink, Encoder, Position};

fn injected(what: &str) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::other(format!("injected {what} failure")))
}

/// Encoder whose count is set by the test through an `EncoderHandle`.
#[derive(Debug, Default)]
pub struct ManualEncoder {
    inner: Arc<EncoderState>,
}

#[derive(Debug, Default)]
struct EncoderState {
    count: AtomicI64,
    fail_next: AtomicBool,
}

/// Test-side control of a `ManualEncoder`.
#[derive(Debug, Clone)]
pub struct EncoderHandle {
    inner: Arc<EncoderState>,
}

impl ManualEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> EncoderHandle {
        EncoderHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl EncoderHandle {
    pub fn set(&self, position: Position) {
        self.inner.count.store(position, Ordering::Relaxed);
    }

    pub fn advance(&self, pulses: Position) {
        self.inner.count.fetch_add(pulses, Ordering::Relaxed);
    }

    pub fn get(&self) -> Position {
        self.inner.count.load(Ordering::Relaxed)
    }

    /// Make the next `read()` fail.
    pub fn fail_next(&self) {
        self.inner.fail_next.store(true, Ordering::Relaxed);
    }
}

impl Encoder for ManualEncoder {
    fn read(&mut self) -> Result<Position, Box<dyn std::error::Error + Send + Sync>> {
        if self.inner.fail_next.swap(false, Ordering::Relaxed) {
            return Err(injected("encoder"));
        }
        Ok(self.inner.count.load(Ordering::Relaxed))
    }

    fn reset(&mut self, value: Position) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.inner.count.store(value, Ordering::Relaxed);
        Ok(())
    }
}

/// Link fed by hand through a `LinkHandle`; counts readiness announcements.
#[derive(Debug, Default)]
pub struct QueueLink {
    inner: Arc<LinkState>,
}

#[derive(Debug, Default)]
struct LinkState {
    codes: Mutex<VecDeque<u8>>,
    readies: AtomicU32,
    fail_next: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct LinkHandle {
    inner: Arc<LinkState>,
}

impl QueueLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> LinkHandle {
        LinkHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl LinkHandle {
    pub fn send(&self, code: u8) {
        if let Ok(mut q) = self.inner.codes.lock() {
            q.push_back(code);
        }
    }

    /// Codes sent but not yet taken by the scheduler.
    pub fn queued(&self) -> usize {
        self.inner.codes.lock().map_or(0, |q| q.len())
    }

    /// Number of `announce_ready()` calls seen.
    pub fn readies(&self) -> u32 {
        self.inner.readies.load(Ordering::Relaxed)
    }

    /// Make the next `try_recv()` fail.
    pub fn fail_next(&self) {
        self.inner.fail_next.store(true, Ordering::Relaxed);
    }
}

impl CategoryLink for QueueLink {
    fn try_recv(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        if self.inner.fail_next.swap(false, Ordering::Relaxed) {
            return Err(injected("link"));
        }
        let mut q = self
            .inner
            .codes
            .lock()
            .map_err(|_| injected("link lock"))?;
        Ok(q.pop_front())
    }

    fn announce_ready(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.inner.readies.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Link that never delivers anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLink;

impl CategoryLink for NoLink {
    fn try_recv(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(None)
    }
}

/// Actuator output that records its level and can be told to fail.
#[derive(Debug, Default)]
pub struct SpyLine {
    inner: Arc<LineState>,
}

#[derive(Debug, Default)]
struct LineState {
    level: AtomicBool,
    writes: AtomicU32,
    activations: AtomicU32,
    fail_next: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct LineSpy {
    inner: Arc<LineState>,
}

impl SpyLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spy(&self) -> LineSpy {
        LineSpy {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl LineSpy {
    pub fn level(&self) -> bool {
        self.inner.level.load(Ordering::Relaxed)
    }

    /// Successful writes of either level.
    pub fn writes(&self) -> u32 {
        self.inner.writes.load(Ordering::Relaxed)
    }

    /// Inactive to active transitions.
    pub fn activations(&self) -> u32 {
        self.inner.activations.load(Ordering::Relaxed)
    }

    /// Make the next `set_active()` fail without changing the level.
    pub fn fail_next(&self) {
        self.inner.fail_next.store(true, Ordering::Relaxed);
    }
}

impl ActuatorLine for SpyLine {
    fn set_active(
        &mut self,
        active: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.inner.fail_next.swap(false, Ordering::Relaxed) {
            return Err(injected("actuator"));
        }
        let was = self.inner.level.swap(active, Ordering::Relaxed);
        if active && !was {
            self.inner.activations.fetch_add(1, Ordering::Relaxed);
        }
        self.inner.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

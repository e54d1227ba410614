//! Fixed-width actuator pulses without blocking.
//!
//! `arm()` energizes the line and stamps the time; `tick()` is called every
//! loop pass and de-energizes once the pulse width has elapsed. Nothing here
//! sleeps, so the pulse width is bounded by the loop period, not stretched
//! by it.

use sorter_traits::ActuatorLine;

/// Logical state of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    Idle,
    Active { since_ms: u64 },
}

pub struct ActuatorTimer<A> {
    line: A,
    pulse_width_ms: u64,
    state: ActuatorState,
}

impl<A> core::fmt::Debug for ActuatorTimer<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActuatorTimer")
            .field("pulse_width_ms", &self.pulse_width_ms)
            .field("state", &self.state)
            .finish()
    }
}

impl<A: ActuatorLine> ActuatorTimer<A> {
    /// Starts Idle; the line level is left as the driver initialised it.
    pub fn new(line: A, pulse_width_ms: u64) -> Self {
        Self {
            line,
            pulse_width_ms,
            state: ActuatorState::Idle,
        }
    }

    /// Energize the line. Arming an active actuator restarts its pulse.
    ///
    /// If the line write fails the state is left unchanged.
    pub fn arm(&mut self, now_ms: u64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.line.set_active(true)?;
        self.state = ActuatorState::Active { since_ms: now_ms };
        Ok(())
    }

    /// De-energize once the pulse width has elapsed.
    ///
    /// Returns how long the line was held when it is released on this call.
    /// A failed release keeps the actuator Active so the next tick retries.
    pub fn tick(
        &mut self,
        now_ms: u64,
    ) -> Result<Option<u64>, Box<dyn std::error::Error + Send + Sync>> {
        if let ActuatorState::Active { since_ms } = self.state {
            let held = now_ms.saturating_sub(since_ms);
            if held >= self.pulse_width_ms {
                self.line.set_active(false)?;
                self.state = ActuatorState::Idle;
                return Ok(Some(held));
            }
        }
        Ok(None)
    }

    /// Force the line inactive regardless of the pulse (shutdown, start-up).
    pub fn release(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.line.set_active(false)?;
        self.state = ActuatorState::Idle;
        Ok(())
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ActuatorState::Active { .. })
    }

    /// Time at which the current pulse ends, if one is running.
    pub fn deadline_ms(&self) -> Option<u64> {
        match self.state {
            ActuatorState::Active { since_ms } => Some(since_ms.saturating_add(self.pulse_width_ms)),
            ActuatorState::Idle => None,
        }
    }

    pub fn pulse_width_ms(&self) -> u64 {
        self.pulse_width_ms
    }

    pub fn line(&self) -> &A {
        &self.line
    }
}

//! [`LoopRate`] – fixed-rate pacing for the host control loop.
//!
//! Call [`tick`][LoopRate::tick] at the top of every iteration and
//! [`sleep`][LoopRate::sleep] at the bottom.  The loop runs on a fixed
//! schedule of deadlines, so a slow iteration is not followed by a full
//! period of sleep.  An iteration that starts after its deadline is logged
//! as an overrun; missing a whole period restarts the schedule.
//!
//! # Example
//!
//! ```rust,no_run
//! use fission_hal::SystemClock;
//! use fission_runtime::loop_rate::LoopRate;
//!
//! let mut rate = LoopRate::new(50.0, SystemClock::shared()).unwrap();
//! loop {
//!     rate.tick();
//!     // read sensors, update actuators, run dispatchers …
//!     rate.sleep();
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use fission_hal::Clock;
use fission_types::FissionError;
use tracing::warn;

use crate::config::RobotConfig;

pub struct LoopRate {
    period: Duration,
    clock: Arc<dyn Clock>,
    last_tick: Option<Duration>,
    deadline: Option<Duration>,
    overruns: u64,
}

impl LoopRate {
    /// Pace at `hz` iterations per second.
    ///
    /// # Errors
    ///
    /// Returns [`FissionError::Config`] unless `hz` is a positive number.
    pub fn new(hz: f64, clock: Arc<dyn Clock>) -> Result<Self, FissionError> {
        let period = (hz.is_finite() && hz > 0.0)
            .then(|| Duration::try_from_secs_f64(1.0 / hz).ok())
            .flatten()
            .ok_or_else(|| FissionError::Config(format!("loop rate must be positive, got {hz}")))?;
        Ok(Self {
            period,
            clock,
            last_tick: None,
            deadline: None,
            overruns: 0,
        })
    }

    pub fn from_config(config: &RobotConfig, clock: Arc<dyn Clock>) -> Result<Self, FissionError> {
        Self::new(config.loop_hz, clock)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Mark the start of an iteration.
    ///
    /// Returns the time since the previous `tick`, or `None` on the first.
    pub fn tick(&mut self) -> Option<Duration> {
        let now = self.clock.now();
        let measured = self.last_tick.map(|prev| now.saturating_sub(prev));
        self.last_tick = Some(now);

        let next = match self.deadline {
            Some(deadline) => {
                if now > deadline {
                    self.overruns += 1;
                    warn!(
                        overrun_ms = (now - deadline).as_secs_f64() * 1e3,
                        period_ms = self.period.as_secs_f64() * 1e3,
                        "control loop overran its period"
                    );
                }
                // Keep the schedule unless a whole period was missed.
                Some(deadline + self.period).filter(|next| *next > now)
            }
            None => None,
        };
        self.deadline = Some(next.unwrap_or(now + self.period));
        measured
    }

    /// Time left until the current iteration's deadline.
    pub fn remaining(&self) -> Duration {
        match self.deadline {
            Some(deadline) => deadline.saturating_sub(self.clock.now()),
            None => Duration::ZERO,
        }
    }

    /// Block until the current iteration's deadline.
    pub fn sleep(&self) {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }

    /// Number of iterations that started after their deadline.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

impl std::fmt::Debug for LoopRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopRate")
            .field("period", &self.period)
            .field("overruns", &self.overruns)
            .finish_non_exhaustive()
    }
}

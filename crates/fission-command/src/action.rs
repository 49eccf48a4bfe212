//! Atomic units of work that a [`CommandSequence`][crate::CommandSequence]
//! runs in order.
//!
//! An [`Action`] has a one-shot body ([`Action::run`]) and a completion check
//! ([`Action::poll`]).  The sequence calls `run` once when the action becomes
//! current, then polls it every tick until it reports `true`.  Most actions
//! finish inside their body and keep the default `poll`, which is always
//! `true`.
//!
//! | Type                | Completes when                                   |
//! |---------------------|--------------------------------------------------|
//! | [`FnAction`]        | its body returns                                 |
//! | [`WaitAction`]      | the configured time has elapsed since `run`      |
//! | [`ConditionAction`] | its predicate first returns `true` after `run`   |

use std::sync::Arc;
use std::time::Duration;

use fission_hal::{Clock, SystemClock};
use fission_types::FissionError;

/// A unit of work inside a sequence.
///
/// Actions are driven from the control loop and must not block: long
/// operations start in [`run`][Action::run] and report progress through
/// [`poll`][Action::poll].
pub trait Action: Send {
    /// Human-readable identifier used in log output.
    fn name(&self) -> &str;

    /// The action body.  Called exactly once each time the sequence reaches
    /// this action.
    fn run(&mut self) -> Result<(), FissionError>;

    /// `true` once the work started by [`run`][Action::run] is finished.
    fn poll(&mut self) -> bool {
        true
    }
}

type Body = Box<dyn FnMut() -> Result<(), FissionError> + Send>;

// ─────────────────────────────────────────────────────────────────────────────
// FnAction
// ─────────────────────────────────────────────────────────────────────────────

/// An action whose body is a closure.
pub struct FnAction {
    name: String,
    body: Body,
}

impl FnAction {
    /// Wrap an infallible closure.
    pub fn new(name: impl Into<String>, mut body: impl FnMut() + Send + 'static) -> Self {
        Self::fallible(name, move || {
            body();
            Ok(())
        })
    }

    /// Wrap a closure that may fail.  A failure is logged by the sequence and
    /// counts as completion.
    pub fn fallible(
        name: impl Into<String>,
        body: impl FnMut() -> Result<(), FissionError> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            body: Box::new(body),
        }
    }
}

impl Action for FnAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self) -> Result<(), FissionError> {
        (self.body)()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WaitAction
// ─────────────────────────────────────────────────────────────────────────────

/// Pause a sequence for a fixed time.
pub struct WaitAction {
    name: String,
    duration: Duration,
    clock: Arc<dyn Clock>,
    started: Option<Duration>,
}

impl WaitAction {
    /// Wait `seconds` on the system clock.
    pub fn new(seconds: f64) -> Self {
        Self::with_clock(seconds, SystemClock::shared())
    }

    /// Wait `seconds` on `clock`.  Negative or NaN durations wait for zero
    /// time.
    pub fn with_clock(seconds: f64, clock: Arc<dyn Clock>) -> Self {
        let duration = Duration::try_from_secs_f64(seconds).unwrap_or(if seconds > 0.0 {
            Duration::MAX
        } else {
            Duration::ZERO
        });
        Self {
            name: format!("wait {seconds}s"),
            duration,
            clock,
            started: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Action for WaitAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self) -> Result<(), FissionError> {
        self.started = Some(self.clock.now());
        Ok(())
    }

    fn poll(&mut self) -> bool {
        match self.started {
            Some(start) => self.clock.now().saturating_sub(start) >= self.duration,
            None => false,
        }
    }
}

impl std::fmt::Debug for WaitAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitAction")
            .field("duration", &self.duration)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ConditionAction
// ─────────────────────────────────────────────────────────────────────────────

/// Start some work, then hold the sequence until a predicate holds.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use fission_command::{Action, ConditionAction};
///
/// let lift_height = Arc::new(Mutex::new(0.0));
/// let target = Arc::clone(&lift_height);
/// let sensor = Arc::clone(&lift_height);
///
/// let mut raise = ConditionAction::new(
///     "raise lift",
///     move || *target.lock().unwrap() = 12.0,
///     move || *sensor.lock().unwrap() >= 12.0,
/// );
/// raise.run().unwrap();
/// assert!(raise.poll());
/// ```
pub struct ConditionAction {
    name: String,
    body: Body,
    condition: Box<dyn FnMut() -> bool + Send>,
}

impl ConditionAction {
    pub fn new(
        name: impl Into<String>,
        mut body: impl FnMut() + Send + 'static,
        condition: impl FnMut() -> bool + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            body: Box::new(move || {
                body();
                Ok(())
            }),
            condition: Box::new(condition),
        }
    }

    /// A condition with no body: hold the sequence until `condition` holds.
    pub fn wait_until(
        name: impl Into<String>,
        condition: impl FnMut() -> bool + Send + 'static,
    ) -> Self {
        Self::new(name, || {}, condition)
    }

    /// Replace the body with one that may fail.
    pub fn with_fallible_body(
        mut self,
        body: impl FnMut() -> Result<(), FissionError> + Send + 'static,
    ) -> Self {
        self.body = Box::new(body);
        self
    }
}

impl Action for ConditionAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self) -> Result<(), FissionError> {
        (self.body)()
    }

    fn poll(&mut self) -> bool {
        (self.condition)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use fission_hal::ManualClock;

    #[test]
    fn fn_action_runs_body_and_completes() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut action = FnAction::new("count", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(action.name(), "count");
        action.run().unwrap();
        assert!(action.poll());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fallible_fn_action_returns_error() {
        let mut action = FnAction::fallible("broken", || {
            Err(FissionError::ActionFailed {
                action: "broken".into(),
                details: "servo jammed".into(),
            })
        });
        assert!(action.run().is_err());
    }

    #[test]
    fn wait_completes_after_duration() {
        let clock = ManualClock::new();
        let mut wait = WaitAction::with_clock(0.5, Arc::new(clock.clone()));
        assert_eq!(wait.duration(), Duration::from_millis(500));

        wait.run().unwrap();
        assert!(!wait.poll());
        clock.advance(Duration::from_millis(499));
        assert!(!wait.poll());
        clock.advance(Duration::from_millis(1));
        assert!(wait.poll());
    }

    #[test]
    fn wait_restarts_on_each_run() {
        let clock = ManualClock::new();
        let mut wait = WaitAction::with_clock(1.0, Arc::new(clock.clone()));
        wait.run().unwrap();
        clock.advance_secs(1.0);
        assert!(wait.poll());

        wait.run().unwrap();
        assert!(!wait.poll());
    }

    #[test]
    fn wait_before_run_never_completes() {
        let clock = ManualClock::new();
        let mut wait = WaitAction::with_clock(0.0, Arc::new(clock));
        assert!(!wait.poll());
    }

    #[test]
    fn negative_wait_is_zero() {
        let wait = WaitAction::with_clock(-2.0, Arc::new(ManualClock::new()));
        assert_eq!(wait.duration(), Duration::ZERO);
        let wait = WaitAction::with_clock(f64::NAN, Arc::new(ManualClock::new()));
        assert_eq!(wait.duration(), Duration::ZERO);
    }

    #[test]
    fn condition_waits_for_predicate() {
        let flag = Arc::new(AtomicBool::new(false));
        let sensor = Arc::clone(&flag);
        let mut action =
            ConditionAction::wait_until("flag", move || sensor.load(Ordering::SeqCst));

        action.run().unwrap();
        assert!(!action.poll());
        flag.store(true, Ordering::SeqCst);
        assert!(action.poll());
    }

    #[test]
    fn condition_fallible_body() {
        let mut action = ConditionAction::wait_until("sensor", || true).with_fallible_body(|| {
            Err(FissionError::ActionFailed {
                action: "sensor".into(),
                details: "sensor offline".into(),
            })
        });
        assert!(action.run().is_err());
    }
}

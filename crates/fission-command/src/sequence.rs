//! [`CommandSequence`] – an ordered list of actions run to completion.
//!
//! A sequence is a small state machine driven from the control loop.
//! [`run`][CommandSequence::run] arms it and [`tick`][CommandSequence::tick]
//! advances it: the current action's body runs once, then its completion is
//! polled, and every action that finishes within a tick lets the next one
//! start in the same tick.  [`has_completed`][CommandSequence::has_completed]
//! is `true` while the sequence is idle and may be read from any thread.
//!
//! A failing action (an `Err` from its body or a panic in either method) is
//! logged and counts as complete, so one broken action cannot wedge the
//! sequence.  An action whose `poll` never returns `true` still does: there
//! is no cancellation.
//!
//! # Example
//!
//! ```rust
//! use fission_command::{CommandSequence, FnAction};
//!
//! let score = CommandSequence::builder("score")
//!     .add(FnAction::new("open claw", || {}))
//!     .add(FnAction::new("lower lift", || {}))
//!     .build();
//!
//! assert!(score.has_completed());
//! assert!(score.run());
//! assert!(score.has_completed());
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use fission_hal::{Clock, SystemClock};
use fission_types::FissionError;
use tracing::{debug, error, info, warn};

use crate::action::{Action, WaitAction};

/// Outcome of one [`CommandSequence::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStatus {
    /// Not running; nothing was done.
    Idle,
    /// The current action is still in progress.
    Running,
    /// The last action finished during this tick.
    Completed,
}

struct SequenceState {
    actions: Vec<Box<dyn Action>>,
    started: bool,
    armed: bool,
}

/// An ordered list of actions executed one at a time.
///
/// The accessors never take the state lock, so an action may query its own
/// sequence while it runs.
pub struct CommandSequence {
    name: String,
    len: usize,
    has_completed: AtomicBool,
    // Written only while the state lock is held.
    cursor: AtomicUsize,
    state: Mutex<SequenceState>,
}

impl CommandSequence {
    pub fn builder(name: impl Into<String>) -> SequenceBuilder {
        SequenceBuilder {
            name: name.into(),
            actions: Vec::new(),
            clock: SystemClock::shared(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` when the sequence is idle: before its first run and after its
    /// last action finishes.
    pub fn has_completed(&self) -> bool {
        self.has_completed.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        !self.has_completed()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the action in progress, if running.
    pub fn current_action(&self) -> Option<usize> {
        let cursor = self.cursor.load(Ordering::Acquire);
        self.is_running().then_some(cursor)
    }

    /// Start the sequence from its first action and tick it once.
    ///
    /// Returns `false` without doing anything if the sequence is already
    /// running.
    pub fn run(&self) -> bool {
        if !self.has_completed() {
            debug!(sequence = %self.name, "run ignored; sequence still running");
            return false;
        }
        {
            let mut state = self.lock();
            self.cursor.store(0, Ordering::Release);
            state.started = false;
            state.armed = true;
            self.has_completed.store(false, Ordering::Release);
        }
        info!(sequence = %self.name, "sequence started");
        self.tick();
        true
    }

    /// Advance the sequence as far as it can go without waiting.
    ///
    /// Calling `tick` from inside one of this sequence's own actions is a
    /// no-op that reports [`SequenceStatus::Running`].
    pub fn tick(&self) -> SequenceStatus {
        let mut guard = match self.state.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return SequenceStatus::Running,
        };
        let state = &mut *guard;
        if !state.armed {
            return SequenceStatus::Idle;
        }

        loop {
            let step = self.cursor.load(Ordering::Acquire);
            let Some(action) = state.actions.get_mut(step) else {
                state.armed = false;
                self.has_completed.store(true, Ordering::Release);
                info!(sequence = %self.name, "sequence completed");
                return SequenceStatus::Completed;
            };
            let action_name = action.name().to_string();

            if !state.started {
                debug!(sequence = %self.name, action = %action_name, step, "action started");
                state.started = true;
                if guarded(&self.name, &action_name, || action.run()).is_none() {
                    self.cursor.store(step + 1, Ordering::Release);
                    state.started = false;
                    continue;
                }
            }
            let finished =
                guarded(&self.name, &action_name, || Ok(action.poll())).unwrap_or(true);
            if !finished {
                return SequenceStatus::Running;
            }
            self.cursor.store(step + 1, Ordering::Release);
            state.started = false;
        }
    }

    fn lock(&self) -> MutexGuard<'_, SequenceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CommandSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSequence")
            .field("name", &self.name)
            .field("has_completed", &self.has_completed())
            .finish_non_exhaustive()
    }
}

/// Call an action method, turning errors and panics into a logged `None`.
fn guarded<T>(
    sequence: &str,
    action: &str,
    f: impl FnOnce() -> Result<T, FissionError>,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!(sequence = %sequence, action = %action, error = %e, "action failed; skipping");
            None
        }
        Err(payload) => {
            let details = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            let e = FissionError::ActionFailed {
                action: action.to_string(),
                details,
            };
            error!(sequence = %sequence, error = %e, "action panicked; skipping");
            None
        }
    }
}

/// Tick every distinct sequence in `sequences` once.
pub(crate) fn tick_distinct<'a>(sequences: impl IntoIterator<Item = &'a Arc<CommandSequence>>) {
    let mut seen: Vec<&Arc<CommandSequence>> = Vec::new();
    for sequence in sequences {
        if !seen.iter().any(|other| Arc::ptr_eq(other, sequence)) {
            seen.push(sequence);
            sequence.tick();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SequenceBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Collects actions for a [`CommandSequence`].
pub struct SequenceBuilder {
    name: String,
    actions: Vec<Box<dyn Action>>,
    clock: Arc<dyn Clock>,
}

impl SequenceBuilder {
    pub fn add(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    pub fn add_boxed(mut self, action: Box<dyn Action>) -> Self {
        self.actions.push(action);
        self
    }

    /// Clock used by [`wait`][Self::wait].  Defaults to the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Append a [`WaitAction`] of `seconds` on the builder's clock.
    pub fn wait(self, seconds: f64) -> Self {
        let clock = Arc::clone(&self.clock);
        self.add(WaitAction::with_clock(seconds, clock))
    }

    /// Freeze the action list.
    pub fn build(self) -> Arc<CommandSequence> {
        debug!(sequence = %self.name, actions = self.actions.len(), "sequence built");
        Arc::new(CommandSequence {
            name: self.name,
            len: self.actions.len(),
            has_completed: AtomicBool::new(true),
            cursor: AtomicUsize::new(0),
            state: Mutex::new(SequenceState {
                actions: self.actions,
                started: false,
                armed: false,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use fission_hal::ManualClock;

    use crate::action::{ConditionAction, FnAction};

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn record(log: &Log, entry: &'static str) -> FnAction {
        let log = Arc::clone(log);
        FnAction::new(entry, move || log.lock().unwrap().push(entry))
    }

    #[test]
    fn new_sequence_is_idle() {
        let seq = CommandSequence::builder("idle").build();
        assert!(seq.has_completed());
        assert_eq!(seq.tick(), SequenceStatus::Idle);
        assert_eq!(seq.current_action(), None);
    }

    #[test]
    fn empty_sequence_completes_on_run() {
        let seq = CommandSequence::builder("empty").build();
        assert!(seq.is_empty());
        assert!(seq.run());
        assert!(seq.has_completed());
    }

    #[test]
    fn instant_actions_finish_in_one_run() {
        let log = Log::default();
        let seq = CommandSequence::builder("abc")
            .add(record(&log, "a"))
            .add(record(&log, "b"))
            .add(record(&log, "c"))
            .build();

        assert!(seq.run());
        assert!(seq.has_completed());
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn wait_holds_sequence_open() {
        let clock = ManualClock::new();
        let log = Log::default();
        let seq = CommandSequence::builder("a-wait-b")
            .clock(Arc::new(clock.clone()))
            .add(record(&log, "a"))
            .wait(0.5)
            .add(record(&log, "b"))
            .build();

        seq.run();
        assert!(!seq.has_completed());
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
        assert_eq!(seq.current_action(), Some(1));

        clock.advance_secs(0.25);
        assert_eq!(seq.tick(), SequenceStatus::Running);
        assert!(!seq.has_completed());

        clock.advance_secs(0.25);
        assert_eq!(seq.tick(), SequenceStatus::Completed);
        assert!(seq.has_completed());
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn run_while_running_is_ignored() {
        let clock = ManualClock::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let seq = CommandSequence::builder("busy")
            .clock(Arc::new(clock.clone()))
            .add(FnAction::new("count", move || {
                c.fetch_add(1, Ordering::SeqCst);
            }))
            .wait(1.0)
            .build();

        assert!(seq.run());
        assert!(!seq.run());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        clock.advance_secs(1.0);
        seq.tick();
        assert!(seq.run());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn condition_body_runs_once_while_polled() {
        let runs = Arc::new(AtomicUsize::new(0));
        let ready = Arc::new(AtomicBool::new(false));
        let (r, sensor) = (Arc::clone(&runs), Arc::clone(&ready));
        let seq = CommandSequence::builder("gated")
            .add(ConditionAction::new(
                "start",
                move || {
                    r.fetch_add(1, Ordering::SeqCst);
                },
                move || sensor.load(Ordering::SeqCst),
            ))
            .build();

        seq.run();
        for _ in 0..5 {
            assert_eq!(seq.tick(), SequenceStatus::Running);
        }
        ready.store(true, Ordering::SeqCst);
        assert_eq!(seq.tick(), SequenceStatus::Completed);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_action_is_skipped() {
        let log = Log::default();
        let seq = CommandSequence::builder("fails")
            .add(FnAction::fallible("broken", || {
                Err(FissionError::ActionFailed {
                    action: "broken".into(),
                    details: "jammed".into(),
                })
            }))
            .add(record(&log, "after"))
            .build();

        seq.run();
        assert!(seq.has_completed());
        assert_eq!(*log.lock().unwrap(), vec!["after"]);
    }

    #[test]
    fn panicking_action_is_skipped() {
        let log = Log::default();
        let seq = CommandSequence::builder("panics")
            .add(FnAction::new("explode", || panic!("boom")))
            .add(ConditionAction::wait_until("bad poll", || panic!("bang")))
            .add(record(&log, "after"))
            .build();

        seq.run();
        assert!(seq.has_completed());
        assert_eq!(*log.lock().unwrap(), vec!["after"]);

        // The state lock survives the panics.
        assert!(seq.run());
    }

    #[test]
    fn tick_from_own_action_does_not_deadlock() {
        let slot: Arc<Mutex<Option<Arc<CommandSequence>>>> = Arc::default();
        let inner = Arc::clone(&slot);
        let seq = CommandSequence::builder("reentrant")
            .add(FnAction::new("tick self", move || {
                if let Some(me) = inner.lock().unwrap().as_ref() {
                    assert_eq!(me.tick(), SequenceStatus::Running);
                }
            }))
            .build();
        *slot.lock().unwrap() = Some(Arc::clone(&seq));

        seq.run();
        assert!(seq.has_completed());
        slot.lock().unwrap().take();
    }

    #[test]
    fn action_can_inspect_its_own_sequence() {
        type Slot = Arc<Mutex<Option<Arc<CommandSequence>>>>;
        type Seen = Arc<Mutex<Vec<(Option<usize>, usize, bool)>>>;

        fn step(slot: &Slot, seen: &Seen) -> FnAction {
            let (slot, seen) = (Arc::clone(slot), Arc::clone(seen));
            FnAction::new("inspect self", move || {
                if let Some(me) = slot.lock().unwrap().as_ref() {
                    seen.lock()
                        .unwrap()
                        .push((me.current_action(), me.len(), me.is_empty()));
                }
            })
        }

        let slot = Slot::default();
        let seen = Seen::default();
        let seq = CommandSequence::builder("introspective")
            .add(step(&slot, &seen))
            .add(step(&slot, &seen))
            .build();
        *slot.lock().unwrap() = Some(Arc::clone(&seq));

        assert!(seq.run());
        assert!(seq.has_completed());
        assert_eq!(seq.current_action(), None);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(Some(0), 2, false), (Some(1), 2, false)]
        );
        slot.lock().unwrap().take();
    }

    #[test]
    fn tick_distinct_skips_duplicates() {
        let clock = ManualClock::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let seq = CommandSequence::builder("twice")
            .clock(Arc::new(clock.clone()))
            .wait(1.0)
            .add(FnAction::new("count", move || {
                c.fetch_add(1, Ordering::SeqCst);
            }))
            .build();
        seq.run();
        clock.advance_secs(1.0);

        let refs = vec![Arc::clone(&seq), Arc::clone(&seq)];
        tick_distinct(&refs);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

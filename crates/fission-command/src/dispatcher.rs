//! [`InputDispatcher`] – teleop sequences fired by gamepad input.
//!
//! The dispatcher walks an ordered wheel of `(sequence, trigger)` bindings.
//! Each [`run`][InputDispatcher::run] looks only at the current binding: when
//! the snapshot's [`InputTag`] equals its trigger and nothing is still
//! running, the sequence fires and the cursor moves to the next binding,
//! wrapping back to the first after the last.
//!
//! ```rust
//! use fission_command::{CommandSequence, FnAction, InputDispatcher, InputTag};
//! use fission_hal::GamepadSnapshot;
//!
//! let grab = CommandSequence::builder("grab").add(FnAction::new("close claw", || {})).build();
//! let release = CommandSequence::builder("release").add(FnAction::new("open claw", || {})).build();
//!
//! let mut driver_two = InputDispatcher::builder()
//!     .add(grab, InputTag::A)
//!     .add(release, InputTag::B)
//!     .build();
//!
//! let pressed_a = GamepadSnapshot { a: true, ..GamepadSnapshot::idle() };
//! assert!(driver_two.run(&pressed_a));
//! assert_eq!(driver_two.current_index(), 1);
//! ```

use std::sync::Arc;

use fission_hal::GamepadSnapshot;
use tracing::{debug, info, warn};

use crate::input::InputTag;
use crate::sequence::{CommandSequence, tick_distinct};

/// A cursor over trigger-bound sequences, advanced by input matches.
#[derive(Debug)]
pub struct InputDispatcher {
    bindings: Vec<(Arc<CommandSequence>, InputTag)>,
    cursor: usize,
    last_fired: Option<Arc<CommandSequence>>,
    warned_empty: bool,
}

impl InputDispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// One control tick.
    ///
    /// Ticks every bound sequence, then fires the current binding if its
    /// trigger is the active input, the bound sequence is idle, and the last
    /// sequence this dispatcher fired has finished.  Returns `true` if a
    /// sequence fired.
    pub fn run(&mut self, snapshot: &GamepadSnapshot) -> bool {
        if self.bindings.is_empty() {
            if !self.warned_empty {
                warn!("input dispatcher has no bindings; run() does nothing");
                self.warned_empty = true;
            }
            return false;
        }
        tick_distinct(self.bindings.iter().map(|(sequence, _)| sequence));

        let (sequence, trigger) = &self.bindings[self.cursor];
        if InputTag::from_snapshot(snapshot) != *trigger {
            return false;
        }
        let sequence = Arc::clone(sequence);
        let trigger = *trigger;

        let prior_done = self.last_fired.as_ref().is_none_or(|s| s.has_completed());
        if !(prior_done && sequence.has_completed()) {
            debug!(sequence = %sequence.name(), trigger = %trigger, "trigger held; previous sequence still running");
            return false;
        }

        sequence.run();
        info!(sequence = %sequence.name(), trigger = %trigger, step = self.cursor, "teleop sequence fired");
        self.last_fired = Some(sequence);
        self.cursor = (self.cursor + 1) % self.bindings.len();
        true
    }

    /// Index of the binding the next trigger is matched against.
    pub fn current_index(&self) -> usize {
        self.cursor
    }

    /// Trigger of the current binding.
    pub fn current_trigger(&self) -> Option<InputTag> {
        self.bindings.get(self.cursor).map(|(_, trigger)| *trigger)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Collects bindings for an [`InputDispatcher`].
#[derive(Debug, Default)]
pub struct DispatcherBuilder {
    bindings: Vec<(Arc<CommandSequence>, InputTag)>,
}

impl DispatcherBuilder {
    pub fn add(mut self, sequence: Arc<CommandSequence>, trigger: InputTag) -> Self {
        self.bindings.push((sequence, trigger));
        self
    }

    /// Bind `sequence` to [`InputTag::None`]: it fires on a tick with no
    /// input engaged.
    pub fn add_default(self, sequence: Arc<CommandSequence>) -> Self {
        self.add(sequence, InputTag::None)
    }

    pub fn build(self) -> InputDispatcher {
        InputDispatcher {
            bindings: self.bindings,
            cursor: 0,
            last_fired: None,
            warned_empty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use fission_hal::ManualClock;
    use proptest::prelude::*;

    use crate::action::FnAction;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn logged(name: &'static str, log: &Log) -> Arc<CommandSequence> {
        let log = Arc::clone(log);
        CommandSequence::builder(name)
            .add(FnAction::new(name, move || log.lock().unwrap().push(name)))
            .build()
    }

    fn pressing(tag: InputTag) -> GamepadSnapshot {
        let mut snapshot = GamepadSnapshot::idle();
        match tag {
            InputTag::A => snapshot.a = true,
            InputTag::B => snapshot.b = true,
            InputTag::X => snapshot.x = true,
            InputTag::Y => snapshot.y = true,
            _ => {}
        }
        snapshot
    }

    #[test]
    fn cycles_through_bindings_in_order() {
        let log = Log::default();
        let mut dispatcher = InputDispatcher::builder()
            .add(logged("s1", &log), InputTag::A)
            .add(logged("s2", &log), InputTag::B)
            .add(logged("s3", &log), InputTag::X)
            .build();

        for tag in [InputTag::A, InputTag::None, InputTag::B, InputTag::None, InputTag::X, InputTag::A] {
            dispatcher.run(&pressing(tag));
        }
        assert_eq!(*log.lock().unwrap(), vec!["s1", "s2", "s3", "s1"]);
        assert_eq!(dispatcher.current_index(), 1);
    }

    #[test]
    fn wrong_input_does_not_advance() {
        let log = Log::default();
        let mut dispatcher = InputDispatcher::builder()
            .add(logged("s1", &log), InputTag::A)
            .add(logged("s2", &log), InputTag::B)
            .build();

        assert!(!dispatcher.run(&pressing(InputTag::B)));
        assert!(!dispatcher.run(&pressing(InputTag::Y)));
        assert_eq!(dispatcher.current_index(), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn waits_for_running_sequence() {
        let clock = ManualClock::new();
        let log = Log::default();
        let slow = CommandSequence::builder("slow")
            .clock(Arc::new(clock.clone()))
            .wait(1.0)
            .build();
        let mut dispatcher = InputDispatcher::builder()
            .add(slow, InputTag::A)
            .add(logged("next", &log), InputTag::B)
            .build();

        assert!(dispatcher.run(&pressing(InputTag::A)));
        assert!(!dispatcher.run(&pressing(InputTag::B)));
        assert_eq!(dispatcher.current_index(), 1);

        // The dispatcher ticks the running sequence itself.
        clock.advance_secs(1.0);
        assert!(dispatcher.run(&pressing(InputTag::B)));
        assert_eq!(*log.lock().unwrap(), vec!["next"]);
    }

    #[test]
    fn held_button_does_not_refire_running_sequence() {
        let clock = ManualClock::new();
        let only = CommandSequence::builder("only")
            .clock(Arc::new(clock.clone()))
            .wait(0.5)
            .build();
        let mut dispatcher = InputDispatcher::builder().add(Arc::clone(&only), InputTag::A).build();

        assert!(dispatcher.run(&pressing(InputTag::A)));
        assert!(!dispatcher.run(&pressing(InputTag::A)));
        clock.advance_secs(0.5);
        assert!(dispatcher.run(&pressing(InputTag::A)));
        assert!(only.is_running());
    }

    #[test]
    fn default_binding_fires_on_idle_snapshot() {
        let log = Log::default();
        let mut dispatcher = InputDispatcher::builder()
            .add_default(logged("idle", &log))
            .add(logged("a", &log), InputTag::A)
            .build();
        assert_eq!(dispatcher.current_trigger(), Some(InputTag::None));

        assert!(dispatcher.run(&GamepadSnapshot::idle()));
        assert!(dispatcher.run(&pressing(InputTag::A)));
        assert_eq!(*log.lock().unwrap(), vec!["idle", "a"]);
    }

    #[test]
    fn empty_dispatcher_is_noop() {
        let mut dispatcher = InputDispatcher::builder().build();
        assert!(dispatcher.is_empty());
        assert!(!dispatcher.run(&pressing(InputTag::A)));
        assert!(!dispatcher.run(&pressing(InputTag::A)));
        assert_eq!(dispatcher.current_index(), 0);
    }

    proptest! {
        #[test]
        fn wraps_after_n_triggers(n in 1usize..12) {
            let log = Log::default();
            let mut builder = InputDispatcher::builder();
            for _ in 0..n {
                builder = builder.add(logged("step", &log), InputTag::Y);
            }
            let mut dispatcher = builder.build();

            for _ in 0..n {
                prop_assert!(dispatcher.run(&pressing(InputTag::Y)));
            }
            prop_assert_eq!(dispatcher.current_index(), 0);
            prop_assert_eq!(log.lock().unwrap().len(), n);
        }
    }
}

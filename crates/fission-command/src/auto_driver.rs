//! [`AutoDriver`] – the autonomous routine as a chain of sequences.
//!
//! Each [`run`][AutoDriver::run] fires the current sequence once the
//! previous one has finished and the drivetrain reports it is not busy, then
//! moves on.  Firing the last sequence latches
//! [`has_completed`][AutoDriver::has_completed]; from then on `run` only
//! keeps the running sequences ticking until [`reset`][AutoDriver::reset].
//!
//! ```rust
//! use fission_command::{AutoDriver, CommandSequence, FnAction};
//!
//! let park = CommandSequence::builder("park").add(FnAction::new("stow arm", || {})).build();
//! let mut auto = AutoDriver::builder().add(park).build();
//!
//! assert!(!auto.run(true)); // drive still following its trajectory
//! assert!(auto.run(false));
//! assert!(auto.has_completed());
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::sequence::{CommandSequence, tick_distinct};

/// A cursor over sequences advanced by completion plus a drive-busy gate.
#[derive(Debug)]
pub struct AutoDriver {
    sequences: Vec<Arc<CommandSequence>>,
    cursor: usize,
    has_completed: bool,
    armed: bool,
    last_fired: Option<Arc<CommandSequence>>,
    warned_empty: bool,
}

impl AutoDriver {
    pub fn builder() -> AutoDriverBuilder {
        AutoDriverBuilder::default()
    }

    /// One control tick.
    ///
    /// Ticks every sequence, then fires the current one if `drive_is_busy`
    /// is `false`, it is idle, and the previously fired sequence has
    /// finished.  Returns `true` if a sequence fired.
    pub fn run(&mut self, drive_is_busy: bool) -> bool {
        if self.sequences.is_empty() {
            if !self.warned_empty {
                warn!("auto driver has no sequences; run() does nothing");
                self.warned_empty = true;
            }
            return false;
        }
        tick_distinct(&self.sequences);

        if !self.armed || drive_is_busy {
            return false;
        }
        let sequence = Arc::clone(&self.sequences[self.cursor]);
        let prior_done = self.last_fired.as_ref().is_none_or(|s| s.has_completed());
        if !(prior_done && sequence.has_completed()) {
            return false;
        }

        sequence.run();
        info!(sequence = %sequence.name(), step = self.cursor, "auto sequence fired");
        self.last_fired = Some(sequence);
        self.cursor += 1;
        if self.cursor >= self.sequences.len() {
            self.cursor = 0;
            self.armed = false;
            self.has_completed = true;
            info!(sequences = self.sequences.len(), "auto routine fired every sequence");
        }
        true
    }

    /// Rewind to the first sequence and allow firing again.
    ///
    /// The completion latch stays set once it has been set.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.armed = true;
        debug!(has_completed = self.has_completed, "auto driver reset");
    }

    /// `true` once the last sequence has been fired.
    pub fn has_completed(&self) -> bool {
        self.has_completed
    }

    /// `true` when the routine has fired its last sequence and every
    /// sequence has finished running.
    pub fn is_idle(&self) -> bool {
        self.has_completed && self.sequences.iter().all(|s| s.has_completed())
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// Collects sequences for an [`AutoDriver`].
#[derive(Debug, Default)]
pub struct AutoDriverBuilder {
    sequences: Vec<Arc<CommandSequence>>,
}

impl AutoDriverBuilder {
    pub fn add(mut self, sequence: Arc<CommandSequence>) -> Self {
        self.sequences.push(sequence);
        self
    }

    pub fn build(self) -> AutoDriver {
        AutoDriver {
            sequences: self.sequences,
            cursor: 0,
            has_completed: false,
            armed: true,
            last_fired: None,
            warned_empty: false,
        }
    }
}

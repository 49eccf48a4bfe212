//! `fission-command` – command sequencing for teleop and autonomous play.
//!
//! User code is written as [`Action`]s, grouped into [`CommandSequence`]s,
//! and fired either by driver input through an [`InputDispatcher`] or by an
//! [`AutoDriver`] that chains sequences into a match routine.  Everything is
//! driven from the host's control loop: nothing here spawns threads or
//! blocks.
//!
//! # Modules
//!
//! - [`action`] – [`Action`], [`FnAction`], [`WaitAction`],
//!   [`ConditionAction`].
//! - [`sequence`] – [`CommandSequence`] and its builder.
//! - [`input`] – [`InputTag`] derivation from a gamepad snapshot.
//! - [`dispatcher`] – [`InputDispatcher`] for teleop.
//! - [`auto_driver`] – [`AutoDriver`] for autonomous.

pub mod action;
pub mod auto_driver;
pub mod dispatcher;
pub mod input;
pub mod sequence;

pub use action::{Action, ConditionAction, FnAction, WaitAction};
pub use auto_driver::{AutoDriver, AutoDriverBuilder};
pub use dispatcher::{DispatcherBuilder, InputDispatcher};
pub use input::InputTag;
pub use sequence::{CommandSequence, SequenceBuilder, SequenceStatus};

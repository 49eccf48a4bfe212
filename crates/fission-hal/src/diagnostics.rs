//! The host's diagnostic channel.
//!
//! Configuration mistakes (wheel constants never set, motion constraints
//! missing, …) are not errors a match can recover from, but they must not
//! stop the robot either.  They are reported as a single human-readable line
//! through a [`DiagnosticSink`] and the caller carries on with a safe default.

use std::sync::{Arc, Mutex, PoisonError};

use fission_types::FissionError;
use tracing::error;

/// Receives configuration diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &FissionError);
}

/// Forwards every diagnostic to `tracing::error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &FissionError) {
        error!(error = %diagnostic, "configuration diagnostic");
    }
}

/// Keeps every diagnostic in memory.  Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every diagnostic received so far, rendered with `Display`.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: &FissionError) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic.to_string());
    }
}

//! The edge-triggered touch sensor flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared between the input source, which raises it, and the VM, which
/// polls it. Polling is an atomic test-and-clear: a poll that sees a tap
/// consumes it, a poll that sees none leaves a later tap untouched.
#[derive(Debug, Clone, Default)]
pub struct TouchSensor {
    tapped: Arc<AtomicBool>,
}

impl TouchSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tap. Repeated taps before a poll collapse into one.
    pub fn raise(&self) {
        self.tapped.store(true, Ordering::Release);
    }

    /// Read and clear. Returns `true` iff a tap arrived since the last poll.
    pub fn poll(&self) -> bool {
        self.tapped.swap(false, Ordering::AcqRel)
    }

    /// Drop any pending tap.
    pub fn reset(&self) {
        self.tapped.store(false, Ordering::Release);
    }
}

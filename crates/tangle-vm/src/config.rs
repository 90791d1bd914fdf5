//! VM configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Milliseconds in one `wait` unit.
    pub time_unit_ms: u64,
    /// Instructions executed between cooperative yields when no `wait`
    /// intervenes.
    pub yield_every: u32,
    /// Capacity of the command channel.
    pub command_buffer: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            time_unit_ms: 1,
            yield_every: 64,
            command_buffer: 32,
        }
    }
}

impl VmConfig {
    /// Wall-clock length of `units` wait units.
    pub fn wait_duration(&self, units: u32) -> Duration {
        Duration::from_millis(self.time_unit_ms.saturating_mul(u64::from(units)))
    }
}

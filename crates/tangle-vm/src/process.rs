//! Process state owned by the machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Execution status of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
        })
    }
}

/// One execution of the loaded program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Process {
    pub pid: u32,
    pub pc: usize,
    pub variables: BTreeMap<String, i32>,
    /// Unelapsed part of a `wait` interrupted by a pause.
    pub pending_wait: Option<Duration>,
}

impl Process {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            pc: 0,
            variables: BTreeMap::new(),
            pending_wait: None,
        }
    }
}

/// What observers are told about the process behind an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub pc: usize,
    pub status: Status,
}

/// A copy of the process state, for hosts and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub pc: usize,
    pub status: Status,
    pub variables: BTreeMap<String, i32>,
    pub pending_wait_ms: Option<u64>,
}

impl ProcessSnapshot {
    pub(crate) fn of(process: &Process, status: Status) -> Self {
        Self {
            pid: process.pid,
            pc: process.pc,
            status,
            variables: process.variables.clone(),
            pending_wait_ms: process
                .pending_wait
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        }
    }
}

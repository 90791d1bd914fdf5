//! Statements: the compiler's node type, one per detected marker.

use serde::{Deserialize, Serialize};
use std::fmt;
use tangle_types::{Marker, NativeAction};

use crate::connector::{Connector, Direction};

/// Arena index of a statement inside its [`Collection`](crate::Collection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatementId(pub u32);

impl StatementId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Literal carried by a parameter sticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    /// A repeat or wait count.
    Count(u32),
    /// Run until the touch sensor is tapped.
    Tap,
    /// The "no limit" sentinel.
    Forever,
}

impl ParamValue {
    /// Literal used for counts and wait announcements when nothing limits
    /// the loop.
    pub const FOREVER_LITERAL: i32 = 1000;

    /// Numeric literal for counted loops. `None` for the tap sentinel.
    pub fn limit(self) -> Option<i32> {
        match self {
            Self::Count(n) => Some(i32::try_from(n).unwrap_or(i32::MAX)),
            Self::Forever => Some(Self::FOREVER_LITERAL),
            Self::Tap => None,
        }
    }
}

/// The closed set of statement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatementKind {
    Start,
    Action { action: NativeAction },
    Parameter { value: ParamValue },
    LoopBegin,
    LoopEnd,
    Wait,
}

impl StatementKind {
    pub fn is_start(self) -> bool {
        matches!(self, Self::Start)
    }

    pub fn is_parameter(self) -> bool {
        matches!(self, Self::Parameter { .. })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Action { .. } => "action",
            Self::Parameter { .. } => "parameter",
            Self::LoopBegin => "loop-begin",
            Self::LoopEnd => "loop-end",
            Self::Wait => "wait",
        }
    }
}

/// A statement built from one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub id: StatementId,
    pub kind: StatementKind,
    /// Sticker name, e.g. "Walk" or "Begin Repeat".
    pub name: String,
    pub marker: Marker,
    pub connectors: Vec<Connector>,
    compiled: bool,
    dangling: bool,
}

impl Statement {
    pub fn new(
        id: StatementId,
        kind: StatementKind,
        name: impl Into<String>,
        marker: Marker,
        connectors: Vec<Connector>,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            marker,
            connectors,
            compiled: false,
            dangling: false,
        }
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Set the compiled flag. Returns `false` if it was already set.
    pub fn mark_compiled(&mut self) -> bool {
        !std::mem::replace(&mut self.compiled, true)
    }

    /// An outgoing connector of this statement did not resolve.
    pub fn is_dangling(&self) -> bool {
        self.dangling
    }

    pub fn mark_dangling(&mut self) {
        self.dangling = true;
    }

    /// Clear the compiled and dangling flags, keeping resolved targets.
    pub fn clear_marks(&mut self) {
        self.compiled = false;
        self.dangling = false;
    }

    /// Clear per-pass flags and resolved targets.
    pub fn reset(&mut self) {
        self.clear_marks();
        for c in &mut self.connectors {
            c.target = None;
        }
    }

    pub fn connector(&self, name: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.name == name)
    }

    /// Target of the named connector, if it resolved.
    pub fn connection(&self, name: &str) -> Option<StatementId> {
        self.connector(name).and_then(|c| c.target)
    }

    /// Target of the first parameter plug, if it resolved.
    pub fn parameter_connection(&self) -> Option<StatementId> {
        self.connectors
            .iter()
            .find(|c| c.direction == Direction::Parameter)
            .and_then(|c| c.target)
    }

    /// Outgoing connectors in declaration order.
    pub fn outgoing(&self) -> impl Iterator<Item = &Connector> {
        self.connectors
            .iter()
            .filter(|c| c.direction == Direction::Outgoing)
    }

    pub fn has_outgoing_connection(&self) -> bool {
        self.outgoing().any(Connector::is_connected)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.id)
    }
}

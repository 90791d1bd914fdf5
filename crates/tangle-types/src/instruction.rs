//! The instruction set of the compiled control-flow language.
//!
//! ```text
//! walk()                  native call, no arguments
//! doWait(5)               native call, one integer argument
//! wait 1000               suspend for 1000 time units
//! a = 0                   assign a literal
//! a = a + 1               increment a counter
//! while a < 5:            counted loop header
//! while not getTouchSensor():   sensor-polling loop header
//! {  ...  }               loop body
//! trace 3                 trace point
//! print "Walk"            informational message
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed vocabulary of native calls the actuator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeAction {
    Walk,
    Run,
    Jump,
    Spin,
    Wiggle,
    Sleep,
    Yawn,
    Stand,
    End,
    Dance,
    /// Announce a timed or tap-gated wait; one integer argument.
    Wait,
    /// Zero-argument touch sensor query; returns 0/1 and clears on read.
    TouchSensor,
}

impl NativeAction {
    pub const ALL: [NativeAction; 12] = [
        Self::Walk,
        Self::Run,
        Self::Jump,
        Self::Spin,
        Self::Wiggle,
        Self::Sleep,
        Self::Yawn,
        Self::Stand,
        Self::End,
        Self::Dance,
        Self::Wait,
        Self::TouchSensor,
    ];

    /// Name used in the listing language.
    pub fn name(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Run => "run",
            Self::Jump => "jump",
            Self::Spin => "spin",
            Self::Wiggle => "wiggle",
            Self::Sleep => "sleep",
            Self::Yawn => "yawn",
            Self::Stand => "stand",
            Self::End => "end",
            Self::Dance => "dance",
            Self::Wait => "doWait",
            Self::TouchSensor => "getTouchSensor",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Sensor queries may appear in loop conditions.
    pub fn is_sensor(self) -> bool {
        matches!(self, Self::TouchSensor)
    }
}

impl fmt::Display for NativeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Condition evaluated by a `while` header on every pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// `while var < limit:`
    Below { var: String, limit: i32 },
    /// `while not sensor():`, looping until the sensor reads 1.
    SensorNotRaised { sensor: String },
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Below { var, limit } => write!(f, "{var} < {limit}"),
            Self::SensorNotRaised { sensor } => write!(f, "not {sensor}()"),
        }
    }
}

/// One line of the compiled program.
///
/// Native calls and sensors are stored by name so that listings parsed from
/// text carry unknown names through to the VM, which reports them as
/// unresolvable when reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    Call { name: String, args: Vec<i32> },
    Wait { units: u32 },
    Assign { var: String, value: i32 },
    Increment { var: String, by: i32 },
    While(Condition),
    Close,
    Trace { point: u32 },
    Print { text: String },
}

impl Instruction {
    pub fn call(action: NativeAction, args: Vec<i32>) -> Self {
        Self::Call {
            name: action.name().to_string(),
            args,
        }
    }

    pub fn assign(var: &str, value: i32) -> Self {
        Self::Assign {
            var: var.to_string(),
            value,
        }
    }

    pub fn increment(var: &str) -> Self {
        Self::Increment {
            var: var.to_string(),
            by: 1,
        }
    }

    pub fn while_below(var: &str, limit: i32) -> Self {
        Self::While(Condition::Below {
            var: var.to_string(),
            limit,
        })
    }

    pub fn while_not_sensor(sensor: NativeAction) -> Self {
        Self::While(Condition::SensorNotRaised {
            sensor: sensor.name().to_string(),
        })
    }

    pub fn is_native_call(&self) -> bool {
        matches!(self, Self::Call { .. })
    }
}

impl fmt::Display for Instruction {
    /// Renders the listing form. A `while` header spans two lines because
    /// the block opener sits on its own line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call { name, args } => {
                let args: Vec<String> = args.iter().map(i32::to_string).collect();
                write!(f, "{name}({})", args.join(", "))
            }
            Self::Wait { units } => write!(f, "wait {units}"),
            Self::Assign { var, value } => write!(f, "{var} = {value}"),
            Self::Increment { var, by } => write!(f, "{var} = {var} + {by}"),
            Self::While(cond) => write!(f, "while {cond}:\n{{"),
            Self::Close => write!(f, "}}"),
            Self::Trace { point } => write!(f, "trace {point}"),
            Self::Print { text } => {
                f.write_str("print \"")?;
                write_escaped(f, text)?;
                f.write_str("\"")
            }
        }
    }
}

/// Escape only what the listing lexer unescapes; everything else is literal.
fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for ch in text.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            other => write!(f, "{other}")?,
        }
    }
    Ok(())
}

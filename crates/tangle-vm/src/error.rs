//! VM error and fault types.

use tangle_asm::AsmError;
use tangle_types::ErrorCode;
use thiserror::Error;

use crate::process::Status;

/// A rejected VM command.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("no program loaded")]
    NoProgram,

    #[error("cannot {command} while {status}")]
    InvalidTransition { command: &'static str, status: Status },

    #[error("listing does not assemble: {0}")]
    Listing(#[from] AsmError),

    #[error("virtual machine needs a running Tokio runtime")]
    NoRuntime,

    /// The VM task has shut down.
    #[error("virtual machine is no longer running")]
    ChannelClosed,
}

/// A problem met while executing an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("no matching block for instruction {pc}")]
    UnresolvableJump { pc: usize },

    #[error("unknown native call '{name}' at instruction {pc}")]
    UnknownNative { name: String, pc: usize },

    #[error("'{name}' is not a sensor")]
    NotASensor { name: String },

    #[error("variable '{name}' read before assignment")]
    UndefinedVariable { name: String },

    #[error("{name}() returned status {status}")]
    NativeStatus { name: String, status: i32 },
}

impl Fault {
    /// Fatal faults stop the process; the rest are reported and execution
    /// continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnresolvableJump { .. } | Self::UnknownNative { .. } | Self::NotASensor { .. }
        )
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnresolvableJump { .. } | Self::UnknownNative { .. } | Self::NotASensor { .. } => {
                ErrorCode::UNRESOLVABLE_INSTRUCTION
            }
            Self::UndefinedVariable { .. } => ErrorCode::UNDEFINED_VARIABLE,
            Self::NativeStatus { .. } => ErrorCode::NATIVE_STATUS,
        }
    }
}

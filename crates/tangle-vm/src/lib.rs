//! Tangle virtual machine.
//!
//! Executes a [`CompiledProgram`](tangle_types::CompiledProgram) against an
//! [`Actuator`], reporting to an [`Observer`].
//!
//! ```text
//! VmHandle ──commands──▶ VM task ──steps──▶ Machine ──▶ Actuator
//!     ▲                     │                  └──────▶ Observer
//!     └────status (watch)───┘
//! ```
//!
//! [`Machine`] is the synchronous core: one instruction per step, with
//! `wait` handed back to the caller. [`VirtualMachine::spawn`] runs it in a
//! Tokio task where waits sleep without blocking and every command is
//! applied on an instruction boundary.

pub mod actuator;
pub mod config;
pub mod error;
pub mod machine;
pub mod observer;
pub mod process;
pub mod runtime;
pub mod sensor;

pub use actuator::Actuator;
pub use config::VmConfig;
pub use error::{Fault, VmError};
pub use machine::{Machine, StepOutcome};
pub use observer::{ChannelObserver, Observer, VmEvent};
pub use process::{ProcessInfo, ProcessSnapshot, Status};
pub use runtime::{VirtualMachine, VmHandle};
pub use sensor::TouchSensor;

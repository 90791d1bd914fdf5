//! The synchronous stepping core.
//!
//! [`Machine`] executes one instruction per [`step`](Machine::step) and
//! never sleeps: a `wait` instruction is handed back to the driver as
//! [`StepOutcome::Wait`]. The async runtime drives it from a task; tests
//! drive it directly.

use std::time::Duration;

use tangle_types::{CompiledProgram, Condition, Instruction, NativeAction};
use tracing::{debug, error, info, warn};

use crate::actuator::Actuator;
use crate::config::VmConfig;
use crate::error::{Fault, VmError};
use crate::observer::Observer;
use crate::process::{Process, ProcessInfo, ProcessSnapshot, Status};
use crate::sensor::TouchSensor;

/// Result of one [`Machine::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Executed one instruction; step again.
    Continue,
    /// Executed a `wait`; step again once this much time has passed.
    Wait(Duration),
    /// Ran off the end of the program.
    Finished,
    /// Stopped by a fatal fault.
    Faulted(Fault),
    /// Nothing to run: no process, or the process is paused.
    Idle,
}

/// Where control goes after an instruction.
enum Flow {
    Next,
    Jump(usize),
    Wait(Duration),
}

pub struct Machine<A, O> {
    actuator: A,
    observer: O,
    config: VmConfig,
    sensor: TouchSensor,
    program: Option<CompiledProgram>,
    /// Matching block index for every `while` and `}`; `None` if unmatched.
    jumps: Vec<Option<usize>>,
    process: Option<Process>,
    status: Status,
    next_pid: u32,
}

impl<A: Actuator, O: Observer> Machine<A, O> {
    pub fn new(actuator: A, observer: O, config: VmConfig) -> Self {
        Self {
            actuator,
            observer,
            config,
            sensor: TouchSensor::new(),
            program: None,
            jumps: Vec::new(),
            process: None,
            status: Status::Stopped,
            next_pid: 1,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// The sensor flag polled by this machine. Clone it to raise taps.
    pub fn sensor(&self) -> &TouchSensor {
        &self.sensor
    }

    pub fn program(&self) -> Option<&CompiledProgram> {
        self.program.as_ref()
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn snapshot(&self) -> Option<ProcessSnapshot> {
        self.process
            .as_ref()
            .map(|p| ProcessSnapshot::of(p, self.status))
    }

    fn info(&self) -> ProcessInfo {
        ProcessInfo {
            pid: self.process.as_ref().map_or(0, |p| p.pid),
            pc: self.process.as_ref().map_or(0, |p| p.pc),
            status: self.status,
        }
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Replace the loaded program. Any live process is stopped first.
    pub fn load(&mut self, program: CompiledProgram) {
        self.stop();
        self.jumps = link_blocks(program.instructions());
        let unmatched = self
            .jumps
            .iter()
            .zip(program.instructions())
            .filter(|(jump, ins)| {
                jump.is_none() && matches!(ins, Instruction::While(_) | Instruction::Close)
            })
            .count();
        if unmatched > 0 {
            warn!(unmatched, "program has unmatched blocks");
        }
        info!(instructions = program.len(), "program loaded");
        self.program = Some(program);
    }

    /// Assemble a listing and load it.
    pub fn load_listing(&mut self, listing: &str) -> Result<(), VmError> {
        let program = tangle_asm::parse_program(listing)?;
        self.load(program);
        Ok(())
    }

    /// Start a fresh process. Only valid while stopped.
    pub fn start(&mut self) -> Result<(), VmError> {
        if self.status != Status::Stopped {
            return Err(self.rejected("start"));
        }
        self.launch()
    }

    /// Stop any live process and start a fresh one.
    pub fn restart(&mut self) -> Result<(), VmError> {
        if self.program.is_none() {
            return Err(VmError::NoProgram);
        }
        self.stop();
        self.launch()
    }

    /// Suspend at the current instruction boundary. `remaining` is the
    /// unelapsed part of an interrupted `wait`, handed back by
    /// [`resume`](Self::resume).
    pub fn pause(&mut self, remaining: Option<Duration>) -> Result<(), VmError> {
        if self.status != Status::Running {
            return Err(self.rejected("pause"));
        }
        if let Some(process) = self.process.as_mut() {
            process.pending_wait = remaining;
        }
        self.status = Status::Paused;
        info!(pid = self.info().pid, pc = self.info().pc, "process paused");
        Ok(())
    }

    /// Continue a paused process. Returns the wait time still owed.
    pub fn resume(&mut self) -> Result<Option<Duration>, VmError> {
        if self.status != Status::Paused {
            return Err(self.rejected("resume"));
        }
        self.status = Status::Running;
        info!(pid = self.info().pid, pc = self.info().pc, "process resumed");
        Ok(self.process.as_mut().and_then(|p| p.pending_wait.take()))
    }

    /// Discard the process and halt the robot. Safe in any state.
    pub fn stop(&mut self) {
        if self.process.is_some() {
            self.actuator.all_stop();
            self.end_process("process stopped");
        }
        self.status = Status::Stopped;
    }

    /// Stop and unload the program.
    pub fn clear(&mut self) {
        self.stop();
        self.program = None;
        self.jumps.clear();
    }

    /// Point the actuator at `address` and connect.
    pub fn connect(&mut self, address: &str) {
        info!(address, "connecting actuator");
        self.actuator.set_address(address);
        self.actuator.open_connection();
    }

    /// Stop and drop the actuator connection.
    pub fn shutdown(&mut self) {
        self.stop();
        if self.actuator.is_connected() {
            self.actuator.close_connection();
        }
    }

    fn rejected(&self, command: &'static str) -> VmError {
        warn!(command, status = %self.status, "command rejected");
        VmError::InvalidTransition {
            command,
            status: self.status,
        }
    }

    fn launch(&mut self) -> Result<(), VmError> {
        if self.program.is_none() {
            return Err(VmError::NoProgram);
        }
        self.sensor.reset();
        if !self.actuator.is_connected() {
            self.actuator.open_connection();
        }
        let pid = self.next_pid;
        self.next_pid = self.next_pid.wrapping_add(1);
        self.process = Some(Process::new(pid));
        self.status = Status::Running;
        info!(pid, "process started");
        let info = self.info();
        self.observer.process_started(&info);
        Ok(())
    }

    fn end_process(&mut self, reason: &'static str) {
        self.status = Status::Stopped;
        let info = self.info();
        info!(pid = info.pid, pc = info.pc, "{reason}");
        self.observer.process_stopped(&info);
        self.process = None;
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Execute the instruction at the program counter.
    pub fn step(&mut self) -> StepOutcome {
        if self.status != Status::Running {
            return StepOutcome::Idle;
        }
        let Some(pc) = self.process.as_ref().map(|p| p.pc) else {
            return StepOutcome::Idle;
        };
        let instruction = self
            .program
            .as_ref()
            .and_then(|p| p.instructions().get(pc))
            .cloned();
        let Some(instruction) = instruction else {
            self.end_process("process finished");
            return StepOutcome::Finished;
        };

        match self.execute(pc, &instruction) {
            Ok(flow) => {
                let (next, outcome) = match flow {
                    Flow::Next => (pc + 1, StepOutcome::Continue),
                    Flow::Jump(target) => (target, StepOutcome::Continue),
                    Flow::Wait(duration) => (pc + 1, StepOutcome::Wait(duration)),
                };
                if let Some(process) = self.process.as_mut() {
                    process.pc = next;
                }
                outcome
            }
            Err(fault) => {
                let info = self.info();
                error!(pid = info.pid, pc, fault = %fault, "fatal fault");
                self.observer.error(&info, &fault.to_string());
                self.end_process("process stopped by fault");
                StepOutcome::Faulted(fault)
            }
        }
    }

    /// Returns `Err` only for fatal faults; recoverable ones are reported
    /// on the spot.
    fn execute(&mut self, pc: usize, instruction: &Instruction) -> Result<Flow, Fault> {
        match instruction {
            Instruction::Call { name, args } => {
                self.call(pc, name, args, instruction)?;
                Ok(Flow::Next)
            }
            Instruction::Wait { units } => Ok(Flow::Wait(self.config.wait_duration(*units))),
            Instruction::Assign { var, value } => {
                self.write(var, *value);
                Ok(Flow::Next)
            }
            Instruction::Increment { var, by } => {
                let value = self.read(var).saturating_add(*by);
                self.write(var, value);
                Ok(Flow::Next)
            }
            Instruction::While(condition) => {
                if self.holds(pc, condition)? {
                    Ok(Flow::Next)
                } else {
                    self.jumps
                        .get(pc)
                        .copied()
                        .flatten()
                        .map(|close| Flow::Jump(close + 1))
                        .ok_or(Fault::UnresolvableJump { pc })
                }
            }
            Instruction::Close => self
                .jumps
                .get(pc)
                .copied()
                .flatten()
                .map(Flow::Jump)
                .ok_or(Fault::UnresolvableJump { pc }),
            Instruction::Trace { point } => {
                let statement = self
                    .program
                    .as_ref()
                    .and_then(|p| p.trace_map().statement_for(*point));
                let info = self.info();
                self.observer.trace(&info, *point, statement);
                Ok(Flow::Next)
            }
            Instruction::Print { text } => {
                let info = self.info();
                self.observer.print(&info, text);
                Ok(Flow::Next)
            }
        }
    }

    fn call(
        &mut self,
        pc: usize,
        name: &str,
        args: &[i32],
        instruction: &Instruction,
    ) -> Result<(), Fault> {
        let action = NativeAction::from_name(name).ok_or_else(|| Fault::UnknownNative {
            name: name.to_string(),
            pc,
        })?;
        let info = self.info();
        self.observer.print(&info, &instruction.to_string());

        match self.actuator.dispatch(action, args) {
            Some(0) => debug!(pid = info.pid, pc, call = name, "native call"),
            Some(status) => {
                warn!(pid = info.pid, pc, call = name, status, "native call failed");
                self.report(Fault::NativeStatus {
                    name: name.to_string(),
                    status,
                });
            }
            None => {
                let tapped = self.sensor.poll();
                debug!(pid = info.pid, pc, tapped, "sensor polled");
            }
        }
        Ok(())
    }

    fn holds(&mut self, pc: usize, condition: &Condition) -> Result<bool, Fault> {
        match condition {
            Condition::Below { var, limit } => Ok(self.read(var) < *limit),
            Condition::SensorNotRaised { sensor } => match NativeAction::from_name(sensor) {
                Some(action) if action.is_sensor() => Ok(!self.sensor.poll()),
                Some(_) => Err(Fault::NotASensor {
                    name: sensor.clone(),
                }),
                None => Err(Fault::UnknownNative {
                    name: sensor.clone(),
                    pc,
                }),
            },
        }
    }

    /// Unassigned variables read as zero, after an error report.
    fn read(&mut self, var: &str) -> i32 {
        let value = self
            .process
            .as_ref()
            .and_then(|p| p.variables.get(var))
            .copied();
        value.unwrap_or_else(|| {
            self.report(Fault::UndefinedVariable {
                name: var.to_string(),
            });
            0
        })
    }

    fn write(&mut self, var: &str, value: i32) {
        if let Some(process) = self.process.as_mut() {
            process.variables.insert(var.to_string(), value);
        }
    }

    fn report(&mut self, fault: Fault) {
        let info = self.info();
        warn!(pid = info.pid, pc = info.pc, code = %fault.code(), "{fault}");
        self.observer.error(&info, &fault.to_string());
    }
}

/// Pair every `while` with its `}`.
fn link_blocks(instructions: &[Instruction]) -> Vec<Option<usize>> {
    let mut jumps = vec![None; instructions.len()];
    let mut open = Vec::new();
    for (i, instruction) in instructions.iter().enumerate() {
        match instruction {
            Instruction::While(_) => open.push(i),
            Instruction::Close => {
                if let Some(header) = open.pop() {
                    jumps[header] = Some(i);
                    jumps[i] = Some(header);
                }
            }
            _ => {}
        }
    }
    jumps
}

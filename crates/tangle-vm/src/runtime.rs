//! The VM task and the handle that commands it.
//!
//! The machine lives inside one spawned task. Commands arrive on an `mpsc`
//! channel and are answered through `oneshot`; status changes go out on a
//! `watch` channel. Commands are taken only between instructions, or while
//! a `wait` sleeps, so every command lands on an instruction boundary and a
//! stop or restart cuts a wait short.

use tangle_types::CompiledProgram;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::actuator::Actuator;
use crate::config::VmConfig;
use crate::error::VmError;
use crate::machine::{Machine, StepOutcome};
use crate::observer::Observer;
use crate::process::{ProcessSnapshot, Status};
use crate::sensor::TouchSensor;

type Reply<T> = oneshot::Sender<Result<T, VmError>>;

enum Command {
    Load(CompiledProgram, Reply<()>),
    Start(Reply<()>),
    Restart(Reply<()>),
    Pause(Reply<()>),
    Resume(Reply<()>),
    Stop(Reply<()>),
    Clear(Reply<()>),
    Toggle(Reply<Status>),
    Connect(String, Reply<()>),
    Snapshot(oneshot::Sender<Option<ProcessSnapshot>>),
    Shutdown(oneshot::Sender<()>),
}

/// A VM that has not been spawned yet.
pub struct VirtualMachine<A, O> {
    machine: Machine<A, O>,
}

impl<A, O> VirtualMachine<A, O>
where
    A: Actuator + Send + 'static,
    O: Observer + Send + 'static,
{
    pub fn new(actuator: A, observer: O, config: VmConfig) -> Self {
        Self {
            machine: Machine::new(actuator, observer, config),
        }
    }

    /// The sensor flag the VM will poll.
    pub fn sensor(&self) -> TouchSensor {
        self.machine.sensor().clone()
    }

    /// Move the VM into its own task on the current Tokio runtime.
    pub fn spawn(self) -> Result<VmHandle, VmError> {
        let runtime = Handle::try_current().map_err(|_| VmError::NoRuntime)?;
        let (command_tx, command_rx) = mpsc::channel(self.machine.config().command_buffer.max(1));
        let (status_tx, status_rx) = watch::channel(Status::Stopped);
        let sensor = self.sensor();
        let task = VmTask {
            machine: self.machine,
            status_tx,
            wake: None,
        };
        runtime.spawn(task.run(command_rx));
        Ok(VmHandle {
            commands: command_tx,
            status: status_rx,
            sensor,
        })
    }
}

struct VmTask<A, O> {
    machine: Machine<A, O>,
    status_tx: watch::Sender<Status>,
    /// When the `wait` in progress ends.
    wake: Option<Instant>,
}

impl<A: Actuator, O: Observer> VmTask<A, O> {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        info!("virtual machine running");
        let yield_every = self.machine.config().yield_every.max(1);
        let mut since_yield = 0u32;

        loop {
            if self.machine.status() != Status::Running {
                match commands.recv().await {
                    Some(command) => {
                        if !self.handle(command) {
                            break;
                        }
                        continue;
                    }
                    None => break,
                }
            }

            if let Some(deadline) = self.wake {
                tokio::select! {
                    _ = sleep_until(deadline) => self.wake = None,
                    command = commands.recv() => match command {
                        Some(command) => {
                            if !self.handle(command) {
                                break;
                            }
                        }
                        None => break,
                    },
                }
                continue;
            }

            match commands.try_recv() {
                Ok(command) => {
                    if !self.handle(command) {
                        break;
                    }
                    continue;
                }
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            if let StepOutcome::Wait(duration) = self.machine.step() {
                self.wake = Some(Instant::now() + duration);
            }
            self.publish();

            since_yield += 1;
            if since_yield >= yield_every {
                since_yield = 0;
                tokio::task::yield_now().await;
            }
        }

        self.machine.shutdown();
        self.publish();
        info!("virtual machine shut down");
    }

    fn publish(&self) {
        let status = self.machine.status();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    fn respond<T>(&self, reply: Reply<T>, result: Result<T, VmError>) {
        self.publish();
        let _ = reply.send(result);
    }

    /// Returns `false` on shutdown.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Load(program, reply) => {
                self.wake = None;
                self.machine.load(program);
                self.respond(reply, Ok(()));
            }
            Command::Start(reply) => {
                let result = self.machine.start();
                self.respond(reply, result);
            }
            Command::Restart(reply) => {
                self.wake = None;
                let result = self.machine.restart();
                self.respond(reply, result);
            }
            Command::Pause(reply) => {
                let result = self.pause();
                self.respond(reply, result);
            }
            Command::Resume(reply) => {
                let result = self.resume();
                self.respond(reply, result);
            }
            Command::Stop(reply) => {
                self.wake = None;
                self.machine.stop();
                self.respond(reply, Ok(()));
            }
            Command::Clear(reply) => {
                self.wake = None;
                self.machine.clear();
                self.respond(reply, Ok(()));
            }
            Command::Toggle(reply) => {
                let result = match self.machine.status() {
                    Status::Running => self.pause(),
                    Status::Paused => self.resume(),
                    Status::Stopped => {
                        self.wake = None;
                        self.machine.restart()
                    }
                };
                let status = self.machine.status();
                self.respond(reply, result.map(|()| status));
            }
            Command::Connect(address, reply) => {
                self.machine.connect(&address);
                self.respond(reply, Ok(()));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.machine.snapshot());
            }
            Command::Shutdown(reply) => {
                self.wake = None;
                self.machine.shutdown();
                self.publish();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    /// Pause, keeping whatever is left of a wait in progress.
    fn pause(&mut self) -> Result<(), VmError> {
        let remaining = self
            .wake
            .map(|deadline| deadline.saturating_duration_since(Instant::now()));
        self.machine.pause(remaining)?;
        self.wake = None;
        debug!(?remaining, "paused");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), VmError> {
        let owed = self.machine.resume()?;
        self.wake = owed.map(|d| Instant::now() + d);
        Ok(())
    }
}

/// Cloneable handle to a spawned VM.
///
/// When every handle is dropped the VM stops its process, closes the
/// actuator connection and exits.
#[derive(Debug, Clone)]
pub struct VmHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<Status>,
    sensor: TouchSensor,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Load(..) => "Load",
            Self::Start(_) => "Start",
            Self::Restart(_) => "Restart",
            Self::Pause(_) => "Pause",
            Self::Resume(_) => "Resume",
            Self::Stop(_) => "Stop",
            Self::Clear(_) => "Clear",
            Self::Toggle(_) => "Toggle",
            Self::Connect(..) => "Connect",
            Self::Snapshot(_) => "Snapshot",
            Self::Shutdown(_) => "Shutdown",
        })
    }
}

impl VmHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, VmError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| VmError::ChannelClosed)?;
        rx.await.map_err(|_| VmError::ChannelClosed)?
    }

    pub async fn load(&self, program: CompiledProgram) -> Result<(), VmError> {
        self.request(|reply| Command::Load(program, reply)).await
    }

    /// Assemble a listing and load it.
    pub async fn load_listing(&self, listing: &str) -> Result<(), VmError> {
        let program = tangle_asm::parse_program(listing)?;
        self.load(program).await
    }

    pub async fn start(&self) -> Result<(), VmError> {
        self.request(Command::Start).await
    }

    pub async fn restart(&self) -> Result<(), VmError> {
        self.request(Command::Restart).await
    }

    pub async fn pause(&self) -> Result<(), VmError> {
        self.request(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<(), VmError> {
        self.request(Command::Resume).await
    }

    pub async fn stop(&self) -> Result<(), VmError> {
        self.request(Command::Stop).await
    }

    pub async fn clear(&self) -> Result<(), VmError> {
        self.request(Command::Clear).await
    }

    /// Resume if paused, restart if stopped, pause if running. Returns the
    /// new status.
    pub async fn toggle(&self) -> Result<Status, VmError> {
        self.request(Command::Toggle).await
    }

    pub async fn connect(&self, address: &str) -> Result<(), VmError> {
        let address = address.to_string();
        self.request(|reply| Command::Connect(address, reply)).await
    }

    pub async fn snapshot(&self) -> Result<Option<ProcessSnapshot>, VmError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot(tx))
            .await
            .map_err(|_| VmError::ChannelClosed)?;
        rx.await.map_err(|_| VmError::ChannelClosed)
    }

    /// Stop the VM task. Other handles see [`VmError::ChannelClosed`].
    pub async fn shutdown(&self) -> Result<(), VmError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Shutdown(tx))
            .await
            .map_err(|_| VmError::ChannelClosed)?;
        rx.await.map_err(|_| VmError::ChannelClosed)
    }

    /// Latest published status (non-blocking).
    pub fn status(&self) -> Status {
        *self.status.borrow()
    }

    /// Wait until no process is running or paused.
    pub async fn wait_stopped(&self) -> Status {
        let mut rx = self.status.clone();
        loop {
            let status = *rx.borrow_and_update();
            if status == Status::Stopped {
                return status;
            }
            if rx.changed().await.is_err() {
                return *rx.borrow();
            }
        }
    }

    /// The sensor flag polled by the VM. Raise it on a tap.
    pub fn sensor(&self) -> &TouchSensor {
        &self.sensor
    }
}

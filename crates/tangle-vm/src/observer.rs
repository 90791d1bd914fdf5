//! Lifecycle and diagnostic events reported by the VM.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::process::ProcessInfo;

/// Receives VM events. Every method defaults to doing nothing.
pub trait Observer {
    /// A process started from `start` or `restart`.
    fn process_started(&mut self, _info: &ProcessInfo) {}

    /// A process ran off the end of the program, faulted fatally or was
    /// stopped.
    fn process_stopped(&mut self, _info: &ProcessInfo) {}

    /// A trace point was reached. `statement` is the originating statement
    /// when the program carries a trace map entry for `point`.
    fn trace(&mut self, _info: &ProcessInfo, _point: u32, _statement: Option<u32>) {}

    fn print(&mut self, _info: &ProcessInfo, _text: &str) {}

    fn error(&mut self, _info: &ProcessInfo, _text: &str) {}
}

/// Discards every event.
impl Observer for () {}

/// An observer callback as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VmEvent {
    ProcessStarted {
        info: ProcessInfo,
    },
    ProcessStopped {
        info: ProcessInfo,
    },
    Trace {
        info: ProcessInfo,
        point: u32,
        statement: Option<u32>,
    },
    Print {
        info: ProcessInfo,
        text: String,
    },
    Error {
        info: ProcessInfo,
        text: String,
    },
}

/// Forwards callbacks into an unbounded channel.
///
/// Events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<VmEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<VmEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: VmEvent) {
        let _ = self.tx.send(event);
    }
}

impl Observer for ChannelObserver {
    fn process_started(&mut self, info: &ProcessInfo) {
        self.emit(VmEvent::ProcessStarted { info: *info });
    }

    fn process_stopped(&mut self, info: &ProcessInfo) {
        self.emit(VmEvent::ProcessStopped { info: *info });
    }

    fn trace(&mut self, info: &ProcessInfo, point: u32, statement: Option<u32>) {
        self.emit(VmEvent::Trace {
            info: *info,
            point,
            statement,
        });
    }

    fn print(&mut self, info: &ProcessInfo, text: &str) {
        self.emit(VmEvent::Print {
            info: *info,
            text: text.to_string(),
        });
    }

    fn error(&mut self, info: &ProcessInfo, text: &str) {
        self.emit(VmEvent::Error {
            info: *info,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Status;

    #[test]
    fn channel_observer_forwards_in_order() {
        let (mut observer, mut rx) = ChannelObserver::new();
        let info = ProcessInfo {
            pid: 1,
            pc: 0,
            status: Status::Running,
        };
        observer.process_started(&info);
        observer.print(&info, "walk()");
        observer.trace(&info, 0, Some(3));

        assert_eq!(rx.try_recv().unwrap(), VmEvent::ProcessStarted { info });
        assert_eq!(
            rx.try_recv().unwrap(),
            VmEvent::Print {
                info,
                text: "walk()".into()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            VmEvent::Trace {
                info,
                point: 0,
                statement: Some(3)
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receiver_is_ignored() {
        let (mut observer, rx) = ChannelObserver::new();
        drop(rx);
        let info = ProcessInfo {
            pid: 1,
            pc: 0,
            status: Status::Stopped,
        };
        observer.error(&info, "lost");
    }

    #[test]
    fn events_serialize_tagged() {
        let event = VmEvent::Print {
            info: ProcessInfo {
                pid: 2,
                pc: 5,
                status: Status::Running,
            },
            text: "hi".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "print");
        assert_eq!(json["info"]["status"], "running");
    }
}

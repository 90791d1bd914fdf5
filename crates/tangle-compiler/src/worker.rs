//! Single-flight compile worker.
//!
//! Detection and graph walking run on a blocking thread so the caller's
//! task never stalls. At most one compile is in flight; a second request is
//! rejected rather than queued.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tangle_graph::Catalog;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::source::MarkerSource;
use crate::{compile_from, Compilation, CompileError, CompileOptions};

/// Why a compile request was not accepted.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum WorkerError {
    #[error("a compile is already in flight")]
    Busy,

    #[error("compile worker needs a running Tokio runtime")]
    NoRuntime,
}

/// Clears the in-flight flag when the blocking job ends, even by panic.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs compiles off the caller's task, one at a time.
#[derive(Debug, Clone)]
pub struct CompileWorker {
    busy: Arc<AtomicBool>,
    catalog: Arc<Catalog>,
    options: CompileOptions,
}

impl CompileWorker {
    pub fn new(options: CompileOptions) -> Self {
        Self::with_catalog(Catalog::standard(), options)
    }

    pub fn with_catalog(catalog: Catalog, options: CompileOptions) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            catalog: Arc::new(catalog),
            options,
        }
    }

    /// `true` while a compile is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start compiling the markers `source` detects.
    ///
    /// Returns immediately; await the ticket for the outcome.
    pub fn submit<S>(&self, source: S) -> Result<CompileTicket, WorkerError>
    where
        S: MarkerSource + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| WorkerError::NoRuntime)?;
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("compile request rejected, worker busy");
            return Err(WorkerError::Busy);
        }

        let guard = InFlight(self.busy.clone());
        let catalog = self.catalog.clone();
        let options = self.options.clone();
        debug!("compile submitted");
        let handle = runtime.spawn_blocking(move || {
            let _guard = guard;
            compile_from(&source, &catalog, &options)
        });
        Ok(CompileTicket { handle })
    }
}

/// Pending outcome of a submitted compile.
#[derive(Debug)]
pub struct CompileTicket {
    handle: JoinHandle<Result<Compilation, CompileError>>,
}

impl CompileTicket {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Future for CompileTicket {
    type Output = Result<Compilation, CompileError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| {
            joined.unwrap_or_else(|e| Err(CompileError::Aborted(e.to_string())))
        })
    }
}

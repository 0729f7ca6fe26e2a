//! The call bridge
//!
//! [`Bridge`] is the context every operation runs against: the shared
//! interpreter namespace and the compiled-code store. The C entry points use a
//! single process-wide instance created on first use; tests and embedders can
//! build their own.

mod dispatch;
mod namespace;
mod resolve;

pub use dispatch::{ArgMode, CompileOptions};
pub use namespace::{CompileMode, Namespace};
pub use resolve::resolve_callable;

use crate::errors::report::propagate;
use crate::errors::{BridgeError, Status};
use crate::infrastructure::{init_logging, Config, LogConfig};
use crate::marshal::{deliver, OutputSlot};
use crate::store::{CompilationStore, Handle};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use pyo3::prelude::*;
use tracing::{info, warn};

pub struct Bridge {
    namespace: Namespace,
    store: CompilationStore<PyObject>,
}

impl Bridge {
    pub fn new(py: Python<'_>, config: &Config) -> Result<Self, BridgeError> {
        Ok(Self {
            namespace: Namespace::new(py, &config.python)?,
            store: CompilationStore::new(),
        })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn compiled_count(&self) -> usize {
        self.store.len()
    }
}

/// Process-wide bridge used by the C API.
///
/// Calls are single-threaded and non-reentrant by contract. The mutex exists
/// because a `static` must be `Sync`; it is only ever `try_lock`ed, and a
/// call that finds it held fails with [`crate::errors::ErrorKind::Busy`].
static BRIDGE: OnceCell<Mutex<Bridge>> = OnceCell::new();

fn global(py: Python<'_>) -> Result<&'static Mutex<Bridge>, BridgeError> {
    BRIDGE.get_or_try_init(|| {
        let (config, problem) = Config::discover();
        init_logging(&LogConfig::from_settings(&config.log));
        if let Some(problem) = problem {
            warn!(%problem, "using default configuration");
        }
        let bridge = Bridge::new(py, &config)?;
        info!(version = env!("CARGO_PKG_VERSION"), "mpy bridge initialized");
        Ok(Mutex::new(bridge))
    })
}

/// Run `f` against the process-wide bridge.
pub fn with_global<R>(py: Python<'_>, f: impl FnOnce(&mut Bridge) -> Result<R, BridgeError>) -> Result<R, BridgeError> {
    let bridge = global(py)?;
    let mut guard = bridge.try_lock().ok_or_else(BridgeError::busy)?;
    f(&mut guard)
}

/// Result of a dispatch operation on its way back to the host.
pub enum Reply<'py> {
    /// A value to render into the output (or print when there is none).
    Value(&'py PyAny),
    /// A compile handle, handed back like any other string result.
    Handle(Handle),
    /// Statements ran; the output, if any, is emptied.
    Empty,
}

/// Deliver an outcome to the host and produce the status code.
///
/// Failures raised while encoding the result go through the same error
/// protocol as failures raised by the operation itself.
pub fn complete(py: Python<'_>, outcome: Result<Reply<'_>, BridgeError>, mut output: Option<&mut OutputSlot<'_>>) -> Status {
    let delivered = outcome.and_then(|reply| match reply {
        Reply::Value(value) => deliver(py, value, output.as_deref_mut()),
        Reply::Handle(handle) => {
            let text = handle.to_string().into_py(py);
            deliver(py, text.as_ref(py), output.as_deref_mut())
        }
        Reply::Empty => {
            if let Some(slot) = output.as_deref_mut() {
                slot.clear();
            }
            Ok(())
        }
    });

    match delivered {
        Ok(()) => Status::Ok,
        Err(err) => propagate(py, &err, output),
    }
}

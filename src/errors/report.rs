//! Error propagation protocol
//!
//! A failed call always returns [`Status::Failed`]. The text goes to the
//! host's output buffer when one was supplied, otherwise to the interpreter's
//! stderr with the full traceback. Failures that happen while reporting a
//! failure only ever reach stderr.

use super::{BridgeError, Status};
use crate::marshal::{write_stream, OutputSlot};
use pyo3::prelude::*;
use pyo3::types::PyString;
use tracing::warn;

/// Where an error report ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reported {
    Output,
    Traceback,
    DiagnosticOnly,
}

pub fn propagate(py: Python<'_>, err: &BridgeError, output: Option<&mut OutputSlot<'_>>) -> Status {
    let reported = report(py, err, output);
    warn!(kind = %err.kind, message = %err.message, ?reported, "call failed");
    err.status()
}

pub fn report(py: Python<'_>, err: &BridgeError, output: Option<&mut OutputSlot<'_>>) -> Reported {
    if err.is_secondary() {
        diagnostic(py, &err.message);
        return Reported::DiagnosticOnly;
    }

    match output {
        Some(slot) => match slot.write(err.message.as_bytes()) {
            Ok(_) => Reported::Output,
            Err(secondary) => {
                warn!(%secondary, "could not write error into output buffer");
                diagnostic(py, &err.message);
                Reported::DiagnosticOnly
            }
        },
        None => {
            // PyErr::print would hand SystemExit to Py_Exit and end the host.
            match err.source.as_ref().map(|source| format_traceback(py, source)) {
                Some(Ok(text)) => {
                    if write_stream(py, "stderr", &text).is_err() {
                        eprint!("{}", text);
                    }
                }
                Some(Err(_)) | None => diagnostic(py, &err.message),
            }
            Reported::Traceback
        }
    }
}

/// `traceback.format_exception` of `err`, joined into one string.
fn format_traceback(py: Python<'_>, err: &PyErr) -> PyResult<String> {
    let value = err.value(py);
    let lines = py
        .import("traceback")?
        .getattr("format_exception")?
        .call1((value.get_type(), value, err.traceback(py)))?;
    PyString::new(py, "").call_method1("join", (lines,))?.extract()
}

/// Last-resort text output; falls back to the process stderr if even the
/// interpreter's stream is unusable.
fn diagnostic(py: Python<'_>, text: &str) {
    let line = format!("{}\n", text);
    if write_stream(py, "stderr", &line).is_err() {
        eprint!("{}", line);
    }
}

//! Structured failures and their mapping onto the host's status convention
//!
//! Everything that can go wrong during a call ends up as a [`BridgeError`].
//! The C boundary never sees it directly: [`report::propagate`] turns it into
//! a negative [`Status`] plus a textual payload.

pub mod report;

use pyo3::prelude::*;
use std::fmt;
use std::os::raw::c_int;

/// Return code handed back to the host; the host only looks at the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    Failed = -1,
}

impl Status {
    pub fn as_raw(self) -> c_int {
        self as c_int
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The host passed a buffer that violates the calling contract.
    InvalidBuffer,
    /// A mode, flag or name argument could not be understood.
    InvalidArgument,
    /// The interpreter raised an exception.
    Interpreter { exception: String },
    /// A `>N` handle that was never issued or has been released.
    HandleNotFound { handle: String },
    /// A dotted call path did not resolve.
    NotFound { path: String },
    /// A dotted call path resolved to something that cannot be called.
    NotCallable { path: String },
    /// The bridge was entered while another call was still running.
    Busy,
    /// The exception could not even be turned into text.
    Unrenderable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBuffer => write!(f, "invalid buffer"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::Interpreter { exception } => write!(f, "interpreter raised {}", exception),
            Self::HandleNotFound { handle } => write!(f, "no compiled code for handle {}", handle),
            Self::NotFound { path } => write!(f, "'{}' not found", path),
            Self::NotCallable { path } => write!(f, "'{}' is not callable", path),
            Self::Busy => write!(f, "bridge busy"),
            Self::Unrenderable => write!(f, "unprintable exception"),
        }
    }
}

#[derive(Debug)]
pub struct BridgeError {
    pub kind: ErrorKind,
    /// Text written into the host's output buffer on failure.
    pub message: String,
    /// The originating interpreter exception, kept for traceback printing.
    pub source: Option<PyErr>,
}

impl BridgeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: PyErr) -> Self {
        self.source = Some(source);
        self
    }

    pub fn invalid_buffer(detail: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidBuffer, format!("invalid buffer: {}", detail))
    }

    pub fn invalid_argument(detail: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidArgument, format!("ValueError: {}", detail))
    }

    pub fn handle_not_found(handle: &str) -> Self {
        Self::new(
            ErrorKind::HandleNotFound { handle: handle.to_string() },
            format!("KeyError: '{}'", handle),
        )
    }

    pub fn not_found(path: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound { path: path.to_string() }, message)
    }

    pub fn not_callable(path: &str, type_name: &str) -> Self {
        Self::new(
            ErrorKind::NotCallable { path: path.to_string() },
            format!("TypeError: '{}' object is not callable", type_name),
        )
    }

    pub fn busy() -> Self {
        Self::new(
            ErrorKind::Busy,
            "RuntimeError: mpy entered while another call is in progress",
        )
    }

    /// Capture an interpreter exception as text while the GIL is held.
    ///
    /// If `str()` of the exception itself raises, the error is marked
    /// [`ErrorKind::Unrenderable`] and only a placeholder text is kept.
    pub fn from_py(py: Python<'_>, err: PyErr) -> Self {
        let exception = err
            .get_type(py)
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|_| "Exception".to_string());

        let text = err
            .value(py)
            .str()
            .and_then(|s| s.to_str().map(str::to_owned));

        match text {
            Ok(text) => {
                let message = if text.is_empty() {
                    exception.clone()
                } else {
                    format!("{}: {}", exception, text)
                };
                Self::new(ErrorKind::Interpreter { exception }, message).with_source(err)
            }
            Err(_) => Self::new(
                ErrorKind::Unrenderable,
                format!("<unprintable {} object>", exception),
            )
            .with_source(err),
        }
    }

    /// Reclassify an interpreter lookup failure as an unresolved call path.
    pub(crate) fn into_not_found(self, path: &str) -> Self {
        Self {
            kind: ErrorKind::NotFound { path: path.to_string() },
            ..self
        }
    }

    /// Every failure maps to the same sentinel; the payload carries the detail.
    pub fn status(&self) -> Status {
        Status::Failed
    }

    pub fn is_secondary(&self) -> bool {
        matches!(self.kind, ErrorKind::Unrenderable)
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

/// Shorthand used by the dispatch layer for interpreter results.
pub(crate) trait IntoBridge<T> {
    fn into_bridge(self, py: Python<'_>) -> Result<T, BridgeError>;
}

impl<T> IntoBridge<T> for PyResult<T> {
    fn into_bridge(self, py: Python<'_>) -> Result<T, BridgeError> {
        self.map_err(|err| BridgeError::from_py(py, err))
    }
}

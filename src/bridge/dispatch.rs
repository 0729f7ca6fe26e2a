//! Dispatch operations on the bridge context
//!
//! Each operation resolves its inputs, runs the interpreter against the
//! shared namespace and returns the raw result. Writing results and errors
//! back to the host is left to [`super::complete`].

use super::namespace::CompileMode;
use super::resolve::resolve_callable;
use super::Bridge;
use crate::errors::{BridgeError, IntoBridge};
use crate::marshal::{coerce, ArgCursor, ArgSource};
use crate::store::Handle;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyTuple};
use tracing::debug;

/// How call arguments are turned into interpreter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgMode {
    /// Numeric-looking strings become `int`/`float`.
    Coerced,
    /// Every argument is passed as `bytes`.
    Raw,
}

/// Name, mode and flags for a compile request, parsed from host buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub name: String,
    pub mode: CompileMode,
    pub flags: i32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            name: "<string>".to_string(),
            mode: CompileMode::Eval,
            flags: 0,
        }
    }
}

impl CompileOptions {
    /// Build options from the optional trailing buffers of a compile call.
    pub fn from_bytes(name: Option<&[u8]>, mode: Option<&[u8]>, flags: Option<&[u8]>) -> Result<Self, BridgeError> {
        let mut options = Self::default();
        if let Some(name) = name {
            options.name = String::from_utf8_lossy(name).into_owned();
        }
        if let Some(mode) = mode {
            options.mode = utf8(mode, "mode")?.parse()?;
        }
        if let Some(flags) = flags {
            let text = utf8(flags, "flags")?.trim();
            if !text.is_empty() {
                options.flags = text.parse().map_err(|_| {
                    BridgeError::invalid_argument(format!("compile() flags must be an integer, not '{}'", text))
                })?;
            }
        }
        Ok(options)
    }
}

fn utf8<'a>(bytes: &'a [u8], what: &str) -> Result<&'a str, BridgeError> {
    std::str::from_utf8(bytes).map_err(|_| BridgeError::invalid_argument(format!("{} is not valid UTF-8", what)))
}

impl Bridge {
    /// Turn a `code` argument into something `eval`/`exec` accept: the stored
    /// code object for a `>N` handle, otherwise the source bytes.
    fn resolve_code<'py>(&self, py: Python<'py>, code: &[u8]) -> Result<&'py PyAny, BridgeError> {
        if Handle::is_reference(code) {
            return self
                .store
                .get(code)
                .map(|entity| entity.clone_ref(py).into_ref(py))
                .ok_or_else(|| BridgeError::handle_not_found(&String::from_utf8_lossy(code)));
        }
        let source: &PyAny = PyBytes::new(py, code);
        Ok(source)
    }

    /// Evaluate an expression (or stored code) in the shared namespace.
    ///
    /// Source text that evaluates to a code object has that code object
    /// evaluated once more, so precompiled code kept in a variable can be run
    /// by naming it.
    pub fn evaluate<'py>(&self, py: Python<'py>, code: &[u8]) -> Result<&'py PyAny, BridgeError> {
        debug!(len = code.len(), handle = Handle::is_reference(code), "evaluate");
        let target = self.resolve_code(py, code)?;
        let value = self.namespace.eval(py, target)?;
        if !Handle::is_reference(code) && self.namespace.is_code(py, value)? {
            debug!("evaluate produced a code object; evaluating it");
            return self.namespace.eval(py, value);
        }
        Ok(value)
    }

    /// Execute statements (or stored code) in the shared namespace.
    pub fn execute(&self, py: Python<'_>, code: &[u8]) -> Result<(), BridgeError> {
        debug!(len = code.len(), handle = Handle::is_reference(code), "execute");
        let target = self.resolve_code(py, code)?;
        self.namespace.exec(py, target)
    }

    /// Call the callable at dotted `path` with arguments pulled from `args`.
    ///
    /// Every argument is copied into an interpreter object before the call,
    /// so no host buffer is referenced once this returns.
    pub fn call<'py, 'a, S>(
        &self,
        py: Python<'py>,
        path: &[u8],
        args: ArgCursor<'a, S>,
        mode: ArgMode,
    ) -> Result<&'py PyAny, BridgeError>
    where
        S: ArgSource<'a>,
    {
        let path = utf8(path, "function name")?;
        debug!(path, argc = args.len(), ?mode, "call");

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let arg = arg?;
            let value = match mode {
                ArgMode::Coerced => coerce(arg).into_py_object(py).into_bridge(py)?,
                ArgMode::Raw => PyBytes::new(py, arg).into_py(py),
            };
            values.push(value);
        }

        let target = resolve_callable(py, &self.namespace, path)?;
        target.call1(PyTuple::new(py, values)).into_bridge(py)
    }

    /// Compile `source` and keep the code object under a new handle.
    pub fn compile(&mut self, py: Python<'_>, source: &[u8], options: &CompileOptions) -> Result<Handle, BridgeError> {
        let code = self
            .namespace
            .compile(py, source, &options.name, options.mode, options.flags)?;
        let handle = self.store.insert(code.into());
        debug!(%handle, name = %options.name, mode = %options.mode, "compiled");
        Ok(handle)
    }

    /// Forget a handle. Unknown handles are ignored.
    pub fn release(&mut self, handle: &[u8]) {
        let released = self.store.release(handle).is_some();
        debug!(handle = %String::from_utf8_lossy(handle), released, "release");
    }
}

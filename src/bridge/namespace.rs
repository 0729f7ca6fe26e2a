//! The shared interpreter scope
//!
//! One dict serves as both globals and locals for every call, so functions
//! defined by one `exec` can see each other and everything persists until the
//! process exits.

use crate::errors::{BridgeError, IntoBridge};
use crate::infrastructure::PythonConfig;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict, PyList};
use std::fmt;
use std::str::FromStr;

/// How source is compiled, as understood by Python's `compile()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
    Eval,
    Exec,
    Single,
}

impl CompileMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eval => "eval",
            Self::Exec => "exec",
            Self::Single => "single",
        }
    }
}

impl FromStr for CompileMode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eval" => Ok(Self::Eval),
            "exec" => Ok(Self::Exec),
            "single" => Ok(Self::Single),
            other => Err(BridgeError::invalid_argument(format!(
                "compile() mode must be 'exec', 'eval' or 'single', not '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for CompileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Namespace {
    scope: Py<PyDict>,
    builtins: Py<PyModule>,
    code_type: PyObject,
}

impl Namespace {
    pub fn new(py: Python<'_>, config: &PythonConfig) -> Result<Self, BridgeError> {
        let builtins = py.import("builtins").into_bridge(py)?;
        let code_type = py.import("types").and_then(|m| m.getattr("CodeType")).into_bridge(py)?;

        let scope = PyDict::new(py);
        scope.set_item("__builtins__", builtins).into_bridge(py)?;
        scope.set_item("__name__", &config.namespace_name).into_bridge(py)?;

        if !config.sys_path.is_empty() {
            let path: &PyList = py
                .import("sys")
                .and_then(|sys| sys.getattr("path"))
                .and_then(|p| p.downcast::<PyList>().map_err(PyErr::from))
                .into_bridge(py)?;
            for (i, dir) in config.sys_path.iter().enumerate() {
                path.insert(i, dir).into_bridge(py)?;
            }
        }

        let namespace = Self {
            scope: scope.into(),
            builtins: builtins.into(),
            code_type: code_type.into(),
        };

        if let Some(startup) = &config.startup {
            namespace.exec(py, PyBytes::new(py, startup.as_bytes()))?;
        }

        Ok(namespace)
    }

    pub fn scope<'py>(&self, py: Python<'py>) -> &'py PyDict {
        self.scope.clone_ref(py).into_ref(py)
    }

    pub fn builtins<'py>(&self, py: Python<'py>) -> &'py PyModule {
        self.builtins.clone_ref(py).into_ref(py)
    }

    /// `eval(code, ns, ns)` where `code` is source bytes or a code object.
    pub fn eval<'py>(&self, py: Python<'py>, code: &'py PyAny) -> Result<&'py PyAny, BridgeError> {
        let scope = self.scope(py);
        self.builtins(py)
            .getattr("eval")
            .and_then(|eval| eval.call1((code, scope, scope)))
            .into_bridge(py)
    }

    /// `exec(code, ns, ns)`.
    pub fn exec(&self, py: Python<'_>, code: &PyAny) -> Result<(), BridgeError> {
        let scope = self.scope(py);
        self.builtins(py)
            .getattr("exec")
            .and_then(|exec| exec.call1((code, scope, scope)))
            .map(drop)
            .into_bridge(py)
    }

    /// `compile(source, name, mode, flags, dont_inherit=True)`.
    pub fn compile<'py>(
        &self,
        py: Python<'py>,
        source: &[u8],
        name: &str,
        mode: CompileMode,
        flags: i32,
    ) -> Result<&'py PyAny, BridgeError> {
        let source = PyBytes::new(py, source);
        self.builtins(py)
            .getattr("compile")
            .and_then(|compile| compile.call1((source, name, mode.as_str(), flags, true)))
            .into_bridge(py)
    }

    pub fn is_code(&self, py: Python<'_>, value: &PyAny) -> Result<bool, BridgeError> {
        value.is_instance(self.code_type.as_ref(py)).into_bridge(py)
    }

    /// Look a name up in the namespace only.
    pub fn get<'py>(&self, py: Python<'py>, name: &str) -> Result<Option<&'py PyAny>, BridgeError> {
        self.scope(py).get_item(name).into_bridge(py)
    }
}

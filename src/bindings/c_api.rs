//! C API for the M external-call table
//!
//! Every function takes the host's logical argument count first and returns
//! `0` on success or `-1` on failure. Nothing unwinds out of these functions:
//! interpreter exceptions are reported through the output buffer or stderr,
//! and Rust panics are caught and logged.
//!
//! The variadic `mpy_func`/`mpy_func_raw` are defined in `csrc/mpy_varargs.c`
//! and land in [`mpy_vfunc`]/[`mpy_vfunc_raw`] with a `va_list*`.

use std::ffi::c_void;
use std::os::raw::c_int;
use std::panic::{self, AssertUnwindSafe};

use pyo3::prelude::*;
use tracing::error;

use crate::bridge::{complete, with_global, ArgMode, CompileOptions, Reply};
use crate::errors::Status;
use crate::marshal::{decode, ArgCursor, GtmString, OutputSlot, VaListArgs};

/// Position of the output buffer among the logical arguments; below this
/// count the host did not pass one.
const OUTPUT_ARGC: c_int = 2;

/// Run an entry point body, turning any panic into a failure status.
fn guard(name: &'static str, body: impl FnOnce() -> Status) -> c_int {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(status) => status.as_raw(),
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(entry = name, %detail, "panic caught at the C boundary");
            Status::Failed.as_raw()
        }
    }
}

const fn version_component(text: &str) -> c_int {
    let bytes = text.as_bytes();
    let mut value = 0;
    let mut i = 0;
    while i < bytes.len() {
        value = value * 10 + (bytes[i] - b'0') as c_int;
        i += 1;
    }
    value
}

/// `major*10000 + minor*100 + patch` of this crate.
pub const VERSION_NUMBER: c_int = version_component(env!("CARGO_PKG_VERSION_MAJOR")) * 10000
    + version_component(env!("CARGO_PKG_VERSION_MINOR")) * 100
    + version_component(env!("CARGO_PKG_VERSION_PATCH"));

#[no_mangle]
pub extern "C" fn mpy_version_number(_argc: c_int) -> c_int {
    VERSION_NUMBER
}

/// Evaluate an expression or a compiled handle.
///
/// # Safety
/// `code` and `output` must be null or valid `gtm_string_t` pointers for the
/// duration of the call.
#[no_mangle]
pub unsafe extern "C" fn mpy_eval(argc: c_int, code: *const GtmString, output: *mut GtmString) -> c_int {
    guard("mpy_eval", || {
        Python::with_gil(|py| {
            let mut output = OutputSlot::from_raw(argc, OUTPUT_ARGC, output);
            let outcome = with_global(py, |bridge| {
                let code = decode(code)?;
                bridge.evaluate(py, code).map(Reply::Value)
            });
            complete(py, outcome, output.as_mut())
        })
    })
}

/// Execute statements or a compiled handle; the output is emptied on success.
///
/// # Safety
/// As for [`mpy_eval`].
#[no_mangle]
pub unsafe extern "C" fn mpy_exec(argc: c_int, code: *const GtmString, output: *mut GtmString) -> c_int {
    guard("mpy_exec", || {
        Python::with_gil(|py| {
            let mut output = OutputSlot::from_raw(argc, OUTPUT_ARGC, output);
            let outcome = with_global(py, |bridge| {
                let code = decode(code)?;
                bridge.execute(py, code).map(|()| Reply::Empty)
            });
            complete(py, outcome, output.as_mut())
        })
    })
}

unsafe fn vfunc(
    name: &'static str,
    mode: ArgMode,
    argc: c_int,
    funcname: *const GtmString,
    output: *mut GtmString,
    args: *mut c_void,
) -> c_int {
    guard(name, || {
        Python::with_gil(|py| {
            let mut output = OutputSlot::from_raw(argc, OUTPUT_ARGC, output);
            let count = usize::try_from(argc.saturating_sub(OUTPUT_ARGC)).unwrap_or(0);
            let outcome = with_global(py, |bridge| {
                let funcname = decode(funcname)?;
                let args = ArgCursor::new(VaListArgs::new(args), count);
                bridge.call(py, funcname, args, mode).map(Reply::Value)
            });
            complete(py, outcome, output.as_mut())
        })
    })
}

/// Call a function with numeric-looking arguments converted to numbers.
///
/// # Safety
/// `args` must be the `va_list*` captured by `mpy_func` holding at least
/// `argc - 2` `gtm_string_t*` entries.
#[no_mangle]
pub unsafe extern "C" fn mpy_vfunc(
    argc: c_int,
    funcname: *const GtmString,
    output: *mut GtmString,
    args: *mut c_void,
) -> c_int {
    vfunc("mpy_vfunc", ArgMode::Coerced, argc, funcname, output, args)
}

/// Call a function with every argument passed as bytes.
///
/// # Safety
/// As for [`mpy_vfunc`].
#[no_mangle]
pub unsafe extern "C" fn mpy_vfunc_raw(
    argc: c_int,
    funcname: *const GtmString,
    output: *mut GtmString,
    args: *mut c_void,
) -> c_int {
    vfunc("mpy_vfunc_raw", ArgMode::Raw, argc, funcname, output, args)
}

/// Compile `code` and return its handle in `output`.
///
/// `name`, `mode` and `flags` are optional and default to `<string>`, `eval`
/// and `0`.
///
/// # Safety
/// Every pointer the host counts in `argc` must be a valid `gtm_string_t`
/// for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn mpy_compile(
    argc: c_int,
    code: *const GtmString,
    output: *mut GtmString,
    name: *const GtmString,
    mode: *const GtmString,
    flags: *const GtmString,
) -> c_int {
    guard("mpy_compile", || {
        Python::with_gil(|py| {
            let mut output = OutputSlot::from_raw(argc, OUTPUT_ARGC, output);
            let optional = |position: c_int, raw: *const GtmString| {
                if argc >= position && !raw.is_null() {
                    decode(raw).map(Some)
                } else {
                    Ok(None)
                }
            };
            let outcome = with_global(py, |bridge| {
                let code = decode(code)?;
                let options = CompileOptions::from_bytes(optional(3, name)?, optional(4, mode)?, optional(5, flags)?)?;
                bridge.compile(py, code, &options).map(Reply::Handle)
            });
            complete(py, outcome, output.as_mut())
        })
    })
}

/// Release a compiled handle. Unknown handles are ignored; always succeeds.
///
/// # Safety
/// `handle` must be null or a valid `gtm_string_t` pointer.
#[no_mangle]
pub unsafe extern "C" fn mpy_uncompile(argc: c_int, handle: *const GtmString) -> c_int {
    guard("mpy_uncompile", || {
        if argc < 1 {
            return Status::Ok;
        }
        Python::with_gil(|py| {
            let released = with_global(py, |bridge| {
                bridge.release(decode(handle)?);
                Ok(())
            });
            if let Err(err) = released {
                tracing::debug!(%err, "uncompile ignored");
            }
            Status::Ok
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_packing() {
        assert_eq!(version_component("0"), 0);
        assert_eq!(version_component("12"), 12);
        let expected = env!("CARGO_PKG_VERSION_MAJOR").parse::<c_int>().unwrap() * 10000
            + env!("CARGO_PKG_VERSION_MINOR").parse::<c_int>().unwrap() * 100
            + env!("CARGO_PKG_VERSION_PATCH").parse::<c_int>().unwrap();
        assert_eq!(mpy_version_number(0), expected);
    }

    #[test]
    fn test_guard_catches_panics() {
        assert_eq!(guard("test", || Status::Ok), 0);
        assert_eq!(guard("test", || panic!("boom")), -1);
    }
}

//! Host string buffers
//!
//! The host hands every string over as a `gtm_string_t`: a length and a
//! pointer it owns. Inputs are only read; the output buffer arrives with its
//! capacity in `length` and is filled in place.

use crate::errors::{BridgeError, IntoBridge};
use pyo3::prelude::*;
use pyo3::types::{PyByteArray, PyBytes};
use std::borrow::Cow;
use std::os::raw::{c_char, c_int, c_long};
use std::{ptr, slice};

/// Layout-compatible with the host's `gtm_string_t`.
#[repr(C)]
#[derive(Debug)]
pub struct GtmString {
    pub length: c_long,
    pub address: *mut c_char,
}

impl GtmString {
    /// Describe a caller-owned region; used by tests and embedders.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            length: bytes.len() as c_long,
            address: bytes.as_ptr() as *mut c_char,
        }
    }

    /// Describe a writable region whose whole length is the capacity.
    pub fn with_capacity(buf: &mut [u8]) -> Self {
        Self {
            length: buf.len() as c_long,
            address: buf.as_mut_ptr() as *mut c_char,
        }
    }
}

/// Borrow the bytes of a host buffer.
///
/// # Safety
/// `raw` must be null or point to a `GtmString` whose `address` is valid for
/// `length` bytes for the whole lifetime `'a`, which must not outlive the
/// host call that supplied it.
pub unsafe fn decode<'a>(raw: *const GtmString) -> Result<&'a [u8], BridgeError> {
    let Some(buffer) = raw.as_ref() else {
        return Err(BridgeError::invalid_buffer("null buffer pointer"));
    };

    let len = usize::try_from(buffer.length)
        .map_err(|_| BridgeError::invalid_buffer(format!("negative length {}", buffer.length)))?;

    if len == 0 {
        return Ok(&[]);
    }
    if buffer.address.is_null() {
        return Err(BridgeError::invalid_buffer("null address with non-zero length"));
    }

    Ok(slice::from_raw_parts(buffer.address as *const u8, len))
}

/// The host's output buffer, when the call supplied a usable one.
pub struct OutputSlot<'a> {
    raw: &'a mut GtmString,
}

impl<'a> OutputSlot<'a> {
    pub fn new(raw: &'a mut GtmString) -> Self {
        Self { raw }
    }

    /// Apply the arity rule: the output only exists when the host passed at
    /// least `min_argc` logical arguments and a non-null pointer.
    ///
    /// # Safety
    /// When non-null, `raw` must point to a `GtmString` that stays valid and
    /// unaliased for `'a`.
    pub unsafe fn from_raw(argc: c_int, min_argc: c_int, raw: *mut GtmString) -> Option<Self> {
        if argc < min_argc {
            return None;
        }
        raw.as_mut().map(Self::new)
    }

    /// Capacity as announced by the host on entry.
    pub fn capacity(&self) -> usize {
        usize::try_from(self.raw.length).unwrap_or(0)
    }

    /// Copy `bytes` into the host buffer, silently truncating to capacity.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, BridgeError> {
        let n = bytes.len().min(self.capacity());
        if n > 0 {
            if self.raw.address.is_null() {
                return Err(BridgeError::invalid_buffer("output has capacity but no address"));
            }
            // SAFETY: the host guarantees `address` holds `capacity` bytes and
            // `n <= capacity`; the source is Rust-owned so they cannot overlap.
            unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), self.raw.address as *mut u8, n) };
        }
        self.raw.length = n as c_long;
        Ok(n)
    }

    pub fn clear(&mut self) {
        self.raw.length = 0;
    }
}

/// Bytes sent back to the host for a result value.
///
/// `bytes` and `bytearray` pass through, `None` is empty, everything else is
/// `str(value)` in UTF-8.
pub fn render<'py>(value: &'py PyAny) -> PyResult<Cow<'py, [u8]>> {
    if value.is_none() {
        return Ok(Cow::Borrowed(&[]));
    }
    if let Ok(bytes) = value.downcast::<PyBytes>() {
        return Ok(Cow::Borrowed(bytes.as_bytes()));
    }
    if let Ok(array) = value.downcast::<PyByteArray>() {
        return Ok(Cow::Owned(array.to_vec()));
    }
    let text = value.str()?.to_str()?;
    Ok(Cow::Borrowed(text.as_bytes()))
}

/// Hand a result to the host: into the output slot when there is one,
/// otherwise as `repr()` on the interpreter's stdout.
pub fn deliver(py: Python<'_>, value: &PyAny, output: Option<&mut OutputSlot<'_>>) -> Result<(), BridgeError> {
    match output {
        Some(slot) => {
            let bytes = render(value).into_bridge(py)?;
            let written = slot.write(&bytes)?;
            if written < bytes.len() {
                tracing::debug!(produced = bytes.len(), written, "result truncated to output capacity");
            }
            Ok(())
        }
        None => {
            let empty: &PyAny = PyBytes::new(py, b"");
            let shown = if value.is_none() { empty } else { value };
            let text = shown.repr().and_then(|r| r.to_str().map(str::to_owned)).into_bridge(py)?;
            write_stream(py, "stdout", &text).into_bridge(py)
        }
    }
}

/// Write text to `sys.<name>` so it interleaves with the interpreter's own
/// `print` output.
pub(crate) fn write_stream(py: Python<'_>, name: &str, text: &str) -> PyResult<()> {
    let stream = py.import("sys")?.getattr(name)?;
    stream.call_method1("write", (text,))?;
    stream.call_method0("flush")?;
    Ok(())
}

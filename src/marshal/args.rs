//! Argument cursor for variadic calls
//!
//! The host passes call arguments as C varargs; the count is only known
//! from `argc`. [`ArgCursor`] pairs a source of buffers with that explicit
//! bound so nothing ever reads past the last argument.

use super::buffer::{decode, GtmString};
use crate::errors::BridgeError;
use std::ffi::c_void;
use std::marker::PhantomData;

/// Something that yields argument buffers one at a time.
pub trait ArgSource<'a> {
    /// Pull the next buffer. Called at most as many times as the cursor's
    /// bound allows.
    fn pull(&mut self) -> Result<&'a [u8], BridgeError>;
}

/// Bounded iterator over call arguments.
pub struct ArgCursor<'a, S> {
    source: S,
    remaining: usize,
    _args: PhantomData<&'a [u8]>,
}

impl<'a, S: ArgSource<'a>> ArgCursor<'a, S> {
    pub fn new(source: S, count: usize) -> Self {
        Self {
            source,
            remaining: count,
            _args: PhantomData,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<'a, S: ArgSource<'a>> Iterator for ArgCursor<'a, S> {
    type Item = Result<&'a [u8], BridgeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.source.pull())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, S: ArgSource<'a>> ExactSizeIterator for ArgCursor<'a, S> {}

/// Arguments already laid out in memory.
pub struct SliceArgs<'a> {
    args: std::slice::Iter<'a, &'a [u8]>,
}

impl<'a> SliceArgs<'a> {
    pub fn new(args: &'a [&'a [u8]]) -> Self {
        Self { args: args.iter() }
    }
}

impl<'a> ArgSource<'a> for SliceArgs<'a> {
    fn pull(&mut self) -> Result<&'a [u8], BridgeError> {
        self.args
            .next()
            .copied()
            .ok_or_else(|| BridgeError::invalid_buffer("fewer arguments than argc announced"))
    }
}

extern "C" {
    /// `va_arg(*args, gtm_string_t *)`, implemented in `csrc/mpy_varargs.c`.
    fn mpy_next_string(args: *mut c_void) -> *const GtmString;
}

/// Arguments behind a C `va_list*` captured by the variadic shim.
pub struct VaListArgs<'a> {
    args: *mut c_void,
    _host: PhantomData<&'a GtmString>,
}

impl<'a> VaListArgs<'a> {
    /// # Safety
    /// `args` must point to a started `va_list` whose remaining entries are
    /// `gtm_string_t*` valid for `'a`, and it must not be stepped further
    /// than the number of arguments the caller actually passed.
    pub unsafe fn new(args: *mut c_void) -> Self {
        Self {
            args,
            _host: PhantomData,
        }
    }
}

impl<'a> ArgSource<'a> for VaListArgs<'a> {
    fn pull(&mut self) -> Result<&'a [u8], BridgeError> {
        if self.args.is_null() {
            return Err(BridgeError::invalid_buffer("null argument list"));
        }
        // SAFETY: upheld by the contract of `VaListArgs::new`; the cursor
        // bound keeps us within the caller's argument count.
        unsafe { decode(mpy_next_string(self.args)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_honours_bound() {
        let args: [&[u8]; 3] = [b"3", b"4", b"5"];
        let cursor = ArgCursor::new(SliceArgs::new(&args), 2);
        assert_eq!(cursor.len(), 2);
        let pulled: Vec<_> = cursor.map(Result::unwrap).collect();
        assert_eq!(pulled, vec![&b"3"[..], &b"4"[..]]);
    }

    #[test]
    fn test_cursor_zero_count() {
        let args: [&[u8]; 1] = [b"x"];
        let mut cursor = ArgCursor::new(SliceArgs::new(&args), 0);
        assert!(cursor.next().is_none());
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_short_source_is_an_error() {
        let args: [&[u8]; 1] = [b"x"];
        let results: Vec<_> = ArgCursor::new(SliceArgs::new(&args), 2).collect();
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_null_va_list() {
        let mut source = unsafe { VaListArgs::new(std::ptr::null_mut()) };
        assert!(source.pull().is_err());
    }
}

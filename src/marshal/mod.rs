//! Marshaling between host buffers and interpreter values
//!
//! - `buffer.rs` - `gtm_string_t` layout, decoding, truncating write-back
//! - `coerce.rs` - numeric heuristic for coerced call arguments
//! - `args.rs` - bounded cursor over variadic arguments

mod args;
mod buffer;
mod coerce;

pub use args::{ArgCursor, ArgSource, SliceArgs, VaListArgs};
pub use buffer::{decode, deliver, render, GtmString, OutputSlot};
pub(crate) use buffer::write_stream;
pub use coerce::{coerce, Coerced};

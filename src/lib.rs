//! mpy - call Python from M
//!
//! A shared library for the YottaDB/GT.M external-call interface. M code
//! evaluates expressions, executes statements, calls functions and keeps
//! precompiled code in an embedded CPython interpreter, passing strings in
//! and getting strings (or an error text) back.
//!
//! Layout:
//! - `marshal` - host buffers, numeric coercion, variadic argument cursor
//! - `store` - compiled-code handles
//! - `bridge` - shared namespace and the dispatch operations
//! - `errors` - structured errors and the status/payload protocol
//! - `bindings` - the exported C entry points
//! - `infrastructure` - configuration and logging
//!
//! Calls must come from one thread at a time and must not re-enter the
//! bridge; this is the host's calling contract, not something the library
//! arbitrates.

pub mod bindings;
pub mod bridge;
pub mod errors;
pub mod infrastructure;
pub mod marshal;
pub mod store;

// Re-export commonly used items
pub use bridge::{complete, with_global, ArgMode, Bridge, CompileMode, CompileOptions, Namespace, Reply};
pub use errors::{report::propagate, BridgeError, ErrorKind, Status};
pub use infrastructure::{init_logging, Config, LogConfig};
pub use marshal::{coerce, decode, deliver, render, ArgCursor, ArgSource, Coerced, GtmString, OutputSlot, SliceArgs};
pub use store::{CompilationStore, Handle};

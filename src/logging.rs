//! Library-level logging shim.
//!
//! With the `logging` feature enabled, the names below are the `tracing`
//! macros themselves; without it, they alias one no-op macro and every log
//! statement in the library compiles to nothing.

#[cfg(feature = "logging")]
pub(crate) use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "logging"))]
macro_rules! noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
pub(crate) use noop as trace;

#[cfg(not(feature = "logging"))]
pub(crate) use noop as debug;

#[cfg(not(feature = "logging"))]
pub(crate) use noop as info;

#[cfg(not(feature = "logging"))]
pub(crate) use noop as warn;

#[cfg(not(feature = "logging"))]
pub(crate) use noop as error;

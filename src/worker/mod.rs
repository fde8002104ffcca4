//! Intercept-worker core.
//!
//! The worker runs detached from any page: it installs itself by populating
//! a fresh cache generation with the application shell, activates by pruning
//! stale generations, and classifies incoming requests into the policies
//! that decide whether they are intercepted, served from cache, or forwarded
//! to the network. Share submissions are persisted straight into the durable
//! store and never reach the network.
//!
//! Every decision here is a function of the request and persisted state;
//! nothing depends on mutable in-memory worker globals, so behavior survives
//! worker eviction and restart.

mod error;
mod fetch;
mod lifecycle;
mod share;

pub use error::WorkerError;
pub use fetch::{classify, FetchClass, FetchPolicy, InterceptConfig};
pub use lifecycle::{InterceptWorker, WorkerState};
pub use share::{review_redirect, store_shared, ShareOutcome, SharedPart};

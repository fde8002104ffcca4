//! Upload progress observation and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Observer of per-file upload progress.
///
/// `on_progress` is invoked with monotonically non-decreasing byte counts;
/// implementations drive progress bars or logs. All methods default to
/// no-ops so sinks implement only what they need.
pub trait ProgressSink: Send + Sync {
    /// An upload attempt for `id` began.
    fn on_file_started(&self, _id: u64, _name: &str) {}

    /// `sent` of `total` payload bytes have been handed to the transport.
    fn on_progress(&self, _id: u64, _sent: u64, _total: u64) {}

    /// The attempt finished; `success` means a confirmed 2xx response.
    fn on_file_finished(&self, _id: u64, _success: bool) {}
}

/// A sink that ignores all progress events.
pub struct NullSink;

impl ProgressSink for NullSink {}

/// Shared cancellation flag checked at chunk boundaries.
///
/// Cancelling aborts the in-flight transfer only; the queued record is left
/// untouched for a later attempt. There is no timeout-based
/// auto-cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the transfer observing this flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_flag_is_shared_across_clones() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
    }
}

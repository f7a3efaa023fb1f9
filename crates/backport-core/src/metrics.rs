//! Global atomic counters for bot observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a daemon tick).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters; no allocations, no locking.
pub struct Metrics {
    polls_completed: AtomicU64,
    comments_posted: AtomicU64,
    comments_updated: AtomicU64,
    pushes: AtomicU64,
    transient_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            polls_completed: AtomicU64::new(0),
            comments_posted: AtomicU64::new(0),
            comments_updated: AtomicU64::new(0),
            pushes: AtomicU64::new(0),
            transient_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_polls(&self) {
        self.polls_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "polls_completed", "counter incremented");
    }

    pub fn inc_comments_posted(&self) {
        self.comments_posted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "comments_posted", "counter incremented");
    }

    pub fn inc_comments_updated(&self) {
        self.comments_updated.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "comments_updated", "counter incremented");
    }

    pub fn inc_pushes(&self) {
        self.pushes.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "pushes", "counter incremented");
    }

    pub fn inc_transient_failures(&self) {
        self.transient_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "transient_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a daemon tick, CLI exit)
    /// rather than on every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            polls_completed = self.polls_completed(),
            comments_posted = self.comments_posted(),
            comments_updated = self.comments_updated(),
            pushes = self.pushes(),
            transient_failures = self.transient_failures(),
        );
    }

    pub fn polls_completed(&self) -> u64 {
        self.polls_completed.load(Ordering::Relaxed)
    }

    pub fn comments_posted(&self) -> u64 {
        self.comments_posted.load(Ordering::Relaxed)
    }

    pub fn comments_updated(&self) -> u64 {
        self.comments_updated.load(Ordering::Relaxed)
    }

    pub fn pushes(&self) -> u64 {
        self.pushes.load(Ordering::Relaxed)
    }

    pub fn transient_failures(&self) -> u64 {
        self.transient_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.polls_completed.store(0, Ordering::Relaxed);
        self.comments_posted.store(0, Ordering::Relaxed);
        self.comments_updated.store(0, Ordering::Relaxed);
        self.pushes.store(0, Ordering::Relaxed);
        self.transient_failures.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.polls_completed(), 0);
        m.inc_polls();
        m.inc_polls();
        assert_eq!(m.polls_completed(), 2);

        m.inc_comments_posted();
        m.inc_comments_updated();
        m.inc_pushes();
        m.inc_transient_failures();
        m.inc_transient_failures();
        assert_eq!(m.comments_posted(), 1);
        assert_eq!(m.comments_updated(), 1);
        assert_eq!(m.pushes(), 1);
        assert_eq!(m.transient_failures(), 2);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_polls();
        m.inc_comments_posted();
        m.inc_pushes();
        m.reset();
        assert_eq!(m.polls_completed(), 0);
        assert_eq!(m.comments_posted(), 0);
        assert_eq!(m.pushes(), 0);
    }
}

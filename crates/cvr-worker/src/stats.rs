// SPDX-License-Identifier: MIT OR Apache-2.0
//! Atomic counters exposed by a running [`WorkerPool`](crate::WorkerPool).

use std::sync::atomic::{AtomicU64, Ordering};

/// Live, atomically-updated counters for a worker pool.
#[derive(Debug, Default)]
pub struct WorkerPoolStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    in_progress_collapses: AtomicU64,
    queue_full_rejections: AtomicU64,
    completed_resolutions: AtomicU64,
    dropped_completion_events: AtomicU64,
}

impl WorkerPoolStats {
    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_in_progress_collapse(&self) {
        self.in_progress_collapses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_queue_full(&self) {
        self.queue_full_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completed_resolution(&self) {
        self.completed_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_completion_event(&self) {
        self.dropped_completion_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Take an immutable snapshot of the current counter values.
    pub fn snapshot(&self) -> WorkerPoolStatsSnapshot {
        WorkerPoolStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            in_progress_collapses: self.in_progress_collapses.load(Ordering::Relaxed),
            queue_full_rejections: self.queue_full_rejections.load(Ordering::Relaxed),
            completed_resolutions: self.completed_resolutions.load(Ordering::Relaxed),
            dropped_completion_events: self.dropped_completion_events.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`WorkerPoolStats`], safe to log or serialise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct WorkerPoolStatsSnapshot {
    /// Cache reads that found a live entry.
    pub cache_hits: u64,
    /// Cache reads that found nothing (or an evicted entry).
    pub cache_misses: u64,
    /// Calls that found a resolution already running for their key.
    pub in_progress_collapses: u64,
    /// Calls rejected because the work queue was saturated.
    pub queue_full_rejections: u64,
    /// Worker-completed resolutions, successes and failures alike.
    pub completed_resolutions: u64,
    /// Completion events dropped because no reader was ready.
    pub dropped_completion_events: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_counters() {
        let stats = WorkerPoolStats::default();
        stats.record_cache_hit();
        stats.record_cache_hit();
        stats.record_queue_full();

        let snap = stats.snapshot();
        assert_eq!(snap.cache_hits, 2);
        assert_eq!(snap.queue_full_rejections, 1);
        assert_eq!(snap.cache_misses, 0);
    }
}

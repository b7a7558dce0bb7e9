//! Metrics registry for folio
//!
//! Counters only, monotonic, reset on process start.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters for one open store.
///
/// All counters use Relaxed ordering; they are diagnostics, not
/// synchronization.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    records_created: AtomicU64,
    records_updated: AtomicU64,
    records_deleted: AtomicU64,
    index_rebuilds: AtomicU64,
    index_rebuild_failures: AtomicU64,
    indexed_lookups: AtomicU64,
    scan_lookups: AtomicU64,
}

impl MetricsRegistry {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_records_created(&self) {
        self.records_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_updated(&self) {
        self.records_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_deleted(&self) {
        self.records_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_index_rebuilds(&self) {
        self.index_rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_index_rebuild_failures(&self) {
        self.index_rebuild_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_indexed_lookups(&self) {
        self.indexed_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_scan_lookups(&self) {
        self.scan_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_created: self.records_created.load(Ordering::Relaxed),
            records_updated: self.records_updated.load(Ordering::Relaxed),
            records_deleted: self.records_deleted.load(Ordering::Relaxed),
            index_rebuilds: self.index_rebuilds.load(Ordering::Relaxed),
            index_rebuild_failures: self.index_rebuild_failures.load(Ordering::Relaxed),
            indexed_lookups: self.indexed_lookups.load(Ordering::Relaxed),
            scan_lookups: self.scan_lookups.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub records_created: u64,
    pub records_updated: u64,
    pub records_deleted: u64,
    pub index_rebuilds: u64,
    pub index_rebuild_failures: u64,
    pub indexed_lookups: u64,
    pub scan_lookups: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_increment() {
        let metrics = MetricsRegistry::new();
        metrics.increment_records_created();
        metrics.increment_records_created();
        metrics.increment_index_rebuild_failures();

        let snap = metrics.snapshot();
        assert_eq!(snap.records_created, 2);
        assert_eq!(snap.index_rebuild_failures, 1);
        assert_eq!(snap.records_deleted, 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let metrics = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..250 {
                        m.increment_scan_lookups();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(metrics.snapshot().scan_lookups, 1000);
    }
}

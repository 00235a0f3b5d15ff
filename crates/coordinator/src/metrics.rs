use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking reservation and drain outcomes.
///
/// All counters use relaxed ordering; call [`snapshot`](Self::snapshot)
/// for a consistent point-in-time view.
#[derive(Debug, Default)]
pub struct CoordinatorMetrics {
    /// Reservations that returned `Success` or `WaitingForNodeDrain`.
    pub reservations_granted: AtomicU64,
    /// Releases that completed successfully.
    pub releases: AtomicU64,
    /// Node drains kicked off in the background.
    pub drains_started: AtomicU64,
    /// Node drains that finished successfully.
    pub drains_completed: AtomicU64,
    /// Node drains that did not complete.
    pub drains_failed: AtomicU64,
}

impl CoordinatorMetrics {
    pub fn increment_reservations_granted(&self) {
        self.reservations_granted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_releases(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_drains_started(&self) {
        self.drains_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_drains_completed(&self) {
        self.drains_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_drains_failed(&self) {
        self.drains_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a consistent point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reservations_granted: self.reservations_granted.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            drains_started: self.drains_started.load(Ordering::Relaxed),
            drains_completed: self.drains_completed.load(Ordering::Relaxed),
            drains_failed: self.drains_failed.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`CoordinatorMetrics`] at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub reservations_granted: u64,
    pub releases: u64,
    pub drains_started: u64,
    pub drains_completed: u64,
    pub drains_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = CoordinatorMetrics::default();
        assert_eq!(m.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn increment_and_snapshot() {
        let m = CoordinatorMetrics::default();
        m.increment_reservations_granted();
        m.increment_reservations_granted();
        m.increment_releases();
        m.increment_drains_started();
        m.increment_drains_completed();
        m.increment_drains_failed();

        let snap = m.snapshot();
        assert_eq!(snap.reservations_granted, 2);
        assert_eq!(snap.releases, 1);
        assert_eq!(snap.drains_started, 1);
        assert_eq!(snap.drains_completed, 1);
        assert_eq!(snap.drains_failed, 1);
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Live counters for one session.
#[derive(Debug, Default)]
pub(crate) struct PreloadStats {
    claimed: AtomicUsize,
    duplicates: AtomicUsize,
    batches: AtomicUsize,
    cached: AtomicUsize,
    fetch_failures: AtomicUsize,
    store_failures: AtomicUsize,
    decode_failures: AtomicUsize,
    timeouts: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Point-in-time copy of a session's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// URLs claimed for preloading.
    pub claimed: usize,
    /// `preload` calls that found the URL already claimed.
    pub duplicates: usize,
    /// Batches dispatched by the scheduler.
    pub batches: usize,
    /// Entries written to the store.
    pub cached: usize,
    /// Cache fetches that failed (network or non-2xx).
    pub fetch_failures: usize,
    /// Store writes that failed.
    pub store_failures: usize,
    /// Image loads that failed to fetch or decode.
    pub decode_failures: usize,
    /// Preloads abandoned by the timeout.
    pub timeouts: usize,
    /// Preloads claimed but not yet settled.
    pub in_flight: usize,
    /// Highest `in_flight` value observed.
    pub peak_in_flight: usize,
}

/// Decrements the in-flight gauge when dropped.
pub(crate) struct InFlight<'a>(&'a PreloadStats);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl PreloadStats {
    pub(crate) fn enter(&self) -> InFlight<'_> {
        self.claimed.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::AcqRel);
        InFlight(self)
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_batch(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cached(&self) {
        self.cached.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            claimed: self.claimed.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            cached: self.cached.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Acquire),
            peak_in_flight: self.peak_in_flight.load(Ordering::Acquire),
        }
    }
}

//! Optional metrics instrumentation for fieldwork.
//!
//! When the `observe` feature is enabled, batch commits and listener activity
//! emit counters, histograms and gauges via the [`metrics`] crate. The host
//! application installs a recorder to collect them.
//!
//! Without the feature every function here is a zero-cost no-op.

/// Record a chunked batch run.
///
/// - `fieldwork.batch.runs_total` – counter with `outcome` label
/// - `fieldwork.batch.partitions_total` – counter
/// - `fieldwork.batch.duration_seconds` – histogram
#[inline]
pub fn record_batch(duration: std::time::Duration, partitions: usize, success: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!("fieldwork.batch.runs_total", "outcome" => outcome).increment(1);
        metrics::counter!("fieldwork.batch.partitions_total").increment(partitions as u64);
        metrics::histogram!("fieldwork.batch.duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, partitions, success);
    }
}

/// Record a snapshot applied to a projection slice.
///
/// - `fieldwork.listeners.snapshots_total` – counter with `category` label
#[inline]
pub fn record_snapshot(category: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("fieldwork.listeners.snapshots_total", "category" => category)
            .increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = category;
    }
}

/// Record a snapshot discarded because its subscription was already torn down.
///
/// - `fieldwork.listeners.stale_snapshots_total` – counter with `category` label
#[inline]
pub fn record_stale_snapshot(category: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("fieldwork.listeners.stale_snapshots_total", "category" => category)
            .increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = category;
    }
}

/// Set the number of live store subscriptions.
///
/// - `fieldwork.listeners.live` – gauge
#[inline]
pub fn set_live_subscriptions(count: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::gauge!("fieldwork.listeners.live").set(count as f64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = count;
    }
}

//! Prometheus metrics for core components.
//!
//! Counters and histograms for the two job runners; the server crate
//! registers them into its registry for the `/metrics` endpoint.

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Transfer Metrics
// =============================================================================

/// Transfers accepted by the supervisor.
pub static TRANSFERS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediaforge_transfers_started_total",
        "Total transfer jobs accepted",
    )
    .unwrap()
});

/// Transfer outcomes by result.
pub static TRANSFERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediaforge_transfers_total",
            "Total transfer jobs finished",
        ),
        &["result"], // "complete", "failed"
    )
    .unwrap()
});

/// Transfer duration in seconds.
pub static TRANSFER_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "mediaforge_transfer_duration_seconds",
            "Duration of completed transfers",
        )
        .buckets(vec![
            30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0, 14400.0,
        ]),
    )
    .unwrap()
});

// =============================================================================
// Transcode Metrics
// =============================================================================

/// Conversions accepted by the supervisor.
pub static TRANSCODES_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediaforge_transcodes_started_total",
        "Total conversion jobs accepted",
    )
    .unwrap()
});

/// Conversion outcomes by result.
pub static TRANSCODES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediaforge_transcodes_total",
            "Total conversion jobs finished",
        ),
        &["result"], // "complete", "failed"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static TRANSCODE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "mediaforge_transcode_duration_seconds",
            "Duration of completed conversions",
        )
        .buckets(vec![
            1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0,
        ]),
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TRANSFERS_STARTED.clone()),
        Box::new(TRANSFERS_TOTAL.clone()),
        Box::new(TRANSFER_DURATION.clone()),
        Box::new(TRANSCODES_STARTED.clone()),
        Box::new(TRANSCODES_TOTAL.clone()),
        Box::new(TRANSCODE_DURATION.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
    }
}

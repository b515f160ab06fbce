//! Prometheus metrics for the stash server.
//!
//! Exposes counters for cache traffic and the failure modes worth
//! alerting on. `stash_checksum_mismatches_total` in particular tracks
//! entries whose chunks were all present but disagreed with the recorded
//! checksum - expected to stay at zero.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static FILES_CACHED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "stash_files_cached_total",
        "Total number of files successfully cached",
    )
    .expect("metric creation failed")
});

pub static FILES_SERVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "stash_files_served_total",
        "Total number of files successfully served",
    )
    .expect("metric creation failed")
});

pub static FILES_NOT_FOUND: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "stash_files_not_found_total",
        "Total number of download requests for absent or evicted entries",
    )
    .expect("metric creation failed")
});

pub static CHECKSUM_MISMATCHES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "stash_checksum_mismatches_total",
        "Total number of reads that found all chunks but a mismatched checksum",
    )
    .expect("metric creation failed")
});

pub static BYTES_CACHED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("stash_bytes_cached_total", "Total bytes written into the cache")
        .expect("metric creation failed")
});

pub static BYTES_SERVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("stash_bytes_served_total", "Total bytes served from the cache")
        .expect("metric creation failed")
});

pub static UPLOAD_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "stash_upload_duration_seconds",
            "Time taken to stage and cache an uploaded file",
        )
        .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
    )
    .expect("metric creation failed")
});

pub static DOWNLOAD_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "stash_download_duration_seconds",
            "Time taken to reassemble and serve a file",
        )
        .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
    )
    .expect("metric creation failed")
});

static INIT: Once = Once::new();

/// Register all metrics with the global registry. Idempotent.
pub fn register_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(FILES_CACHED.clone()))
            .expect("failed to register stash_files_cached_total");
        REGISTRY
            .register(Box::new(FILES_SERVED.clone()))
            .expect("failed to register stash_files_served_total");
        REGISTRY
            .register(Box::new(FILES_NOT_FOUND.clone()))
            .expect("failed to register stash_files_not_found_total");
        REGISTRY
            .register(Box::new(CHECKSUM_MISMATCHES.clone()))
            .expect("failed to register stash_checksum_mismatches_total");
        REGISTRY
            .register(Box::new(BYTES_CACHED.clone()))
            .expect("failed to register stash_bytes_cached_total");
        REGISTRY
            .register(Box::new(BYTES_SERVED.clone()))
            .expect("failed to register stash_bytes_served_total");
        REGISTRY
            .register(Box::new(UPLOAD_DURATION.clone()))
            .expect("failed to register stash_upload_duration_seconds");
        REGISTRY
            .register(Box::new(DOWNLOAD_DURATION.clone()))
            .expect("failed to register stash_download_duration_seconds");
    });
}

/// GET /metrics - Prometheus text exposition.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (StatusCode::OK, buffer).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "encoding error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_is_idempotent() {
        register_metrics();
        register_metrics();
        FILES_CACHED.inc();
        assert!(FILES_CACHED.get() >= 1);
    }
}

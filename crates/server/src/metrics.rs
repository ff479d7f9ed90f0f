//! Prometheus metrics for the Trove server.
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! Metrics carry operation names and outcomes only, never asset ids or keys.
//! The endpoint should still be network-restricted to scrapers.

use crate::error::ApiResult;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::future::Future;
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static METADATA_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "trove_metadata_requests_total",
            "Total metadata requests by operation and outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("metric creation failed")
});

pub static METADATA_REDIRECTS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "trove_metadata_redirects_total",
        "Total single-key reads answered with a redirect to the referenced asset",
    )
    .expect("metric creation failed")
});

pub static METADATA_ROWS_WRITTEN: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "trove_metadata_rows_written_total",
        "Total metadata entries inserted or replaced",
    )
    .expect("metric creation failed")
});

pub static METADATA_ROWS_DELETED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "trove_metadata_rows_deleted_total",
        "Total metadata entries removed by delete operations",
    )
    .expect("metric creation failed")
});

pub static METADATA_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "trove_metadata_request_duration_seconds",
            "Time taken to serve a metadata request",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["operation"],
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(METADATA_REQUESTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(METADATA_REDIRECTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(METADATA_ROWS_WRITTEN.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(METADATA_ROWS_DELETED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(METADATA_REQUEST_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// Time a handler and count its outcome (`ok` or the error code).
pub async fn observe<F>(operation: &'static str, fut: F) -> ApiResult<Response>
where
    F: Future<Output = ApiResult<Response>>,
{
    let timer = METADATA_REQUEST_DURATION
        .with_label_values(&[operation])
        .start_timer();
    let result = fut.await;
    timer.observe_duration();

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.code(),
    };
    METADATA_REQUESTS
        .with_label_values(&[operation, outcome])
        .inc();
    result
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

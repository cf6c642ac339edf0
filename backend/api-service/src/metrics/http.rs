//! HTTP request collectors

use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};
use std::time::Duration;

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register http_requests_total")
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latency by method and route",
        &["method", "route"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("failed to register http_request_duration_seconds")
});

/// Record one finished request. `route` is the matched pattern, not the raw path.
pub fn record_request(method: &str, route: &str, status: u16, elapsed: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, route, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, route])
        .observe(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request_increments_counter() {
        let before = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test/record", "200"])
            .get();
        record_request("GET", "/test/record", 200, Duration::from_millis(12));
        let after = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test/record", "200"])
            .get();
        assert_eq!(after, before + 1);
    }
}

//! Client metrics definitions
//!
//! OpenTelemetry instruments recorded by the client codec when observability
//! is enabled via `ClientBuilder::with_observability()`:
//!
//! - **calls_total**: calls issued, by method and outcome (counter)
//! - **call_duration**: publish-to-resolution latency in seconds (histogram)
//! - **errors_total**: transport and decode failures, by kind (counter)
//! - **replies_discarded**: replies without a matching pending call (counter)
//! - **in_flight**: calls currently awaiting a reply (gauge)

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};

/// Client-side metrics for monitoring.
pub struct ClientMetrics {
    /// Total calls issued
    pub calls_total: Counter<u64>,
    /// Call duration in seconds, from publish to resolution
    pub call_duration: Histogram<f64>,
    /// Total errors, by kind
    pub errors_total: Counter<u64>,
    /// Replies that matched no pending call (timed out or duplicate)
    pub replies_discarded: Counter<u64>,
    /// Calls currently in flight
    pub in_flight: Gauge<i64>,
}

impl ClientMetrics {
    /// Create metrics bound to the globally registered meter provider.
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics from a specific meter.
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            calls_total: meter
                .u64_counter("jroq.client.calls.total")
                .with_description("Total number of calls issued")
                .build(),
            call_duration: meter
                .f64_histogram("jroq.client.call.duration")
                .with_description("Call duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("jroq.client.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
            replies_discarded: meter
                .u64_counter("jroq.client.replies.discarded")
                .with_description("Replies without a matching pending call")
                .build(),
            in_flight: meter
                .i64_gauge("jroq.client.calls.in_flight")
                .with_description("Calls currently awaiting a reply")
                .build(),
        }
    }

    /// Record a completed call.
    pub fn record_call(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.calls_total.add(1, attributes);
        self.call_duration.record(duration_secs, attributes);
    }

    /// Record an error by kind.
    pub fn record_error(&self, error_kind: &str) {
        let attributes = &[KeyValue::new("kind", error_kind.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record a reply discarded by the dispatcher.
    pub fn record_discarded_reply(&self) {
        self.replies_discarded.add(1, &[]);
    }

    /// Record the current in-flight call count.
    pub fn record_in_flight(&self, count: i64) {
        self.in_flight.record(count, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ClientMetrics::new("test-client");

        metrics.record_call("Test.Mul", "success", 0.05);
        metrics.record_call("Test.Divide", "error", 0.01);
        metrics.record_error("publish");
        metrics.record_discarded_reply();
        metrics.record_in_flight(3);
    }
}

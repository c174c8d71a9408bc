//! Server metrics definitions
//!
//! OpenTelemetry instruments recorded by the server codec when observability
//! is enabled via `ServerBuilder::with_observability()`:
//!
//! - **calls_dispatched**: calls handled, by method and outcome (counter)
//! - **dispatch_duration**: decode-to-reply latency in seconds (histogram)
//! - **envelopes_discarded**: undecodable or unroutable deliveries (counter)
//! - **workers_busy**: dispatch workers currently running (gauge)

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};

/// Server-side metrics for monitoring.
pub struct ServerMetrics {
    /// Total calls dispatched
    pub calls_dispatched: Counter<u64>,
    /// Dispatch duration in seconds, from decode to reply publish
    pub dispatch_duration: Histogram<f64>,
    /// Deliveries discarded before dispatch
    pub envelopes_discarded: Counter<u64>,
    /// Dispatch workers currently busy
    pub workers_busy: Gauge<i64>,
}

impl ServerMetrics {
    /// Create metrics bound to the globally registered meter provider.
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics from a specific meter.
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            calls_dispatched: meter
                .u64_counter("jroq.server.calls.dispatched")
                .with_description("Total number of calls dispatched")
                .build(),
            dispatch_duration: meter
                .f64_histogram("jroq.server.dispatch.duration")
                .with_description("Dispatch duration in seconds")
                .build(),
            envelopes_discarded: meter
                .u64_counter("jroq.server.envelopes.discarded")
                .with_description("Deliveries discarded before dispatch")
                .build(),
            workers_busy: meter
                .i64_gauge("jroq.server.workers.busy")
                .with_description("Dispatch workers currently busy")
                .build(),
        }
    }

    /// Record a dispatched call.
    pub fn record_dispatch(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.calls_dispatched.add(1, attributes);
        self.dispatch_duration.record(duration_secs, attributes);
    }

    /// Record a delivery discarded before dispatch.
    pub fn record_discarded(&self, reason: &str) {
        let attributes = &[KeyValue::new("reason", reason.to_string())];
        self.envelopes_discarded.add(1, attributes);
    }

    /// Record the current busy worker count.
    pub fn record_workers_busy(&self, count: i64) {
        self.workers_busy.record(count, &[]);
    }
}

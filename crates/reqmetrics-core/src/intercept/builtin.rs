//! Built-in interceptors. Each one records into exactly one metric.
//!
//! Per-request observations (CPU, memory, response time, request count) are
//! recorded on `Outcome::Completed` only. The throughput gauge is the one
//! metric that must also settle on abort.

use std::time::Instant;

use crate::metric::{Counter, Gauge, Histogram};
use crate::process::{self, CpuTime};

use super::{Interceptor, Outcome, RequestAttrs};

fn method_path(req: &RequestAttrs) -> [(&'static str, &str); 2] {
    [("method", req.method.as_str()), ("path", req.path.as_str())]
}

/// Process CPU time consumed during the request's wall-clock window, in
/// microseconds.
///
/// This is process-wide CPU, not CPU caused by this request alone: with
/// overlapping requests each one is charged for the others' work too, so
/// the counter over-counts under concurrency.
pub struct CpuTimeInterceptor {
    counter: Counter,
}

impl CpuTimeInterceptor {
    pub fn new(counter: Counter) -> Self {
        Self { counter }
    }
}

impl Interceptor for CpuTimeInterceptor {
    type State = CpuTime;

    fn name(&self) -> &'static str {
        "cpu_time"
    }

    fn on_enter(&self, _req: &RequestAttrs) -> CpuTime {
        process::cpu_time()
    }

    fn on_finish(&self, req: &RequestAttrs, outcome: &Outcome, start: CpuTime) {
        if let Outcome::Completed { .. } = outcome {
            let used = process::cpu_time().since(&start);
            let _ = self.counter.inc(&method_path(req), used.as_micros() as f64);
        }
    }
}

/// Adds the resident memory size read at request start (not a delta).
///
/// A coarse footprint proxy kept for compatibility with existing
/// dashboards; it does not measure per-request allocation.
pub struct MemoryInterceptor {
    counter: Counter,
}

impl MemoryInterceptor {
    pub fn new(counter: Counter) -> Self {
        Self { counter }
    }
}

impl Interceptor for MemoryInterceptor {
    type State = u64;

    fn name(&self) -> &'static str {
        "memory"
    }

    fn on_enter(&self, _req: &RequestAttrs) -> u64 {
        process::resident_memory_bytes()
    }

    fn on_finish(&self, req: &RequestAttrs, outcome: &Outcome, rss_at_start: u64) {
        if let Outcome::Completed { .. } = outcome {
            let _ = self.counter.inc(&method_path(req), rss_at_start as f64);
        }
    }
}

/// Wall-clock seconds from enter to completion.
pub struct ResponseTimeInterceptor {
    histogram: Histogram,
}

impl ResponseTimeInterceptor {
    pub fn new(histogram: Histogram) -> Self {
        Self { histogram }
    }
}

impl Interceptor for ResponseTimeInterceptor {
    type State = Instant;

    fn name(&self) -> &'static str {
        "response_time"
    }

    fn on_enter(&self, _req: &RequestAttrs) -> Instant {
        Instant::now()
    }

    fn on_finish(&self, req: &RequestAttrs, outcome: &Outcome, start: Instant) {
        if let Outcome::Completed { .. } = outcome {
            let _ = self
                .histogram
                .observe(&method_path(req), start.elapsed().as_secs_f64());
        }
    }
}

/// Wall-clock seconds for requests that matched a route, keyed by the
/// route template and final status. Unmatched requests are skipped.
pub struct RouteResponseTimeInterceptor {
    histogram: Histogram,
}

impl RouteResponseTimeInterceptor {
    pub fn new(histogram: Histogram) -> Self {
        Self { histogram }
    }
}

impl Interceptor for RouteResponseTimeInterceptor {
    type State = Instant;

    fn name(&self) -> &'static str {
        "route_response_time"
    }

    fn on_enter(&self, _req: &RequestAttrs) -> Instant {
        Instant::now()
    }

    fn on_finish(&self, req: &RequestAttrs, outcome: &Outcome, start: Instant) {
        let (Outcome::Completed { status }, Some(route)) = (outcome, req.route.as_deref()) else {
            return;
        };
        let status = status.to_string();
        let _ = self.histogram.observe(
            &[
                ("method", req.method.as_str()),
                ("route", route),
                ("status_code", status.as_str()),
            ],
            start.elapsed().as_secs_f64(),
        );
    }
}

/// Completed requests by method, path and final status.
pub struct RequestCountInterceptor {
    counter: Counter,
}

impl RequestCountInterceptor {
    pub fn new(counter: Counter) -> Self {
        Self { counter }
    }
}

impl Interceptor for RequestCountInterceptor {
    type State = ();

    fn name(&self) -> &'static str {
        "request_count"
    }

    fn on_enter(&self, _req: &RequestAttrs) {}

    fn on_finish(&self, req: &RequestAttrs, outcome: &Outcome, _state: ()) {
        if let Outcome::Completed { status } = outcome {
            let status = status.to_string();
            let _ = self.counter.inc(
                &[
                    ("method", req.method.as_str()),
                    ("path", req.path.as_str()),
                    ("status_code", status.as_str()),
                ],
                1.0,
            );
        }
    }
}

/// Bytes read from the connection so far. Last writer wins per label set.
pub struct RequestSizeInterceptor {
    gauge: Gauge,
}

impl RequestSizeInterceptor {
    pub fn new(gauge: Gauge) -> Self {
        Self { gauge }
    }
}

impl Interceptor for RequestSizeInterceptor {
    type State = ();

    fn name(&self) -> &'static str {
        "request_size"
    }

    fn on_enter(&self, req: &RequestAttrs) {
        let _ = self.gauge.set(&method_path(req), req.bytes_read as f64);
    }

    fn on_finish(&self, _req: &RequestAttrs, _outcome: &Outcome, _state: ()) {}
}

/// Declared `content-length` (0 when absent).
pub struct PayloadSizeInterceptor {
    gauge: Gauge,
}

impl PayloadSizeInterceptor {
    pub fn new(gauge: Gauge) -> Self {
        Self { gauge }
    }
}

impl Interceptor for PayloadSizeInterceptor {
    type State = ();

    fn name(&self) -> &'static str {
        "payload_size"
    }

    fn on_enter(&self, req: &RequestAttrs) {
        let _ = self.gauge.set(&method_path(req), req.content_length() as f64);
    }

    fn on_finish(&self, _req: &RequestAttrs, _outcome: &Outcome, _state: ()) {}
}

/// Requests entering the chain, by method and path.
pub struct RequestRateInterceptor {
    counter: Counter,
}

impl RequestRateInterceptor {
    pub fn new(counter: Counter) -> Self {
        Self { counter }
    }
}

impl Interceptor for RequestRateInterceptor {
    type State = ();

    fn name(&self) -> &'static str {
        "request_rate"
    }

    fn on_enter(&self, req: &RequestAttrs) {
        let _ = self.counter.inc(&method_path(req), 1.0);
    }

    fn on_finish(&self, _req: &RequestAttrs, _outcome: &Outcome, _state: ()) {}
}

/// In-flight requests. Incremented on enter, decremented exactly once on
/// completion or abort.
pub struct ThroughputInterceptor {
    gauge: Gauge,
}

impl ThroughputInterceptor {
    pub fn new(gauge: Gauge) -> Self {
        Self { gauge }
    }
}

impl Interceptor for ThroughputInterceptor {
    type State = ();

    fn name(&self) -> &'static str {
        "throughput"
    }

    fn on_enter(&self, _req: &RequestAttrs) {
        let _ = self.gauge.inc(&[], 1.0);
    }

    fn on_finish(&self, _req: &RequestAttrs, _outcome: &Outcome, _state: ()) {
        let _ = self.gauge.dec(&[], 1.0);
    }
}

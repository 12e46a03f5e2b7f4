//! The standard HTTP metric set and the chain built from it.
//!
//! Metric names and label sets are fixed: existing scrape configs and
//! dashboards depend on them.

use crate::error::Result;
use crate::metric::{Buckets, Counter, Gauge, Histogram};
use crate::registry::Registry;

use super::builtin::{
    CpuTimeInterceptor, MemoryInterceptor, PayloadSizeInterceptor, RequestCountInterceptor,
    RequestRateInterceptor, RequestSizeInterceptor, ResponseTimeInterceptor,
    RouteResponseTimeInterceptor, ThroughputInterceptor,
};
use super::chain::Chain;

pub const NODE_CPU_USAGE: &str = "node_cpu_usage";
pub const NODE_MEMORY_USAGE: &str = "node_memory_usage";
pub const HTTP_RESPONSE_TIME_SECONDS: &str = "http_response_time_seconds";
pub const REST_RESPONSE_TIME_DURATION_SECONDS: &str = "rest_response_time_duration_seconds";
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_SIZE_BYTES: &str = "http_request_size_bytes";
pub const HTTP_REQUEST_PAYLOAD_BYTES: &str = "http_request_payload_bytes";
pub const HTTP_REQUEST_RATE: &str = "http_request_rate";
pub const HTTP_REQUEST_THROUGHPUT: &str = "http_request_throughput";

/// Which built-in interceptors go into the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterceptorToggles {
    pub cpu: bool,
    pub memory: bool,
    pub response_time: bool,
    pub route_response_time: bool,
    pub request_count: bool,
    pub request_size: bool,
    pub payload_size: bool,
    pub request_rate: bool,
    pub throughput: bool,
}

impl Default for InterceptorToggles {
    fn default() -> Self {
        Self {
            cpu: true,
            memory: true,
            response_time: true,
            route_response_time: true,
            request_count: true,
            request_size: true,
            payload_size: true,
            request_rate: true,
            throughput: true,
        }
    }
}

/// Handles for every request-scoped metric.
#[derive(Clone)]
pub struct StandardMetrics {
    pub cpu_usage: Counter,
    pub memory_usage: Counter,
    pub response_time: Histogram,
    pub route_response_time: Histogram,
    pub requests_total: Counter,
    pub request_size: Gauge,
    pub request_payload: Gauge,
    pub request_rate: Counter,
    pub request_throughput: Gauge,
}

impl StandardMetrics {
    /// Register all request-scoped families, whether or not their
    /// interceptor is enabled, so the exposed name set stays fixed.
    pub fn register(registry: &Registry, response_time_buckets: Buckets) -> Result<Self> {
        let mp = ["method", "path"];
        Ok(Self {
            cpu_usage: registry.counter(NODE_CPU_USAGE, "CPU usage per request", &mp)?,
            memory_usage: registry.counter(NODE_MEMORY_USAGE, "Memory usage per request", &mp)?,
            response_time: registry.histogram(
                HTTP_RESPONSE_TIME_SECONDS,
                "Duration of HTTP response time in seconds",
                response_time_buckets.clone(),
                &mp,
            )?,
            route_response_time: registry.histogram(
                REST_RESPONSE_TIME_DURATION_SECONDS,
                "REST API response time in seconds",
                response_time_buckets,
                &["method", "route", "status_code"],
            )?,
            requests_total: registry.counter(
                HTTP_REQUESTS_TOTAL,
                "Total number of HTTP requests",
                &["method", "path", "status_code"],
            )?,
            request_size: registry.gauge(
                HTTP_REQUEST_SIZE_BYTES,
                "Size of HTTP request in bytes",
                &mp,
            )?,
            request_payload: registry.gauge(
                HTTP_REQUEST_PAYLOAD_BYTES,
                "Size of HTTP request payload in bytes",
                &mp,
            )?,
            request_rate: registry.counter(
                HTTP_REQUEST_RATE,
                "Number of HTTP requests per second",
                &mp,
            )?,
            request_throughput: registry.gauge(
                HTTP_REQUEST_THROUGHPUT,
                "Number of concurrent HTTP requests",
                &[],
            )?,
        })
    }

    /// Build the chain in the canonical order, skipping disabled links.
    pub fn chain(&self, on: InterceptorToggles) -> Chain {
        let mut chain = Chain::new();
        if on.throughput {
            chain.push(ThroughputInterceptor::new(self.request_throughput.clone()));
        }
        if on.cpu {
            chain.push(CpuTimeInterceptor::new(self.cpu_usage.clone()));
        }
        if on.memory {
            chain.push(MemoryInterceptor::new(self.memory_usage.clone()));
        }
        if on.response_time {
            chain.push(ResponseTimeInterceptor::new(self.response_time.clone()));
        }
        if on.route_response_time {
            chain.push(RouteResponseTimeInterceptor::new(
                self.route_response_time.clone(),
            ));
        }
        if on.request_count {
            chain.push(RequestCountInterceptor::new(self.requests_total.clone()));
        }
        if on.request_size {
            chain.push(RequestSizeInterceptor::new(self.request_size.clone()));
        }
        if on.payload_size {
            chain.push(PayloadSizeInterceptor::new(self.request_payload.clone()));
        }
        if on.request_rate {
            chain.push(RequestRateInterceptor::new(self.request_rate.clone()));
        }
        chain
    }
}

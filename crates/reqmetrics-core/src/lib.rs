//! reqmetrics core: metric model, registry, exposition and request interceptors.
//!
//! This crate defines the metric data model (counters, gauges, histograms keyed
//! by label sets), the registry that owns them, the text exposition renderer,
//! the interceptor chain that turns request lifecycle events into observations,
//! and the process collector. It carries no transport or async runtime
//! dependencies so any host can drive it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Rejected observations surface as `MetricsError` and leave the series
//! untouched; a metrics failure never takes the instrumented request down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod expo;
pub mod intercept;
pub mod metric;
pub mod process;
pub mod registry;
pub mod snapshot;

/// Shared result type.
pub use error::{ErrorClass, MetricsError, Result};
pub use intercept::{Chain, Interceptor, Observation, Outcome, RequestAttrs};
pub use metric::{Buckets, Counter, Gauge, Histogram, MetricDescriptor, MetricKind};
pub use registry::{Metric, Registry, RegistryOptions};
pub use snapshot::RegistrySnapshot;

//! Metric primitives.
//!
//! - `Counter`: monotonic non-negative accumulator
//! - `Gauge`: arbitrary set/inc/dec value
//! - `Histogram`: cumulative buckets + count + sum
//!
//! Each handle is a cheap clone over a shared family; every operation is
//! atomic per series.

mod atomic;
mod counter;
pub mod descriptor;
pub(crate) mod family;
mod gauge;
mod histogram;
pub mod labels;

pub use counter::Counter;
pub use descriptor::{Buckets, MetricDescriptor, MetricKind, DEFAULT_BUCKETS};
pub use gauge::Gauge;
pub use histogram::Histogram;
pub use labels::{LabelSet, OVERFLOW_LABEL_VALUE};

pub(crate) use counter::CounterCell;
pub(crate) use gauge::GaugeCell;
pub(crate) use histogram::HistogramCell;

//! Metric registry.
//!
//! Construct once at startup, then share via `Arc` with every interceptor,
//! the renderer and the process sampler. Families are kept in registration
//! order so renders are stable.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{MetricsError, Result};
use crate::expo;
use crate::metric::family::Family;
use crate::metric::{
    Buckets, Counter, CounterCell, Gauge, GaugeCell, Histogram, HistogramCell, MetricDescriptor,
    MetricKind,
};
use crate::snapshot::RegistrySnapshot;

/// Registry-wide limits.
#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
    /// Distinct label sets per family before new ones fold into the
    /// overflow series. `None` is unbounded.
    pub max_series_per_metric: Option<usize>,
}

#[derive(Clone)]
enum FamilyRef {
    Counter(Arc<Family<CounterCell>>),
    Gauge(Arc<Family<GaugeCell>>),
    Histogram(Arc<Family<HistogramCell>>),
}

impl FamilyRef {
    fn descriptor(&self) -> &MetricDescriptor {
        match self {
            FamilyRef::Counter(f) => f.descriptor(),
            FamilyRef::Gauge(f) => f.descriptor(),
            FamilyRef::Histogram(f) => f.descriptor(),
        }
    }

    fn handle(&self) -> Metric {
        match self {
            FamilyRef::Counter(f) => Metric::Counter(Counter::from_family(Arc::clone(f))),
            FamilyRef::Gauge(f) => Metric::Gauge(Gauge::from_family(Arc::clone(f))),
            FamilyRef::Histogram(f) => Metric::Histogram(Histogram::from_family(Arc::clone(f))),
        }
    }
}

/// Handle returned by `Registry::register`.
#[derive(Clone)]
pub enum Metric {
    Counter(Counter),
    Gauge(Gauge),
    Histogram(Histogram),
}

impl Metric {
    fn kind_str(&self) -> &'static str {
        match self {
            Metric::Counter(_) => "counter",
            Metric::Gauge(_) => "gauge",
            Metric::Histogram(_) => "histogram",
        }
    }

    fn name(&self) -> &str {
        match self {
            Metric::Counter(m) => m.name(),
            Metric::Gauge(m) => m.name(),
            Metric::Histogram(m) => m.name(),
        }
    }

    fn mismatch(&self, expected: &'static str) -> MetricsError {
        MetricsError::KindMismatch {
            name: self.name().to_string(),
            expected,
            actual: self.kind_str(),
        }
    }

    pub fn into_counter(self) -> Result<Counter> {
        match self {
            Metric::Counter(c) => Ok(c),
            other => Err(other.mismatch("counter")),
        }
    }

    pub fn into_gauge(self) -> Result<Gauge> {
        match self {
            Metric::Gauge(g) => Ok(g),
            other => Err(other.mismatch("gauge")),
        }
    }

    pub fn into_histogram(self) -> Result<Histogram> {
        match self {
            Metric::Histogram(h) => Ok(h),
            other => Err(other.mismatch("histogram")),
        }
    }
}

#[derive(Default)]
pub struct Registry {
    opts: RegistryOptions,
    families: RwLock<Vec<FamilyRef>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(opts: RegistryOptions) -> Self {
        Self {
            opts,
            families: RwLock::new(Vec::new()),
        }
    }

    /// Register a family. Re-registering an identical shape returns the
    /// existing handle; a conflicting shape is a `DuplicateName` error.
    pub fn register(&self, desc: MetricDescriptor) -> Result<Metric> {
        desc.validate()?;

        let mut families = self.families.write();
        if let Some(existing) = families.iter().find(|f| f.descriptor().name == desc.name) {
            if existing.descriptor().same_shape(&desc) {
                return Ok(existing.handle());
            }
            return Err(MetricsError::DuplicateName { name: desc.name });
        }

        tracing::debug!(metric = %desc.name, kind = desc.kind.as_str(), labels = ?desc.label_names, "metric registered");
        let max = self.opts.max_series_per_metric;
        let family = match desc.kind {
            MetricKind::Counter => FamilyRef::Counter(Arc::new(Family::new(desc, max))),
            MetricKind::Gauge => FamilyRef::Gauge(Arc::new(Family::new(desc, max))),
            MetricKind::Histogram { .. } => FamilyRef::Histogram(Arc::new(Family::new(desc, max))),
        };
        let handle = family.handle();
        families.push(family);
        Ok(handle)
    }

    pub fn counter(&self, name: &str, help: &str, label_names: &[&str]) -> Result<Counter> {
        self.register(MetricDescriptor::counter(name, help, label_names))?
            .into_counter()
    }

    pub fn gauge(&self, name: &str, help: &str, label_names: &[&str]) -> Result<Gauge> {
        self.register(MetricDescriptor::gauge(name, help, label_names))?
            .into_gauge()
    }

    pub fn histogram(
        &self,
        name: &str,
        help: &str,
        buckets: Buckets,
        label_names: &[&str],
    ) -> Result<Histogram> {
        self.register(MetricDescriptor::histogram(name, help, buckets, label_names))?
            .into_histogram()
    }

    /// Registered family names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.families
            .read()
            .iter()
            .map(|f| f.descriptor().name.clone())
            .collect()
    }

    /// Copy every series. The family list lock is released before any
    /// series is read; each series is copied under its own synchronization.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let families: Vec<FamilyRef> = self.families.read().clone();
        RegistrySnapshot {
            families: families
                .iter()
                .map(|f| match f {
                    FamilyRef::Counter(f) => f.snapshot(),
                    FamilyRef::Gauge(f) => f.snapshot(),
                    FamilyRef::Histogram(f) => f.snapshot(),
                })
                .collect(),
        }
    }

    /// Snapshot and render in the text exposition format.
    pub fn render(&self) -> Result<String> {
        expo::render(&self.snapshot())
    }
}

//! Metric descriptors (name, help, kind, label names).
//!
//! Validation rules follow the Prometheus data model:
//! - metric names: `[a-zA-Z_:][a-zA-Z0-9_:]*`
//! - label names: `[a-zA-Z_][a-zA-Z0-9_]*`, no `__` prefix, unique
//! - `le` is reserved (histogram bucket label)

use std::sync::Arc;

use crate::error::{MetricsError, Result};

/// Default histogram buckets (seconds).
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Strictly increasing, finite histogram upper bounds. `+Inf` is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct Buckets(Arc<[f64]>);

impl Buckets {
    pub fn new(bounds: &[f64]) -> std::result::Result<Self, String> {
        if bounds.is_empty() {
            return Err("at least one bucket bound is required".into());
        }
        if let Some(b) = bounds.iter().find(|b| !b.is_finite()) {
            return Err(format!("bound {b} is not finite (+Inf is implicit)"));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err("bounds must be strictly increasing".into());
        }
        Ok(Self(bounds.into()))
    }

    pub fn bounds(&self) -> &[f64] {
        &self.0
    }
}

impl Default for Buckets {
    fn default() -> Self {
        Self(DEFAULT_BUCKETS.as_slice().into())
    }
}

/// Metric kind. Histogram buckets are part of the shape.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram { buckets: Buckets },
}

impl MetricKind {
    /// Type name as written on the `# TYPE` line.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram { .. } => "histogram",
        }
    }
}

/// Immutable description of one metric family.
#[derive(Debug, Clone)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_names: Vec<String>,
}

impl MetricDescriptor {
    pub fn new(name: &str, help: &str, kind: MetricKind, label_names: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            kind,
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn counter(name: &str, help: &str, label_names: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Counter, label_names)
    }

    pub fn gauge(name: &str, help: &str, label_names: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Gauge, label_names)
    }

    pub fn histogram(name: &str, help: &str, buckets: Buckets, label_names: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Histogram { buckets }, label_names)
    }

    /// Same kind (buckets included) and same ordered label names.
    pub fn same_shape(&self, other: &MetricDescriptor) -> bool {
        self.kind == other.kind && self.label_names == other.label_names
    }

    pub fn validate(&self) -> Result<()> {
        if !valid_metric_name(&self.name) {
            return Err(MetricsError::InvalidName(self.name.clone()));
        }
        for (i, label) in self.label_names.iter().enumerate() {
            let reserved = label == "le" && matches!(self.kind, MetricKind::Histogram { .. });
            let duplicate = self.label_names[..i].contains(label);
            if !valid_label_name(label) || reserved || duplicate {
                return Err(MetricsError::InvalidLabelName {
                    name: self.name.clone(),
                    label: label.clone(),
                });
            }
        }
        Ok(())
    }
}

fn valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn valid_label_name(label: &str) -> bool {
    if label.starts_with("__") {
        return false;
    }
    let mut chars = label.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

//! Point-in-time copies of registry state, consumed by the renderer.

use crate::metric::MetricKind;

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// Finite upper bounds; `+Inf` is implicit.
    pub bounds: Vec<f64>,
    /// Cumulative count per finite bound.
    pub cumulative: Vec<u64>,
    pub count: u64,
    pub sum: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Counter(f64),
    Gauge(f64),
    Histogram(HistogramSnapshot),
}

#[derive(Debug, Clone)]
pub struct SeriesSnapshot {
    /// Values aligned with the family's `label_names`.
    pub labels: Vec<String>,
    pub value: SeriesValue,
}

#[derive(Debug, Clone)]
pub struct FamilySnapshot {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_names: Vec<String>,
    /// Sorted by label values.
    pub series: Vec<SeriesSnapshot>,
}

impl FamilySnapshot {
    /// Look up one series by `(name, value)` pairs in any order.
    pub fn series(&self, labels: &[(&str, &str)]) -> Option<&SeriesValue> {
        if labels.len() != self.label_names.len() {
            return None;
        }
        self.series
            .iter()
            .find(|s| {
                labels.iter().all(|(k, v)| {
                    self.label_names
                        .iter()
                        .position(|n| n == k)
                        .and_then(|i| s.labels.get(i))
                        .map_or(false, |l| l.as_str() == *v)
                })
            })
            .map(|s| &s.value)
    }
}

/// All families, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub families: Vec<FamilySnapshot>,
}

impl RegistrySnapshot {
    pub fn family(&self, name: &str) -> Option<&FamilySnapshot> {
        self.families.iter().find(|f| f.name == name)
    }
}

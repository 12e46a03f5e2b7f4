use std::sync::Arc;

use crate::error::{MetricsError, Result};
use crate::snapshot::SeriesValue;

use super::atomic::AtomicF64;
use super::descriptor::MetricDescriptor;
use super::family::{rejected, Cell, Family};

pub(crate) struct CounterCell(AtomicF64);

impl Cell for CounterCell {
    fn new(_desc: &MetricDescriptor) -> Self {
        Self(AtomicF64::new(0.0))
    }

    fn read(&self) -> SeriesValue {
        SeriesValue::Counter(self.0.load())
    }
}

/// Monotonic, non-negative accumulator.
#[derive(Clone)]
pub struct Counter {
    family: Arc<Family<CounterCell>>,
}

impl Counter {
    pub(crate) fn from_family(family: Arc<Family<CounterCell>>) -> Self {
        Self { family }
    }

    pub fn name(&self) -> &str {
        self.family.name()
    }

    /// Add `amount` to the series. Negative or non-finite amounts are
    /// rejected and leave the series untouched.
    pub fn inc(&self, labels: &[(&str, &str)], amount: f64) -> Result<()> {
        if amount.is_nan() || amount.is_infinite() {
            return Err(rejected(MetricsError::NonFinite {
                name: self.name().to_string(),
                value: amount,
            }));
        }
        if amount < 0.0 {
            return Err(rejected(MetricsError::NegativeIncrement {
                name: self.name().to_string(),
                amount,
            }));
        }
        self.family.with_series(labels, |c| c.0.add(amount))
    }

    /// Create the series at 0 so it renders before the first increment.
    pub fn declare(&self, labels: &[(&str, &str)]) -> Result<()> {
        self.family.with_series(labels, |_| ())
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> Option<f64> {
        match self.family.read(labels)? {
            SeriesValue::Counter(v) => Some(v),
            _ => None,
        }
    }

    /// Number of distinct label sets currently held.
    pub fn series_count(&self) -> usize {
        self.family.series_count()
    }
}

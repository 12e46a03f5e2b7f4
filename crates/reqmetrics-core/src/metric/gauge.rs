use std::sync::Arc;

use crate::error::Result;
use crate::snapshot::SeriesValue;

use super::atomic::AtomicF64;
use super::descriptor::MetricDescriptor;
use super::family::{Cell, Family};

pub(crate) struct GaugeCell(AtomicF64);

impl Cell for GaugeCell {
    fn new(_desc: &MetricDescriptor) -> Self {
        Self(AtomicF64::new(0.0))
    }

    fn read(&self) -> SeriesValue {
        SeriesValue::Gauge(self.0.load())
    }
}

/// Arbitrary value; last write wins.
#[derive(Clone)]
pub struct Gauge {
    family: Arc<Family<GaugeCell>>,
}

impl Gauge {
    pub(crate) fn from_family(family: Arc<Family<GaugeCell>>) -> Self {
        Self { family }
    }

    pub fn name(&self) -> &str {
        self.family.name()
    }

    pub fn set(&self, labels: &[(&str, &str)], value: f64) -> Result<()> {
        self.family.with_series(labels, |c| c.0.store(value))
    }

    pub fn inc(&self, labels: &[(&str, &str)], delta: f64) -> Result<()> {
        self.family.with_series(labels, |c| c.0.add(delta))
    }

    pub fn dec(&self, labels: &[(&str, &str)], delta: f64) -> Result<()> {
        self.family.with_series(labels, |c| c.0.add(-delta))
    }

    pub fn declare(&self, labels: &[(&str, &str)]) -> Result<()> {
        self.family.with_series(labels, |_| ())
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> Option<f64> {
        match self.family.read(labels)? {
            SeriesValue::Gauge(v) => Some(v),
            _ => None,
        }
    }
}

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::snapshot::{HistogramSnapshot, SeriesValue};

use super::descriptor::{Buckets, MetricDescriptor, MetricKind};
use super::family::{Cell, Family};

#[derive(Default)]
struct HistogramState {
    /// Cumulative count per finite bound; `+Inf` is `count`.
    buckets: Vec<u64>,
    count: u64,
    sum: f64,
}

pub(crate) struct HistogramCell {
    bounds: Buckets,
    state: Mutex<HistogramState>,
}

impl HistogramCell {
    fn observe(&self, value: f64) {
        let valid = value.is_finite() && value >= 0.0;
        let mut st = self.state.lock();
        st.count += 1;
        if !valid {
            // Counted in +Inf only; kept out of the sum.
            return;
        }
        st.sum += value;
        for (i, &le) in self.bounds.bounds().iter().enumerate() {
            if value <= le {
                st.buckets[i] += 1;
            }
        }
    }
}

impl Cell for HistogramCell {
    fn new(desc: &MetricDescriptor) -> Self {
        let bounds = match &desc.kind {
            MetricKind::Histogram { buckets } => buckets.clone(),
            _ => Buckets::default(),
        };
        let state = HistogramState {
            buckets: vec![0; bounds.bounds().len()],
            ..HistogramState::default()
        };
        Self {
            bounds,
            state: Mutex::new(state),
        }
    }

    fn read(&self) -> SeriesValue {
        let (cumulative, count, sum) = {
            let st = self.state.lock();
            (st.buckets.clone(), st.count, st.sum)
        };
        SeriesValue::Histogram(HistogramSnapshot {
            bounds: self.bounds.bounds().to_vec(),
            cumulative,
            count,
            sum,
        })
    }
}

/// Bucketed distribution with cumulative buckets, count and sum.
#[derive(Clone)]
pub struct Histogram {
    family: Arc<Family<HistogramCell>>,
}

impl Histogram {
    pub(crate) fn from_family(family: Arc<Family<HistogramCell>>) -> Self {
        Self { family }
    }

    pub fn name(&self) -> &str {
        self.family.name()
    }

    /// Record one observation. Never drops a value: NaN, negative and
    /// infinite values land in the `+Inf` bucket only.
    pub fn observe(&self, labels: &[(&str, &str)], value: f64) -> Result<()> {
        self.family.with_series(labels, |c| c.observe(value))
    }

    pub fn declare(&self, labels: &[(&str, &str)]) -> Result<()> {
        self.family.with_series(labels, |_| ())
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> Option<HistogramSnapshot> {
        match self.family.read(labels)? {
            SeriesValue::Histogram(h) => Some(h),
            _ => None,
        }
    }

    pub fn series_count(&self) -> usize {
        self.family.series_count()
    }

    pub fn buckets(&self) -> &[f64] {
        match &self.family.descriptor().kind {
            MetricKind::Histogram { buckets } => buckets.bounds(),
            _ => &[],
        }
    }
}

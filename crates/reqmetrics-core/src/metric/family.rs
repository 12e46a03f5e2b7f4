//! One metric family: descriptor plus its label-keyed series.
//!
//! Series live in a sharded `DashMap`; each cell synchronizes itself
//! (atomics or a per-series mutex), so writers to different series never
//! contend and writers to the same series only contend on that series.
//! Creating a new series takes a family-local lock so the cardinality cap
//! is exact.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::{MetricsError, Result};
use crate::snapshot::{FamilySnapshot, SeriesSnapshot, SeriesValue};

use super::descriptor::MetricDescriptor;
use super::labels::LabelSet;

/// Per-series storage for one metric kind.
pub(crate) trait Cell: Send + Sync + 'static {
    fn new(desc: &MetricDescriptor) -> Self;
    fn read(&self) -> SeriesValue;
}

pub(crate) struct Family<C> {
    desc: MetricDescriptor,
    series: DashMap<LabelSet, C>,
    max_series: Option<usize>,
    create: Mutex<()>,
    overflowed: AtomicBool,
}

impl<C: Cell> Family<C> {
    pub(crate) fn new(desc: MetricDescriptor, max_series: Option<usize>) -> Self {
        let family = Self {
            desc,
            series: DashMap::new(),
            max_series,
            create: Mutex::new(()),
            overflowed: AtomicBool::new(false),
        };
        // An unlabeled family has exactly one series; declare it up front.
        if family.desc.label_names.is_empty() {
            family.series.insert(LabelSet::default(), C::new(&family.desc));
        }
        family
    }

    pub(crate) fn descriptor(&self) -> &MetricDescriptor {
        &self.desc
    }

    pub(crate) fn name(&self) -> &str {
        &self.desc.name
    }

    /// Run `f` against the series for `labels`, creating it on first use.
    pub(crate) fn with_series<R>(&self, labels: &[(&str, &str)], f: impl FnOnce(&C) -> R) -> Result<R> {
        let key = self.resolve(labels)?;
        if let Some(cell) = self.series.get(&key) {
            return Ok(f(cell.value()));
        }

        let _guard = self.create.lock();
        let key = self.admit(key);
        let cell = self
            .series
            .entry(key)
            .or_insert_with(|| C::new(&self.desc));
        Ok(f(cell.value()))
    }

    /// Read one series without creating it.
    pub(crate) fn read(&self, labels: &[(&str, &str)]) -> Option<SeriesValue> {
        let key = LabelSet::resolve(&self.desc.name, &self.desc.label_names, labels).ok()?;
        self.series.get(&key).map(|cell| cell.value().read())
    }

    pub(crate) fn series_count(&self) -> usize {
        self.series.len()
    }

    pub(crate) fn snapshot(&self) -> FamilySnapshot {
        let mut series: Vec<SeriesSnapshot> = self
            .series
            .iter()
            .map(|r| SeriesSnapshot {
                labels: r.key().values().to_vec(),
                value: r.value().read(),
            })
            .collect();
        series.sort_by(|a, b| a.labels.cmp(&b.labels));

        FamilySnapshot {
            name: self.desc.name.clone(),
            help: self.desc.help.clone(),
            kind: self.desc.kind.clone(),
            label_names: self.desc.label_names.clone(),
            series,
        }
    }

    fn resolve(&self, labels: &[(&str, &str)]) -> Result<LabelSet> {
        LabelSet::resolve(&self.desc.name, &self.desc.label_names, labels).map_err(rejected)
    }

    /// Fold a new label set into the overflow series once the cap is reached.
    /// Caller holds `create`.
    fn admit(&self, key: LabelSet) -> LabelSet {
        let Some(max) = self.max_series else { return key };
        if self.series.contains_key(&key) || self.series.len() < max {
            return key;
        }
        if !self.overflowed.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                metric = %self.desc.name,
                max_series = max,
                "label cardinality cap reached; folding new label sets into overflow series"
            );
        }
        LabelSet::overflow(self.desc.label_names.len())
    }
}

/// Log a rejected observation and hand the error back.
pub(crate) fn rejected(e: MetricsError) -> MetricsError {
    tracing::warn!(error = %e, class = e.class().as_str(), "observation rejected");
    e
}

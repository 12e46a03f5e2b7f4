//! Label sets.
//!
//! Callers pass `&[(name, value)]` in any order. The set is resolved against
//! the descriptor's declared label names and stored as values in declared
//! order, so two sets are equal iff every name maps to an equal value.

use crate::error::{MetricsError, Result};

/// Value used for every label of the overflow series.
pub const OVERFLOW_LABEL_VALUE: &str = "other";

/// Label values aligned with a descriptor's `label_names`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet(Vec<String>);

impl LabelSet {
    /// Resolve `pairs` against `names`. Missing, extra or repeated names are rejected.
    pub fn resolve(metric: &str, names: &[String], pairs: &[(&str, &str)]) -> Result<Self> {
        if pairs.len() != names.len() {
            return Err(MetricsError::LabelMismatch {
                name: metric.to_string(),
                detail: format!("expected {} labels, got {}", names.len(), pairs.len()),
            });
        }
        let mut values: Vec<Option<String>> = vec![None; names.len()];
        for (k, v) in pairs {
            let idx = names.iter().position(|n| n == k).ok_or_else(|| MetricsError::LabelMismatch {
                name: metric.to_string(),
                detail: format!("unknown label {k:?}"),
            })?;
            if values[idx].replace(v.to_string()).is_some() {
                return Err(MetricsError::LabelMismatch {
                    name: metric.to_string(),
                    detail: format!("label {k:?} given twice"),
                });
            }
        }
        // Equal lengths and no duplicates means every slot is filled.
        Ok(Self(values.into_iter().flatten().collect()))
    }

    pub(crate) fn overflow(arity: usize) -> Self {
        Self(vec![OVERFLOW_LABEL_VALUE.to_string(); arity])
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["method".to_string(), "path".to_string()]
    }

    #[test]
    fn order_independent() {
        let a = LabelSet::resolve("m", &names(), &[("method", "GET"), ("path", "/")]).unwrap();
        let b = LabelSet::resolve("m", &names(), &[("path", "/"), ("method", "GET")]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.values(), ["GET", "/"]);
    }

    #[test]
    fn rejects_missing_extra_and_repeated() {
        assert!(LabelSet::resolve("m", &names(), &[("method", "GET")]).is_err());
        assert!(LabelSet::resolve("m", &names(), &[("method", "GET"), ("route", "/")]).is_err());
        assert!(LabelSet::resolve("m", &names(), &[("method", "GET"), ("method", "PUT")]).is_err());
    }
}

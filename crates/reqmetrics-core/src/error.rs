//! Shared error type across reqmetrics crates.

use thiserror::Error;

/// Error classes (stable API).
///
/// Configuration errors are fatal at startup, invalid observations reject a
/// single call, render errors surface as a failed scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Conflicting or malformed metric/config definition.
    Configuration,
    /// A single rejected observation.
    InvalidObservation,
    /// Exposition serialization failure.
    Render,
    /// Internal failure (I/O at startup, bind errors).
    Internal,
}

impl ErrorClass {
    /// String representation used in logs and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Configuration => "CONFIGURATION",
            ErrorClass::InvalidObservation => "INVALID_OBSERVATION",
            ErrorClass::Render => "RENDER",
            ErrorClass::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metric {name} already registered with a different shape")]
    DuplicateName { name: String },
    #[error("invalid metric name: {0:?}")]
    InvalidName(String),
    #[error("invalid label name {label:?} on metric {name}")]
    InvalidLabelName { name: String, label: String },
    #[error("invalid buckets on metric {name}: {reason}")]
    InvalidBuckets { name: String, reason: String },
    #[error("metric {name} is a {actual}, not a {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("bad config: {0}")]
    Config(String),

    #[error("negative increment {amount} on counter {name}")]
    NegativeIncrement { name: String, amount: f64 },
    #[error("non-finite value {value} on metric {name}")]
    NonFinite { name: String, value: f64 },
    #[error("label mismatch on metric {name}: {detail}")]
    LabelMismatch { name: String, detail: String },

    #[error("render failed: {0}")]
    Render(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    /// Map an error to its stable class.
    pub fn class(&self) -> ErrorClass {
        match self {
            MetricsError::DuplicateName { .. }
            | MetricsError::InvalidName(_)
            | MetricsError::InvalidLabelName { .. }
            | MetricsError::InvalidBuckets { .. }
            | MetricsError::KindMismatch { .. }
            | MetricsError::Config(_) => ErrorClass::Configuration,
            MetricsError::NegativeIncrement { .. }
            | MetricsError::NonFinite { .. }
            | MetricsError::LabelMismatch { .. } => ErrorClass::InvalidObservation,
            MetricsError::Render(_) => ErrorClass::Render,
            MetricsError::Internal(_) => ErrorClass::Internal,
        }
    }
}

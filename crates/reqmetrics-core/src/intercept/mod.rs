//! Interceptor chain.
//!
//! Lifecycle per request:
//! - `Chain::enter` runs every `on_enter` synchronously, in chain order, and
//!   arms one finish callback per interceptor inside an `Observation`.
//! - The host calls `Observation::complete` once the response has been fully
//!   sent, or `Observation::abort` on error/disconnect. The first call wins;
//!   dropping an unfinished observation aborts it.
//!
//! Finish callbacks run in no particular order relative to each other.

pub mod builtin;
pub mod chain;
pub mod observation;
pub mod standard;

pub use chain::Chain;
pub use observation::{Observation, Phase};
pub use standard::{InterceptorToggles, StandardMetrics};

/// Per-request attribute bag handed over by the host.
#[derive(Debug, Clone, Default)]
pub struct RequestAttrs {
    pub method: String,
    pub path: String,
    /// Matched route template, `None` when no route matched.
    pub route: Option<String>,
    /// Header names are matched case-insensitively.
    pub headers: Vec<(String, String)>,
    /// Bytes read from the connection when the request entered the chain.
    pub bytes_read: u64,
}

impl RequestAttrs {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_bytes_read(mut self, n: u64) -> Self {
        self.bytes_read = n;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Declared `content-length`, 0 if absent or unparsable.
    pub fn content_length(&self) -> u64 {
        self.header("content-length")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// How a request left the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Response fully sent.
    Completed { status: u16 },
    /// Handler failed, connection closed, or the response was dropped early.
    Aborted { reason: String },
}

/// One lifecycle hook pair recording into one metric.
pub trait Interceptor: Send + Sync + 'static {
    /// Captured on enter, handed back on finish.
    type State: Send + 'static;

    fn name(&self) -> &'static str;

    /// Runs before the handler. Must not block.
    fn on_enter(&self, req: &RequestAttrs) -> Self::State;

    /// Runs exactly once per request, on completion or abort.
    fn on_finish(&self, req: &RequestAttrs, outcome: &Outcome, state: Self::State);
}

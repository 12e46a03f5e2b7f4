//! Observability plumbing around the core registry.
//!
//! - `logging`: tracing subscriber setup
//! - `sampler`: background task driving the process collector

pub mod logging;
pub mod sampler;

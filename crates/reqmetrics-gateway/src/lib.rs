//! reqmetrics gateway library entry.
//!
//! This crate hosts the core instrumentation in an axum server: config
//! loading, the tracking middleware, ops endpoints, and the background
//! process sampler. It is intended to be consumed by the binary (`main.rs`)
//! and by integration tests.

pub mod app_state;
pub mod config;
pub mod demo;
pub mod obs;
pub mod ops;
pub mod router;
pub mod transport;

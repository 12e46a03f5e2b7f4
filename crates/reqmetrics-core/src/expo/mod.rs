//! Exposition (Prometheus text format 0.0.4).

pub mod text;

pub use text::{render, CONTENT_TYPE};

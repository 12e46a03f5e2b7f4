//! Top-level facade crate for reqmetrics.
//!
//! Re-exports the core metric model and the axum host so users can depend on a single crate.

pub mod core {
    pub use reqmetrics_core::*;
}

pub mod gateway {
    pub use reqmetrics_gateway::*;
}

//! Transport adapters.
//!
//! - `layer`: axum middleware that turns request/response lifecycle into
//!   interceptor chain events

pub mod layer;

pub use layer::{track, SocketBytesRead};

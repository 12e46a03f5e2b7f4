//! Process-level facts independent of any request.

pub mod collector;
pub mod probe;

pub use collector::ProcessCollector;
pub use probe::{cpu_time, resident_memory_bytes, CpuTime};

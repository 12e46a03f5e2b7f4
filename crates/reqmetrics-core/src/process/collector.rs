//! Default process metrics.
//!
//! `collect()` samples the probes and writes the conventional `process_*`
//! series into the shared registry. The gateway drives it from a timer;
//! nothing here depends on a runtime.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::error::Result;
use crate::metric::{Counter, Gauge};
use crate::registry::Registry;

use super::probe::{self, CpuTime};

pub const PROCESS_CPU_USER_SECONDS_TOTAL: &str = "process_cpu_user_seconds_total";
pub const PROCESS_CPU_SYSTEM_SECONDS_TOTAL: &str = "process_cpu_system_seconds_total";
pub const PROCESS_CPU_SECONDS_TOTAL: &str = "process_cpu_seconds_total";
pub const PROCESS_START_TIME_SECONDS: &str = "process_start_time_seconds";
pub const PROCESS_UPTIME_SECONDS: &str = "process_uptime_seconds";
pub const PROCESS_RESIDENT_MEMORY_BYTES: &str = "process_resident_memory_bytes";
pub const PROCESS_VIRTUAL_MEMORY_BYTES: &str = "process_virtual_memory_bytes";
pub const PROCESS_HEAP_BYTES: &str = "process_heap_bytes";
pub const PROCESS_OPEN_FDS: &str = "process_open_fds";
pub const PROCESS_MAX_FDS: &str = "process_max_fds";
pub const PROCESS_SCHEDULER_LAG_SECONDS: &str = "process_scheduler_lag_seconds";

pub struct ProcessCollector {
    cpu_user: Counter,
    cpu_system: Counter,
    cpu_total: Counter,
    start_time: Gauge,
    uptime: Gauge,
    resident: Gauge,
    virtual_size: Gauge,
    heap: Gauge,
    open_fds: Gauge,
    max_fds: Gauge,
    lag: Gauge,

    start_secs: f64,
    last_cpu: Mutex<CpuTime>,
}

impl ProcessCollector {
    /// Register the `process_*` families. Fails if a name is already taken
    /// with a different shape.
    pub fn register(registry: &Registry) -> Result<Self> {
        Ok(Self {
            cpu_user: registry.counter(
                PROCESS_CPU_USER_SECONDS_TOTAL,
                "Total user CPU time spent in seconds.",
                &[],
            )?,
            cpu_system: registry.counter(
                PROCESS_CPU_SYSTEM_SECONDS_TOTAL,
                "Total system CPU time spent in seconds.",
                &[],
            )?,
            cpu_total: registry.counter(
                PROCESS_CPU_SECONDS_TOTAL,
                "Total user and system CPU time spent in seconds.",
                &[],
            )?,
            start_time: registry.gauge(
                PROCESS_START_TIME_SECONDS,
                "Start time of the process since unix epoch in seconds.",
                &[],
            )?,
            uptime: registry.gauge(PROCESS_UPTIME_SECONDS, "Process uptime in seconds.", &[])?,
            resident: registry.gauge(
                PROCESS_RESIDENT_MEMORY_BYTES,
                "Resident memory size in bytes.",
                &[],
            )?,
            virtual_size: registry.gauge(
                PROCESS_VIRTUAL_MEMORY_BYTES,
                "Virtual memory size in bytes.",
                &[],
            )?,
            heap: registry.gauge(PROCESS_HEAP_BYTES, "Process heap size in bytes.", &[])?,
            open_fds: registry.gauge(PROCESS_OPEN_FDS, "Number of open file descriptors.", &[])?,
            max_fds: registry.gauge(
                PROCESS_MAX_FDS,
                "Maximum number of open file descriptors.",
                &[],
            )?,
            lag: registry.gauge(
                PROCESS_SCHEDULER_LAG_SECONDS,
                "How late the last sampler tick fired, in seconds.",
                &[],
            )?,
            start_secs: probe::start_time_seconds(SystemTime::now()),
            last_cpu: Mutex::new(CpuTime::default()),
        })
    }

    /// Take one sample.
    pub fn collect(&self) {
        let cpu = probe::cpu_time();
        let (du, ds) = {
            let mut last = self.last_cpu.lock();
            let d = (
                cpu.user.saturating_sub(last.user),
                cpu.system.saturating_sub(last.system),
            );
            *last = cpu;
            d
        };
        let _ = self.cpu_user.inc(&[], du.as_secs_f64());
        let _ = self.cpu_system.inc(&[], ds.as_secs_f64());
        let _ = self.cpu_total.inc(&[], (du + ds).as_secs_f64());

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        let _ = self.start_time.set(&[], self.start_secs);
        let _ = self.uptime.set(&[], (now - self.start_secs).max(0.0));

        let mem = probe::memory_stats();
        if let Some(v) = mem.resident {
            let _ = self.resident.set(&[], v as f64);
        }
        if let Some(v) = mem.virtual_size {
            let _ = self.virtual_size.set(&[], v as f64);
        }
        if let Some(v) = mem.heap {
            let _ = self.heap.set(&[], v as f64);
        }
        if let Some(v) = probe::open_fds() {
            let _ = self.open_fds.set(&[], v as f64);
        }
        if let Some(v) = probe::max_fds() {
            let _ = self.max_fds.set(&[], v as f64);
        }
    }

    /// Record how late the sampler's timer fired.
    pub fn record_lag(&self, lag: Duration) {
        let _ = self.lag.set(&[], lag.as_secs_f64());
    }
}

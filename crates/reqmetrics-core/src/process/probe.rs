//! Process probes: CPU time, memory, descriptors, start time.
//!
//! CPU time and descriptor limits come from `getrusage`/`getrlimit`; memory,
//! open descriptors and start time from `/proc` (Linux only). A probe the
//! platform cannot answer returns `None` and the caller skips that fact.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Cumulative process CPU time (all threads).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTime {
    pub user: Duration,
    pub system: Duration,
}

impl CpuTime {
    pub fn total(&self) -> Duration {
        self.user + self.system
    }

    /// CPU consumed since `earlier` (saturating).
    pub fn since(&self, earlier: &CpuTime) -> Duration {
        self.total().saturating_sub(earlier.total())
    }
}

#[cfg(unix)]
pub fn cpu_time() -> CpuTime {
    use nix::sys::resource::{getrusage, UsageWho};
    use nix::sys::time::TimeValLike;

    match getrusage(UsageWho::RUSAGE_SELF) {
        Ok(usage) => CpuTime {
            user: Duration::from_micros(usage.user_time().num_microseconds().max(0) as u64),
            system: Duration::from_micros(usage.system_time().num_microseconds().max(0) as u64),
        },
        Err(e) => {
            tracing::debug!(error = %e, "getrusage failed");
            CpuTime::default()
        }
    }
}

#[cfg(not(unix))]
pub fn cpu_time() -> CpuTime {
    CpuTime::default()
}

/// Current resident set size in bytes (`/proc/self/statm`), 0 if unknown.
pub fn resident_memory_bytes() -> u64 {
    read_statm_resident().unwrap_or(0)
}

#[cfg(target_os = "linux")]
fn read_statm_resident() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(pages * page_size()?)
}

#[cfg(not(target_os = "linux"))]
fn read_statm_resident() -> Option<u64> {
    None
}

#[cfg(target_os = "linux")]
fn page_size() -> Option<u64> {
    use nix::unistd::{sysconf, SysconfVar};
    static PAGE: std::sync::OnceLock<Option<u64>> = std::sync::OnceLock::new();
    *PAGE.get_or_init(|| {
        sysconf(SysconfVar::PAGE_SIZE)
            .ok()
            .flatten()
            .and_then(|v| u64::try_from(v).ok())
    })
}

/// Memory figures from `/proc/self/status`, in bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStats {
    pub resident: Option<u64>,
    pub virtual_size: Option<u64>,
    pub heap: Option<u64>,
}

#[cfg(target_os = "linux")]
pub fn memory_stats() -> MemoryStats {
    match std::fs::read_to_string("/proc/self/status") {
        Ok(status) => parse_status(&status),
        Err(e) => {
            tracing::debug!(error = %e, "read /proc/self/status failed");
            MemoryStats::default()
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn memory_stats() -> MemoryStats {
    MemoryStats::default()
}

fn parse_status(status: &str) -> MemoryStats {
    let kib = |key: &str| -> Option<u64> {
        let line = status.lines().find(|l| l.starts_with(key))?;
        let n: u64 = line[key.len()..].split_whitespace().next()?.parse().ok()?;
        Some(n * 1024)
    };
    MemoryStats {
        resident: kib("VmRSS:"),
        virtual_size: kib("VmSize:"),
        heap: kib("VmData:"),
    }
}

/// Open file descriptors (`/proc/self/fd`, excluding the one used to list it).
#[cfg(target_os = "linux")]
pub fn open_fds() -> Option<u64> {
    let n = std::fs::read_dir("/proc/self/fd").ok()?.count() as u64;
    Some(n.saturating_sub(1))
}

#[cfg(not(target_os = "linux"))]
pub fn open_fds() -> Option<u64> {
    None
}

/// Soft `RLIMIT_NOFILE`.
#[cfg(unix)]
pub fn max_fds() -> Option<u64> {
    use nix::sys::resource::{getrlimit, Resource};
    getrlimit(Resource::RLIMIT_NOFILE).ok().map(|(soft, _hard)| soft as u64)
}

#[cfg(not(unix))]
pub fn max_fds() -> Option<u64> {
    None
}

/// Process start time as seconds since the Unix epoch.
///
/// Linux derives it from the boot time and the process start tick; other
/// platforms fall back to `fallback` (the time the caller first asked).
pub fn start_time_seconds(fallback: SystemTime) -> f64 {
    proc_start_time().unwrap_or_else(|| {
        fallback
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    })
}

#[cfg(target_os = "linux")]
fn proc_start_time() -> Option<f64> {
    use nix::unistd::{sysconf, SysconfVar};

    let stat = std::fs::read_to_string("/proc/self/stat").ok()?;
    // Field 22 (starttime), counted after the parenthesised command name.
    let after_comm = &stat[stat.rfind(')')? + 1..];
    let start_ticks: u64 = after_comm.split_whitespace().nth(19)?.parse().ok()?;

    let proc_stat = std::fs::read_to_string("/proc/stat").ok()?;
    let btime: u64 = proc_stat
        .lines()
        .find_map(|l| l.strip_prefix("btime "))?
        .trim()
        .parse()
        .ok()?;

    let ticks = sysconf(SysconfVar::CLK_TCK).ok().flatten()?;
    if ticks <= 0 {
        return None;
    }
    Some(btime as f64 + start_ticks as f64 / ticks as f64)
}

#[cfg(not(target_os = "linux"))]
fn proc_start_time() -> Option<f64> {
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing() {
        let status = "Name:\tdemo\nVmSize:\t  2048 kB\nVmRSS:\t   512 kB\nVmData:\t 1024 kB\n";
        let m = parse_status(status);
        assert_eq!(m.resident, Some(512 * 1024));
        assert_eq!(m.virtual_size, Some(2048 * 1024));
        assert_eq!(m.heap, Some(1024 * 1024));
    }

    #[test]
    fn cpu_time_is_monotonic() {
        let a = cpu_time();
        let mut x = 0u64;
        for i in 0..200_000u64 {
            x = x.wrapping_add(i * i);
        }
        assert!(x > 0);
        let b = cpu_time();
        assert!(b.total() >= a.total());
        assert_eq!(a.since(&b), Duration::ZERO);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_probes_answer() {
        assert!(resident_memory_bytes() > 0);
        assert!(open_fds().is_some());
        assert!(start_time_seconds(SystemTime::now()) > 0.0);
    }
}

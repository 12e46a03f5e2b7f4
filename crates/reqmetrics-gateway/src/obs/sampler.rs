//! Background process sampler.
//!
//! Ticks on a fixed interval independent of request traffic. Each tick also
//! records how late it fired, which is the async runtime's analogue of
//! event-loop lag.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};

use reqmetrics_core::process::ProcessCollector;

/// Spawn the sampler. The first sample is taken immediately so the first
/// scrape is populated.
pub fn spawn(collector: Arc<ProcessCollector>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let scheduled = tick.tick().await;
            let lag = Instant::now().saturating_duration_since(scheduled);
            collector.record_lag(lag);
            collector.collect();
            tracing::trace!(lag_ms = lag.as_millis() as u64, "process sample taken");
        }
    })
}

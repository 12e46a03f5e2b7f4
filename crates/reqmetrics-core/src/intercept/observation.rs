//! Per-request observation context.
//!
//! State machine: `Entered -> Completed | Aborted`, exactly one transition,
//! taken by compare-and-set. Completion and abort may race (body end vs.
//! connection drop); the loser is a no-op.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::chain::Armed;
use super::{Outcome, RequestAttrs};

const ENTERED: u8 = 0;
const COMPLETED: u8 = 1;
const ABORTED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entered,
    Completed,
    Aborted,
}

pub struct Observation {
    req: RequestAttrs,
    started: Instant,
    phase: AtomicU8,
    armed: Mutex<Vec<Box<dyn Armed>>>,
}

impl Observation {
    pub(crate) fn new(req: RequestAttrs, armed: Vec<Box<dyn Armed>>) -> Self {
        Self {
            req,
            started: Instant::now(),
            phase: AtomicU8::new(ENTERED),
            armed: Mutex::new(armed),
        }
    }

    pub fn request(&self) -> &RequestAttrs {
        &self.req
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn phase(&self) -> Phase {
        match self.phase.load(Ordering::Acquire) {
            ENTERED => Phase::Entered,
            COMPLETED => Phase::Completed,
            _ => Phase::Aborted,
        }
    }

    /// Response fully sent. Returns `false` if already finished.
    pub fn complete(&self, status: u16) -> bool {
        self.finish(COMPLETED, Outcome::Completed { status })
    }

    /// Handler failure or disconnect. Returns `false` if already finished.
    pub fn abort(&self, reason: impl Into<String>) -> bool {
        self.finish(
            ABORTED,
            Outcome::Aborted {
                reason: reason.into(),
            },
        )
    }

    fn finish(&self, to: u8, outcome: Outcome) -> bool {
        if self
            .phase
            .compare_exchange(ENTERED, to, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        if let Outcome::Aborted { reason } = &outcome {
            tracing::debug!(method = %self.req.method, path = %self.req.path, %reason, "request aborted");
        }

        let armed = std::mem::take(&mut *self.armed.lock());
        for a in armed {
            let name = a.name();
            if catch_unwind(AssertUnwindSafe(|| a.fire(&self.req, &outcome))).is_err() {
                tracing::error!(interceptor = name, method = %self.req.method, path = %self.req.path, "finish callback panicked");
            }
        }
        true
    }
}

impl Drop for Observation {
    fn drop(&mut self) {
        if self.phase() == Phase::Entered {
            self.abort("observation dropped before completion");
        }
    }
}

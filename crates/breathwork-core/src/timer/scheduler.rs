//! Timer scheduling for the phase engine.
//!
//! The engine never sleeps. It asks a [`Scheduler`] to deliver a
//! [`TimerFiring`] later and the host feeds that firing back through
//! [`PhaseEngine::fire`](super::PhaseEngine::fire). Each firing carries the
//! generation it was armed under so the engine can discard firings that were
//! already in flight when their timer got cancelled.
//!
//! Two hosts ship with the crate:
//!
//! - [`ManualScheduler`]: a virtual clock, advanced explicitly. Deterministic,
//!   used by tests and `session simulate`.
//! - [`TokioScheduler`]: spawns one task per timer and delivers firings through
//!   an unbounded channel the host `select!`s on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ValidationError;

/// Slowest accepted [`TokioScheduler::with_speed`] factor.
pub const MIN_SPEED: f64 = 0.01;
/// Fastest accepted [`TokioScheduler::with_speed`] factor.
pub const MAX_SPEED: f64 = 1000.0;

/// Which engine timer a firing belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Repeating one-second session countdown.
    Countdown,
    /// One-shot trigger that advances to the next phase.
    PhaseTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFiring {
    pub kind: TimerKind,
    pub generation: u64,
}

/// Handle returned by the scheduler; pass it back to [`Scheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancelToken(u64);

pub trait Scheduler {
    /// Deliver `firing` once after `delay`.
    fn schedule_once(&mut self, delay: Duration, firing: TimerFiring) -> CancelToken;

    /// Deliver `firing` every `period`, first delivery one period from now.
    fn schedule_repeating(&mut self, period: Duration, firing: TimerFiring) -> CancelToken;

    /// Best-effort cancellation. A firing already handed to the host may still
    /// arrive; the engine's generation check drops it.
    fn cancel(&mut self, token: CancelToken);
}

// ── Manual (virtual clock) ──────────────────────────────────────────

#[derive(Debug)]
struct Pending {
    token: u64,
    due: Duration,
    period: Option<Duration>,
    seq: u64,
    firing: TimerFiring,
}

#[derive(Debug, Default)]
struct ManualQueue {
    now: Duration,
    next_token: u64,
    next_seq: u64,
    pending: Vec<Pending>,
}

impl ManualQueue {
    fn push(&mut self, delay: Duration, period: Option<Duration>, firing: TimerFiring) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            token,
            due: self.now + delay,
            period,
            seq,
            firing,
        });
        token
    }
}

/// Virtual-clock scheduler.
///
/// Cloning yields another handle to the same clock, so a test can keep one
/// handle while the engine owns the other. Firings due at the same instant are
/// delivered in the order they were scheduled.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, ManualQueue> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current virtual time since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.queue().now
    }

    /// Number of armed timers.
    pub fn pending_count(&self) -> usize {
        self.queue().pending.len()
    }

    /// Delay until the next firing of `kind`, if one is armed.
    pub fn next_due(&self, kind: TimerKind) -> Option<Duration> {
        let queue = self.queue();
        queue
            .pending
            .iter()
            .filter(|p| p.firing.kind == kind)
            .map(|p| p.due.saturating_sub(queue.now))
            .min()
    }

    /// Pop the earliest firing due at or before `until`, moving the clock to
    /// its due time. Repeating timers are re-armed one period later.
    pub fn pop_due(&self, until: Duration) -> Option<TimerFiring> {
        let mut queue = self.queue();
        let idx = queue
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= until)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;

        let due = queue.pending[idx].due;
        queue.now = queue.now.max(due);
        let firing = queue.pending[idx].firing;

        match queue.pending[idx].period {
            Some(period) => {
                let seq = queue.next_seq;
                queue.next_seq += 1;
                let entry = &mut queue.pending[idx];
                entry.due = due + period;
                entry.seq = seq;
            }
            None => {
                queue.pending.swap_remove(idx);
            }
        }
        Some(firing)
    }

    /// Move the clock forward without delivering anything.
    pub fn set_now(&self, now: Duration) {
        let mut queue = self.queue();
        queue.now = queue.now.max(now);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&mut self, delay: Duration, firing: TimerFiring) -> CancelToken {
        CancelToken(self.queue().push(delay, None, firing))
    }

    fn schedule_repeating(&mut self, period: Duration, firing: TimerFiring) -> CancelToken {
        CancelToken(self.queue().push(period, Some(period), firing))
    }

    fn cancel(&mut self, token: CancelToken) {
        self.queue().pending.retain(|p| p.token != token.0);
    }
}

// ── Tokio ───────────────────────────────────────────────────────────

/// Scheduler backed by tokio timers.
///
/// Must be used from within a tokio runtime. Firings arrive on the receiver
/// returned by [`TokioScheduler::new`].
#[derive(Debug)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<TimerFiring>,
    tasks: HashMap<u64, JoinHandle<()>>,
    next_token: u64,
    time_scale: f64,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFiring>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                tasks: HashMap::new(),
                next_token: 0,
                time_scale: 1.0,
            },
            rx,
        )
    }

    /// Run every timer `factor` times faster.
    ///
    /// `factor` must lie within [`MIN_SPEED`]..=[`MAX_SPEED`]; outside that
    /// range a one-second tick either rounds to zero or no longer fits a
    /// `Duration` once multiplied by the longest phase.
    pub fn with_speed(mut self, factor: f64) -> Result<Self, ValidationError> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&factor) {
            return Err(ValidationError::invalid(
                "speed",
                format!("must be between {MIN_SPEED} and {MAX_SPEED}, got {factor}"),
            ));
        }
        self.time_scale = 1.0 / factor;
        Ok(self)
    }

    fn scaled(&self, d: Duration) -> Duration {
        d.mul_f64(self.time_scale)
    }

    fn track(&mut self, handle: JoinHandle<()>) -> CancelToken {
        self.tasks.retain(|_, h| !h.is_finished());
        let token = self.next_token;
        self.next_token += 1;
        self.tasks.insert(token, handle);
        CancelToken(token)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&mut self, delay: Duration, firing: TimerFiring) -> CancelToken {
        let tx = self.tx.clone();
        let delay = self.scaled(delay);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(firing);
        });
        self.track(handle)
    }

    fn schedule_repeating(&mut self, period: Duration, firing: TimerFiring) -> CancelToken {
        let tx = self.tx.clone();
        let period = self.scaled(period);
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if tx.send(firing).is_err() {
                    break;
                }
            }
        });
        self.track(handle)
    }

    fn cancel(&mut self, token: CancelToken) {
        if let Some(handle) = self.tasks.remove(&token.0) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

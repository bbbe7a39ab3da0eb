//! Per-session timeout task
//!
//! Each session owns one timeout task. It wakes every statistics interval
//! to sample the byte counters, and fires once if the inactivity deadline
//! passes before it is re-armed. A kill signal ends it without touching the
//! session.
//!
//! The decision logic lives in [`TimeoutTask`], a plain state machine that
//! is fed one [`TaskEvent`] at a time. [`spawn`] drives it from a tokio
//! task: it waits for the earliest of kill, deadline and next tick, feeds
//! the event in, and re-arms the tick from the returned delay. A re-armed
//! deadline takes precedence over an expiry observed in the same wake-up.
//!
//! A stopped task is never resumed. Starting the session again spawns a
//! replacement through [`TimeoutHandle::rearm`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::registry::SessionId;
use crate::stats::StreamCounters;

use super::record::RecordSession;

/// Something the scheduler woke the task for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    /// The owner asked the task to stop
    Kill,
    /// The inactivity deadline elapsed
    Timeout,
    /// Periodic statistics wake-up
    Tick,
}

/// Why a task terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateReason {
    Killed,
    Expired,
}

/// What the scheduler should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Wake the task again after this delay
    Reschedule(Duration),
    /// Stop the task for good
    Terminate(TerminateReason),
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Scheduled,
    Running,
    Terminating,
}

/// Timeout task state machine
#[derive(Debug)]
pub struct TimeoutTask {
    state: TaskState,
    interval: Duration,
}

impl TimeoutTask {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: TaskState::Scheduled,
            interval,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Handle one event for session `id`
    ///
    /// Once terminated, every further event is answered with
    /// `Terminate(Killed)` and nothing is sampled.
    pub fn on_event(
        &mut self,
        event: TaskEvent,
        id: &SessionId,
        counters: &StreamCounters,
        now: Instant,
    ) -> TaskOutcome {
        if self.state == TaskState::Terminating {
            return TaskOutcome::Terminate(TerminateReason::Killed);
        }

        match event {
            TaskEvent::Kill => {
                self.state = TaskState::Terminating;
                tracing::info!(session = %id, "Timeout task killed");
                TaskOutcome::Terminate(TerminateReason::Killed)
            }
            TaskEvent::Timeout => {
                self.state = TaskState::Terminating;
                tracing::info!(session = %id, "Session timed out");
                TaskOutcome::Terminate(TerminateReason::Expired)
            }
            TaskEvent::Tick => {
                self.state = TaskState::Running;
                let bitrate = counters.sample(now);
                tracing::trace!(
                    session = %id,
                    bitrate = bitrate,
                    total_bytes = counters.total_bytes(),
                    total_packets = counters.total_packets(),
                    "Statistics sampled"
                );
                self.state = TaskState::Scheduled;
                TaskOutcome::Reschedule(self.interval)
            }
        }
    }
}

/// Owner-side control of a session's timeout task
///
/// The channels to the running task sit behind a lock so that a stopped
/// task can be replaced by a fresh one (see [`TimeoutHandle::rearm`]).
#[derive(Debug)]
pub struct TimeoutHandle {
    current: Mutex<TimerChannels>,
}

/// Owner-side ends for one spawned task
#[derive(Debug)]
struct TimerChannels {
    deadline: watch::Sender<Instant>,
    stop: Arc<StopSignal>,
    join: Option<JoinHandle<()>>,
}

/// Task-side ends of the control channels
#[derive(Debug)]
pub(crate) struct TimerSignals {
    deadline: watch::Receiver<Instant>,
    stop: Arc<StopSignal>,
}

#[derive(Debug, Default)]
struct StopSignal {
    /// Set by `kill`, or by the task itself once it has decided to exit
    stopped: AtomicBool,
    finished: AtomicBool,
    notify: Notify,
}

fn channels(deadline: Instant) -> (TimerChannels, TimerSignals) {
    let (tx, rx) = watch::channel(deadline);
    let stop = Arc::new(StopSignal::default());

    let owner = TimerChannels {
        deadline: tx,
        stop: Arc::clone(&stop),
        join: None,
    };
    (owner, TimerSignals { deadline: rx, stop })
}

impl TimeoutHandle {
    /// Create a handle with the deadline armed at `deadline`
    pub(crate) fn new(deadline: Instant) -> (Self, TimerSignals) {
        let (owner, signals) = channels(deadline);
        let handle = Self {
            current: Mutex::new(owner),
        };
        (handle, signals)
    }

    /// Move the running task's deadline to `timeout` from now
    ///
    /// Has no effect once the task has stopped; use [`TimeoutHandle::rearm`]
    /// to bring a stopped task back.
    pub fn set_timeout(&self, timeout: Duration) {
        self.current.lock().deadline.send_replace(Instant::now() + timeout);
    }

    /// Arm the deadline `timeout` from now
    ///
    /// If the current task is still running it simply picks up the new
    /// deadline and `None` is returned. If it has stopped (or been told
    /// to), fresh channels replace the old ones and their task-side ends
    /// are returned; the caller must spawn a task on them.
    pub(crate) fn rearm(&self, timeout: Duration) -> Option<TimerSignals> {
        let deadline = Instant::now() + timeout;
        let mut current = self.current.lock();

        if !current.stop.stopped.load(Ordering::Acquire) {
            current.deadline.send_replace(deadline);
            return None;
        }

        // The old task exits on its own; its join handle is detached
        let (owner, signals) = channels(deadline);
        *current = owner;
        Some(signals)
    }

    /// Current inactivity deadline
    pub fn deadline(&self) -> Instant {
        *self.current.lock().deadline.borrow()
    }

    /// Ask the task to stop before its next wake-up
    pub fn kill(&self) {
        let current = self.current.lock();
        if !current.stop.stopped.swap(true, Ordering::AcqRel) {
            // Stores a permit if the task is not currently waiting
            current.stop.notify.notify_one();
        }
    }

    /// Whether the current task has exited
    pub fn is_finished(&self) -> bool {
        self.current.lock().stop.finished.load(Ordering::Acquire)
    }

    pub(crate) fn attach(&self, join: JoinHandle<()>) {
        self.current.lock().join = Some(join);
    }

    pub(crate) fn take_join(&self) -> Option<JoinHandle<()>> {
        self.current.lock().join.take()
    }
}

/// Spawn the tokio task driving `session`'s timeout task
///
/// The task holds a strong reference to the session until it terminates.
/// On expiry it releases the session's handles before letting go.
pub(crate) fn spawn(
    session: Arc<RecordSession>,
    mut signals: TimerSignals,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut task = TimeoutTask::new(interval);
        let mut next_tick = Instant::now() + interval;

        loop {
            let deadline = *signals.deadline.borrow_and_update();

            let event = if signals.stop.stopped.load(Ordering::Acquire) {
                TaskEvent::Kill
            } else {
                tokio::select! {
                    biased;
                    _ = signals.stop.notify.notified() => TaskEvent::Kill,
                    changed = signals.deadline.changed() => {
                        if changed.is_err() {
                            TaskEvent::Kill
                        } else {
                            continue;
                        }
                    }
                    _ = sleep_until(deadline) => TaskEvent::Timeout,
                    _ = sleep_until(next_tick) => TaskEvent::Tick,
                }
            };

            match task.on_event(event, session.id(), session.counters(), Instant::now()) {
                TaskOutcome::Reschedule(delay) => {
                    next_tick = Instant::now() + delay;
                }
                TaskOutcome::Terminate(reason) => {
                    // A start from here on spawns a replacement task
                    signals.stop.stopped.store(true, Ordering::Release);
                    if reason == TerminateReason::Expired {
                        session.release();
                    }
                    tracing::debug!(
                        session = %session.id(),
                        reason = ?reason,
                        "Timeout task finished"
                    );
                    break;
                }
            }
        }

        signals.stop.finished.store(true, Ordering::Release);
    })
}

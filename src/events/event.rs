//! # Runtime events emitted by the supervisor and its tasks.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Topology events**: queue set and queues created/registered, startup failure
//! - **Task lifecycle events**: starting, stopped, failed
//! - **Data-path events**: period overruns, spurious wakes, select timeouts
//! - **Shutdown events**: requested, finished within grace, grace exceeded
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use sensorhub::{Event, EventKind, Level};
//!
//! let ev = Event::new(EventKind::PeriodOverrun)
//!     .with_task("producer-2")
//!     .with_late(Duration::from_millis(40));
//!
//! assert_eq!(ev.kind.level(), Level::Warn);
//! assert_eq!(ev.task.as_deref(), Some("producer-2"));
//! assert_eq!(ev.late_ms, Some(40));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::queue::QueueId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Severity of an event, used by log subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        })
    }
}

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Topology ===
    /// Queue set created.
    ///
    /// Sets: `reason` (capacity).
    SetCreated,

    /// Queue created (not yet a member of the set).
    ///
    /// Sets: `queue`, `reason` (capacity).
    QueueCreated,

    /// Queue registered with the set.
    ///
    /// Sets: `queue`, `task` (owning producer name).
    QueueRegistered,

    /// Topology could not be built; the supervisor gives up.
    ///
    /// Sets: `reason` (error message).
    StartupFailed,

    // === Task lifecycle ===
    /// Task is starting.
    ///
    /// Sets: `task`, `priority`.
    TaskStarting,

    /// Task has stopped (returned or was cancelled gracefully).
    ///
    /// Sets: `task`.
    TaskStopped,

    /// Task returned an error or panicked.
    ///
    /// Sets: `task`, `reason`.
    TaskFailed,

    // === Data path ===
    /// A producer finished its cycle after the absolute deadline had passed;
    /// the wakeup was skipped.
    ///
    /// Sets: `task`, `late_ms`.
    PeriodOverrun,

    /// `select` reported a queue but the non-blocking fetch found it empty.
    ///
    /// Sets: `task` (consumer), `queue`.
    SpuriousWake,

    /// A finite `select` elapsed without any notification.
    ///
    /// Sets: `task` (consumer).
    SelectTimedOut,

    // === Shutdown ===
    /// Shutdown requested (OS signal or explicit request).
    ShutdownRequested,

    /// All tasks stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some tasks did not stop in time.
    ///
    /// Sets: `reason` (stuck task names).
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason`.
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `task` (subscriber name), `reason` (panic message).
    SubscriberPanicked,
}

impl EventKind {
    /// Severity of this kind of event.
    pub fn level(&self) -> Level {
        match self {
            EventKind::StartupFailed | EventKind::TaskFailed | EventKind::GraceExceeded => {
                Level::Error
            }
            EventKind::PeriodOverrun
            | EventKind::SpuriousWake
            | EventKind::SubscriberOverflow
            | EventKind::SubscriberPanicked => Level::Warn,
            _ => Level::Info,
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Queue involved, if applicable.
    pub queue: Option<QueueId>,
    /// Human-readable reason (errors, capacities, stuck tasks).
    pub reason: Option<Arc<str>>,
    /// Task priority (for `TaskStarting`).
    pub priority: Option<u8>,
    /// How far past its deadline a producer finished, in milliseconds.
    pub late_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            queue: None,
            reason: None,
            priority: None,
            late_ms: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a queue identifier.
    #[inline]
    pub fn with_queue(mut self, queue: QueueId) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task priority.
    #[inline]
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attaches an overrun amount (stored as milliseconds).
    #[inline]
    pub fn with_late(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.late_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn levels() {
        assert_eq!(EventKind::StartupFailed.level(), Level::Error);
        assert_eq!(EventKind::SpuriousWake.level(), Level::Warn);
        assert_eq!(EventKind::QueueRegistered.level(), Level::Info);
    }
}

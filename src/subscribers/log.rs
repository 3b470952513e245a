//! # LogWriter: human-readable event printer
//!
//! Prints one line per [`Event`], tagged with its [`Level`](crate::Level).
//! Errors go to stderr, everything else to stdout.
//!
//! ## Example output
//! ```text
//! [info] set-created capacity=50
//! [info] queue-created queue=q1 capacity=10
//! [info] queue-registered queue=q1 task="producer-0"
//! [info] starting task="producer-0" priority=5
//! [warn] period-overrun task="producer-3" late=12ms
//! [warn] spurious-wake task="consumer" queue=q4: failed to receive data from queue
//! [error] startup-failed: failed to create queue 0: capacity must be greater than zero
//! [info] shutdown-requested
//! [info] all-stopped-within-grace
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind, Level};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn render(e: &Event) -> String {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        let queue = e
            .queue
            .map(|q| q.to_string())
            .unwrap_or_else(|| "-".into());

        match e.kind {
            EventKind::SetCreated => format!("set-created capacity={reason}"),
            EventKind::QueueCreated => format!("queue-created queue={queue} capacity={reason}"),
            EventKind::QueueRegistered => format!("queue-registered queue={queue} task={task:?}"),
            EventKind::StartupFailed => format!("startup-failed: {reason}"),
            EventKind::TaskStarting => match e.priority {
                Some(p) => format!("starting task={task:?} priority={p}"),
                None => format!("starting task={task:?}"),
            },
            EventKind::TaskStopped => format!("stopped task={task:?}"),
            EventKind::TaskFailed => format!("failed task={task:?} err={reason:?}"),
            EventKind::PeriodOverrun => {
                format!("period-overrun task={task:?} late={}ms", e.late_ms.unwrap_or(0))
            }
            EventKind::SpuriousWake => {
                format!("spurious-wake task={task:?} queue={queue}: failed to receive data from queue")
            }
            EventKind::SelectTimedOut => format!("select-timed-out task={task:?}"),
            EventKind::ShutdownRequested => "shutdown-requested".to_string(),
            EventKind::AllStoppedWithin => "all-stopped-within-grace".to_string(),
            EventKind::GraceExceeded => format!("grace-exceeded stuck={reason}"),
            EventKind::SubscriberOverflow => {
                format!("subscriber-overflow subscriber={task:?} reason={reason:?}")
            }
            EventKind::SubscriberPanicked => {
                format!("subscriber-panicked subscriber={task:?} info={reason:?}")
            }
        }
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let level = e.kind.level();
        let line = Self::render(e);
        if level == Level::Error {
            eprintln!("[{level}] {line}");
        } else {
            println!("[{level}] {line}");
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

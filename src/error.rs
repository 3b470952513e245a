//! Error types used by the queues, the tasks and the supervisor runtime.
//!
//! - [`QueueError`]: a queue or queue set could not be created.
//! - [`SendError`]: a send did not deliver; the item is handed back.
//! - [`RegisterError`]: queue set membership conflicts.
//! - [`TaskError`]: errors raised by individual task executions.
//! - [`RuntimeError`]: errors raised by the supervisor itself.
//!
//! Every enum provides `as_label` (stable snake_case label) for logs.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::queue::QueueId;

/// # Errors produced when creating queues or queue sets.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Requested capacity was zero; nothing could ever be stored.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::ZeroCapacity => "queue_zero_capacity",
        }
    }
}

/// # Send did not deliver.
///
/// The rejected item is always returned to the caller, so a failed send never
/// loses a reading silently.
#[derive(Error, PartialEq, Eq)]
pub enum SendError<T> {
    /// No free slot appeared before the timeout elapsed.
    #[error("send timed out")]
    TimedOut(T),

    /// The queue was closed (supervisor teardown).
    #[error("queue closed")]
    Closed(T),
}

impl<T> SendError<T> {
    /// Returns the item that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            SendError::TimedOut(item) | SendError::Closed(item) => item,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SendError::TimedOut(_) => "send_timed_out",
            SendError::Closed(_) => "send_closed",
        }
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::TimedOut(_) => f.write_str("TimedOut(..)"),
            SendError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

/// # Errors produced by queue set membership changes.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// The queue already belongs to a queue set (this one or another).
    #[error("queue {queue} already belongs to a set")]
    AlreadyMember {
        /// Queue that was rejected.
        queue: QueueId,
    },

    /// The set cannot reserve notification slots for the queue's capacity.
    #[error("set full: queue {queue} needs {needed} slots, {free} free")]
    SetFull {
        /// Queue that was rejected.
        queue: QueueId,
        /// Capacity the queue would reserve.
        needed: usize,
        /// Notification slots still unreserved.
        free: usize,
    },

    /// The queue holds items, which would have no ready-notifications.
    #[error("queue {queue} is not empty")]
    NotEmpty {
        /// Queue that was rejected.
        queue: QueueId,
    },

    /// The queue is not a member of this set.
    #[error("queue {queue} is not a member of this set")]
    NotMember {
        /// Queue that was rejected.
        queue: QueueId,
    },
}

impl RegisterError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegisterError::AlreadyMember { .. } => "register_already_member",
            RegisterError::SetFull { .. } => "register_set_full",
            RegisterError::NotEmpty { .. } => "register_not_empty",
            RegisterError::NotMember { .. } => "register_not_member",
        }
    }
}

/// # Errors produced by task execution.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Non-recoverable error.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task was cancelled due to supervisor teardown.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use sensorhub::TaskError;
    ///
    /// assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }
}

/// # Errors produced by the supervisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A configuration value cannot produce a working topology.
    #[error("invalid config `{field}`: {reason}")]
    Config {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A queue or the queue set could not be created at startup.
    #[error("failed to create {what}: {source}")]
    Queue {
        /// What was being created (`"queue set"`, `"queue 3"`, ...).
        what: String,
        /// Underlying cause.
        #[source]
        source: QueueError,
    },

    /// A queue could not be registered with the set at startup.
    #[error("failed to add queue {index} to set: {source}")]
    Register {
        /// Sensor index of the queue.
        index: usize,
        /// Underlying cause.
        #[source]
        source: RegisterError,
    },

    /// Teardown grace period was exceeded; some tasks did not stop.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of tasks that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use sensorhub::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Config { .. } => "runtime_invalid_config",
            RuntimeError::Queue { .. } => "runtime_queue_create",
            RuntimeError::Register { .. } => "runtime_queue_register",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns true for errors raised while building the topology.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            RuntimeError::Config { .. } | RuntimeError::Queue { .. } | RuntimeError::Register { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_error_returns_item() {
        let err = SendError::TimedOut(7u32);
        assert_eq!(err.as_label(), "send_timed_out");
        assert_eq!(err.into_inner(), 7);

        let err = SendError::Closed("reading");
        assert_eq!(err.to_string(), "queue closed");
        assert_eq!(err.into_inner(), "reading");
    }

    #[test]
    fn startup_errors_are_classified() {
        let err = RuntimeError::Queue {
            what: "queue set".into(),
            source: QueueError::ZeroCapacity,
        };
        assert!(err.is_startup());
        assert_eq!(
            err.to_string(),
            "failed to create queue set: capacity must be greater than zero"
        );

        let err = RuntimeError::Config {
            field: "period",
            reason: "must be greater than zero",
        };
        assert!(err.is_startup());
        assert_eq!(err.as_label(), "runtime_invalid_config");
        assert_eq!(
            err.to_string(),
            "invalid config `period`: must be greater than zero"
        );

        let err = RuntimeError::GraceExceeded {
            grace: Duration::from_secs(1),
            stuck: vec!["consumer".into()],
        };
        assert!(!err.is_startup());
    }
}

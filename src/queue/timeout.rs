//! # Wait selector for blocking queue operations.
//!
//! [`Timeout`] distinguishes the three waits the queues support:
//! - [`Timeout::Poll`] return immediately if the operation cannot complete;
//! - [`Timeout::After`] wait at most the given duration;
//! - [`Timeout::Infinite`] wait until the operation completes or the queue closes.
//!
//! `Duration::ZERO` converts to `Poll`, `None` converts to `Infinite`.

use std::pin::Pin;
use std::time::Duration;

use tokio::sync::futures::Notified;
use tokio::time::{self, Instant};

/// How long a blocking queue operation may wait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Timeout {
    /// Non-blocking: give up at once.
    Poll,
    /// Wait at most this long.
    After(Duration),
    /// Wait until completion (or until the queue/set is closed).
    #[default]
    Infinite,
}

impl Timeout {
    /// Resolves the timeout into an absolute deadline, measured from now.
    pub(crate) fn deadline(self) -> Deadline {
        match self {
            Timeout::Poll => Deadline::Now,
            Timeout::After(d) if d.is_zero() => Deadline::Now,
            Timeout::After(d) => Deadline::At(Instant::now() + d),
            Timeout::Infinite => Deadline::Never,
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        if d.is_zero() {
            Timeout::Poll
        } else {
            Timeout::After(d)
        }
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(d: Option<Duration>) -> Self {
        match d {
            Some(d) => d.into(),
            None => Timeout::Infinite,
        }
    }
}

/// Absolute form of a [`Timeout`], fixed once per operation so that retries
/// after wakeups do not extend the total wait.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Deadline {
    Now,
    At(Instant),
    Never,
}

impl Deadline {
    /// Waits for `notified` until the deadline.
    ///
    /// Returns `false` if the deadline passed first.
    pub(crate) async fn wait(self, notified: Pin<&mut Notified<'_>>) -> bool {
        match self {
            Deadline::Now => false,
            Deadline::At(at) => time::timeout_at(at, notified).await.is_ok(),
            Deadline::Never => {
                notified.await;
                true
            }
        }
    }
}

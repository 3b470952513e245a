//! # FanInConsumer: drain a queue set in notification order.
//!
//! ```text
//! loop {
//!   ├─► id = set.select(timeout)             (cancellable)
//!   │     └─ None → closed ? exit : publish SelectTimedOut, continue
//!   ├─► item = set.queue(id).try_receive()   (never blocks)
//!   │     └─ None → publish SpuriousWake, continue
//!   └─► dispatch.dispatch(id, item)          (runs to completion)
//! }
//! ```
//!
//! ## Exit conditions
//! - cancellation token fired while waiting in `select` → `Err(TaskError::Canceled)`
//! - set closed and drained → `Ok(())`
//!
//! Cancellation is only observed between iterations: a reading that has left
//! its queue is always dispatched, so a sink that never returns holds teardown
//! until the grace period runs out.
//!
//! There is no priority among queues beyond the set's notification FIFO.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::dispatch::Dispatch;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::queue::{QueueId, QueueSet, Timeout};
use crate::tasks::task::Task;

/// Outcome of one consumer iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// An item from this queue was dispatched.
    Dispatched(QueueId),
    /// The set named this queue but it was empty (benign miss).
    Spurious(QueueId),
    /// `select` timed out with no notification.
    TimedOut,
    /// The set is closed and drained.
    Closed,
}

/// Task that multiplexes every queue of one [`QueueSet`].
pub struct FanInConsumer<T> {
    name: Arc<str>,
    set: QueueSet<T>,
    dispatch: Arc<dyn Dispatch<T>>,
    timeout: Timeout,
    bus: Bus,
}

impl<T: Send + 'static> FanInConsumer<T> {
    /// Creates a consumer that waits on `set` without a timeout.
    pub fn new(
        name: impl Into<Arc<str>>,
        set: QueueSet<T>,
        dispatch: Arc<dyn Dispatch<T>>,
        bus: Bus,
    ) -> Self {
        Self {
            name: name.into(),
            set,
            dispatch,
            timeout: Timeout::Infinite,
            bus,
        }
    }

    /// Returns a consumer whose `select` gives up after `timeout`.
    pub fn with_timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Runs one select → fetch → dispatch iteration.
    pub async fn step(&self) -> Step {
        let ready = self.set.select(self.timeout).await;
        self.handle(ready).await
    }

    /// Fetches and dispatches the item behind one `select` outcome.
    async fn handle(&self, ready: Option<QueueId>) -> Step {
        let Some(id) = ready else {
            if self.set.is_closed() {
                return Step::Closed;
            }
            self.bus
                .publish(Event::new(EventKind::SelectTimedOut).with_task(Arc::clone(&self.name)));
            return Step::TimedOut;
        };

        match self.set.queue(id).and_then(|q| q.try_receive()) {
            Some(item) => {
                self.dispatch.dispatch(id, item).await;
                Step::Dispatched(id)
            }
            None => {
                self.bus.publish(
                    Event::new(EventKind::SpuriousWake)
                        .with_task(Arc::clone(&self.name))
                        .with_queue(id),
                );
                Step::Spurious(id)
            }
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Task for FanInConsumer<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        loop {
            let ready = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(TaskError::Canceled),
                ready = self.set.select(self.timeout) => ready,
            };
            if self.handle(ready).await == Step::Closed {
                return Ok(());
            }
        }
    }
}

//! # Run one task for its whole lifetime.
//!
//! ```text
//! publish TaskStarting{priority}
//!   └─► task.run(child token)
//!         ├─ Ok(())              → TaskStopped
//!         ├─ Err(Canceled)       → TaskStopped (graceful)
//!         ├─ Err(Fail/Fatal)     → TaskFailed
//!         └─ panic               → TaskFailed (panic message)
//! ```
//!
//! Always publishes **exactly one** terminal event. There is no restart: the
//! topology is static and tasks live until teardown.

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::panic_message;
use crate::tasks::{Priority, TaskRef};

/// Runs `task` until it returns, panics, or honors cancellation of `token`.
pub(crate) async fn run_task(task: TaskRef, priority: Priority, token: CancellationToken, bus: Bus) {
    let name = task.name().to_string();
    bus.publish(
        Event::new(EventKind::TaskStarting)
            .with_task(name.as_str())
            .with_priority(priority.0),
    );

    let res = std::panic::AssertUnwindSafe(task.run(token))
        .catch_unwind()
        .await;

    match res {
        Ok(Ok(())) | Ok(Err(TaskError::Canceled)) => {
            bus.publish(Event::new(EventKind::TaskStopped).with_task(name));
        }
        Ok(Err(e)) => {
            bus.publish(
                Event::new(EventKind::TaskFailed)
                    .with_task(name)
                    .with_reason(e.to_string()),
            );
        }
        Err(panic) => {
            bus.publish(
                Event::new(EventKind::TaskFailed)
                    .with_task(name)
                    .with_reason(format!("panic: {}", panic_message(panic.as_ref()))),
            );
        }
    }
}

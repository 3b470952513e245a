//! # Task abstraction.
//!
//! A task receives a [`CancellationToken`] and must race every blocking point
//! against it, so teardown never waits on a task parked in `send`, `select`
//! or a periodic sleep.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// # Asynchronous, cancelable unit.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use sensorhub::{Task, TaskError};
///
/// struct Idle;
///
/// #[async_trait]
/// impl Task for Idle {
///     fn name(&self) -> &str { "idle" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         ctx.cancelled().await;
///         Err(TaskError::Canceled)
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task until completion or cancellation.
    ///
    /// Returning `Err(TaskError::Canceled)` is treated as a graceful stop.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}

/// Shared handle to a task object.
pub type TaskRef = Arc<dyn Task>;

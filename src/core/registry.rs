//! # Task registry: owns the handles of every spawned task.
//!
//! ```text
//! spawn_all(specs) ── by_priority ──► for each spec:
//!                                       child = runtime_token.child_token()
//!                                       tokio::spawn(run_task(task, priority, child, bus))
//!                                       tasks[name] = Handle { join }
//!
//! shutdown(grace) ── drain handles ──► join each until the shared deadline
//!                                       ├─ joined         → ok
//!                                       ├─ join error     → TaskFailed (aborted)
//!                                       └─ deadline hit   → abort, report as stuck
//! ```
//!
//! ## Rules
//! - Task names are unique; a duplicate spec is rejected with `TaskFailed`.
//! - Higher priorities are spawned first; ties keep submission order.
//! - Cancellation itself is driven by the runtime token, not by the registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::runner::run_task;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{TaskSpec, by_priority};

/// Handle to a running task.
struct Handle {
    join: JoinHandle<()>,
}

/// Registry of spawned tasks.
pub struct Registry {
    tasks: RwLock<HashMap<String, Handle>>,
    bus: Bus,
    runtime_token: CancellationToken,
}

impl Registry {
    /// Creates a new registry whose tasks derive tokens from `runtime_token`.
    pub fn new(bus: Bus, runtime_token: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            tasks: RwLock::new(HashMap::new()),
            bus,
            runtime_token,
        })
    }

    /// Spawns every spec, highest priority first.
    pub async fn spawn_all(&self, specs: Vec<TaskSpec>) {
        let mut tasks = self.tasks.write().await;
        for spec in by_priority(specs) {
            let name = spec.name().to_string();
            if tasks.contains_key(&name) {
                self.bus.publish(
                    Event::new(EventKind::TaskFailed)
                        .with_task(name)
                        .with_reason("task_already_exists"),
                );
                continue;
            }

            let join = tokio::spawn(run_task(
                spec.task().clone(),
                spec.priority(),
                self.runtime_token.child_token(),
                self.bus.clone(),
            ));
            tasks.insert(name, Handle { join });
        }
    }

    /// Returns sorted list of registered task names.
    pub async fn list(&self) -> Vec<String> {
        let tasks = self.tasks.read().await;
        let mut names: Vec<String> = tasks.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Joins every task, waiting at most `grace` in total.
    ///
    /// Tasks still running at the deadline are aborted and returned (sorted) as `Err`.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), Vec<String>> {
        let handles: Vec<(String, Handle)> = {
            let mut tasks = self.tasks.write().await;
            tasks.drain().collect()
        };

        let deadline = Instant::now() + grace;
        let mut stuck = Vec::new();
        for (name, mut handle) in handles {
            match time::timeout_at(deadline, &mut handle.join).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    self.bus.publish(
                        Event::new(EventKind::TaskFailed)
                            .with_task(name.as_str())
                            .with_reason(join_err.to_string()),
                    );
                }
                Err(_elapsed) => {
                    handle.join.abort();
                    stuck.push(name);
                }
            }
        }

        if stuck.is_empty() {
            Ok(())
        } else {
            stuck.sort_unstable();
            Err(stuck)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::error::TaskError;
    use crate::tasks::{Priority, Task};

    /// Waits for cancellation, or ignores it when `stubborn`.
    struct Sleeper {
        name: &'static str,
        stubborn: bool,
    }

    #[async_trait]
    impl Task for Sleeper {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
            if self.stubborn {
                std::future::pending::<()>().await;
            }
            ctx.cancelled().await;
            Err(TaskError::Canceled)
        }
    }

    fn spec(name: &'static str, priority: u8, stubborn: bool) -> TaskSpec {
        TaskSpec::new(Arc::new(Sleeper { name, stubborn }), Priority(priority))
    }

    #[tokio::test]
    async fn spawns_by_priority_and_rejects_duplicates() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let token = CancellationToken::new();
        let registry = Registry::new(bus, token.clone());

        registry
            .spawn_all(vec![
                spec("consumer", 3, false),
                spec("producer-0", 5, false),
                spec("producer-1", 5, false),
                spec("producer-0", 5, false),
            ])
            .await;
        assert_eq!(
            registry.list().await,
            vec!["consumer", "producer-0", "producer-1"]
        );

        let dup = rx.recv().await.unwrap();
        assert_eq!(dup.kind, EventKind::TaskFailed);
        assert_eq!(dup.reason.as_deref(), Some("task_already_exists"));

        let mut started = Vec::new();
        while started.len() < 3 {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::TaskStarting {
                started.push(ev.task.as_deref().unwrap_or_default().to_string());
            }
        }
        assert_eq!(started, vec!["producer-0", "producer-1", "consumer"]);

        token.cancel();
        assert_eq!(registry.shutdown(Duration::from_secs(1)).await, Ok(()));
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reports_tasks_that_ignore_cancellation() {
        let bus = Bus::new(64);
        let token = CancellationToken::new();
        let registry = Registry::new(bus, token.clone());
        registry
            .spawn_all(vec![spec("polite", 1, false), spec("stubborn", 1, true)])
            .await;
        tokio::task::yield_now().await;

        token.cancel();
        let stuck = registry.shutdown(Duration::from_millis(100)).await;
        assert_eq!(stuck, Err(vec!["stubborn".to_string()]));
    }
}

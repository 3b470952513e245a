//! # Task specification.
//!
//! [`TaskSpec`] bundles a task with its [`Priority`]. The registry spawns specs
//! in descending priority order; equal priorities keep submission order.

use std::fmt;

use crate::tasks::task::TaskRef;

/// Advisory scheduling priority (higher value = more urgent).
///
/// The tokio scheduler has no notion of priority, so this only decides spawn
/// order and is reported on `TaskStarting` events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u8);

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Specification for running a task under supervision.
#[derive(Clone)]
pub struct TaskSpec {
    task: TaskRef,
    priority: Priority,
}

impl TaskSpec {
    /// Creates a new task specification.
    pub fn new(task: TaskRef, priority: Priority) -> Self {
        Self { task, priority }
    }

    /// Returns reference to the task.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Convenience: returns the task name.
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Returns the priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns a new spec with updated priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Orders specs by descending priority, keeping submission order for ties.
pub(crate) fn by_priority(mut specs: Vec<TaskSpec>) -> Vec<TaskSpec> {
    specs.sort_by(|a, b| b.priority.cmp(&a.priority));
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use crate::error::TaskError;
    use crate::tasks::task::Task;

    struct Named(&'static str);

    #[async_trait]
    impl Task for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, _ctx: CancellationToken) -> Result<(), TaskError> {
            Ok(())
        }
    }

    fn spec(name: &'static str, priority: u8) -> TaskSpec {
        TaskSpec::new(Arc::new(Named(name)), Priority(priority))
    }

    #[test]
    fn highest_priority_first_ties_stable() {
        let ordered = by_priority(vec![
            spec("consumer", 3),
            spec("producer-0", 5),
            spec("idle", 0),
            spec("producer-1", 5),
        ]);
        let names: Vec<&str> = ordered.iter().map(TaskSpec::name).collect();
        assert_eq!(names, vec!["producer-0", "producer-1", "consumer", "idle"]);
    }

    #[test]
    fn with_priority_overrides() {
        let s = spec("consumer", 3).with_priority(Priority(9));
        assert_eq!(s.priority(), Priority(9));
        assert_eq!(s.name(), "consumer");
    }
}

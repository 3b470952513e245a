//! # Acquisition runtime configuration.
//!
//! Provides [`Config`], the static topology and timing of the acquisition core.
//!
//! ## Sentinel values
//! - `set_capacity = 0` → sum of member capacities (`sensors × queue_capacity`)
//! - `select_timeout = 0s` → consumer waits on the set without a timeout

use std::time::Duration;

use crate::error::RuntimeError;
use crate::queue::Timeout;
use crate::tasks::Priority;

/// Configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `sensors`: number of producers, each with its own queue
/// - `queue_capacity`: per-queue capacity (`0` fails at startup)
/// - `set_capacity`: notification slots of the queue set (`0` = derived)
/// - `period`: sampling period of every producer
/// - `producer_priority` / `consumer_priority`: spawn-order policy
/// - `select_timeout`: consumer wait on the set (`0s` = infinite)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `grace`: how long teardown waits for tasks to stop
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of producers (and queues).
    pub sensors: usize,

    /// Capacity of every producer queue.
    pub queue_capacity: usize,

    /// Notification slots of the queue set.
    ///
    /// - `0` = `sensors × queue_capacity`, which exactly fits every member
    /// - `n > 0` = fixed; registration fails with `SetFull` if members need more
    pub set_capacity: usize,

    /// Sampling period of every producer (absolute-deadline schedule).
    ///
    /// Must be non-zero: a zero period overruns on every cycle.
    pub period: Duration,

    /// Priority of producer tasks.
    ///
    /// Higher than the consumer by default: losing a sample is worse than
    /// displaying it late.
    pub producer_priority: Priority,

    /// Priority of the consumer task.
    pub consumer_priority: Priority,

    /// How long the consumer waits in `select` before reporting a timeout.
    pub select_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Maximum time teardown waits for tasks to stop.
    pub grace: Duration,
}

impl Config {
    /// Returns the queue set capacity with the `0` sentinel resolved.
    #[inline]
    pub fn set_capacity_resolved(&self) -> usize {
        if self.set_capacity == 0 {
            self.sensors.saturating_mul(self.queue_capacity)
        } else {
            self.set_capacity
        }
    }

    /// Returns the consumer's select timeout.
    ///
    /// - `Timeout::Infinite` when `select_timeout` is zero
    /// - `Timeout::After(d)` otherwise
    #[inline]
    pub fn consumer_timeout(&self) -> Timeout {
        if self.select_timeout.is_zero() {
            Timeout::Infinite
        } else {
            Timeout::After(self.select_timeout)
        }
    }

    /// Rejects values no topology can run with.
    ///
    /// Zero capacities are left to queue creation, which reports them per queue.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.period.is_zero() {
            return Err(RuntimeError::Config {
                field: "period",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - 5 sensors, queues of 10, set sized to fit (50)
    /// - `period = 1s`
    /// - producers at priority 5, consumer at 3
    /// - infinite select, `bus_capacity = 1024`, `grace = 5s`
    fn default() -> Self {
        Self {
            sensors: 5,
            queue_capacity: 10,
            set_capacity: 0,
            period: Duration::from_millis(1000),
            producer_priority: Priority(5),
            consumer_priority: Priority(3),
            select_timeout: Duration::ZERO,
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}

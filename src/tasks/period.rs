//! # Absolute-deadline periodic scheduling.
//!
//! Each cycle captures `t0` before doing any work and wakes at `t0 + period`,
//! so time spent sampling or blocked in `send` is absorbed rather than added.
//! When `t0 + period` is already in the past the cycle overran: the task
//! resumes at once and the next deadline is again measured from the new
//! cycle's `t0`. Missed wakeups are skipped, never replayed in a burst.

use std::time::Duration;

use tokio::time::Instant;

/// Outcome of a finished cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wake {
    /// Sleep until this instant.
    At(Instant),
    /// Deadline already passed by `late`; start the next cycle now.
    Overrun {
        /// How far past the deadline the cycle finished.
        late: Duration,
    },
}

/// Fixed period of a producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Period(Duration);

impl Period {
    /// Creates a period.
    pub fn new(period: Duration) -> Self {
        Self(period)
    }

    /// Period length.
    pub fn get(&self) -> Duration {
        self.0
    }

    /// Absolute deadline of the cycle that started at `t0`.
    pub fn deadline(&self, t0: Instant) -> Instant {
        t0 + self.0
    }

    /// Decides how to wait for the cycle that started at `t0`, given the current time.
    pub fn wake(&self, t0: Instant, now: Instant) -> Wake {
        let deadline = self.deadline(t0);
        if deadline > now {
            Wake::At(deadline)
        } else {
            Wake::Overrun {
                late: now - deadline,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wakes_at_absolute_deadline() {
        let p = Period::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        // Work took 300ms: sleep only the remaining 700ms.
        let now = t0 + Duration::from_millis(300);
        assert_eq!(p.wake(t0, now), Wake::At(t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn overrun_never_sleeps_backward() {
        let p = Period::new(Duration::from_millis(100));
        let t0 = Instant::now();
        let now = t0 + Duration::from_millis(350);
        assert_eq!(
            p.wake(t0, now),
            Wake::Overrun {
                late: Duration::from_millis(250)
            }
        );
        // Exactly on the deadline counts as overrun (nothing left to sleep).
        assert!(matches!(
            p.wake(t0, t0 + Duration::from_millis(100)),
            Wake::Overrun { .. }
        ));
    }
}

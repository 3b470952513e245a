//! # PeriodicProducer: sample, send, sleep until the next absolute deadline.
//!
//! ```text
//! Init ──► Running ─┬─► t0 = now
//!                   ├─► item = sampler.sample(sensor, cycle)
//!                   ├─► queue.send(item, Infinite)     (cancellable)
//!                   └─► Period::wake(t0, now)
//!                         ├─ At(t0 + period) → sleep_until  (cancellable)
//!                         └─ Overrun{late}   → publish PeriodOverrun, next cycle now
//! ```
//!
//! ## Exit conditions
//! - cancellation token fired → `Err(TaskError::Canceled)` (graceful)
//! - queue closed → `Ok(())`
//!
//! A producer never drops a reading on its own: the send waits as long as it takes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::{SendError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::queue::{BoundedQueue, Timeout};
use crate::reading::{Sample, SensorId};
use crate::tasks::period::{Period, Wake};
use crate::tasks::task::Task;

/// Parameter block owned by one producer for its whole lifetime.
pub struct ProducerParams<T> {
    /// Sensor this producer samples.
    pub sensor_id: SensorId,
    /// Sampling period.
    pub period: Duration,
    /// Queue the readings go to.
    pub queue: BoundedQueue<T>,
    /// Source of readings.
    pub sampler: Arc<dyn Sample<Item = T>>,
}

/// Periodic task that feeds one bounded queue.
pub struct PeriodicProducer<T> {
    name: Arc<str>,
    params: ProducerParams<T>,
    bus: Bus,
}

impl<T> PeriodicProducer<T> {
    /// Creates a producer named `producer-<sensor_id>`.
    pub fn new(params: ProducerParams<T>, bus: Bus) -> Self {
        let name = format!("producer-{}", params.sensor_id);
        Self {
            name: name.into(),
            params,
            bus,
        }
    }

    /// Parameters this producer was created with.
    pub fn params(&self) -> &ProducerParams<T> {
        &self.params
    }
}

#[async_trait]
impl<T: Send + 'static> Task for PeriodicProducer<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        let period = Period::new(self.params.period);
        let mut cycle: u64 = 0;

        loop {
            let t0 = Instant::now();
            let item = self.params.sampler.sample(self.params.sensor_id, cycle);
            cycle += 1;

            let sent = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(TaskError::Canceled),
                res = self.params.queue.send(item, Timeout::Infinite) => res,
            };
            match sent {
                Ok(()) => {}
                Err(SendError::Closed(_)) => return Ok(()),
                Err(SendError::TimedOut(_)) => {
                    return Err(TaskError::Fail {
                        error: "infinite send timed out".into(),
                    });
                }
            }

            match period.wake(t0, Instant::now()) {
                Wake::At(deadline) => {
                    tokio::select! {
                        biased;
                        _ = ctx.cancelled() => return Err(TaskError::Canceled),
                        _ = time::sleep_until(deadline) => {}
                    }
                }
                Wake::Overrun { late } => {
                    self.bus.publish(
                        Event::new(EventKind::PeriodOverrun)
                            .with_task(Arc::clone(&self.name))
                            .with_late(late),
                    );
                    // Give the consumer a turn before the next sample.
                    tokio::task::yield_now().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stamps each sample with the instant it was taken.
    struct Clock;

    impl Sample for Clock {
        type Item = Instant;

        fn sample(&self, _sensor: SensorId, _cycle: u64) -> Instant {
            Instant::now()
        }
    }

    fn producer(queue: &BoundedQueue<Instant>, period_ms: u64, bus: &Bus) -> Arc<PeriodicProducer<Instant>> {
        Arc::new(PeriodicProducer::new(
            ProducerParams {
                sensor_id: 0,
                period: Duration::from_millis(period_ms),
                queue: queue.clone(),
                sampler: Arc::new(Clock),
            },
            bus.clone(),
        ))
    }

    /// Pre-fills a capacity-1 queue and starts draining it after `delay`.
    fn delayed_drain(queue: &BoundedQueue<Instant>, delay_ms: u64) -> tokio::task::JoinHandle<Vec<Instant>> {
        let queue = queue.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(delay_ms)).await;
            let mut out = Vec::new();
            while let Some(at) = queue.receive(Timeout::Infinite).await {
                out.push(at);
            }
            out
        })
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_send_does_not_shift_the_schedule() {
        let bus = Bus::new(16);
        let queue = BoundedQueue::new(1).unwrap();
        let origin = Instant::now();
        queue.try_send(origin).unwrap();
        let drain = delayed_drain(&queue, 30);

        let token = CancellationToken::new();
        let p = producer(&queue, 100, &bus);
        let run = tokio::spawn({
            let token = token.clone();
            async move { p.run(token).await }
        });

        time::sleep(Duration::from_millis(450)).await;
        queue.close();
        assert!(run.await.unwrap().is_ok());

        let offsets: Vec<u128> = drain
            .await
            .unwrap()
            .iter()
            .skip(1)
            .map(|at| (*at - origin).as_millis())
            .collect();
        assert_eq!(offsets, vec![0, 100, 200, 300, 400]);
    }

    #[tokio::test(start_paused = true)]
    async fn overrun_skips_missed_wakeups() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let queue = BoundedQueue::new(1).unwrap();
        let origin = Instant::now();
        queue.try_send(origin).unwrap();
        let drain = delayed_drain(&queue, 350);

        let token = CancellationToken::new();
        let p = producer(&queue, 100, &bus);
        let run = tokio::spawn({
            let token = token.clone();
            async move { p.run(token).await }
        });

        time::sleep(Duration::from_millis(600)).await;
        token.cancel();
        assert!(matches!(run.await.unwrap(), Err(TaskError::Canceled)));
        queue.close();

        let offsets: Vec<u128> = drain
            .await
            .unwrap()
            .iter()
            .skip(1)
            .map(|at| (*at - origin).as_millis())
            .collect();
        // No burst at 100/200/300: the schedule restarts from the late cycle.
        assert_eq!(offsets, vec![0, 350, 450, 550]);

        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::PeriodOverrun);
        assert_eq!(ev.task.as_deref(), Some("producer-0"));
        assert_eq!(ev.late_ms, Some(250));
    }

    #[tokio::test]
    async fn cancellation_unblocks_a_full_queue_send() {
        let bus = Bus::new(16);
        let queue = BoundedQueue::new(1).unwrap();
        queue.try_send(Instant::now()).unwrap();

        let token = CancellationToken::new();
        let p = producer(&queue, 10, &bus);
        assert_eq!(p.params().period, Duration::from_millis(10));
        assert_eq!(p.params().queue.id(), queue.id());
        let run = tokio::spawn({
            let token = token.clone();
            async move { p.run(token).await }
        });
        tokio::task::yield_now().await;
        token.cancel();

        assert!(matches!(run.await.unwrap(), Err(TaskError::Canceled)));
        assert_eq!(queue.len(), 1);
    }
}

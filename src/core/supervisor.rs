//! # Supervisor: builds the acquisition topology, runs it, tears it down.
//!
//! The [`Supervisor`] owns the event bus, the task [`Registry`], and the
//! runtime cancellation token. One call to [`Supervisor::run`] drives the whole
//! lifecycle.
//!
//! ## High-level architecture
//! ```text
//! run():
//!   build_topology()
//!     ├─ cfg.validate()                        ── Err → StartupFailed, return
//!     ├─ QueueSet::new(set_capacity)           ── Err → StartupFailed, return
//!     ├─ for i in 0..sensors:
//!     │    BoundedQueue::new(queue_capacity)   ── Err → StartupFailed, return
//!     │    set.register(&queue)                ── Err → StartupFailed, return
//!     │    PeriodicProducer(ProducerParams{i, period, queue, sampler})
//!     └─ FanInConsumer("consumer", set, dispatch)
//!
//!   registry.spawn_all(specs)                  (descending priority)
//!
//!   wait: OS signal | shutdown()
//!
//! Teardown:
//!   Bus.publish(ShutdownRequested)
//!     └─► runtime_token.cancel()               → child tokens of every task
//!     └─► close queues and set                 → wakes any blocked send/select
//!     └─► registry.shutdown(cfg.grace):
//!            ├─ all joined  → Bus.publish(AllStoppedWithin), Ok(())
//!            └─ deadline    → Bus.publish(GraceExceeded), Err(GraceExceeded)
//! ```
//!
//! Subscriber delivery runs on a listener task spawned by the builder; it is
//! flushed before `run` returns so the last events reach every subscriber.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::{builder::SupervisorBuilder, registry::Registry, shutdown};
use crate::dispatch::Dispatch;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::queue::{BoundedQueue, QueueSet};
use crate::reading::{Reading, Sample, SensorId};
use crate::tasks::{FanInConsumer, PeriodicProducer, ProducerParams, TaskSpec};

/// Queues and tasks created at startup.
struct Topology {
    set: QueueSet<Reading>,
    queues: Vec<BoundedQueue<Reading>>,
    specs: Vec<TaskSpec>,
}

/// Coordinates producers, the consumer, event delivery, and graceful shutdown.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    registry: Arc<Registry>,
    runtime_token: CancellationToken,
    stop: CancellationToken,
    sampler: Arc<dyn Sample<Item = Reading>>,
    dispatch: Arc<dyn Dispatch<Reading>>,
    listener_stop: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Supervisor {
    /// Creates a builder for a supervisor with the given configuration.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        registry: Arc<Registry>,
        runtime_token: CancellationToken,
        sampler: Arc<dyn Sample<Item = Reading>>,
        dispatch: Arc<dyn Dispatch<Reading>>,
        listener_stop: CancellationToken,
        listener: JoinHandle<()>,
    ) -> Self {
        Self {
            cfg,
            bus,
            registry,
            runtime_token,
            stop: CancellationToken::new(),
            sampler,
            dispatch,
            listener_stop,
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Returns the runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the event bus (subscribe before `run` to observe startup).
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Returns the sorted names of the running tasks.
    pub async fn tasks(&self) -> Vec<String> {
        self.registry.list().await
    }

    /// Requests teardown, as if a termination signal had arrived.
    pub fn shutdown(&self) {
        self.stop.cancel();
    }

    /// Builds the topology, runs every task, and blocks until teardown completes.
    ///
    /// Returns `Ok(())` after a clean teardown. Startup errors are returned
    /// without spawning anything; `GraceExceeded` lists the tasks that did not stop.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        let res = self.run_inner().await;
        self.flush_subscribers().await;
        res
    }

    async fn run_inner(&self) -> Result<(), RuntimeError> {
        let topology = match self.build_topology() {
            Ok(t) => t,
            Err(e) => {
                self.bus
                    .publish(Event::new(EventKind::StartupFailed).with_reason(e.to_string()));
                return Err(e);
            }
        };

        self.registry.spawn_all(topology.specs).await;
        self.wait_for_stop().await;
        self.teardown(&topology.set, &topology.queues).await
    }

    /// Creates the set, one queue and producer per sensor, and the consumer.
    fn build_topology(&self) -> Result<Topology, RuntimeError> {
        self.cfg.validate()?;
        let set_capacity = self.cfg.set_capacity_resolved();
        let set = QueueSet::new(set_capacity).map_err(|source| RuntimeError::Queue {
            what: "queue set".into(),
            source,
        })?;
        self.bus.publish(
            Event::new(EventKind::SetCreated).with_reason(set_capacity.to_string()),
        );

        let mut queues = Vec::with_capacity(self.cfg.sensors);
        let mut specs = Vec::with_capacity(self.cfg.sensors + 1);
        for index in 0..self.cfg.sensors {
            let queue =
                BoundedQueue::new(self.cfg.queue_capacity).map_err(|source| RuntimeError::Queue {
                    what: format!("queue {index}"),
                    source,
                })?;
            self.bus.publish(
                Event::new(EventKind::QueueCreated)
                    .with_queue(queue.id())
                    .with_reason(queue.capacity().to_string()),
            );
            set.register(&queue)
                .map_err(|source| RuntimeError::Register { index, source })?;

            let producer = PeriodicProducer::new(
                ProducerParams {
                    sensor_id: index as SensorId,
                    period: self.cfg.period,
                    queue: queue.clone(),
                    sampler: Arc::clone(&self.sampler),
                },
                self.bus.clone(),
            );
            self.bus.publish(
                Event::new(EventKind::QueueRegistered)
                    .with_queue(queue.id())
                    .with_task(format!("producer-{index}")),
            );

            specs.push(TaskSpec::new(Arc::new(producer), self.cfg.producer_priority));
            queues.push(queue);
        }

        let consumer = FanInConsumer::new(
            "consumer",
            set.clone(),
            Arc::clone(&self.dispatch),
            self.bus.clone(),
        )
        .with_timeout(self.cfg.consumer_timeout());
        specs.push(TaskSpec::new(Arc::new(consumer), self.cfg.consumer_priority));

        Ok(Topology { set, queues, specs })
    }

    /// Blocks until an OS termination signal or an explicit [`Supervisor::shutdown`].
    async fn wait_for_stop(&self) {
        tokio::select! {
            res = shutdown::wait_for_shutdown_signal() => {
                if res.is_err() {
                    self.stop.cancelled().await;
                }
            }
            _ = self.stop.cancelled() => {}
        }
    }

    /// Cancels every task, unblocks the data path, and waits up to `grace`.
    async fn teardown(
        &self,
        set: &QueueSet<Reading>,
        queues: &[BoundedQueue<Reading>],
    ) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.runtime_token.cancel();
        for queue in queues {
            queue.close();
        }
        set.close();

        let grace = self.cfg.grace;
        match self.registry.shutdown(grace).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(stuck) => {
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join(", ")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Stops the bus listener after it has forwarded everything already published.
    async fn flush_subscribers(&self) {
        self.listener_stop.cancel();
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::dispatch::ChannelDispatch;
    use crate::error::RegisterError;
    use crate::queue::QueueId;
    use crate::subscribers::Subscribe;

    fn small(sensors: usize) -> Config {
        Config {
            sensors,
            period: Duration::from_millis(100),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn zero_capacities_fail_at_startup() {
        let cfg = Config {
            queue_capacity: 0,
            ..small(2)
        };
        let sup = Supervisor::builder(cfg.clone()).build();
        let err = sup.run().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Queue { ref what, .. } if what == "queue set"));

        let sup = Supervisor::builder(Config {
            set_capacity: 4,
            ..cfg
        })
        .build();
        let err = sup.run().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Queue { ref what, .. } if what == "queue 0"));
        assert!(err.is_startup());
    }

    #[tokio::test]
    async fn zero_period_is_rejected_before_any_queue_exists() {
        let sup = Supervisor::builder(Config {
            period: Duration::ZERO,
            ..small(2)
        })
        .build();
        assert!(sup.config().period.is_zero());
        let mut events = sup.bus().subscribe();

        let err = sup.run().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Config { field: "period", .. }));

        let ev = events.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::StartupFailed);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn undersized_set_reports_the_failing_queue() {
        let sup = Supervisor::builder(Config {
            queue_capacity: 10,
            set_capacity: 15,
            ..small(3)
        })
        .build();
        let mut events = sup.bus().subscribe();

        let err = sup.run().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Register {
                index: 1,
                source: RegisterError::SetFull { .. }
            }
        ));

        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::SetCreated,
                EventKind::QueueCreated,
                EventKind::QueueRegistered,
                EventKind::QueueCreated,
                EventKind::StartupFailed
            ]
        );
    }

    struct Counter(Arc<Mutex<usize>>);

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, _event: &Event) {
            *self.0.lock().unwrap() += 1;
        }

        fn name(&self) -> &'static str {
            "counter"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_until_shutdown_and_stops_within_grace() {
        let (sink, mut readings) = ChannelDispatch::<Reading>::new();
        let seen = Arc::new(Mutex::new(0));
        let sup = Supervisor::builder(small(3))
            .with_dispatch(Arc::new(sink))
            .with_subscribers(vec![Arc::new(Counter(Arc::clone(&seen)))])
            .build();
        let mut events = sup.bus().subscribe();

        let run = tokio::spawn({
            let sup = Arc::clone(&sup);
            async move { sup.run().await }
        });
        tokio::time::sleep(Duration::from_millis(1050)).await;
        assert_eq!(
            sup.tasks().await,
            vec!["consumer", "producer-0", "producer-1", "producer-2"]
        );
        sup.shutdown();
        assert!(run.await.unwrap().is_ok());

        let mut per_queue: HashMap<QueueId, Vec<Reading>> = HashMap::new();
        while let Ok((id, r)) = readings.try_recv() {
            assert!(Reading::TEMPERATURE.contains(&r.temperature));
            assert!(Reading::HUMIDITY.contains(&r.humidity));
            per_queue.entry(id).or_default().push(r);
        }
        assert_eq!(per_queue.len(), 3);
        for rs in per_queue.values() {
            assert!(rs.len() >= 10, "only {} readings", rs.len());
            assert!(rs.iter().all(|r| r.sensor_id == rs[0].sensor_id));
        }

        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::TaskStarting).count(),
            4
        );
        assert!(kinds.contains(&EventKind::ShutdownRequested));
        assert_eq!(kinds.last(), Some(&EventKind::AllStoppedWithin));
        assert!(*seen.lock().unwrap() >= kinds.len());
    }
}

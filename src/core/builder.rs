use std::sync::Arc;

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    dispatch::{Dispatch, StdoutDispatch},
    events::{Bus, Event},
    reading::{RandomSampler, Reading, Sample},
    subscribers::{Subscribe, SubscriberSet},
};

use super::{registry::Registry, supervisor::Supervisor};

/// Builder for constructing a Supervisor with optional collaborators.
pub struct SupervisorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    sampler: Option<Arc<dyn Sample<Item = Reading>>>,
    dispatch: Option<Arc<dyn Dispatch<Reading>>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            sampler: None,
            dispatch: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (topology, task lifecycle, data-path
    /// anomalies) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the reading source (default: [`RandomSampler`]).
    pub fn with_sampler(mut self, sampler: Arc<dyn Sample<Item = Reading>>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// Replaces the consumer's sink (default: [`StdoutDispatch`]).
    pub fn with_dispatch(mut self, dispatch: Arc<dyn Dispatch<Reading>>) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Builds and returns the Supervisor instance.
    ///
    /// Initializes the event bus, the registry, and the subscriber workers, and
    /// starts forwarding bus events to the subscribers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let runtime_token = CancellationToken::new();
        let registry = Registry::new(bus.clone(), runtime_token.clone());

        let listener_stop = CancellationToken::new();
        let listener = tokio::spawn(subscriber_listener(
            bus.subscribe(),
            subs,
            listener_stop.clone(),
        ));

        Arc::new(Supervisor::new_internal(
            self.cfg,
            bus,
            registry,
            runtime_token,
            self.sampler.unwrap_or_else(|| Arc::new(RandomSampler)),
            self.dispatch.unwrap_or_else(|| Arc::new(StdoutDispatch)),
            listener_stop,
            listener,
        ))
    }
}

/// Forwards bus events to the subscriber set until `stop` fires.
///
/// On stop, whatever is already buffered is forwarded before the subscriber
/// workers are drained.
async fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    subs: SubscriberSet,
    stop: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            res = rx.recv() => match res {
                Ok(ev) => subs.emit(&ev),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            _ = stop.cancelled() => {
                loop {
                    match rx.try_recv() {
                        Ok(ev) => subs.emit(&ev),
                        Err(TryRecvError::Lagged(_)) => continue,
                        Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                    }
                }
                break;
            }
        }
    }
    subs.shutdown().await;
}

//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to diagnostics emitted by the supervisor, the producers
//! and the consumer.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` (topology, shutdown), task runner
//!   (start/stop/fail), `PeriodicProducer` (overruns), `FanInConsumer`
//!   (spurious wakes), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the supervisor's subscriber listener, which fans out to
//!   the `SubscriberSet`; tests subscribe to the bus directly.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, Level};

//! # sensorhub
//!
//! **Sensorhub** is a small sensor-acquisition runtime built on tokio.
//!
//! Several periodic producers sample simulated sensors and push readings into
//! their own bounded queue. A single consumer waits on a queue set (a union of
//! those queues), picks whichever queue became ready first, fetches one
//! reading without blocking, and dispatches it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌──────────────┐   ┌──────────────┐         ┌──────────────┐
//!   │ producer-0   │   │ producer-1   │   ...   │ producer-N-1 │
//!   │ (period P)   │   │ (period P)   │         │ (period P)   │
//!   └──────┬───────┘   └──────┬───────┘         └──────┬───────┘
//!          │ send             │ send                   │ send
//!          ▼                  ▼                        ▼
//!   ┌──────────────┐   ┌──────────────┐         ┌──────────────┐
//!   │ BoundedQueue │   │ BoundedQueue │   ...   │ BoundedQueue │
//!   └──────┬───────┘   └──────┬───────┘         └──────┬───────┘
//!          └──────────────────┼────────────────────────┘
//!                             ▼   one notification per successful send
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  QueueSet (global ready FIFO of queue ids)                        │
//! └─────────────────────────────┬─────────────────────────────────────┘
//!                               ▼ select → try_receive → dispatch
//!                       ┌──────────────┐
//!                       │ FanInConsumer│ ──► Dispatch (stdout / channel)
//!                       └──────────────┘
//!
//! Every task publishes diagnostics:
//!   tasks ── publish(Event) ──► Bus ──► subscriber_listener ──► SubscriberSet
//!                                                         ┌─────────┼─────────┐
//!                                                         ▼         ▼         ▼
//!                                                      worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Config ──► SupervisorBuilder ──► Supervisor::run()
//!
//!   ├─► build set, queues, producers, consumer (errors are fatal: StartupFailed)
//!   ├─► spawn tasks by descending priority
//!   ├─► wait for SIGINT/SIGTERM or Supervisor::shutdown()
//!   └─► cancel tasks, close queues, join with grace
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                          |
//! |-------------------|-------------------------------------------------------------|---------------------------------------------|
//! | **Queues**        | Bounded FIFO and a queue set with arrival-order selection.  | [`BoundedQueue`], [`QueueSet`], [`Timeout`] |
//! | **Tasks**         | Periodic producers and the fan-in consumer.                 | [`PeriodicProducer`], [`FanInConsumer`]     |
//! | **Supervision**   | Static topology, startup checks and graceful teardown.      | [`Supervisor`], [`SupervisorBuilder`]       |
//! | **Subscriber API**| Hook into runtime events (logging, custom subscribers).     | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors for queues, registration and the runtime.      | [`QueueError`], [`RuntimeError`]            |
//! | **Configuration** | Topology and timing settings.                               | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging` (default): exports a simple built-in [`LogWriter`].
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use sensorhub::{Config, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn sensorhub::Subscribe>> = vec![Arc::new(sensorhub::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn sensorhub::Subscribe>> = Vec::new();
//!
//!     let sup = Supervisor::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     // Runs until Ctrl-C.
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod dispatch;
mod error;
mod events;
mod queue;
mod reading;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use core::{Supervisor, SupervisorBuilder};
pub use dispatch::{ChannelDispatch, Dispatch, StdoutDispatch};
pub use error::{QueueError, RegisterError, RuntimeError, SendError, TaskError};
pub use events::{Bus, Event, EventKind, Level};
pub use queue::{BoundedQueue, QueueId, QueueSet, Timeout};
pub use reading::{RandomSampler, Reading, Sample, SensorId};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    FanInConsumer, Period, PeriodicProducer, Priority, ProducerParams, Step, Task, TaskRef,
    TaskSpec, Wake,
};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

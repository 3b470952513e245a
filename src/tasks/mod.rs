//! # Tasks supervised by the runtime.
//!
//! - [`Task`] trait for async cancelable units, [`TaskRef`] shared handle
//! - [`TaskSpec`] a task plus its advisory [`Priority`]
//! - [`PeriodicProducer`] samples on an absolute-deadline schedule and sends
//! - [`FanInConsumer`] selects a ready queue, fetches and dispatches
//! - [`Period`] next-wake computation for absolute-deadline scheduling

mod consumer;
mod period;
mod producer;
mod spec;
mod task;

pub use consumer::{FanInConsumer, Step};
pub use period::{Period, Wake};
pub use producer::{PeriodicProducer, ProducerParams};
pub(crate) use spec::by_priority;
pub use spec::{Priority, TaskSpec};
pub use task::{Task, TaskRef};

//! Bounded queues and the queue set that multiplexes them.
//!
//! ## Contents
//! - [`BoundedQueue`] fixed-capacity FIFO with blocking `send`/`receive`
//! - [`QueueSet`] lets one consumer wait on "any member has data"
//! - [`Timeout`] poll / finite / infinite wait selector
//!
//! ## Protocol
//! ```text
//! producer ── send(item) ──► BoundedQueue ──(queue lock)──► items.push_back(item)
//!                                  │                         └─► ReadyList.push(queue id)
//!                                  ▼
//! consumer ◄── try_receive() ── QueueSet::queue(id) ◄── select() ◄── ReadyList (global FIFO)
//! ```
//!
//! ## Rules
//! - One successful send onto a member queue produces exactly one ready-notification.
//! - `select` consumes one notification; it never removes the item itself.
//! - Lock order is `set members → queue state → ready list`; the ready list
//!   lock is never held across an await.

mod bounded;
mod set;
mod timeout;

pub use bounded::{BoundedQueue, QueueId};
pub use set::QueueSet;
pub use timeout::Timeout;

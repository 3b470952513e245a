//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the fan-out [`SubscriberSet`],
//! and the built-in [`LogWriter`] (feature `logging`).
//!
//! ```text
//! Bus ──► Supervisor listener ──► SubscriberSet::emit(&Event)
//!                                   ├──► [queue S1] ─► worker S1 ─► on_event()
//!                                   └──► [queue SN] ─► worker SN ─► on_event()
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;

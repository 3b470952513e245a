//! Runtime core: topology, task lifecycle and teardown.
//!
//! The only public API from this module is [`Supervisor`] (and its builder).
//!
//! Internal modules:
//! - [`runner`]: runs one task for its lifetime and publishes start/stop/fail;
//! - [`registry`]: owns task handles, spawns by priority, joins with grace;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`supervisor`]: builds queues and the set, spawns tasks, drives teardown.

mod builder;
mod registry;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use supervisor::Supervisor;

//! # Dispatch sinks for consumed items.
//!
//! The consumer hands every item it fetches to a [`Dispatch`] implementation.
//!
//! - [`StdoutDispatch`] prints one line per item (`Display` form).
//! - [`ChannelDispatch`] forwards `(queue, item)` pairs into a tokio channel,
//!   useful when embedding the acquisition core in a larger service.

use std::fmt::Display;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::queue::QueueId;

/// Sink for items fetched by the consumer.
///
/// Called sequentially from the consumer task; a slow sink delays the next
/// `select`, which in turn back-pressures producers through their queues.
#[async_trait]
pub trait Dispatch<T>: Send + Sync + 'static {
    /// Handles one item fetched from queue `source`.
    async fn dispatch(&self, source: QueueId, item: T);
}

/// Prints each item on stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutDispatch;

#[async_trait]
impl<T> Dispatch<T> for StdoutDispatch
where
    T: Display + Send + 'static,
{
    async fn dispatch(&self, _source: QueueId, item: T) {
        println!("{item}");
    }
}

/// Forwards items into an unbounded channel.
#[derive(Clone, Debug)]
pub struct ChannelDispatch<T> {
    tx: mpsc::UnboundedSender<(QueueId, T)>,
}

impl<T> ChannelDispatch<T> {
    /// Creates the sink and the receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(QueueId, T)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl<T> Dispatch<T> for ChannelDispatch<T>
where
    T: Send + 'static,
{
    async fn dispatch(&self, source: QueueId, item: T) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send((source, item));
    }
}

//! # Fixed-capacity FIFO channel with blocking send and receive.
//!
//! [`BoundedQueue`] is a cheap-to-clone handle (`Arc` inside) over a mutex-protected
//! ring of items and two [`Notify`] wait lists (`not_empty`, `not_full`).
//!
//! ## Rules
//! - `0 ≤ len ≤ capacity` at all times; `send` waits iff the queue is full,
//!   `receive` waits iff it is empty.
//! - The check-modify-notify sequence runs under one lock per queue, so a
//!   wakeup can never slip between "observed full/empty" and "started waiting":
//!   the waiter registers with [`Notified::enable`] before it inspects state.
//! - If the queue is a member of a [`QueueSet`](crate::QueueSet), a successful
//!   `send` records the ready-notification while still holding the queue lock.
//! - [`BoundedQueue::close`] wakes every waiter; senders get `Closed(item)`,
//!   receivers drain what is left and then get `None`.
//!
//! [`Notified::enable`]: tokio::sync::futures::Notified::enable

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use super::set::ReadyList;
use super::timeout::Timeout;
use crate::error::{QueueError, RegisterError, SendError};

/// Global counter for queue identifiers.
static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`BoundedQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueId(u64);

impl QueueId {
    fn next() -> Self {
        Self(NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
    /// Ready list of the set this queue belongs to, if any.
    set: Option<Arc<ReadyList>>,
}

struct Shared<T> {
    id: QueueId,
    capacity: usize,
    state: Mutex<State<T>>,
    not_empty: Notify,
    not_full: Notify,
}

enum Push<T> {
    Done,
    Full(T),
    Closed(T),
}

enum Pop<T> {
    Item(T),
    Empty,
    Closed,
}

/// Fixed-capacity FIFO channel.
///
/// Cloning the handle does not copy the queue; all clones refer to the same storage.
///
/// # Example
/// ```
/// use sensorhub::{BoundedQueue, Timeout};
///
/// # tokio_test_block_on(async {
/// let q = BoundedQueue::new(10).unwrap();
/// for v in [5, 12, 7] {
///     q.send(v, Timeout::Poll).await.unwrap();
/// }
/// assert_eq!(q.receive(Timeout::Poll).await, Some(5));
/// assert_eq!(q.receive(Timeout::Poll).await, Some(12));
/// assert_eq!(q.receive(Timeout::Poll).await, Some(7));
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
/// # }
/// ```
pub struct BoundedQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("id", &self.shared.id)
            .field("capacity", &self.shared.capacity)
            .field("len", &self.len())
            .finish()
    }
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    ///
    /// Fails with [`QueueError::ZeroCapacity`] if `capacity == 0`.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        Ok(Self {
            shared: Arc::new(Shared {
                id: QueueId::next(),
                capacity,
                state: Mutex::new(State {
                    items: VecDeque::with_capacity(capacity),
                    closed: false,
                    set: None,
                }),
                not_empty: Notify::new(),
                not_full: Notify::new(),
            }),
        })
    }

    /// Identity of this queue (shared by all clones).
    pub fn id(&self) -> QueueId {
        self.shared.id
    }

    /// Maximum number of items.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// True if no items are stored.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// True if `len() == capacity()`.
    pub fn is_full(&self) -> bool {
        self.lock().items.len() == self.shared.capacity
    }

    /// True once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Appends `item` at the tail, waiting up to `timeout` for a free slot.
    ///
    /// On success, records a ready-notification in the owning queue set (if any)
    /// and wakes one waiting receiver. On failure the item is handed back.
    ///
    /// Dropping the returned future (e.g. losing a `tokio::select!` race against
    /// a cancellation token) leaves the queue untouched.
    pub async fn send(&self, item: T, timeout: impl Into<Timeout>) -> Result<(), SendError<T>> {
        let deadline = timeout.into().deadline();
        let mut item = item;
        loop {
            let notified = self.shared.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.push(item) {
                Push::Done => return Ok(()),
                Push::Closed(rejected) => return Err(SendError::Closed(rejected)),
                Push::Full(rejected) => item = rejected,
            }
            if !deadline.wait(notified).await {
                return Err(SendError::TimedOut(item));
            }
        }
    }

    /// Non-blocking send; equivalent to `send(item, Timeout::Poll)`.
    pub fn try_send(&self, item: T) -> Result<(), SendError<T>> {
        match self.push(item) {
            Push::Done => Ok(()),
            Push::Full(rejected) => Err(SendError::TimedOut(rejected)),
            Push::Closed(rejected) => Err(SendError::Closed(rejected)),
        }
    }

    /// Removes and returns the head item, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` on timeout, or when the queue is closed and drained.
    pub async fn receive(&self, timeout: impl Into<Timeout>) -> Option<T> {
        let deadline = timeout.into().deadline();
        loop {
            let notified = self.shared.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.pop() {
                Pop::Item(item) => return Some(item),
                Pop::Closed => return None,
                Pop::Empty => {}
            }
            if !deadline.wait(notified).await {
                return None;
            }
        }
    }

    /// Non-blocking receive; equivalent to `receive(Timeout::Poll)`.
    pub fn try_receive(&self) -> Option<T> {
        match self.pop() {
            Pop::Item(item) => Some(item),
            Pop::Empty | Pop::Closed => None,
        }
    }

    /// Closes the queue and wakes all waiters.
    ///
    /// Items already stored remain receivable. Idempotent.
    pub fn close(&self) {
        {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.shared.not_full.notify_waiters();
        self.shared.not_empty.notify_waiters();
    }

    /// Joins the ready list of a queue set.
    ///
    /// Checked under the queue lock: no current set, no stored items, and the
    /// set can reserve `capacity` notification slots.
    pub(crate) fn attach(&self, ready: &Arc<ReadyList>) -> Result<(), RegisterError> {
        let queue = self.shared.id;
        let mut state = self.lock();
        if state.set.is_some() {
            return Err(RegisterError::AlreadyMember { queue });
        }
        if !state.items.is_empty() {
            return Err(RegisterError::NotEmpty { queue });
        }
        ready
            .reserve(self.shared.capacity)
            .map_err(|free| RegisterError::SetFull {
                queue,
                needed: self.shared.capacity,
                free,
            })?;
        state.set = Some(Arc::clone(ready));
        Ok(())
    }

    /// Leaves the ready list of a queue set. Only an empty queue may leave.
    pub(crate) fn detach(&self, ready: &Arc<ReadyList>) -> Result<(), RegisterError> {
        let queue = self.shared.id;
        let mut state = self.lock();
        match &state.set {
            Some(current) if Arc::ptr_eq(current, ready) => {}
            _ => return Err(RegisterError::NotMember { queue }),
        }
        if !state.items.is_empty() {
            return Err(RegisterError::NotEmpty { queue });
        }
        ready.release(queue, self.shared.capacity);
        state.set = None;
        Ok(())
    }

    fn push(&self, item: T) -> Push<T> {
        {
            let mut state = self.lock();
            if state.closed {
                return Push::Closed(item);
            }
            if state.items.len() >= self.shared.capacity {
                return Push::Full(item);
            }
            state.items.push_back(item);
            if let Some(ready) = &state.set {
                ready.push(self.shared.id);
            }
        }
        self.shared.not_empty.notify_one();
        Push::Done
    }

    fn pop(&self) -> Pop<T> {
        let popped = {
            let mut state = self.lock();
            match state.items.pop_front() {
                Some(item) => Pop::Item(item),
                None if state.closed => Pop::Closed,
                None => Pop::Empty,
            }
        };
        if matches!(popped, Pop::Item(_)) {
            self.shared.not_full.notify_one();
        }
        popped
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // Critical sections never panic while mutating, so a poisoned lock
        // still guards consistent state.
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

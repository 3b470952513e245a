//! # Queue set: wait on a union of bounded queues.
//!
//! A [`QueueSet`] owns a [`ReadyList`], a global FIFO of queue identifiers.
//! Every successful send onto a member queue appends that queue's id; every
//! [`QueueSet::select`] consumes the oldest id. Selection therefore follows
//! notification-arrival order across all members, so a busy producer cannot
//! starve a quiet one.
//!
//! ## Two-step protocol
//! ```text
//! let id = set.select(Timeout::Infinite).await?;   // 1. which queue is ready
//! let item = set.queue(id)?.try_receive()?;         // 2. fetch without blocking
//! ```
//! If step 2 finds the queue empty, someone drained it outside the protocol.
//! That is a benign miss: the caller reports it and selects again.
//!
//! ## Capacity
//! The set is created with a fixed number of notification slots. Registering a
//! queue reserves `queue.capacity()` of them, so with well-behaved callers
//! pending notifications never exceed the set capacity.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use super::bounded::{BoundedQueue, QueueId};
use super::timeout::Timeout;
use crate::error::{QueueError, RegisterError};

struct ReadyState {
    fifo: VecDeque<QueueId>,
    reserved: usize,
    closed: bool,
}

/// Ready-notification FIFO shared between a set and its member queues.
pub(crate) struct ReadyList {
    capacity: usize,
    state: Mutex<ReadyState>,
    ready: Notify,
}

impl ReadyList {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(ReadyState {
                fifo: VecDeque::with_capacity(capacity),
                reserved: 0,
                closed: false,
            }),
            ready: Notify::new(),
        }
    }

    /// Records one ready-notification for `queue` and wakes one selector.
    pub(crate) fn push(&self, queue: QueueId) {
        self.lock().fifo.push_back(queue);
        self.ready.notify_one();
    }

    /// Reserves `needed` slots; on failure returns the number of free slots.
    pub(crate) fn reserve(&self, needed: usize) -> Result<(), usize> {
        let mut state = self.lock();
        let free = self.capacity - state.reserved;
        if needed > free {
            return Err(free);
        }
        state.reserved += needed;
        Ok(())
    }

    /// Returns `slots` to the pool and forgets stale notifications for `queue`.
    pub(crate) fn release(&self, queue: QueueId, slots: usize) {
        let mut state = self.lock();
        state.reserved = state.reserved.saturating_sub(slots);
        state.fifo.retain(|id| *id != queue);
    }

    fn pop(&self) -> Option<QueueId> {
        self.lock().fifo.pop_front()
    }

    fn lock(&self) -> MutexGuard<'_, ReadyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of [`BoundedQueue`]s that a single consumer can wait on as a union.
///
/// Cloning the handle does not copy the set.
pub struct QueueSet<T> {
    ready: Arc<ReadyList>,
    members: Arc<Mutex<HashMap<QueueId, BoundedQueue<T>>>>,
}

impl<T> Clone for QueueSet<T> {
    fn clone(&self) -> Self {
        Self {
            ready: Arc::clone(&self.ready),
            members: Arc::clone(&self.members),
        }
    }
}

impl<T> fmt::Debug for QueueSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueSet")
            .field("capacity", &self.ready.capacity)
            .field("members", &self.members())
            .field("pending", &self.pending())
            .finish()
    }
}

impl<T> QueueSet<T> {
    /// Creates an empty set with `capacity` notification slots.
    ///
    /// Fails with [`QueueError::ZeroCapacity`] if `capacity == 0`.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        Ok(Self {
            ready: Arc::new(ReadyList::new(capacity)),
            members: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Total notification slots, fixed at creation.
    pub fn capacity(&self) -> usize {
        self.ready.capacity
    }

    /// Notification slots not yet reserved by members.
    pub fn free(&self) -> usize {
        self.ready.capacity - self.ready.lock().reserved
    }

    /// Number of ready-notifications not yet consumed by `select`.
    pub fn pending(&self) -> usize {
        self.ready.lock().fifo.len()
    }

    /// Sorted identifiers of the member queues.
    pub fn members(&self) -> Vec<QueueId> {
        let mut ids: Vec<QueueId> = self.lock_members().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Adds `queue` to the set.
    ///
    /// Fails if the queue already belongs to a set, holds items, or needs more
    /// notification slots than remain free.
    pub fn register(&self, queue: &BoundedQueue<T>) -> Result<(), RegisterError> {
        let mut members = self.lock_members();
        queue.attach(&self.ready)?;
        members.insert(queue.id(), queue.clone());
        Ok(())
    }

    /// Removes an empty `queue` from the set and frees its reservation.
    pub fn unregister(&self, queue: &BoundedQueue<T>) -> Result<(), RegisterError> {
        let mut members = self.lock_members();
        queue.detach(&self.ready)?;
        members.remove(&queue.id());
        Ok(())
    }

    /// Returns the member queue with identifier `id`.
    pub fn queue(&self, id: QueueId) -> Option<BoundedQueue<T>> {
        self.lock_members().get(&id).cloned()
    }

    /// Waits until a member queue has a pending notification and returns its id.
    ///
    /// Consumes exactly one notification; the item stays in the queue.
    /// Returns `None` on timeout, or when the set is closed and no
    /// notifications remain.
    pub async fn select(&self, timeout: impl Into<Timeout>) -> Option<QueueId> {
        let deadline = timeout.into().deadline();
        loop {
            let notified = self.ready.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(id) = self.ready.pop() {
                return Some(id);
            }
            if self.is_closed() {
                return None;
            }
            if !deadline.wait(notified).await {
                return None;
            }
        }
    }

    /// Non-blocking select; equivalent to `select(Timeout::Poll)`.
    pub fn try_select(&self) -> Option<QueueId> {
        self.ready.pop()
    }

    /// Closes the set and wakes every selector.
    ///
    /// Pending notifications stay selectable.
    pub fn close(&self) {
        self.ready.lock().closed = true;
        self.ready.ready.notify_waiters();
    }

    /// True once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.ready.lock().closed
    }

    fn lock_members(&self) -> MutexGuard<'_, HashMap<QueueId, BoundedQueue<T>>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn queues(n: usize, cap: usize) -> Vec<BoundedQueue<u32>> {
        (0..n).map(|_| BoundedQueue::new(cap).unwrap()).collect()
    }

    #[test]
    fn register_reserves_capacity() {
        let set = QueueSet::new(20).unwrap();
        let qs = queues(3, 10);
        set.register(&qs[0]).unwrap();
        set.register(&qs[1]).unwrap();
        assert_eq!(set.free(), 0);

        let err = set.register(&qs[2]).unwrap_err();
        assert_eq!(
            err,
            RegisterError::SetFull {
                queue: qs[2].id(),
                needed: 10,
                free: 0
            }
        );
        assert_eq!(set.members().len(), 2);
    }

    #[test]
    fn queue_joins_at_most_one_set() {
        let a = QueueSet::new(10).unwrap();
        let b = QueueSet::new(10).unwrap();
        let q = BoundedQueue::<u32>::new(5).unwrap();

        a.register(&q).unwrap();
        assert_eq!(
            a.register(&q).unwrap_err(),
            RegisterError::AlreadyMember { queue: q.id() }
        );
        assert_eq!(
            b.register(&q).unwrap_err(),
            RegisterError::AlreadyMember { queue: q.id() }
        );

        a.unregister(&q).unwrap();
        b.register(&q).unwrap();
        assert_eq!(a.free(), 10);
        assert_eq!(b.free(), 5);
    }

    #[test]
    fn non_empty_queue_cannot_join_or_leave() {
        let set = QueueSet::new(10).unwrap();
        let q = BoundedQueue::new(5).unwrap();
        q.try_send(1u32).unwrap();
        assert_eq!(
            set.register(&q).unwrap_err(),
            RegisterError::NotEmpty { queue: q.id() }
        );

        q.try_receive();
        set.register(&q).unwrap();
        q.try_send(2).unwrap();
        assert_eq!(
            set.unregister(&q).unwrap_err(),
            RegisterError::NotEmpty { queue: q.id() }
        );

        let stranger = BoundedQueue::new(1).unwrap();
        assert_eq!(
            set.unregister(&stranger).unwrap_err(),
            RegisterError::NotMember {
                queue: stranger.id()
            }
        );
    }

    #[tokio::test]
    async fn select_returns_the_only_ready_queue() {
        let set = QueueSet::new(30).unwrap();
        let qs = queues(3, 10);
        for q in &qs {
            set.register(q).unwrap();
        }
        qs[1].send(42, Timeout::Poll).await.unwrap();

        let id = set.select(Timeout::Infinite).await.unwrap();
        assert_eq!(id, qs[1].id());
        assert_eq!(set.queue(id).unwrap().try_receive(), Some(42));
        assert_eq!(set.try_select(), None);
    }

    #[tokio::test]
    async fn select_follows_notification_order() {
        let set = QueueSet::new(30).unwrap();
        let qs = queues(3, 10);
        for q in &qs {
            set.register(q).unwrap();
        }
        let order = [2usize, 0, 0, 1, 2, 1];
        for (n, &i) in order.iter().enumerate() {
            qs[i].try_send(n as u32).unwrap();
        }
        assert_eq!(set.pending(), order.len());

        for (n, &i) in order.iter().enumerate() {
            let id = set.select(Timeout::Poll).await.unwrap();
            assert_eq!(id, qs[i].id());
            assert_eq!(set.queue(id).unwrap().try_receive(), Some(n as u32));
        }
    }

    #[tokio::test]
    async fn select_wakes_on_send() {
        let set = QueueSet::new(10).unwrap();
        let q = BoundedQueue::new(10).unwrap();
        set.register(&q).unwrap();

        let selector = {
            let set = set.clone();
            tokio::spawn(async move { set.select(Timeout::Infinite).await })
        };
        tokio::task::yield_now().await;
        q.send(1u32, Timeout::Infinite).await.unwrap();
        assert_eq!(selector.await.unwrap(), Some(q.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn select_times_out_and_unblocks_on_close() {
        let set = QueueSet::<u32>::new(10).unwrap();
        assert_eq!(set.select(Duration::from_millis(10)).await, None);
        assert_eq!(set.select(Timeout::Poll).await, None);

        let selector = {
            let set = set.clone();
            tokio::spawn(async move { set.select(Timeout::Infinite).await })
        };
        tokio::task::yield_now().await;
        set.close();
        assert_eq!(selector.await.unwrap(), None);
    }

    #[tokio::test]
    async fn direct_drain_leaves_a_benign_stale_notification() {
        let set = QueueSet::new(10).unwrap();
        let q = BoundedQueue::new(10).unwrap();
        set.register(&q).unwrap();
        q.try_send(7u32).unwrap();

        // Misuse: someone reads the member queue outside the protocol.
        assert_eq!(q.try_receive(), Some(7));

        let id = set.select(Timeout::Poll).await.unwrap();
        assert_eq!(set.queue(id).unwrap().try_receive(), None);
        assert_eq!(set.pending(), 0);
    }

    #[test]
    fn unregister_discards_stale_notifications() {
        let set = QueueSet::new(10).unwrap();
        let q = BoundedQueue::new(10).unwrap();
        set.register(&q).unwrap();
        q.try_send(1u32).unwrap();
        q.try_receive();
        assert_eq!(set.pending(), 1);

        set.unregister(&q).unwrap();
        assert_eq!(set.pending(), 0);
        assert!(set.queue(q.id()).is_none());
    }
}

//! The blocking coordinator: a mutex plus two condition variables wrapped
//! around the priority store.
//!
//! Every public operation acquires the one lock, inspects or mutates the
//! heap, and releases it before returning. The condition waits release the
//! lock during suspension and reacquire it on wake. There is no finer-grained
//! or lock-free path: the heap invariant and the capacity invariant must be
//! observed atomically together, and one lock is the cheapest way to get that.

use core::cmp::Ordering;
use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::heap::MinHeap;

/// Default pre-sizing of the backing storage when no hint is given.
const DEFAULT_CAPACITY_HINT: usize = 16;

/// Shared state behind every handle to one queue.
///
/// `capacity` is immutable after construction and needs no synchronization;
/// the heap is reachable only through the mutex.
pub(crate) struct Shared<T> {
    heap: Mutex<MinHeap<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

/// A thread-safe, capacity-bounded min-priority queue.
///
/// Producers block (or time out, or fail fast) when the queue is full;
/// consumers block when it is empty. Elements come out in ascending order
/// under `T`'s natural order or an injected comparator. Equal elements come
/// out in no particular order relative to each other — there is no FIFO
/// guarantee among ties, and no fairness guarantee among blocked threads.
///
/// Cloning a queue produces another handle to the *same* queue, so handles
/// can be moved into threads without an explicit `Arc`.
///
/// # Example
///
/// ```
/// use bounded_priority_queue::BoundedPriorityQueue;
/// use std::thread;
///
/// let queue = BoundedPriorityQueue::new(4);
/// let producer = queue.clone();
///
/// let handle = thread::spawn(move || {
///     for priority in [3u64, 1, 2] {
///         producer.put(priority);
///     }
/// });
///
/// handle.join().unwrap();
///
/// // Minimum first, regardless of insertion order.
/// assert_eq!(queue.take(), 1);
/// assert_eq!(queue.take(), 2);
/// assert_eq!(queue.take(), 3);
/// ```
pub struct BoundedPriorityQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Ord> BoundedPriorityQueue<T> {
    /// Creates a bounded queue ordering elements by their natural order.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_priority_queue::BoundedPriorityQueue;
    ///
    /// let queue: BoundedPriorityQueue<u64> = BoundedPriorityQueue::new(100);
    /// assert_eq!(queue.capacity(), 100);
    /// assert_eq!(queue.remaining_capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self::with_capacity_hint(capacity.min(DEFAULT_CAPACITY_HINT), capacity)
    }

    /// Creates a queue with no capacity bound.
    ///
    /// The bound is represented as `usize::MAX`; inserts never block.
    pub fn unbounded() -> Self {
        Self::with_capacity_hint(DEFAULT_CAPACITY_HINT, usize::MAX)
    }

    /// Creates a bounded queue with pre-sized backing storage.
    ///
    /// `hint` sizes the initial allocation; it does not bound anything.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn with_capacity_hint(hint: usize, capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");
        Self {
            shared: Arc::new(Shared {
                heap: Mutex::new(MinHeap::with_capacity(hint, None)),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
                capacity,
            }),
        }
    }

    /// Creates a bounded queue ordered by an injected comparator.
    ///
    /// The comparator defines a total order; the element comparing least is
    /// extracted first. It is fixed for the queue's lifetime.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_priority_queue::BoundedPriorityQueue;
    ///
    /// // Reverse the natural order: largest first.
    /// let queue = BoundedPriorityQueue::with_comparator(10, |a: &u64, b: &u64| b.cmp(a));
    ///
    /// queue.put(1);
    /// queue.put(3);
    /// queue.put(2);
    ///
    /// assert_eq!(queue.take(), 3);
    /// assert_eq!(queue.take(), 2);
    /// assert_eq!(queue.take(), 1);
    /// ```
    pub fn with_comparator<F>(capacity: usize, cmp: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        assert!(capacity > 0, "capacity must be at least 1");
        Self {
            shared: Arc::new(Shared {
                heap: Mutex::new(MinHeap::with_capacity(
                    capacity.min(DEFAULT_CAPACITY_HINT),
                    Some(Box::new(cmp)),
                )),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
                capacity,
            }),
        }
    }

    /// Creates a bounded queue seeded with existing elements.
    ///
    /// Heapifies `items` in O(n).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 or `items.len() > capacity`.
    pub fn from_vec(items: Vec<T>, capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");
        assert!(
            items.len() <= capacity,
            "initial elements exceed capacity ({} > {})",
            items.len(),
            capacity
        );
        Self {
            shared: Arc::new(Shared {
                heap: Mutex::new(MinHeap::from_vec(items, None)),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
                capacity,
            }),
        }
    }

    // ========================================================================
    // Blocking insert / remove
    // ========================================================================

    /// Inserts `value`, blocking while the queue is full.
    ///
    /// Signals a waiting consumer after the insert. Blocks indefinitely if
    /// no consumer ever frees a slot; use [`put_timeout`](Self::put_timeout)
    /// or [`put_cancellable`](Self::put_cancellable) for a bounded wait.
    pub fn put(&self, value: T) {
        let mut heap = self.lock();
        while heap.len() >= self.shared.capacity {
            heap = Self::wait(&self.shared.not_full, heap);
        }
        heap.push(value);
        self.shared.not_empty.notify_one();
    }

    /// Removes and returns the minimum element, blocking while empty.
    ///
    /// Signals a waiting producer after the extract.
    pub fn take(&self) -> T {
        let mut heap = self.lock();
        loop {
            if let Some(value) = heap.pop() {
                self.shared.not_full.notify_one();
                return value;
            }
            heap = Self::wait(&self.shared.not_empty, heap);
        }
    }

    /// Inserts `value`, blocking while full, unless `token` is cancelled.
    ///
    /// On cancellation the store is left untouched, the value is handed back
    /// inside the error, and the "not full" signal is passed on so another
    /// legitimately-waiting producer is not stranded.
    ///
    /// # Panics
    ///
    /// Panics if `token` was created by a different queue.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_priority_queue::BoundedPriorityQueue;
    ///
    /// let queue = BoundedPriorityQueue::new(1);
    /// queue.put(1u64);
    ///
    /// let token = queue.cancel_token();
    /// token.cancel();
    ///
    /// // The queue is full and the token already cancelled: the value
    /// // comes straight back.
    /// let err = queue.put_cancellable(2, &token).unwrap_err();
    /// assert_eq!(err.into_inner(), 2);
    /// assert_eq!(queue.len(), 1);
    /// ```
    pub fn put_cancellable(&self, value: T, token: &CancelToken<T>) -> Result<(), Cancelled<T>> {
        self.check_token(token);
        let mut heap = self.lock();
        loop {
            if token.is_cancelled() {
                // Hand our wakeup to a peer before abandoning the wait.
                self.shared.not_full.notify_one();
                return Err(Cancelled(value));
            }
            if heap.len() < self.shared.capacity {
                heap.push(value);
                self.shared.not_empty.notify_one();
                return Ok(());
            }
            heap = Self::wait(&self.shared.not_full, heap);
        }
    }

    /// Removes the minimum element, blocking while empty, unless `token` is
    /// cancelled.
    ///
    /// On cancellation the store is left untouched and the "not empty"
    /// signal is passed on to a peer consumer.
    ///
    /// # Panics
    ///
    /// Panics if `token` was created by a different queue.
    pub fn take_cancellable(&self, token: &CancelToken<T>) -> Result<T, Cancelled> {
        self.check_token(token);
        let mut heap = self.lock();
        loop {
            if token.is_cancelled() {
                self.shared.not_empty.notify_one();
                return Err(Cancelled(()));
            }
            if let Some(value) = heap.pop() {
                self.shared.not_full.notify_one();
                return Ok(value);
            }
            heap = Self::wait(&self.shared.not_empty, heap);
        }
    }

    // ========================================================================
    // Non-blocking insert / remove
    // ========================================================================

    /// Attempts to insert without blocking.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the queue is at capacity, handing the
    /// value back.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_priority_queue::{BoundedPriorityQueue, Full};
    ///
    /// let queue = BoundedPriorityQueue::new(2);
    ///
    /// assert!(queue.try_put(1u64).is_ok());
    /// assert!(queue.try_put(2).is_ok());
    /// assert!(matches!(queue.try_put(3), Err(Full(3))));
    /// ```
    pub fn try_put(&self, value: T) -> Result<(), Full<T>> {
        let mut heap = self.lock();
        if heap.len() >= self.shared.capacity {
            return Err(Full(value));
        }
        heap.push(value);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Attempts to remove the minimum element without blocking.
    ///
    /// Returns `None` if the queue is empty.
    pub fn try_take(&self) -> Option<T> {
        let mut heap = self.lock();
        let value = heap.pop();
        if value.is_some() {
            self.shared.not_full.notify_one();
        }
        value
    }

    // ========================================================================
    // Timed insert / remove
    // ========================================================================

    /// Inserts `value`, waiting at most `timeout` for a slot.
    ///
    /// Spurious or early wakes re-check the capacity against the remaining
    /// time; one final non-blocking attempt is made at expiry.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if no slot freed up within `timeout`.
    pub fn put_timeout(&self, value: T, timeout: Duration) -> Result<(), Full<T>> {
        let deadline = Instant::now() + timeout;
        let mut heap = self.lock();
        while heap.len() >= self.shared.capacity {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Err(Full(value));
            };
            let (guard, _) = self
                .shared
                .not_full
                .wait_timeout(heap, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            heap = guard;
        }
        heap.push(value);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Removes the minimum element, waiting at most `timeout` for one.
    ///
    /// Returns `None` if the queue stayed empty for the full duration.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_priority_queue::BoundedPriorityQueue;
    /// use std::time::Duration;
    ///
    /// let queue: BoundedPriorityQueue<u64> = BoundedPriorityQueue::new(4);
    /// assert_eq!(queue.take_timeout(Duration::from_millis(10)), None);
    /// ```
    pub fn take_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut heap = self.lock();
        loop {
            if let Some(value) = heap.pop() {
                self.shared.not_full.notify_one();
                return Some(value);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let (guard, _) = self
                .shared
                .not_empty
                .wait_timeout(heap, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            heap = guard;
        }
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Moves every element into `sink` in ascending priority order.
    ///
    /// Atomic: the lock is held for the whole transfer, so no concurrent
    /// insert or remove can interleave. Returns the number of elements
    /// moved and wakes blocked producers afterwards.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_priority_queue::BoundedPriorityQueue;
    ///
    /// let queue = BoundedPriorityQueue::from_vec(vec![3u64, 1, 2], 10);
    ///
    /// let mut sink = Vec::new();
    /// assert_eq!(queue.drain_to(&mut sink), 3);
    /// assert_eq!(sink, vec![1, 2, 3]);
    /// assert!(queue.is_empty());
    /// ```
    pub fn drain_to<S>(&self, sink: &mut S) -> usize
    where
        S: Extend<T>,
    {
        self.drain_to_limit(sink, usize::MAX)
    }

    /// Moves up to `max` elements into `sink` in ascending priority order.
    ///
    /// Moves exactly `min(len, max)` elements, atomically with respect to
    /// every other operation. Returns the number moved.
    pub fn drain_to_limit<S>(&self, sink: &mut S, max: usize) -> usize
    where
        S: Extend<T>,
    {
        let mut heap = self.lock();
        let mut moved = 0;
        while moved < max {
            match heap.pop() {
                Some(value) => {
                    sink.extend(core::iter::once(value));
                    moved += 1;
                }
                None => break,
            }
        }
        if moved > 0 {
            // Potentially many slots freed at once.
            self.shared.not_full.notify_all();
        }
        moved
    }

    /// Removes all elements without yielding them.
    ///
    /// Capacity and ordering are untouched; blocked producers are woken.
    pub fn clear(&self) {
        let mut heap = self.lock();
        let had_elements = !heap.is_empty();
        heap.clear();
        if had_elements {
            self.shared.not_full.notify_all();
        }
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Returns a clone of the minimum element without removing it.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock().peek().cloned()
    }

    /// Returns the number of elements currently in the queue.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the queue holds no elements.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns `true` if the queue is at capacity.
    pub fn is_full(&self) -> bool {
        self.lock().len() >= self.shared.capacity
    }

    /// The fixed capacity bound. `usize::MAX` means unbounded.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Slots still available: `capacity - len`.
    pub fn remaining_capacity(&self) -> usize {
        self.shared.capacity - self.lock().len()
    }

    /// `true` if the queue orders by an injected comparator rather than
    /// `T`'s natural order.
    pub fn has_comparator(&self) -> bool {
        self.lock().has_comparator()
    }

    /// Linear scan for an element equal to `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.lock().contains(value)
    }

    /// Removes one element equal to `value`.
    ///
    /// Returns `true` if an element was removed; the freed slot wakes a
    /// blocked producer. Which of several equal elements goes is
    /// unspecified.
    pub fn remove_value(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        let mut heap = self.lock();
        let removed = heap.remove(value);
        if removed {
            self.shared.not_full.notify_one();
        }
        removed
    }

    /// Captures a point-in-time copy and iterates it in ascending order.
    ///
    /// The copy is taken under the lock and iterated lock-free afterwards:
    /// it reflects the queue at the instant of the call and never sees later
    /// mutations. One-shot, not a live view.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_priority_queue::BoundedPriorityQueue;
    ///
    /// let queue = BoundedPriorityQueue::from_vec(vec![2u64, 1, 3], 10);
    ///
    /// let snapshot: Vec<u64> = queue.snapshot().collect();
    /// assert_eq!(snapshot, vec![1, 2, 3]);
    ///
    /// // The queue itself is untouched.
    /// assert_eq!(queue.len(), 3);
    /// ```
    pub fn snapshot(&self) -> Snapshot<T>
    where
        T: Clone,
    {
        Snapshot {
            inner: self.lock().sorted_vec().into_iter(),
        }
    }

    /// Returns an independent ascending copy of the contents.
    pub fn to_sorted_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.lock().sorted_vec()
    }

    /// Creates a token that can cancel blocking waits on this queue.
    ///
    /// See [`CancelToken`].
    pub fn cancel_token(&self) -> CancelToken<T> {
        CancelToken {
            shared: Arc::clone(&self.shared),
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Acquires the heap lock, absorbing poisoning.
    ///
    /// A panicking peer thread must not permanently wedge the queue; the
    /// heap remains structurally valid `Vec` storage either way.
    fn lock(&self) -> MutexGuard<'_, MinHeap<T>> {
        self.shared
            .heap
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(
        condvar: &Condvar,
        guard: MutexGuard<'a, MinHeap<T>>,
    ) -> MutexGuard<'a, MinHeap<T>> {
        condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    fn check_token(&self, token: &CancelToken<T>) {
        assert!(
            Arc::ptr_eq(&self.shared, &token.shared),
            "cancel token belongs to a different queue"
        );
    }
}

impl<T> Clone for BoundedPriorityQueue<T> {
    /// Returns another handle to the same queue.
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Ord> FromIterator<T> for BoundedPriorityQueue<T> {
    /// Collects into an unbounded queue.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            shared: Arc::new(Shared {
                heap: Mutex::new(MinHeap::from_vec(iter.into_iter().collect(), None)),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
                capacity: usize::MAX,
            }),
        }
    }
}

impl<T: Ord> fmt::Debug for BoundedPriorityQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedPriorityQueue")
            .field("len", &self.len())
            .field("capacity", &self.shared.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "serde")]
impl<T> BoundedPriorityQueue<T> {
    /// Runs `f` on the store under the queue lock. Serialization support.
    pub(crate) fn with_heap<R>(&self, f: impl FnOnce(&MinHeap<T>) -> R) -> R {
        f(&self
            .shared
            .heap
            .lock()
            .unwrap_or_else(PoisonError::into_inner))
    }

    /// Rebuilds a queue around an already-heapified store. Deserialization
    /// support; `capacity` is trusted to be >= the store's length.
    pub(crate) fn from_parts(heap: MinHeap<T>, capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                heap: Mutex::new(heap),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
                capacity,
            }),
        }
    }
}

/// Cancels blocking waits on the queue that created it.
///
/// A token is cheap to clone and safe to share; [`cancel`](Self::cancel) is
/// sticky — every current and future wait passed this token observes the
/// cancellation. Waits that were not handed the token are unaffected.
///
/// Cancellation wakes every waiter on the queue so each can re-check; a
/// waiter that finds its token cancelled abandons the wait, re-signals the
/// condition it was waiting on, and returns [`Cancelled`] without touching
/// the store.
pub struct CancelToken<T> {
    shared: Arc<Shared<T>>,
    flag: Arc<AtomicBool>,
}

impl<T> CancelToken<T> {
    /// Cancels every wait holding this token.
    ///
    /// Takes the queue lock before notifying: this closes the window where
    /// a waiter has checked the flag but not yet parked, which would
    /// otherwise lose the wakeup.
    pub fn cancel(&self) {
        self.flag.store(true, AtomicOrdering::SeqCst);
        let _guard = self
            .shared
            .heap
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.shared.not_full.notify_all();
        self.shared.not_empty.notify_all();
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(AtomicOrdering::SeqCst)
    }
}

impl<T> Clone for CancelToken<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            flag: Arc::clone(&self.flag),
        }
    }
}

impl<T> fmt::Debug for CancelToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// A point-in-time ascending iterator over a queue's contents.
///
/// Created by [`BoundedPriorityQueue::snapshot`]. Owns its copy of the
/// elements; iteration never touches the live queue.
#[derive(Debug)]
pub struct Snapshot<T> {
    inner: std::vec::IntoIter<T>,
}

impl<T> Iterator for Snapshot<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Snapshot<T> {}

impl<T> core::iter::FusedIterator for Snapshot<T> {}

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when a non-blocking or timed insert finds the queue full.
///
/// Contains the value that could not be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue is full")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}

/// Error returned when a blocking wait is abandoned via a [`CancelToken`].
///
/// On the insert side this carries the value that was never inserted; on the
/// remove side the payload is `()`. The store is guaranteed untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled<T = ()>(pub T);

impl<T> Cancelled<T> {
    /// Returns the value that was never inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Cancelled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wait cancelled")
    }
}

impl<T: fmt::Debug> std::error::Error for Cancelled<T> {}

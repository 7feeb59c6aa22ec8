//! # bounded-priority-queue
//!
//! A thread-safe, capacity-bounded priority queue that blocks producers when
//! full and consumers when empty.
//!
//! This is the safer stand-in for an unbounded priority queue: an unbounded
//! queue under a slow consumer grows until memory runs out, while this one
//! applies backpressure at a fixed bound chosen at construction.
//!
//! ## Semantics
//!
//! - **Min-priority**: extraction always yields the least element under `T`'s
//!   natural order, or under a comparator injected at construction. Ties are
//!   broken arbitrarily; equal elements have no FIFO guarantee.
//! - **Blocking**: [`put`](BoundedPriorityQueue::put) suspends while full,
//!   [`take`](BoundedPriorityQueue::take) suspends while empty. Non-blocking
//!   (`try_put` / `try_take`) and deadline-bounded (`put_timeout` /
//!   `take_timeout`) variants never suspend indefinitely.
//! - **One lock**: a single mutex guards the heap; two condition variables
//!   ("not full", "not empty") wake suspended callers as the state changes.
//!   Correctness depends on the heap mutation and the size check being
//!   observed atomically together, so there is deliberately no finer-grained
//!   path.
//! - **No fairness**: among concurrent blocked callers the wake order is
//!   unspecified. An element offered while the queue is full is not
//!   prioritized relative to other pending inserts until it actually enters
//!   the store.
//!
//! ## Example
//!
//! ```
//! use bounded_priority_queue::BoundedPriorityQueue;
//! use std::thread;
//!
//! let queue = BoundedPriorityQueue::new(3);
//!
//! queue.try_put(2u64).unwrap();
//! queue.try_put(3).unwrap();
//! queue.try_put(1).unwrap();
//!
//! // Full: a further non-blocking insert hands the value back.
//! assert!(queue.try_put(4).is_err());
//!
//! // A blocking insert completes once a consumer frees a slot.
//! let producer = queue.clone();
//! let handle = thread::spawn(move || producer.put(0));
//!
//! assert_eq!(queue.take(), 1);
//! handle.join().unwrap();
//!
//! let mut sink = Vec::new();
//! queue.drain_to(&mut sink);
//! assert_eq!(sink, vec![0, 2, 3]);
//! ```
//!
//! ## Cancellation
//!
//! A thread suspended in `put` or `take` waits until the queue state lets it
//! proceed. To abandon such a wait from outside, hand the blocking call a
//! [`CancelToken`]:
//!
//! ```
//! use bounded_priority_queue::BoundedPriorityQueue;
//! use std::thread;
//! use std::time::Duration;
//!
//! let queue: BoundedPriorityQueue<u64> = BoundedPriorityQueue::new(4);
//! let token = queue.cancel_token();
//!
//! let consumer = queue.clone();
//! let waiter_token = token.clone();
//! let handle = thread::spawn(move || consumer.take_cancellable(&waiter_token));
//!
//! thread::sleep(Duration::from_millis(50));
//! token.cancel();
//!
//! assert!(handle.join().unwrap().is_err());
//! ```
//!
//! A cancelled waiter leaves the store untouched and re-signals the
//! condition it was waiting on, so other legitimately-waiting threads are
//! never stranded by its departure.
//!
//! ## Snapshots
//!
//! [`snapshot`](BoundedPriorityQueue::snapshot) copies the contents under the
//! lock and iterates the copy lock-free, in ascending order. The iteration
//! reflects a single point in time and never sees later mutations.
//!
//! ## Serialization
//!
//! With the `serde` feature enabled the queue serializes its capacity and
//! contents, captured under the same lock as every other operation so the
//! snapshot is never torn. Deserialized queues use natural ordering — a
//! comparator is code and cannot round-trip.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod heap;
mod queue;

#[cfg(feature = "serde")]
mod serde_impl;

pub use queue::{BoundedPriorityQueue, CancelToken, Cancelled, Full, Snapshot};

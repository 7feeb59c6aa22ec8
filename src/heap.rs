//! The priority store: a binary min-heap over owned storage.
//!
//! Purely sequential; all synchronization lives one layer up in the
//! blocking coordinator. The heap orders elements by `T`'s natural order
//! or by an injected comparator fixed at construction.

use core::cmp::Ordering;

/// An injected total order over `T`.
///
/// Boxed so the queue stays a concrete type; `Send + Sync` because the heap
/// sits behind a lock shared across threads.
pub(crate) type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A binary min-heap with an optional comparator.
///
/// The root compares ≤ every other element under the configured order.
/// Ties are broken arbitrarily; equal elements come out in no particular
/// order relative to each other.
pub(crate) struct MinHeap<T> {
    data: Vec<T>,
    cmp: Option<Comparator<T>>,
}

impl<T: Ord> MinHeap<T> {
    /// Creates an empty heap with pre-sized backing storage.
    pub(crate) fn with_capacity(capacity: usize, cmp: Option<Comparator<T>>) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            cmp,
        }
    }

    /// Builds a heap from existing elements in O(n) via bottom-up heapify.
    pub(crate) fn from_vec(items: Vec<T>, cmp: Option<Comparator<T>>) -> Self {
        let mut heap = Self { data: items, cmp };
        let n = heap.data.len();
        for pos in (0..n / 2).rev() {
            heap.sift_down(pos);
        }
        heap
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a reference to the minimum element without removing it.
    #[inline]
    pub(crate) fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// `true` if the configured order came from an injected comparator.
    #[inline]
    pub(crate) fn has_comparator(&self) -> bool {
        self.cmp.is_some()
    }

    /// The raw heap-layout slice. Layout order, not sorted order.
    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Pushes a value, restoring the heap property by sifting up. O(log n).
    pub(crate) fn push(&mut self, value: T) {
        self.data.push(value);
        self.sift_up(self.data.len() - 1);
    }

    /// Removes and returns the minimum element. O(log n).
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.data.is_empty() {
            return None;
        }
        let last = self.data.len() - 1;
        self.data.swap(0, last);
        let min = self.data.pop();
        if !self.data.is_empty() {
            self.sift_down(0);
        }
        min
    }

    /// Drops every element. Capacity and order are untouched.
    #[inline]
    pub(crate) fn clear(&mut self) {
        self.data.clear();
    }

    /// Linear scan for an element equal to `value`.
    pub(crate) fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.data.iter().any(|x| x == value)
    }

    /// Removes one element equal to `value`, restoring the heap property.
    ///
    /// O(n) to find, O(log n) to re-heapify. Returns `false` if no element
    /// matched. Which of several equal elements is removed is unspecified.
    pub(crate) fn remove(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        let Some(pos) = self.data.iter().position(|x| x == value) else {
            return false;
        };
        let last = self.data.len() - 1;
        self.data.swap(pos, last);
        self.data.pop();
        if pos < last {
            // The element swapped in may belong above or below.
            self.sift_down(pos);
            self.sift_up(pos);
        }
        true
    }

    /// Produces an independent ascending copy of the contents.
    ///
    /// The copy reflects the heap at the instant of the call and never
    /// updates afterwards.
    pub(crate) fn sorted_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = self.data.clone();
        match &self.cmp {
            Some(cmp) => out.sort_unstable_by(|a, b| cmp(a, b)),
            None => out.sort_unstable(),
        }
        out
    }

    /// `true` if the element at `a` orders strictly before the element at `b`.
    #[inline]
    fn less(&self, a: usize, b: usize) -> bool {
        let ord = match &self.cmp {
            Some(cmp) => cmp(&self.data[a], &self.data[b]),
            None => self.data[a].cmp(&self.data[b]),
        };
        ord == Ordering::Less
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.less(pos, parent) {
                self.data.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.data.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let smaller = if right < len && self.less(right, left) {
                right
            } else {
                left
            };
            if self.less(smaller, pos) {
                self.data.swap(pos, smaller);
                pos = smaller;
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn natural(items: Vec<u64>) -> MinHeap<u64> {
        MinHeap::from_vec(items, None)
    }

    #[test]
    fn new_is_empty() {
        let heap: MinHeap<u64> = MinHeap::with_capacity(16, None);
        assert!(heap.is_empty());
        assert_eq!(heap.len(), 0);
        assert!(heap.peek().is_none());
    }

    #[test]
    fn push_pop_order() {
        let mut heap: MinHeap<u64> = MinHeap::with_capacity(16, None);

        heap.push(5);
        heap.push(1);
        heap.push(3);
        heap.push(2);
        heap.push(4);

        assert_eq!(heap.len(), 5);

        assert_eq!(heap.pop(), Some(1));
        assert_eq!(heap.pop(), Some(2));
        assert_eq!(heap.pop(), Some(3));
        assert_eq!(heap.pop(), Some(4));
        assert_eq!(heap.pop(), Some(5));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn peek_tracks_minimum() {
        let mut heap: MinHeap<u64> = MinHeap::with_capacity(16, None);

        assert!(heap.peek().is_none());

        heap.push(5);
        assert_eq!(heap.peek(), Some(&5));

        heap.push(1);
        assert_eq!(heap.peek(), Some(&1));

        heap.push(3);
        assert_eq!(heap.peek(), Some(&1));
    }

    #[test]
    fn from_vec_heapifies() {
        let mut heap = natural(vec![9, 4, 7, 1, 8, 2]);

        assert_eq!(heap.len(), 6);
        assert_eq!(heap.peek(), Some(&1));

        let mut drained = Vec::new();
        while let Some(v) = heap.pop() {
            drained.push(v);
        }
        assert_eq!(drained, vec![1, 2, 4, 7, 8, 9]);
    }

    #[test]
    fn comparator_inverts_order() {
        let mut heap: MinHeap<u64> =
            MinHeap::with_capacity(16, Some(Box::new(|a: &u64, b: &u64| b.cmp(a))));

        heap.push(1);
        heap.push(3);
        heap.push(2);

        assert!(heap.has_comparator());
        assert_eq!(heap.pop(), Some(3));
        assert_eq!(heap.pop(), Some(2));
        assert_eq!(heap.pop(), Some(1));
    }

    #[test]
    fn contains_and_remove() {
        let mut heap = natural(vec![10, 1, 5, 3]);

        assert!(heap.contains(&5));
        assert!(!heap.contains(&42));

        assert!(heap.remove(&5));
        assert!(!heap.contains(&5));
        assert_eq!(heap.len(), 3);

        // Heap property intact after the re-heapify.
        assert_eq!(heap.pop(), Some(1));
        assert_eq!(heap.pop(), Some(3));
        assert_eq!(heap.pop(), Some(10));
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut heap = natural(vec![1, 2, 3]);
        assert!(!heap.remove(&42));
        assert_eq!(heap.len(), 3);
    }

    #[test]
    fn remove_root_and_last() {
        let mut heap = natural(vec![1, 2, 3, 4]);

        assert!(heap.remove(&1));
        assert_eq!(heap.peek(), Some(&2));

        // Removing the element sitting in the last slot exercises the
        // pos == last branch.
        let last = *heap.as_slice().last().unwrap();
        assert!(heap.remove(&last));
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn duplicates() {
        let mut heap = natural(vec![5, 5, 5]);

        assert_eq!(heap.pop(), Some(5));
        assert_eq!(heap.pop(), Some(5));
        assert_eq!(heap.pop(), Some(5));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn sorted_vec_is_independent() {
        let mut heap = natural(vec![3, 1, 2]);

        let snapshot = heap.sorted_vec();
        assert_eq!(snapshot, vec![1, 2, 3]);

        heap.pop();
        // The copy does not see the mutation.
        assert_eq!(snapshot, vec![1, 2, 3]);
    }

    #[test]
    fn sorted_vec_respects_comparator() {
        let heap: MinHeap<u64> = MinHeap::from_vec(
            vec![1, 3, 2],
            Some(Box::new(|a: &u64, b: &u64| b.cmp(a))),
        );
        assert_eq!(heap.sorted_vec(), vec![3, 2, 1]);
    }

    #[test]
    fn clear_resets_len_only() {
        let mut heap = natural(vec![1, 2, 3]);
        heap.clear();
        assert!(heap.is_empty());
        heap.push(7);
        assert_eq!(heap.peek(), Some(&7));
    }

    #[test]
    fn stress_push_pop() {
        let mut heap: MinHeap<u64> = MinHeap::with_capacity(1024, None);

        for i in 0..1000u64 {
            heap.push((i * 7 + 13) % 1000); // Deterministic scramble
        }

        let mut last = 0;
        while let Some(v) = heap.pop() {
            assert!(v >= last, "heap order violated");
            last = v;
        }
    }
}

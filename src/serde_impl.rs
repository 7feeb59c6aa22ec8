//! Snapshot serialization for the queue (feature `serde`).
//!
//! Capacity and contents are captured while holding the same lock as every
//! other operation, so the encoded state is never torn mid-mutation. A
//! comparator is code, not data: deserialized queues always use natural
//! ordering.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::heap::MinHeap;
use crate::queue::BoundedPriorityQueue;

/// Borrowed wire form, written under the queue lock.
#[derive(Serialize)]
struct QueueRepr<'a, T> {
    capacity: usize,
    elements: &'a [T],
}

/// Owned wire form, re-heapified on decode.
#[derive(Deserialize)]
struct QueueReprOwned<T> {
    capacity: usize,
    elements: Vec<T>,
}

impl<T: Ord + Serialize> Serialize for BoundedPriorityQueue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_heap(|heap| {
            QueueRepr {
                capacity: self.capacity(),
                elements: heap.as_slice(),
            }
            .serialize(serializer)
        })
    }
}

impl<'de, T: Ord + Deserialize<'de>> Deserialize<'de> for BoundedPriorityQueue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = QueueReprOwned::<T>::deserialize(deserializer)?;
        if repr.capacity == 0 {
            return Err(D::Error::custom("capacity must be at least 1"));
        }
        if repr.elements.len() > repr.capacity {
            return Err(D::Error::custom(format!(
                "element count exceeds capacity ({} > {})",
                repr.elements.len(),
                repr.capacity
            )));
        }
        Ok(Self::from_parts(
            MinHeap::from_vec(repr.elements, None),
            repr.capacity,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::BoundedPriorityQueue;

    #[test]
    fn round_trip_preserves_contents_and_capacity() {
        let queue = BoundedPriorityQueue::from_vec(vec![5u64, 1, 3], 10);

        let encoded = serde_json::to_string(&queue).unwrap();
        let decoded: BoundedPriorityQueue<u64> = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.capacity(), 10);
        assert_eq!(decoded.to_sorted_vec(), queue.to_sorted_vec());
    }

    #[test]
    fn round_trip_of_unbounded_queue() {
        let queue: BoundedPriorityQueue<u64> = [2u64, 1].into_iter().collect();

        let encoded = serde_json::to_string(&queue).unwrap();
        let decoded: BoundedPriorityQueue<u64> = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.capacity(), usize::MAX);
        assert_eq!(decoded.take(), 1);
        assert_eq!(decoded.take(), 2);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let err =
            serde_json::from_str::<BoundedPriorityQueue<u64>>(r#"{"capacity":1,"elements":[1,2]}"#)
                .unwrap_err();
        assert!(err.to_string().contains("exceeds capacity"));
    }

    #[test]
    fn zero_capacity_payload_is_rejected() {
        assert!(
            serde_json::from_str::<BoundedPriorityQueue<u64>>(r#"{"capacity":0,"elements":[]}"#)
                .is_err()
        );
    }

    #[test]
    fn decoded_queue_still_blocks_at_capacity() {
        let queue = BoundedPriorityQueue::from_vec(vec![1u64, 2], 2);

        let encoded = serde_json::to_string(&queue).unwrap();
        let decoded: BoundedPriorityQueue<u64> = serde_json::from_str(&encoded).unwrap();

        assert!(decoded.try_put(3).is_err());
        assert_eq!(decoded.try_take(), Some(1));
        assert!(decoded.try_put(3).is_ok());
    }
}

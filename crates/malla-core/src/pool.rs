//! The snapshot pool: `N` pre-allocated slots, with ownership of each one
//! passed between a producer and a consumer thread exclusively by moving a
//! `Box<T>` through a pair of [`queue`](crate::queue)s — never locks, never
//! shared references, never aliased.
//!
//! One slot starts out "active", owned directly by the consumer thread. To
//! publish an edit, the producer thread acquires a free slot (copy-on-write:
//! it starts as a copy of whatever the consumer thread is currently holding
//! as active), mutates it, and enqueues it as the new ready snapshot. The
//! consumer thread periodically drains the ready queue for the newest
//! snapshot, swaps to it, and returns its previous active slot to the free
//! queue. Every slot that ever exists is allocated once, at [`snapshot_channel`]
//! construction time; steady-state `edit_and_publish`/`try_swap` traffic
//! never allocates.

use crate::queue::{self, Consumer, Producer};

/// Producer-side handle onto a snapshot channel: acquires a free slot,
/// edits it, and publishes it for the consumer to pick up.
pub struct SnapshotProducer<T> {
    free: Consumer<Box<T>>,
    ready: Producer<Box<T>>,
}

/// Consumer-side handle onto a snapshot channel: swaps to the newest
/// published slot and returns retired slots to the free pool.
pub struct SnapshotConsumer<T> {
    free: Producer<Box<T>>,
    ready: Consumer<Box<T>>,
}

impl<T: Copy> SnapshotProducer<T> {
    /// Take a free slot seeded with a copy of `active`, run `edit` on it,
    /// and publish it for the consumer thread to swap to. Returns `false`
    /// (the edit is dropped) if every slot is currently in flight or held
    /// active, or if the ready queue was already full.
    pub fn edit_and_publish(&mut self, active: &T, edit: impl FnOnce(&mut T)) -> bool {
        let Some(mut slot) = self.free.dequeue() else {
            return false;
        };
        *slot = *active;
        edit(&mut slot);
        self.ready.enqueue(slot).is_ok()
    }
}

impl<T: Copy> SnapshotConsumer<T> {
    /// Take the most recently published slot, if any, returning its
    /// contents and releasing the previously active slot back to the free
    /// queue. Returns `active` unchanged if nothing new was published.
    pub fn try_swap(&mut self, active: Box<T>) -> Box<T> {
        let Some(mut newest) = self.ready.dequeue() else {
            return active;
        };
        // Drain any further backlog, keeping only the newest and returning
        // superseded slots to the free pool without ever activating them.
        while let Some(next) = self.ready.dequeue() {
            let _ = self.free.enqueue(newest);
            newest = next;
        }
        let _ = self.free.enqueue(active);
        newest
    }
}

/// Build a snapshot channel with room for `capacity` slots, `capacity >= 2`,
/// pre-allocated as copies of `initial`. Returns the producer half, the
/// consumer half, and the one slot held back as the consumer's initial
/// active snapshot.
pub fn snapshot_channel<T: Copy>(capacity: usize, initial: T) -> (SnapshotProducer<T>, SnapshotConsumer<T>, Box<T>) {
    assert!(capacity >= 2, "a snapshot channel needs at least two slots");

    let (mut free_tx, free_rx) = queue::channel(capacity);
    let (ready_tx, ready_rx) = queue::channel(capacity);

    for _ in 1..capacity {
        let _ = free_tx.enqueue(Box::new(initial));
    }

    (
        SnapshotProducer {
            free: free_rx,
            ready: ready_tx,
        },
        SnapshotConsumer {
            free: free_tx,
            ready: ready_rx,
        },
        Box::new(initial),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Model, Point, Value};

    #[test]
    fn acquire_then_publish_then_swap() {
        let (mut producer, mut consumer, active) = snapshot_channel(3, Model::new());

        let published = producer.edit_and_publish(&active, |m| {
            m.set(Point::new(0, 0), Value::literal(7));
        });
        assert!(published);

        let newest = consumer.try_swap(active);
        assert_eq!(newest.get(Point::new(0, 0)), Value::literal(7));
    }

    #[test]
    fn intermediate_snapshots_return_to_free_without_activation() {
        let (mut producer, mut consumer, active) = snapshot_channel(3, Model::new());

        assert!(producer.edit_and_publish(&active, |m| {
            m.set(Point::new(0, 0), Value::literal(1));
        }));
        assert!(producer.edit_and_publish(&active, |m| {
            m.set(Point::new(0, 0), Value::literal(2));
        }));

        let newest = consumer.try_swap(active);
        assert_eq!(newest.get(Point::new(0, 0)), Value::literal(2));

        // The superseded first edit's slot should be back on the free list,
        // reusable for another publish.
        assert!(producer.edit_and_publish(&newest, |_| {}));
    }

    #[test]
    fn exhausted_pool_returns_false() {
        let (mut producer, _consumer, active) = snapshot_channel(2, Model::new());
        assert!(producer.edit_and_publish(&active, |_| {}));
        assert!(!producer.edit_and_publish(&active, |_| {}));
    }

    #[test]
    fn try_swap_is_noop_without_a_publish() {
        let (_producer, mut consumer, active) = snapshot_channel(2, Model::new());
        let same = consumer.try_swap(active);
        assert_eq!(same.get(Point::new(0, 0)), Value::NONE);
    }

    #[test]
    #[should_panic]
    fn too_few_slots_panics() {
        let _ = snapshot_channel(1, Model::new());
    }
}

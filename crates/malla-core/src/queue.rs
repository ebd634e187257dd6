//! Fixed-capacity single-producer/single-consumer lock-free queue.
//!
//! A thin wrapper over [`rtrb`]'s ring buffer: `channel` splits a
//! preallocated buffer into a [`Producer`] and a [`Consumer`] half, each
//! `Send` but not `Sync`, so ownership of the two ends is handed to exactly
//! one thread apiece at construction time and never shared again. Neither
//! half ever blocks or takes a lock — `enqueue`/`dequeue` are lock-free
//! atomic operations on the ring buffer's internal head/tail indices, the
//! same mechanism real-time audio code reaches for (the underlying
//! `rtrb::RingBuffer` never allocates past construction).

use rtrb::RingBuffer;

/// The producer half of an SPSC channel. Owned by exactly one thread.
pub struct Producer<T> {
    inner: rtrb::Producer<T>,
}

/// The consumer half of an SPSC channel. Owned by exactly one thread.
pub struct Consumer<T> {
    inner: rtrb::Consumer<T>,
}

/// Split a ring buffer with room for `capacity` elements into its
/// producer/consumer halves.
pub fn channel<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let (inner_producer, inner_consumer) = RingBuffer::new(capacity);
    (
        Producer {
            inner: inner_producer,
        },
        Consumer {
            inner: inner_consumer,
        },
    )
}

impl<T> Producer<T> {
    /// Push `element` onto the queue.
    ///
    /// Returns `element` back if the queue was full.
    pub fn enqueue(&mut self, element: T) -> Result<(), T> {
        self.inner.push(element).map_err(|rtrb::PushError::Full(v)| v)
    }

    /// True if the queue has no room for another element right now.
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }
}

impl<T> Consumer<T> {
    /// Pop the oldest element, or `None` if the queue was empty.
    pub fn dequeue(&mut self) -> Option<T> {
        self.inner.pop().ok()
    }

    /// True if no elements are queued right now.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let (mut tx, mut rx) = channel(4);
        assert!(tx.enqueue(1).is_ok());
        assert!(tx.enqueue(2).is_ok());
        assert!(tx.enqueue(3).is_ok());
        assert_eq!(rx.dequeue(), Some(1));
        assert_eq!(rx.dequeue(), Some(2));
        assert_eq!(rx.dequeue(), Some(3));
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn full_enqueue_returns_the_element() {
        let (mut tx, mut rx) = channel(2);
        assert!(tx.enqueue(1).is_ok());
        assert!(tx.enqueue(2).is_ok());
        assert_eq!(tx.enqueue(3), Err(3));
        assert_eq!(rx.dequeue(), Some(1));
        assert!(tx.enqueue(3).is_ok());
        assert_eq!(rx.dequeue(), Some(2));
        assert_eq!(rx.dequeue(), Some(3));
    }

    #[test]
    fn wraps_around_capacity() {
        let (mut tx, mut rx) = channel(3);
        for i in 0..3 {
            assert!(tx.enqueue(i).is_ok());
        }
        for _ in 0..2 {
            rx.dequeue();
        }
        assert!(tx.enqueue(10).is_ok());
        assert!(tx.enqueue(11).is_ok());
        assert_eq!(rx.dequeue(), Some(2));
        assert_eq!(rx.dequeue(), Some(10));
        assert_eq!(rx.dequeue(), Some(11));
    }

    #[test]
    fn cross_thread_fifo() {
        use std::thread;

        let (mut tx, mut rx) = channel::<u32>(1024);
        let producer = thread::spawn(move || {
            for i in 0..1000 {
                loop {
                    if tx.enqueue(i).is_ok() {
                        break;
                    }
                }
            }
        });
        producer.join().unwrap();

        let mut out = Vec::new();
        while let Some(v) = rx.dequeue() {
            out.push(v);
        }
        assert_eq!(out, (0..1000).collect::<Vec<_>>());
    }
}

//! Blocking two-lock FIFO queue.
//!
//! Producers serialize on the tail lock, consumers on the head lock, so a
//! push and a pop only contend with each other when the queue crosses an
//! empty/non-empty boundary. With three or more items in flight, one node
//! can be popped, one mid-link, and one appended, all concurrently.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

// `next` is written by a producer holding the tail lock and read by a
// consumer holding the head lock; the Release/Acquire pair on it is what
// publishes a freshly linked node (and its item) across that boundary.
struct Node<T> {
    item: T,
    next: AtomicPtr<Node<T>>,
}

struct Head<T> {
    first: *mut Node<T>,
    closed: bool,
}

struct Tail<T> {
    last: *mut Node<T>,
}

/// Unbounded FIFO for concurrent producers and consumers.
///
/// `push` never blocks; `pop` blocks until an item arrives or the queue is
/// closed. Items come out in the order their pushes were serialized by the
/// tail lock.
pub struct BlockingQueue<T> {
    head: Mutex<Head<T>>,
    tail: Mutex<Tail<T>>,
    ready: Condvar,
}

// The end pointers are only dereferenced under the lock owning that end of
// the chain, and items move through by value.
unsafe impl<T: Send> Send for BlockingQueue<T> {}
unsafe impl<T: Send> Sync for BlockingQueue<T> {}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self {
            head: Mutex::new(Head {
                first: ptr::null_mut(),
                closed: false,
            }),
            tail: Mutex::new(Tail {
                last: ptr::null_mut(),
            }),
            ready: Condvar::new(),
        }
    }

    /// Appends `item` at the tail. Never blocks on consumers.
    pub fn push(&self, item: T) {
        let node = Box::into_raw(Box::new(Node {
            item,
            next: AtomicPtr::new(ptr::null_mut()),
        }));

        let mut tail = self.tail.lock();
        if !tail.last.is_null() {
            // Non-empty fast path: only the producer end moves.
            unsafe { (*tail.last).next.store(node, Ordering::Release) };
            tail.last = node;
            return;
        }

        // Empty -> non-empty: both ends move together, so the head lock is
        // taken as well, always after the tail lock. A consumer acquires
        // them in the opposite order only when `first` is non-null, and
        // `first` and `last` are null together, so the two cross
        // acquisitions can never face each other.
        let mut head = self.head.lock();
        head.first = node;
        tail.last = node;
        // Signal under the head lock; waiters re-check `first` under it.
        self.ready.notify_one();
    }

    /// Removes the oldest item, blocking while the queue is empty.
    ///
    /// Returns `None` when the wait is cancelled by [`close`](Self::close)
    /// and nothing is queued; items pushed before the close are still
    /// handed out.
    pub fn pop(&self) -> Option<T> {
        let mut head = self.head.lock();
        while head.first.is_null() {
            if head.closed {
                return None;
            }
            self.ready.wait(&mut head);
        }

        let node = head.first;
        let next = unsafe { (*node).next.load(Ordering::Acquire) };
        if !next.is_null() {
            head.first = next;
        } else {
            // Taking the only node empties the queue, so both ends must
            // move. A producer may have appended between the load of
            // `next` above and this acquisition; re-check under both
            // locks before declaring the queue empty.
            let mut tail = self.tail.lock();
            let next = unsafe { (*node).next.load(Ordering::Acquire) };
            if next.is_null() {
                head.first = ptr::null_mut();
                tail.last = ptr::null_mut();
            } else {
                head.first = next;
            }
        }

        if !head.first.is_null() {
            // Items remain; pass the wakeup along to the next waiter.
            self.ready.notify_one();
        }
        drop(head);

        let node = unsafe { Box::from_raw(node) };
        Some(node.item)
    }

    /// Cancels every blocked and future empty-queue wait.
    ///
    /// `push` still works after a close; whether post-close items are ever
    /// popped is up to the consumers.
    pub fn close(&self) {
        let mut head = self.head.lock();
        head.closed = true;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.head.lock().closed
    }

    pub fn is_empty(&self) -> bool {
        self.head.lock().first.is_null()
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for BlockingQueue<T> {
    fn drop(&mut self) {
        let mut cur = self.head.get_mut().first;
        while !cur.is_null() {
            let node = unsafe { Box::from_raw(cur) };
            cur = node.next.load(Ordering::Relaxed);
        }
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = self.head.lock();
        f.debug_struct("BlockingQueue")
            .field("empty", &head.first.is_null())
            .field("closed", &head.closed)
            .finish()
    }
}

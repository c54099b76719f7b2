//! Blocking FIFO hand-off between many producers and a consumer
//!
//! All queue state lives behind one mutex. Two condition variables split the
//! signalling: `pushed` wakes a blocked `pop`, `drained` wakes threads parked
//! in `wait_empty` once a pop leaves the queue empty.

use crate::core::sync::handle_mutex_poison;
use crate::queue::error::{QueueError, QueueResult};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Thread-safe FIFO queue whose `pop` blocks until an item is available
///
/// The queue does not release threads blocked in `pop` when it is dropped.
/// Consumers should be sent a sentinel item and joined before the queue goes
/// away.
///
/// # Example
///
/// ```rust
/// use msgbroker::queue::BlockingQueue;
/// use std::sync::Arc;
///
/// let queue = Arc::new(BlockingQueue::new());
/// let producer = {
///     let queue = Arc::clone(&queue);
///     std::thread::spawn(move || queue.push("hello").unwrap())
/// };
/// assert_eq!(queue.pop().unwrap(), "hello");
/// producer.join().unwrap();
/// ```
#[derive(Debug)]
pub struct BlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    /// Signalled once per push
    pushed: Condvar,
    /// Signalled when a pop empties the queue
    drained: Condvar,
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            pushed: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    fn lock(&self) -> QueueResult<MutexGuard<'_, VecDeque<T>>> {
        handle_mutex_poison(self.items.lock(), |message| QueueError::Poisoned { message })
    }

    /// Append an item at the tail and wake one blocked consumer
    pub fn push(&self, item: T) -> QueueResult<()> {
        let mut items = self.lock()?;
        items.push_back(item);
        self.pushed.notify_one();
        Ok(())
    }

    /// Remove and return the head item, blocking while the queue is empty
    pub fn pop(&self) -> QueueResult<T> {
        let mut items = self.lock()?;
        loop {
            if let Some(item) = items.pop_front() {
                if items.is_empty() {
                    self.drained.notify_all();
                }
                return Ok(item);
            }
            // Spurious wake-ups land back here and re-check.
            items = handle_mutex_poison(self.pushed.wait(items), |message| {
                QueueError::Poisoned { message }
            })?;
        }
    }

    /// Remove the head item if there is one, without blocking
    pub fn try_pop(&self) -> QueueResult<Option<T>> {
        let mut items = self.lock()?;
        let item = items.pop_front();
        if item.is_some() && items.is_empty() {
            self.drained.notify_all();
        }
        Ok(item)
    }

    /// Block until the queue is observed empty
    ///
    /// Nothing stops producers from pushing again right after this returns;
    /// treat it as a best-effort drain signal.
    pub fn wait_empty(&self) -> QueueResult<()> {
        let mut items = self.lock()?;
        while !items.is_empty() {
            items = handle_mutex_poison(self.drained.wait(items), |message| {
                QueueError::Poisoned { message }
            })?;
        }
        Ok(())
    }

    /// Like `wait_empty`, but gives up after `timeout`
    ///
    /// Returns `true` if the queue was observed empty in time.
    pub fn wait_empty_timeout(&self, timeout: Duration) -> QueueResult<bool> {
        let deadline = Instant::now() + timeout;
        let mut items = self.lock()?;
        while !items.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            let (guard, _) = handle_mutex_poison(
                self.drained.wait_timeout(items, remaining),
                |message| QueueError::Poisoned { message },
            )?;
            items = guard;
        }
        Ok(true)
    }

    /// Number of queued items at this instant
    pub fn len(&self) -> QueueResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn with_lock_for_test(&self, f: impl FnOnce()) {
        let _items = self.items.lock();
        f();
    }
}

//! Fixed-capacity priority command queue
//!
//! Ten FIFO buckets (priority 0 serviced first) laid over a preallocated
//! slot arena. Slots are addressed by index and recycled through a
//! free-index stack; at any instant every slot is owned by exactly one
//! structure, either the free stack or one bucket's intrusive list, so the
//! queued count plus the free count always equals the capacity.
//!
//! The arena bounds the number of in-flight commands: `put` suspends the
//! producer while no free slot exists and resumes it when a `get` recycles
//! one, giving natural backpressure. One notifier serves both the
//! "space available" and "data available" edges, so every state change is
//! broadcast to all waiters and every wait re-checks its predicate in a
//! loop; a wakeup for the other edge (or a spurious one) just parks the
//! task again. Waking a single waiter would not be enough here: a producer
//! woken into a still-full arena re-parks without re-signalling and the
//! consumer could be stranded behind it.
//!
//! Fairness: within a bucket, FIFO order holds. Across buckets, a lower
//! number always wins — a continuous stream of priority-0 traffic starves
//! the higher-numbered buckets indefinitely.

use serde::Serialize;
use tokio::sync::{Mutex, Notify};

use crate::command::Command;
use crate::constants::{POOL_CAPACITY, PRIORITY_LEVELS};
use crate::error::{FxError, Result};

/// Running enqueue/dequeue totals, best effort, for diagnostics
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct QueueStats {
    /// Commands accepted by `put`
    pub enqueued: u64,
    /// Commands handed out by `get`
    pub dequeued: u64,
}

#[derive(Debug)]
struct Slot {
    payload: Option<Command>,
    priority: u8,
    next: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    head: Option<u32>,
    tail: Option<u32>,
}

#[derive(Debug)]
struct QueueInner {
    slots: Vec<Slot>,
    free: Vec<u32>,
    buckets: [Bucket; PRIORITY_LEVELS],
    stats: QueueStats,
}

impl QueueInner {
    fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        let mut free = Vec::with_capacity(capacity);
        for index in 0..capacity {
            slots.push(Slot {
                payload: None,
                priority: 0,
                next: None,
            });
            free.push(index as u32);
        }
        Self {
            slots,
            free,
            buckets: [Bucket::default(); PRIORITY_LEVELS],
            stats: QueueStats::default(),
        }
    }

    /// Append to the bucket's FIFO, or hand the command back when the
    /// arena is exhausted
    fn try_enqueue(&mut self, command: Command, priority: u8) -> std::result::Result<(), Command> {
        let Some(index) = self.free.pop() else {
            return Err(command);
        };

        let slot = &mut self.slots[index as usize];
        slot.payload = Some(command);
        slot.priority = priority;
        slot.next = None;

        let bucket = priority as usize;
        match self.buckets[bucket].tail {
            Some(tail) => self.slots[tail as usize].next = Some(index),
            None => self.buckets[bucket].head = Some(index),
        }
        self.buckets[bucket].tail = Some(index);
        self.stats.enqueued += 1;
        Ok(())
    }

    /// Pop the head of the first non-empty bucket, ascending priority scan
    fn try_dequeue(&mut self) -> Option<Command> {
        for bucket in 0..PRIORITY_LEVELS {
            let Some(head) = self.buckets[bucket].head else {
                continue;
            };

            let slot = &mut self.slots[head as usize];
            debug_assert_eq!(usize::from(slot.priority), bucket);
            let command = slot.payload.take();
            let next = slot.next.take();

            self.buckets[bucket].head = next;
            if next.is_none() {
                self.buckets[bucket].tail = None;
            }
            self.free.push(head);
            self.stats.dequeued += 1;
            return command;
        }
        None
    }
}

/// Thread-safe priority queue over a fixed slot arena
#[derive(Debug)]
pub struct CommandQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
    capacity: usize,
}

impl CommandQueue {
    /// Create a queue with the default arena capacity
    pub fn new() -> Self {
        Self::with_capacity(POOL_CAPACITY)
    }

    /// Create a queue with a specific arena capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner::new(capacity)),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Enqueue a command at the given priority (0 is served first)
    ///
    /// Suspends while the arena is exhausted and resumes once a slot is
    /// recycled by a dequeue.
    pub async fn put(&self, command: Command, priority: u8) -> Result<()> {
        if usize::from(priority) >= PRIORITY_LEVELS {
            return Err(FxError::InvalidParameter(format!(
                "priority {priority} outside 0..{PRIORITY_LEVELS}"
            )));
        }

        let mut pending = command;
        loop {
            // Register with the notifier before re-checking; a broadcast
            // between the check and the await is not lost.
            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();
            match self.inner.lock().await.try_enqueue(pending, priority) {
                Ok(()) => {
                    self.notify.notify_waiters();
                    return Ok(());
                }
                Err(returned) => pending = returned,
            }
            notified.await;
        }
    }

    /// Dequeue the oldest command of the best priority
    ///
    /// Suspends while every bucket is empty.
    pub async fn get(&self) -> Command {
        loop {
            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();
            if let Some(command) = self.inner.lock().await.try_dequeue() {
                self.notify.notify_waiters();
                return command;
            }
            notified.await;
        }
    }

    /// Arena capacity fixed at construction
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of commands currently queued across all buckets
    pub async fn len(&self) -> usize {
        self.capacity - self.inner.lock().await.free.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of free arena slots
    pub async fn available(&self) -> usize {
        self.inner.lock().await.free.len()
    }

    /// Snapshot of the running counters
    pub async fn stats(&self) -> QueueStats {
        self.inner.lock().await.stats
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

//! The MPMC queue cell ids move through during a drain, plus the
//! worker-pool helper every evaluator phase spawns its workers through.
//!
//! The bounded ring buffer is `crossbeam`'s `ArrayQueue`, sized to
//! `cell_count` per evaluator run: every cell is enqueued at most once per
//! run (as a starting cell, or exactly once when its last unresolved
//! predecessor completes), so the ring never needs to hold more than
//! `cell_count` entries concurrently. `enqueue`/`dequeue` naming (rather
//! than `crossbeam`'s `push`/`pop`) matches the vocabulary the rest of the
//! evaluator uses for this queue.

use crossbeam::queue::{ArrayQueue, SegQueue};

/// Bounded MPMC queue of cell ids, one per evaluator drain.
pub struct MpmcQueue<T> {
    inner: ArrayQueue<T>,
}

impl<T> MpmcQueue<T> {
    /// Creates an empty queue that can hold at least `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: ArrayQueue::new(capacity.max(1)) }
    }

    /// Enqueues `value`. Only fails if the caller exceeds the capacity
    /// invariant (every cell enqueued at most once per run) — callers treat
    /// that as a logic error, not a recoverable condition.
    pub fn enqueue(&self, value: T) -> Result<(), T> {
        self.inner.push(value)
    }

    /// Attempts to dequeue a value. Returns `None` immediately if the
    /// queue currently has nothing ready — callers are expected to
    /// busy-retry, per the drain loop's no-blocking contract.
    pub fn dequeue(&self) -> Option<T> {
        self.inner.pop()
    }
}

/// A concurrent queue used only by the invalidation BFS, where the same
/// cell id can legitimately be pushed more than once before it is popped
/// (a cell with several live predecessors is reachable by several
/// traversal edges). The drain-phase `MpmcQueue` above assumes exactly one
/// enqueue per cell and is bounded at `cell_count`, which this phase can't
/// guarantee, so this wraps `crossbeam`'s unbounded lock-free `SegQueue`
/// instead.
#[derive(Default)]
pub struct GrowableQueue<T> {
    inner: SegQueue<T>,
}

impl<T> GrowableQueue<T> {
    pub fn new() -> Self {
        Self { inner: SegQueue::new() }
    }

    pub fn push(&self, value: T) {
        self.inner.push(value);
    }

    pub fn try_pop(&self) -> Option<T> {
        self.inner.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Spawns `n` workers, each running `f` to completion, and joins all of
/// them before returning. Both Phase C's drain and the edit-time
/// invalidation BFS spawn their workers through this, so the spawn-and-join
/// protocol lives in one place instead of being repeated at each call site.
pub fn run_workers<F>(n: usize, f: F)
where
    F: Fn() + Sync,
{
    std::thread::scope(|scope| {
        for _ in 0..n {
            scope.spawn(|| f());
        }
    });
}

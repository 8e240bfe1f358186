#![forbid(unsafe_code)]

//! Deferred-callback queue driven by a virtual clock.
//!
//! [`DeferredQueue`] is the event-loop half of a surface: widgets schedule
//! one-shot callbacks with a delay, and the host advances time. Time only
//! moves when the host calls [`advance`](DeferredQueue::advance) or
//! [`run_until_idle`](DeferredQueue::run_until_idle), which keeps every
//! animation and deferral deterministic under test.
//!
//! # Invariants
//!
//! 1. Tasks run in `(due time, schedule order)` order; two tasks with the
//!    same due time run in the order they were scheduled.
//! 2. A task scheduled while the queue is running is eligible in the same
//!    `advance` call if its due time falls inside the advanced window.
//! 3. No internal borrow is held while a task runs.
//! 4. `now()` never decreases.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

use ahash::AHashMap;

use crate::surface::{DeferredFn, TaskId};

/// Upper bound on tasks run by a single [`DeferredQueue::run_until_idle`].
const IDLE_TASK_LIMIT: usize = 10_000;

struct QueueInner {
    now: Duration,
    next_seq: u64,
    /// Pending tasks keyed by `(due, seq)`.
    tasks: BTreeMap<(Duration, u64), DeferredFn>,
    /// `seq -> due` for cancellation.
    due_by_seq: AHashMap<u64, Duration>,
}

/// A virtual-clock queue of one-shot callbacks.
pub struct DeferredQueue {
    inner: RefCell<QueueInner>,
}

impl Default for DeferredQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("DeferredQueue")
            .field("now", &inner.now)
            .field("pending", &inner.tasks.len())
            .finish()
    }
}

impl DeferredQueue {
    /// Create an empty queue at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(QueueInner {
                now: Duration::ZERO,
                next_seq: 1,
                tasks: BTreeMap::new(),
                due_by_seq: AHashMap::new(),
            }),
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Due time of the earliest pending task.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.inner.borrow().tasks.keys().next().map(|(due, _)| *due)
    }

    /// Schedule `task` to run `delay` after the current time.
    pub fn schedule(&self, delay: Duration, task: DeferredFn) -> TaskId {
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let due = inner.now + delay;
        inner.tasks.insert((due, seq), task);
        inner.due_by_seq.insert(seq, due);
        TaskId::from_raw(seq)
    }

    /// Cancel a pending task. Returns `false` if it already ran or was
    /// cancelled.
    pub fn cancel(&self, task: TaskId) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.due_by_seq.remove(&task.id()) {
            Some(due) => inner.tasks.remove(&(due, task.id())).is_some(),
            None => false,
        }
    }

    /// Move the clock forward by `by`, running every task that falls due.
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut ran = 0;
        while let Some(task) = self.pop_due(target) {
            task();
            ran += 1;
        }
        let mut inner = self.inner.borrow_mut();
        if inner.now < target {
            inner.now = target;
        }
        if ran > 0 {
            tracing::trace!(ran, now_ms = millis(inner.now), "deferred tasks ran");
        }
        ran
    }

    /// Run tasks in due order, jumping the clock forward, until none remain.
    ///
    /// Stops after an internal safety limit if tasks keep rescheduling
    /// themselves. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(due) = self.next_due() {
            if ran >= IDLE_TASK_LIMIT {
                tracing::warn!(ran, "deferred queue did not go idle; giving up");
                break;
            }
            let Some(task) = self.pop_due(due) else {
                break;
            };
            task();
            ran += 1;
        }
        ran
    }

    /// Remove the earliest task due at or before `limit`, moving the clock
    /// to its due time. The borrow is released before returning.
    fn pop_due(&self, limit: Duration) -> Option<DeferredFn> {
        let mut inner = self.inner.borrow_mut();
        let key = *inner.tasks.keys().next()?;
        if key.0 > limit {
            return None;
        }
        let task = inner.tasks.remove(&key)?;
        inner.due_by_seq.remove(&key.1);
        if inner.now < key.0 {
            inner.now = key.0;
        }
        Some(task)
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use tracing_test::traced_test;
    use std::rc::Rc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> DeferredFn) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let make = move |name: &'static str| -> DeferredFn {
            let l = Rc::clone(&l);
            Box::new(move || l.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn runs_only_due_tasks() {
        let q = DeferredQueue::new();
        let (log, task) = recorder();
        q.schedule(ms(10), task("a"));
        q.schedule(ms(50), task("b"));

        assert_eq!(q.advance(ms(20)), 1);
        assert_eq!(*log.borrow(), vec!["a"]);
        assert_eq!(q.now(), ms(20));
        assert_eq!(q.pending(), 1);

        q.advance(ms(30));
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn equal_due_runs_in_schedule_order() {
        let q = DeferredQueue::new();
        let (log, task) = recorder();
        q.schedule(ms(5), task("first"));
        q.schedule(ms(5), task("second"));
        q.schedule(ms(1), task("zeroth"));
        q.run_until_idle();
        assert_eq!(*log.borrow(), vec!["zeroth", "first", "second"]);
    }

    #[test]
    fn cancel_prevents_run() {
        let q = DeferredQueue::new();
        let (log, task) = recorder();
        let id = q.schedule(ms(5), task("x"));
        assert!(q.cancel(id));
        assert!(!q.cancel(id), "second cancel is a no-op");
        q.run_until_idle();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn nested_schedule_within_window_runs() {
        let q = Rc::new(DeferredQueue::new());
        let hits = Rc::new(RefCell::new(Vec::new()));
        let q2 = Rc::clone(&q);
        let h = Rc::clone(&hits);
        q.schedule(
            ms(1),
            Box::new(move || {
                h.borrow_mut().push(q2.now());
                let h2 = Rc::clone(&h);
                let q3 = Rc::clone(&q2);
                q2.schedule(ms(200), Box::new(move || h2.borrow_mut().push(q3.now())));
            }),
        );

        q.advance(ms(300));
        assert_eq!(*hits.borrow(), vec![ms(1), ms(201)]);
        assert_eq!(q.now(), ms(300));
    }

    #[test]
    fn run_until_idle_jumps_clock() {
        let q = DeferredQueue::new();
        let (_log, task) = recorder();
        q.schedule(ms(500), task("late"));
        assert_eq!(q.run_until_idle(), 1);
        assert_eq!(q.now(), ms(500));
        assert_eq!(q.next_due(), None);
    }

    #[test]
    fn millis_saturates() {
        assert_eq!(millis(ms(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    #[traced_test]
    fn advance_logs_clock_in_millis() {
        let q = DeferredQueue::new();
        let (_log, task) = recorder();
        q.schedule(ms(5), task("a"));
        q.advance(ms(20));
        assert!(logs_contain("now_ms=20"));
    }

    proptest! {
        #[test]
        fn tasks_run_sorted_by_due_then_seq(delays in proptest::collection::vec(0u64..50, 1..40)) {
            let q = DeferredQueue::new();
            let order = Rc::new(RefCell::new(Vec::new()));
            for (seq, delay) in delays.iter().enumerate() {
                let order = Rc::clone(&order);
                let delay = *delay;
                q.schedule(ms(delay), Box::new(move || order.borrow_mut().push((delay, seq))));
            }
            prop_assert_eq!(q.run_until_idle(), delays.len());
            let ran = order.borrow().clone();
            let mut expected = ran.clone();
            expected.sort();
            prop_assert_eq!(ran, expected);
        }
    }
}

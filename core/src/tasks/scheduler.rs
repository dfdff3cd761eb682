//! A delay queue that runs jobs once their deadline has passed.
//----------------------------------------------------------------------------------------- std lib
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    panic::{self, AssertUnwindSafe},
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};
//--------------------------------------------------------------------------------- other libraries
use log::{debug, error};

use super::panic_message;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

struct Entry {
    at: Instant,
    /// insertion order, breaks ties between equal deadlines
    seq: u64,
    job: Job,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

#[derive(Default)]
struct Queue {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
    stopped: bool,
}

/// Runs jobs at (or shortly after) the instant they were scheduled for.
///
/// [`Scheduler::run`] blocks the calling thread and executes due jobs inline on it, so jobs
/// should hand long running work off to their own thread.
#[derive(Default)]
pub struct Scheduler {
    queue: Mutex<Queue>,
    wakeup: Condvar,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.lock();
        f.debug_struct("Scheduler")
            .field("pending", &queue.heap.len())
            .field("stopped", &queue.stopped)
            .finish()
    }
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // a job panicking never happens while the lock is held, but don't let a poisoned lock
    // take the whole scheduler down either
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `job` to run at `at`. Wakes the loop so an earlier deadline is picked up at once.
    ///
    /// Jobs scheduled after [`Scheduler::stop`] are dropped.
    pub fn schedule_at(&self, at: Instant, job: impl FnOnce() + Send + 'static) {
        let mut queue = self.lock();
        if queue.stopped {
            debug!("scheduler is stopped, dropping job");
            return;
        }
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.heap.push(Reverse(Entry {
            at,
            seq,
            job: Box::new(job),
        }));
        drop(queue);
        self.wakeup.notify_all();
    }

    /// Queue `job` to run once `delay` has elapsed.
    pub fn schedule_in(&self, delay: Duration, job: impl FnOnce() + Send + 'static) {
        self.schedule_at(Instant::now() + delay, job);
    }

    /// The number of jobs waiting for their deadline.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().heap.len()
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Discard all pending jobs and make [`Scheduler::run`] return.
    ///
    /// A job that is already executing finishes normally.
    pub fn stop(&self) {
        let mut queue = self.lock();
        queue.stopped = true;
        queue.heap.clear();
        drop(queue);
        self.wakeup.notify_all();
    }

    /// Wait for jobs to become due and execute them, until [`Scheduler::stop`] is called.
    pub fn run(&self) {
        debug!("scheduler started");
        let mut queue = self.lock();
        loop {
            if queue.stopped {
                break;
            }

            let now = Instant::now();
            match queue.heap.peek().map(|Reverse(entry)| entry.at) {
                None => {
                    queue = self
                        .wakeup
                        .wait(queue)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Some(at) if at <= now => {
                    if let Some(Reverse(entry)) = queue.heap.pop() {
                        drop(queue);
                        Self::execute(entry.job);
                        queue = self.lock();
                    }
                }
                Some(at) => {
                    queue = self
                        .wakeup
                        .wait_timeout(queue, at - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
        debug!("scheduler stopped");
    }

    fn execute(job: Job) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            error!("scheduled job panicked: {}", panic_message(payload.as_ref()));
        }
    }
}

//! Fixed-size worker pool running batches of independent tasks.
//!
//! Tasks are submitted through a [`TaskQueue`] together with a [`FinishFlag`]
//! that identifies their batch. The submitting thread blocks in
//! [`TaskQueue::wait_until_finished`] until every task of the batch has run.
//! Tasks of one batch run in no particular order.

use std::{num::NonZeroUsize, sync::Arc};

use parking_lot::{Condvar, Mutex};
use rayon::{Scope, ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::Error;

/// A unit of work run once on some worker thread.
///
/// Tasks return nothing: each one writes its result to a destination it owns
/// exclusively.
pub trait Task: Send {
    fn run(self);
}

impl<F> Task for F
where
    F: FnOnce() + Send,
{
    fn run(self) {
        self()
    }
}

/// Worker pool settings.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Number of worker threads. `None` uses one thread per available CPU.
    pub threads: Option<NonZeroUsize>,
    pub thread_name_prefix: String,
}

impl DispatcherConfig {
    pub fn with_threads(mut self, threads: NonZeroUsize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            threads: None,
            thread_name_prefix: "etc-worker".to_owned(),
        }
    }
}

/// Owns the worker threads. Dropping the dispatcher joins them.
pub struct TaskDispatcher {
    pool: ThreadPool,
}

impl TaskDispatcher {
    pub fn new(config: DispatcherConfig) -> Result<Self, Error> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(threads) = config.threads {
            builder = builder.num_threads(threads.get());
        }

        let prefix = config.thread_name_prefix;
        let pool = builder
            .thread_name(move |index| format!("{prefix}-{index}"))
            .build()?;

        debug!(threads = pool.current_num_threads(), "worker pool started");

        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Opens a submission scope.
    ///
    /// `op` runs on the calling thread, which is not one of the workers, so it
    /// may block on batches. Tasks may borrow anything that outlives the scope.
    /// Every task has finished when `scope` returns. A panic inside a task is
    /// resumed here once the remaining tasks are done.
    ///
    /// Calling this from inside a task of the same dispatcher can deadlock.
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&TaskQueue<'_, 'scope>) -> R,
    {
        self.pool.in_place_scope(|scope| op(&TaskQueue { scope }))
    }
}

/// Submission handle valid inside [`TaskDispatcher::scope`].
pub struct TaskQueue<'a, 'scope> {
    scope: &'a Scope<'scope>,
}

impl<'a, 'scope> TaskQueue<'a, 'scope> {
    /// Submits `task` as part of the batch identified by `batch`.
    pub fn enqueue_task<T>(&self, task: T, batch: &FinishFlag)
    where
        T: Task + 'scope,
    {
        let guard = batch.begin();
        self.scope.spawn(move |_| {
            // Completes the task even when it unwinds.
            let _guard = guard;
            task.run();
        });
    }

    /// Blocks until every task submitted against `batch` has finished.
    pub fn wait_until_finished(&self, batch: &FinishFlag) {
        batch.wait();
    }
}

struct BatchState {
    pending: Mutex<usize>,
    finished: Condvar,
}

/// Completion latch of one batch.
#[derive(Clone)]
pub struct FinishFlag {
    state: Arc<BatchState>,
}

impl FinishFlag {
    pub fn new() -> Self {
        Self {
            state: Arc::new(BatchState {
                pending: Mutex::new(0),
                finished: Condvar::new(),
            }),
        }
    }

    /// Number of submitted tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        *self.state.pending.lock()
    }

    pub fn is_finished(&self) -> bool {
        self.pending() == 0
    }

    fn begin(&self) -> TaskGuard {
        *self.state.pending.lock() += 1;
        TaskGuard {
            state: Arc::clone(&self.state),
        }
    }

    fn wait(&self) {
        let mut pending = self.state.pending.lock();
        while *pending > 0 {
            self.state.finished.wait(&mut pending);
        }
    }
}

impl Default for FinishFlag {
    fn default() -> Self {
        Self::new()
    }
}

struct TaskGuard {
    state: Arc<BatchState>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        let mut pending = self.state.pending.lock();
        *pending -= 1;
        if *pending == 0 {
            self.state.finished.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn dispatcher(threads: usize) -> TaskDispatcher {
        let config = DispatcherConfig::default()
            .with_threads(NonZeroUsize::new(threads).unwrap())
            .with_thread_name_prefix("test-worker");
        TaskDispatcher::new(config).unwrap()
    }

    #[test]
    fn batch_runs_every_task() {
        let dispatcher = dispatcher(4);
        let counter = AtomicUsize::new(0);

        dispatcher.scope(|queue| {
            let batch = FinishFlag::new();
            for _ in 0..100 {
                queue.enqueue_task(
                    || {
                        counter.fetch_add(1, Ordering::Relaxed);
                    },
                    &batch,
                );
            }
            queue.wait_until_finished(&batch);
            assert!(batch.is_finished());
            assert_eq!(counter.load(Ordering::Relaxed), 100);
        });
    }

    #[test]
    fn empty_batch_does_not_block() {
        let dispatcher = dispatcher(1);
        dispatcher.scope(|queue| {
            let batch = FinishFlag::new();
            queue.wait_until_finished(&batch);
            assert_eq!(batch.pending(), 0);
        });
    }

    #[test]
    fn tasks_write_disjoint_destinations() {
        let dispatcher = dispatcher(3);
        let mut output = vec![0u32; 64];

        dispatcher.scope(|queue| {
            let batch = FinishFlag::new();
            for (index, slot) in output.iter_mut().enumerate() {
                queue.enqueue_task(move || *slot = index as u32 * 2, &batch);
            }
            queue.wait_until_finished(&batch);
        });

        assert!(output.iter().enumerate().all(|(index, &value)| value == index as u32 * 2));
    }

    fn failing_task() {
        panic!("task failed");
    }

    #[test]
    fn panicking_task_still_completes_batch() {
        let dispatcher = dispatcher(2);
        let counter = AtomicUsize::new(0);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            dispatcher.scope(|queue| {
                let batch = FinishFlag::new();
                queue.enqueue_task(failing_task, &batch);
                for _ in 0..8 {
                    queue.enqueue_task(
                        || {
                            counter.fetch_add(1, Ordering::Relaxed);
                        },
                        &batch,
                    );
                }
                queue.wait_until_finished(&batch);
            })
        }));

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::Relaxed), 8);
    }

    #[test]
    fn reports_thread_count() {
        assert_eq!(dispatcher(3).threads(), 3);
    }
}

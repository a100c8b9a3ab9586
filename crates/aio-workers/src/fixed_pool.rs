//! Fixed-size thread pool (default `ThreadPool`).
//!
//! Spawns `n` worker threads at construction, each looping on a bounded
//! MPMC queue. The hook supplied to `new()` is the entire unit of work per
//! task — `FixedPool` itself never inspects a `TaskKind` or touches a
//! completion pipe; that's the hook's business (composed in `aio-engine`
//! from the worker executor plus the pipe writer).

use aio_core::pool::ThreadPool;
use aio_core::task::TaskRecord;
use aio_core::{AioError, Result};

use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

/// Per-task hook run by a worker thread: execute the task, then hand the
/// finished record to the completion path.
pub type Hook = Arc<dyn Fn(Box<TaskRecord>) + Send + Sync>;

struct Shared {
    queue: ArrayQueue<Box<TaskRecord>>,
    shutdown: AtomicBool,
    active: AtomicUsize,
    notify: Condvar,
    notify_lock: Mutex<()>,
}

pub struct FixedPool {
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
    total: usize,
}

impl FixedPool {
    /// Spawn `thread_num` workers with queue capacity `queue_depth`, each
    /// running `hook` for every dispatched task.
    pub fn new(thread_num: usize, queue_depth: usize, hook: Hook) -> Self {
        let shared = Arc::new(Shared {
            queue: ArrayQueue::new(queue_depth.max(1)),
            shutdown: AtomicBool::new(false),
            active: AtomicUsize::new(0),
            notify: Condvar::new(),
            notify_lock: Mutex::new(()),
        });

        let handles = (0..thread_num.max(1))
            .map(|idx| {
                let shared = Arc::clone(&shared);
                let hook = Arc::clone(&hook);
                thread::Builder::new()
                    .name(format!("aio-worker-{idx}"))
                    .spawn(move || worker_loop(shared, hook))
                    .expect("failed to spawn aio worker thread")
            })
            .collect();

        Self {
            shared,
            handles,
            total: thread_num.max(1),
        }
    }
}

fn worker_loop(shared: Arc<Shared>, hook: Hook) {
    loop {
        match shared.queue.pop() {
            Some(task) => {
                shared.active.fetch_add(1, Ordering::SeqCst);
                hook(task);
                shared.active.fetch_sub(1, Ordering::SeqCst);
            }
            None => {
                if shared.shutdown.load(Ordering::SeqCst) {
                    return;
                }
                let guard = shared.notify_lock.lock().unwrap();
                let _ = shared
                    .notify
                    .wait_timeout(guard, std::time::Duration::from_millis(50))
                    .unwrap();
            }
        }
    }
}

impl ThreadPool for FixedPool {
    fn dispatch(&self, task: Box<TaskRecord>) -> Result<()> {
        if self.shared.shutdown.load(Ordering::SeqCst) {
            return Err(AioError::WorkerUnavailable);
        }
        match self.shared.queue.push(task) {
            Ok(()) => {
                let _guard = self.shared.notify_lock.lock().unwrap();
                self.shared.notify.notify_one();
                Ok(())
            }
            Err(_rejected) => Err(AioError::WorkerUnavailable),
        }
    }

    fn active_workers(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    fn total_workers(&self) -> usize {
        self.total
    }

    fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        let _guard = self.shared.notify_lock.lock().unwrap();
        self.shared.notify.notify_all();
    }
}

impl Drop for FixedPool {
    fn drop(&mut self) {
        self.shutdown();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aio_core::task::{TaskId, TaskKind, WriteOffset};
    use std::sync::mpsc;

    #[test]
    fn dispatches_and_runs_hook() {
        let (tx, rx) = mpsc::channel();
        let hook: Hook = Arc::new(move |task: Box<TaskRecord>| {
            tx.send(task.id).unwrap();
        });
        let pool = FixedPool::new(2, 8, hook);
        pool.dispatch(Box::new(TaskRecord::new(
            TaskId(1),
            TaskKind::Write {
                fd: -1,
                buf: aio_core::buffer::IoBuffer::from_slice(&mut []),
                offset: WriteOffset::Sequential,
            },
            None,
        )))
        .unwrap();
        let got = rx.recv_timeout(std::time::Duration::from_secs(2)).unwrap();
        assert_eq!(got, TaskId(1));
    }

    #[test]
    fn rejects_after_shutdown() {
        let hook: Hook = Arc::new(|_task: Box<TaskRecord>| {});
        let pool = FixedPool::new(1, 4, hook);
        pool.shutdown();
        let result = pool.dispatch(Box::new(TaskRecord::new(
            TaskId(2),
            TaskKind::Write {
                fd: -1,
                buf: aio_core::buffer::IoBuffer::from_slice(&mut []),
                offset: WriteOffset::Sequential,
            },
            None,
        )));
        assert!(matches!(result, Err(AioError::WorkerUnavailable)));
    }
}

//! Shared engine state: everything the submission facade and the
//! completion drain handler both need to touch, none of it behind a
//! single owning reference since both run on different threads.

use aio_core::task::{TaskId, TaskRecord};

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

/// Invoked for every completion whose submitter didn't register a
/// per-task callback. Unlike `task::Callback` (`FnOnce`, consumed once per
/// task), this must be callable repeatedly across the engine's lifetime.
pub type DefaultCallback = Box<dyn Fn(&TaskRecord) + Send + Sync>;

/// Which backend executes submitted tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Blocking operations run on a `FixedPool` of OS threads. The only
    /// mode this engine implements.
    ThreadPool,
    /// Reserved for a future native kernel-AIO backend (e.g. io_uring).
    /// Selecting it currently falls back to `ThreadPool` with a warning.
    KernelAio,
}

/// Tunables for a running engine.
pub struct EngineConfig {
    /// Execution backend. Only `Mode::ThreadPool` is implemented.
    pub mode: Mode,
    /// Number of worker threads in the pool.
    pub thread_num: usize,
    /// Capacity of the pool's dispatch queue.
    pub queue_depth: usize,
    /// Maximum completions drained from the pipe per reactor callback.
    pub drain_batch: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::ThreadPool,
            thread_num: 4,
            queue_depth: 256,
            drain_batch: 64,
        }
    }
}

pub struct EngineState {
    pub initialized: AtomicBool,
    /// Execution backend this engine was initialized with.
    pub mode: Mode,
    /// Number of tasks dispatched but not yet drained.
    pub task_num: AtomicI64,
    /// Next `TaskId` to hand out.
    pub current_id: AtomicU64,
    /// Serializes access to anything that must not interleave across
    /// worker threads outside of the pipe's own internal locking — taken
    /// around DNS lookups when `legacy_resolver` is enabled.
    pub pipe_lock: Mutex<()>,
    /// Invoked for completions submitted with no per-task callback.
    pub default_callback: Option<DefaultCallback>,
}

impl EngineState {
    pub fn new(mode: Mode, default_callback: Option<DefaultCallback>) -> Self {
        Self {
            initialized: AtomicBool::new(true),
            mode,
            task_num: AtomicI64::new(0),
            current_id: AtomicU64::new(1),
            pipe_lock: Mutex::new(()),
            default_callback,
        }
    }

    pub fn next_id(&self) -> TaskId {
        TaskId(self.current_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Next `TaskId` that will be handed out, without consuming it.
    pub fn current_id(&self) -> u64 {
        self.current_id.load(Ordering::SeqCst)
    }

    pub fn on_dispatch(&self) {
        self.task_num.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_drain(&self) {
        self.task_num.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn pending(&self) -> i64 {
        self.task_num.load(Ordering::SeqCst)
    }

    pub fn fire(&self, record: &TaskRecord) {
        // `TaskRecord::callback` is consumed by the drain handler before
        // this runs, so we only ever reach the default path here when the
        // submitter left `callback` unset.
        if let Some(default) = &self.default_callback {
            default(record);
        } else {
            log::trace!(
                "task {:?} ({}) completed with no callback registered",
                record.id,
                record.kind.label()
            );
        }
    }
}

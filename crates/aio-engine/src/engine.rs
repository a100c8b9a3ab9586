//! Engine lifecycle: init composes a pool, a completion pipe, and a
//! reactor registration into a working offload engine; `Drop` tears all
//! three down in reverse order.

use crate::drain::DrainHandler;
use crate::facade::Facade;
use crate::state::{DefaultCallback, EngineConfig, EngineState, Mode};

use aio_core::pool::ThreadPool;
use aio_core::reactor::{EventClass, Reactor};
use aio_core::task::TaskRecord;
use aio_core::{AioError, Result};
use aio_workers::{FixedPool, StdResolver, UnixPipe};

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, OnceLock};

/// A running offload engine: one fixed thread pool, one completion pipe,
/// registered with a caller-supplied reactor.
pub struct Engine<R: Reactor> {
    state: Arc<EngineState>,
    pool: Arc<FixedPool>,
    pipe: Arc<UnixPipe>,
    reactor: Arc<Mutex<R>>,
}

impl<R: Reactor> Engine<R> {
    /// Initialize an engine on top of `reactor`, using `config` to size
    /// the pool and batching, and `default_callback` for completions
    /// submitted without their own per-task callback.
    pub fn init(
        reactor: Arc<Mutex<R>>,
        config: EngineConfig,
        default_callback: Option<DefaultCallback>,
    ) -> Result<Self> {
        let mode = match config.mode {
            Mode::ThreadPool => Mode::ThreadPool,
            Mode::KernelAio => {
                log::warn!("Mode::KernelAio is reserved and unimplemented; falling back to Mode::ThreadPool");
                Mode::ThreadPool
            }
        };
        let state = Arc::new(EngineState::new(mode, default_callback));
        let pipe = Arc::new(UnixPipe::new()?);
        let resolver = Arc::new(StdResolver);

        let worker_state = Arc::clone(&state);
        let worker_pipe = Arc::clone(&pipe);
        let worker_resolver = Arc::clone(&resolver);
        let hook: aio_workers::Hook = Arc::new(move |mut task: Box<TaskRecord>| {
            aio_workers::worker::execute(&mut task, worker_resolver.as_ref(), &worker_state.pipe_lock);
            let ptr = Box::into_raw(task);
            if let Err(e) = worker_pipe.send(ptr) {
                // The drain handler will never see this pointer, so
                // reconstruct and drop the box here instead of leaking it;
                // this only happens if the pipe itself is broken, which is
                // already a fatal condition for the engine.
                let _ = unsafe { Box::from_raw(ptr) };
                log::error!("failed to hand completion to the drain pipe: {e}");
            }
        });

        let pool = Arc::new(FixedPool::new(config.thread_num, config.queue_depth, hook));

        let drain_state = Arc::clone(&state);
        let drain_pipe = Arc::clone(&pipe);
        let mut handler = DrainHandler::new(drain_state, Arc::clone(&pipe), config.drain_batch);
        {
            let mut guard = reactor.lock().unwrap();
            guard.set_handler(
                EventClass::Aio,
                Box::new(move |fd| handler.drain(fd)),
            );
            guard
                .add(drain_pipe.reader_fd(), EventClass::Aio)
                .map_err(|_| AioError::NoReactor)?;
        }

        Ok(Self {
            state,
            pool,
            pipe,
            reactor,
        })
    }

    pub fn facade(&self) -> Facade {
        Facade {
            state: Arc::clone(&self.state),
            pool: Arc::clone(&self.pool) as Arc<dyn aio_core::pool::ThreadPool>,
        }
    }

    pub fn pending(&self) -> i64 {
        self.state.pending()
    }

    /// Execution backend this engine is running with.
    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Next `TaskId` that will be handed out, without consuming it.
    pub fn current_id(&self) -> u64 {
        self.state.current_id()
    }
}

impl<R: Reactor> Drop for Engine<R> {
    fn drop(&mut self) {
        self.state.initialized.store(false, Ordering::SeqCst);
        self.pool.shutdown();
        let mut guard = self.reactor.lock().unwrap();
        let _ = guard.del(self.pipe.reader_fd());
    }
}

/// Call-site convenience for callers who want a process-wide singleton
/// engine. `Engine` itself holds no global state and stays an ordinary
/// owned value; wrap one in `OnceLock<Engine<R>>` here and go through
/// `init`/`get` instead of touching `Engine::init` directly.
pub struct EngineCell<R: Reactor> {
    cell: OnceLock<Engine<R>>,
}

impl<R: Reactor> EngineCell<R> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Initialize the singleton. Fails with `AioError::AlreadyInitialized`
    /// if this cell has already been initialized.
    pub fn init(
        &self,
        reactor: Arc<Mutex<R>>,
        config: EngineConfig,
        default_callback: Option<DefaultCallback>,
    ) -> Result<&Engine<R>> {
        if self.cell.get().is_some() {
            return Err(AioError::AlreadyInitialized);
        }
        let engine = Engine::init(reactor, config, default_callback)?;
        self.cell
            .set(engine)
            .map_err(|_| AioError::AlreadyInitialized)?;
        Ok(self.cell.get().expect("just set"))
    }

    pub fn get(&self) -> Option<&Engine<R>> {
        self.cell.get()
    }
}

impl<R: Reactor> Default for EngineCell<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aio_workers::EpollReactor;

    #[test]
    fn second_init_is_rejected() {
        let cell: EngineCell<EpollReactor> = EngineCell::new();
        let reactor = Arc::new(Mutex::new(EpollReactor::new().unwrap()));

        cell.init(Arc::clone(&reactor), EngineConfig::default(), None)
            .unwrap();
        let second = cell.init(Arc::clone(&reactor), EngineConfig::default(), None);

        assert!(matches!(second, Err(AioError::AlreadyInitialized)));
        assert!(cell.get().is_some());
    }

    #[test]
    fn kernel_aio_mode_falls_back_to_thread_pool() {
        let reactor = Arc::new(Mutex::new(EpollReactor::new().unwrap()));
        let mut config = EngineConfig::default();
        config.mode = Mode::KernelAio;
        let engine = Engine::init(reactor, config, None).unwrap();
        assert_eq!(engine.mode(), Mode::ThreadPool);
    }
}

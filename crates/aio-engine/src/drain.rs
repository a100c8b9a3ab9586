//! Completion drain handler — the reactor-side half of the handoff.
//!
//! Registered as the `Aio` event-class handler on whatever `Reactor` the
//! engine was initialized with. Runs on the reactor's own thread, reading
//! whatever whole task-record pointers are available from the completion
//! pipe and firing each one's callback before freeing it.

use crate::state::EngineState;
use aio_workers::UnixPipe;

use aio_core::task::TaskRecord;
use std::os::unix::io::RawFd;
use std::sync::Arc;

pub struct DrainHandler {
    state: Arc<EngineState>,
    pipe: Arc<UnixPipe>,
    residual: Vec<u8>,
    batch: usize,
}

impl DrainHandler {
    pub fn new(state: Arc<EngineState>, pipe: Arc<UnixPipe>, batch: usize) -> Self {
        Self {
            state,
            pipe,
            residual: Vec::new(),
            batch,
        }
    }

    /// Drain up to `batch` completions, invoking each task's callback (or
    /// the engine's default) and freeing the record. Anything beyond
    /// `batch` is left unread in the pipe (or buffered in `residual`) for
    /// the next invocation — nothing parsed here is ever discarded.
    pub fn drain(&mut self, _fd: RawFd) -> aio_core::Result<()> {
        let ptrs = self.pipe.recv_available(&mut self.residual, self.batch)?;
        for ptr in ptrs {
            // Safety: the pointer was produced by `Box::into_raw` on a
            // worker thread and is handed to exactly one drain handler;
            // ownership transfers back to this box now.
            let mut record = unsafe { Box::from_raw(ptr) };
            self.fire(&mut record);
            self.state.on_drain();
        }
        Ok(())
    }

    fn fire(&self, record: &mut TaskRecord) {
        match record.callback.take() {
            Some(callback) => callback(record),
            None => self.state.fire(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Mode;
    use aio_core::task::{TaskId, TaskKind, WriteOffset};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn drains_a_completion_and_fires_its_callback() {
        let state = Arc::new(EngineState::new(Mode::ThreadPool, None));
        state.on_dispatch();
        let pipe = Arc::new(UnixPipe::new().unwrap());
        let mut handler = DrainHandler::new(Arc::clone(&state), Arc::clone(&pipe), 16);

        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        let record = Box::new(TaskRecord::new(
            TaskId(1),
            TaskKind::Write {
                fd: -1,
                buf: aio_core::buffer::IoBuffer::from_slice(&mut []),
                offset: WriteOffset::Sequential,
            },
            Some(Box::new(move |_rec: &TaskRecord| {
                fired_clone.store(true, Ordering::SeqCst);
            })),
        ));
        pipe.send(Box::into_raw(record)).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        handler.drain(pipe.reader_fd()).unwrap();

        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(state.pending(), 0);
    }
}

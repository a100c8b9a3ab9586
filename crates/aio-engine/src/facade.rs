//! Submission facade — the engine's public surface for handing off a
//! blocking operation.
//!
//! Every `submit_*` call allocates a boxed `TaskRecord`, assigns it a
//! `TaskId`, and dispatches it to the pool. On dispatch failure the box is
//! returned to the caller via the error so nothing leaks; on success,
//! ownership has moved to the pool and the caller only sees the result
//! again through its callback.

use crate::state::EngineState;
use aio_core::buffer::IoBuffer;
use aio_core::pool::ThreadPool;
use aio_core::task::{
    AddressFamily, Callback, GetAddrInfoRequest, TaskId, TaskKind, TaskRecord, WriteOffset,
};
use aio_core::{AioError, Result};

use std::os::unix::io::RawFd;
use std::sync::Arc;

pub struct Facade {
    pub(crate) state: Arc<EngineState>,
    pub(crate) pool: Arc<dyn ThreadPool>,
}

impl Facade {
    /// Generic submission entry point; every other operation on this type
    /// builds a `TaskKind` and delegates here.
    pub fn dispatch(&self, kind: TaskKind, callback: Option<Callback>) -> Result<TaskId> {
        if !self.state.initialized.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AioError::NotInitialized);
        }
        let id = self.state.next_id();
        let record = Box::new(TaskRecord::new(id, kind, callback));
        self.state.on_dispatch();
        match self.pool.dispatch(record) {
            Ok(()) => Ok(id),
            Err(e) => {
                self.state.on_drain();
                Err(e)
            }
        }
    }

    /// Read `buf.len()` bytes from `fd` at `offset`.
    pub fn read(
        &self,
        fd: RawFd,
        buf: &mut [u8],
        offset: u64,
        callback: Option<Callback>,
    ) -> Result<TaskId> {
        let kind = TaskKind::Read {
            fd,
            buf: IoBuffer::from_slice(buf),
            offset,
        };
        self.dispatch(kind, callback)
    }

    /// Write `buf` to `fd`. An `offset` of `0` writes sequentially at the
    /// file's current position, matching the legacy C convention; anything
    /// else is a positioned write. Callers that need a positioned write at
    /// byte zero of the file should submit via `write_at` instead.
    pub fn write(
        &self,
        fd: RawFd,
        buf: &[u8],
        offset: u64,
        callback: Option<Callback>,
    ) -> Result<TaskId> {
        self.write_at(fd, buf, WriteOffset::from(offset), callback)
    }

    /// Write `buf` to `fd` with an unambiguous offset.
    pub fn write_at(
        &self,
        fd: RawFd,
        buf: &[u8],
        offset: WriteOffset,
        callback: Option<Callback>,
    ) -> Result<TaskId> {
        // Safety: the caller guarantees `buf` outlives the task's callback.
        let handle = unsafe { IoBuffer::from_raw_parts(buf.as_ptr() as *mut u8, buf.len()) };
        let kind = TaskKind::Write {
            fd,
            buf: handle,
            offset,
        };
        self.dispatch(kind, callback)
    }

    /// Resolve `hostname` to a single address of `family`, rendering it as
    /// text into `buf`.
    pub fn dns_lookup(
        &self,
        hostname: impl Into<String>,
        family: AddressFamily,
        buf: &mut [u8],
        callback: Option<Callback>,
    ) -> Result<TaskId> {
        let kind = TaskKind::DnsLookup {
            hostname: hostname.into(),
            family,
            buf: IoBuffer::from_slice(buf),
        };
        self.dispatch(kind, callback)
    }

    /// Resolve `host`/`service` into a list of socket addresses.
    pub fn getaddrinfo(
        &self,
        host: impl Into<String>,
        service: Option<String>,
        callback: Option<Callback>,
    ) -> Result<TaskId> {
        let kind = TaskKind::GetAddrInfo {
            request: Box::new(GetAddrInfoRequest::new(host, service)),
        };
        self.dispatch(kind, callback)
    }

    /// Number of tasks dispatched but not yet drained.
    pub fn pending(&self) -> i64 {
        self.state.pending()
    }
}

//! Task record and its variant payloads.
//!
//! `TaskKind` is a proper sum type rather than a tag plus an untyped union
//! of `fd`/`buf`/`offset`/`flags`/`req` fields that only some variants use.
//! Each variant only carries the fields it actually needs.

use crate::buffer::IoBuffer;
use std::net::SocketAddr;
use std::os::unix::io::RawFd;

/// Correlation handle returned at submission time.
///
/// Monotonically increasing within a process; the counter advances on
/// every submission, including ones that fail to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TaskId(pub u64);

/// Address family for DNS lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

/// Write positioning.
///
/// A bare `offset: 0` is ambiguous between "write sequentially at the
/// current file position" and "write at byte zero of the file" — this type
/// makes the distinction explicit. The `offset == 0 ⇒ sequential` mapping
/// exists only at the public `write()` facade boundary (see `aio-engine`)
/// for callers migrating from that convention; it never appears inside the
/// engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOffset {
    Sequential,
    Positioned(u64),
}

impl From<u64> for WriteOffset {
    fn from(offset: u64) -> Self {
        if offset == 0 {
            WriteOffset::Sequential
        } else {
            WriteOffset::Positioned(offset)
        }
    }
}

/// A `getaddrinfo`-style request. Filled in with results in place by the
/// worker; the submitter reads `results` only after the task's callback
/// has fired.
pub struct GetAddrInfoRequest {
    pub host: String,
    pub service: Option<String>,
    pub results: Vec<SocketAddr>,
}

impl GetAddrInfoRequest {
    pub fn new(host: impl Into<String>, service: Option<String>) -> Self {
        Self {
            host: host.into(),
            service,
            results: Vec::new(),
        }
    }
}

/// One submittable operation and its variant-specific payload.
pub enum TaskKind {
    Read {
        fd: RawFd,
        buf: IoBuffer,
        offset: u64,
    },
    Write {
        fd: RawFd,
        buf: IoBuffer,
        offset: WriteOffset,
    },
    DnsLookup {
        hostname: String,
        family: AddressFamily,
        buf: IoBuffer,
    },
    GetAddrInfo {
        request: Box<GetAddrInfoRequest>,
    },
}

impl TaskKind {
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Read { .. } => "read",
            TaskKind::Write { .. } => "write",
            TaskKind::DnsLookup { .. } => "dns_lookup",
            TaskKind::GetAddrInfo { .. } => "getaddrinfo",
        }
    }
}

/// Completion hook: invoked on the reactor thread once a task finishes.
/// The record is valid for the duration of the call and freed immediately
/// after it returns.
pub type Callback = Box<dyn FnOnce(&TaskRecord) + Send>;

/// One submission's request, result, and completion hook.
///
/// Ownership is exclusive and moves through exactly one path:
/// submitter → pool queue → worker → completion pipe → drain handler,
/// which frees it after invoking `callback` (or the engine's default hook
/// when `callback` is `None`).
pub struct TaskRecord {
    pub id: TaskId,
    pub kind: TaskKind,
    /// Syscall/resolver return value. `>= 0` on success, `< 0` on failure.
    pub ret: i64,
    /// Error code; `0` on success.
    pub error: i32,
    pub callback: Option<Callback>,
}

impl TaskRecord {
    pub fn new(id: TaskId, kind: TaskKind, callback: Option<Callback>) -> Self {
        Self {
            id,
            kind,
            ret: 0,
            error: 0,
            callback,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.ret >= 0
    }
}

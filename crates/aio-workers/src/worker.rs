//! Worker executor (C2) — runs one task's blocking operation.
//!
//! This is invoked from inside a `FixedPool` worker thread, never from the
//! reactor thread. It may block for as long as the underlying syscall or
//! resolver call does; that's the entire reason this engine exists.

use aio_core::task::{TaskKind, TaskRecord, WriteOffset};
use aio_core::resolver::Resolver;

use nix::fcntl::{flock, FlockArg};
use nix::sys::uio::{pread, pwrite};
use nix::unistd;
use std::os::unix::io::{AsRawFd, BorrowedFd, RawFd};
use std::sync::Mutex;

/// Run `task`'s blocking operation, filling in `ret` and `error`.
///
/// Transient errors (`EINTR`, `EAGAIN`) are retried internally, from the
/// top of the whole dispatch, including re-acquiring any lock that was
/// released before the retry.
pub fn execute(task: &mut TaskRecord, resolver: &dyn Resolver, pipe_lock: &Mutex<()>) {
    loop {
        let outcome = run_once(&mut task.kind, resolver, pipe_lock);
        match outcome {
            Outcome::Retry => continue,
            Outcome::Done { ret, error } => {
                task.ret = ret;
                task.error = error;
                return;
            }
        }
    }
}

enum Outcome {
    Retry,
    Done { ret: i64, error: i32 },
}

fn run_once(kind: &mut TaskKind, resolver: &dyn Resolver, pipe_lock: &Mutex<()>) -> Outcome {
    match kind {
        TaskKind::Write { fd, buf, offset } => {
            let fd = *fd;
            if let Err(errno) = lock_file(fd, FlockArg::LockExclusive) {
                return Outcome::Done {
                    ret: -1,
                    error: errno,
                };
            }
            // Safety: the worker has exclusive access to the buffer for the
            // duration of this task (see `TaskRecord` ownership invariants).
            let bytes = unsafe { buf.as_slice() };
            let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
            let result = match offset {
                WriteOffset::Sequential => unistd::write(borrowed, bytes),
                WriteOffset::Positioned(pos) => pwrite(borrowed, bytes, *pos as i64),
            };
            let _ = lock_file(fd, FlockArg::Unlock);
            finish_syscall(result.map(|n| n as i64))
        }
        TaskKind::Read { fd, buf, offset } => {
            let fd = *fd;
            if let Err(errno) = lock_file(fd, FlockArg::LockShared) {
                return Outcome::Done {
                    ret: -1,
                    error: errno,
                };
            }
            // Safety: same exclusive-ownership contract as above.
            let bytes = unsafe { buf.as_mut_slice() };
            let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
            let result = pread(borrowed, bytes, *offset as i64);
            let _ = lock_file(fd, FlockArg::Unlock);
            finish_syscall(result.map(|n| n as i64))
        }
        TaskKind::DnsLookup {
            hostname,
            family,
            buf,
        } => {
            let _guard = if cfg!(feature = "legacy_resolver") {
                Some(pipe_lock.lock().unwrap())
            } else {
                None
            };
            match resolver.resolve(*family, hostname) {
                Ok(addr) => {
                    // Safety: exclusive ownership, as above.
                    unsafe { buf.clear() };
                    let text = addr.to_string();
                    let text_bytes = text.as_bytes();
                    // Safety: exclusive ownership, as above.
                    let out = unsafe { buf.as_mut_slice() };
                    if text_bytes.len() >= out.len() {
                        Outcome::Done {
                            ret: -1,
                            error: aio_core::AioError::AddressFormat.error_code(),
                        }
                    } else {
                        out[..text_bytes.len()].copy_from_slice(text_bytes);
                        Outcome::Done { ret: 0, error: 0 }
                    }
                }
                Err(code) => {
                    // Safety: exclusive ownership, as above.
                    unsafe { buf.clear() };
                    Outcome::Done {
                        ret: -1,
                        error: code,
                    }
                }
            }
        }
        TaskKind::GetAddrInfo { request } => {
            let error = resolver.getaddrinfo(request);
            if error == 0 {
                Outcome::Done { ret: 0, error: 0 }
            } else {
                Outcome::Done {
                    ret: -1,
                    error,
                }
            }
        }
    }
}

fn lock_file(fd: RawFd, arg: FlockArg) -> Result<(), i32> {
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
    flock(borrowed.as_raw_fd(), arg).map_err(|e| e as i32)
}

fn finish_syscall(result: Result<i64, nix::Error>) -> Outcome {
    match result {
        Ok(n) => Outcome::Done { ret: n, error: 0 },
        Err(nix::Error::EINTR) | Err(nix::Error::EAGAIN) => Outcome::Retry,
        Err(e) => Outcome::Done {
            ret: -1,
            error: e as i32,
        },
    }
}

//! Completion pipe (C3) — the handoff channel from worker threads to the
//! reactor thread.
//!
//! A finished `TaskRecord` crosses this pipe as a raw pointer: the worker
//! writes `Box::into_raw(record) as usize` (pointer-width, one write), the
//! drain handler on the reactor side reads it back and reconstitutes the
//! box. The write end is shared by every worker thread and serialized by
//! a single mutex so concurrent writes can never interleave their bytes.

use aio_core::{AioError, Result};

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::unistd;
use std::os::unix::io::{AsRawFd, BorrowedFd, IntoRawFd, RawFd};
use std::sync::Mutex;

const WORD_SIZE: usize = std::mem::size_of::<usize>();

pub struct UnixPipe {
    read_fd: RawFd,
    write_fd: RawFd,
    write_lock: Mutex<()>,
}

impl UnixPipe {
    pub fn new() -> Result<Self> {
        let (read_fd, write_fd) = unistd::pipe().map_err(|e| AioError::Os(e as i32))?;
        let read_fd = read_fd.into_raw_fd();
        let write_fd = write_fd.into_raw_fd();
        set_nonblocking(read_fd)?;
        Ok(Self {
            read_fd,
            write_fd,
            write_lock: Mutex::new(()),
        })
    }

    pub fn reader_fd(&self) -> RawFd {
        self.read_fd
    }

    pub fn writer_fd(&self) -> RawFd {
        self.write_fd
    }

    /// Write one pointer-sized word, retrying on `EINTR`/`EAGAIN`.
    ///
    /// Callers hold `pipe_lock` for the legacy-resolver feature already;
    /// this lock additionally protects against two workers' writes
    /// interleaving within the same word.
    pub fn send(&self, ptr: *mut aio_core::task::TaskRecord) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        let bytes = (ptr as usize).to_ne_bytes();
        let mut written = 0;
        let borrowed = unsafe { BorrowedFd::borrow_raw(self.write_fd) };
        while written < WORD_SIZE {
            match unistd::write(borrowed, &bytes[written..]) {
                Ok(n) => written += n,
                Err(nix::Error::EINTR) => continue,
                Err(nix::Error::EAGAIN) => continue,
                Err(e) => return Err(AioError::Os(e as i32)),
            }
        }
        Ok(())
    }

    /// Non-blocking read of up to `max_ptrs` pointers. Partial trailing
    /// bytes, and any whole words beyond `max_ptrs`, are left in `residual`
    /// for the next call — nothing is ever read out of the kernel pipe and
    /// then discarded: the read loop itself stops once `residual` holds
    /// enough bytes, so anything past `max_ptrs` simply stays unread in the
    /// pipe (or buffered in `residual`) until the caller asks for more.
    pub fn recv_available(
        &self,
        residual: &mut Vec<u8>,
        max_ptrs: usize,
    ) -> Result<Vec<*mut aio_core::task::TaskRecord>> {
        let target_bytes = max_ptrs * WORD_SIZE;
        let mut buf = [0u8; 4096];
        let borrowed = unsafe { BorrowedFd::borrow_raw(self.read_fd) };
        while residual.len() < target_bytes {
            match unistd::read(borrowed.as_raw_fd(), &mut buf) {
                Ok(0) => break,
                Ok(n) => residual.extend_from_slice(&buf[..n]),
                Err(nix::Error::EAGAIN) => break,
                Err(nix::Error::EINTR) => continue,
                Err(e) => return Err(AioError::Os(e as i32)),
            }
        }
        let whole_words = (residual.len() / WORD_SIZE).min(max_ptrs);
        let consumed = whole_words * WORD_SIZE;
        let mut ptrs = Vec::with_capacity(whole_words);
        for chunk in residual[..consumed].chunks_exact(WORD_SIZE) {
            let mut word = [0u8; WORD_SIZE];
            word.copy_from_slice(chunk);
            ptrs.push(usize::from_ne_bytes(word) as *mut aio_core::task::TaskRecord);
        }
        residual.drain(..consumed);
        Ok(ptrs)
    }
}

fn set_nonblocking(fd: RawFd) -> Result<()> {
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
    let flags = fcntl(borrowed.as_raw_fd(), FcntlArg::F_GETFL).map_err(|e| AioError::Os(e as i32))?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(borrowed.as_raw_fd(), FcntlArg::F_SETFL(flags)).map_err(|e| AioError::Os(e as i32))?;
    Ok(())
}

impl Drop for UnixPipe {
    fn drop(&mut self) {
        let _ = unistd::close(self.read_fd);
        let _ = unistd::close(self.write_fd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_pointer() {
        let pipe = UnixPipe::new().unwrap();
        let mut record = Box::new(42u8);
        let ptr = &mut *record as *mut u8 as *mut aio_core::task::TaskRecord;
        pipe.send(ptr).unwrap();
        let mut residual = Vec::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let ptrs = pipe.recv_available(&mut residual, 16).unwrap();
        assert_eq!(ptrs, vec![ptr]);
    }

    #[test]
    fn bounds_read_to_max_ptrs_and_keeps_the_rest_for_next_call() {
        let pipe = UnixPipe::new().unwrap();
        let mut records: Vec<Box<u8>> = (0..4u8).map(Box::new).collect();
        let ptrs: Vec<_> = records
            .iter_mut()
            .map(|r| &mut **r as *mut u8 as *mut aio_core::task::TaskRecord)
            .collect();
        for ptr in &ptrs {
            pipe.send(*ptr).unwrap();
        }

        std::thread::sleep(std::time::Duration::from_millis(10));
        let mut residual = Vec::new();
        let first = pipe.recv_available(&mut residual, 2).unwrap();
        assert_eq!(first, ptrs[..2]);

        let second = pipe.recv_available(&mut residual, 16).unwrap();
        assert_eq!(second, ptrs[2..]);
    }
}

//! Minimal level-triggered epoll reactor (default `Reactor`).
//!
//! Just enough to drive the engine end to end: register a handful of fds,
//! dispatch readability events to the one handler installed per event
//! class, and nothing else. Production services with a real reactor
//! already running should implement `Reactor` against it instead of using
//! this one.

use aio_core::reactor::{EventClass, Handler, Reactor};
use aio_core::{AioError, Result};

use nix::sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags, EpollTimeout};
use std::collections::HashMap;
use std::os::unix::io::{AsRawFd, BorrowedFd, RawFd};

pub struct EpollReactor {
    epoll: Epoll,
    handlers: HashMap<EventClass, Handler>,
    registered: HashMap<RawFd, EventClass>,
}

impl EpollReactor {
    pub fn new() -> Result<Self> {
        let epoll = Epoll::new(EpollCreateFlags::empty()).map_err(|e| AioError::Os(e as i32))?;
        Ok(Self {
            epoll,
            handlers: HashMap::new(),
            registered: HashMap::new(),
        })
    }

    /// Block for up to `timeout_ms` waiting for events, dispatching each
    /// ready fd to its class's handler. Returns the number of fds
    /// dispatched.
    pub fn run_once(&mut self, timeout_ms: i32) -> Result<usize> {
        let mut events = [EpollEvent::empty(); 16];
        let timeout = EpollTimeout::try_from(timeout_ms).unwrap_or(EpollTimeout::NONE);
        let n = self
            .epoll
            .wait(&mut events, timeout)
            .map_err(|e| AioError::Os(e as i32))?;

        for event in &events[..n] {
            let fd = event.data() as RawFd;
            if let Some(class) = self.registered.get(&fd).copied() {
                if let Some(handler) = self.handlers.get_mut(&class) {
                    if let Err(err) = handler(fd) {
                        log::warn!("aio reactor handler for fd {fd} returned an error: {err}");
                    }
                }
            }
        }
        Ok(n)
    }
}

impl Reactor for EpollReactor {
    fn set_handler(&mut self, class: EventClass, handler: Handler) {
        self.handlers.insert(class, handler);
    }

    fn add(&mut self, fd: RawFd, class: EventClass) -> Result<()> {
        let event = EpollEvent::new(EpollFlags::EPOLLIN, fd as u64);
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        self.epoll
            .add(borrowed, event)
            .map_err(|e| AioError::Os(e as i32))?;
        self.registered.insert(fd, class);
        Ok(())
    }

    fn del(&mut self, fd: RawFd) -> Result<()> {
        if self.registered.remove(&fd).is_none() {
            return Ok(());
        }
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        match self.epoll.delete(borrowed) {
            Ok(()) => Ok(()),
            Err(nix::Error::EBADF) | Err(nix::Error::ENOENT) => Ok(()),
            Err(e) => Err(AioError::Os(e as i32)),
        }
    }
}

impl AsRawFd for EpollReactor {
    fn as_raw_fd(&self) -> RawFd {
        self.epoll.0.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd;
    use std::os::unix::io::IntoRawFd;

    #[test]
    fn dispatches_a_ready_read_fd() {
        let (read_fd, write_fd) = unistd::pipe().unwrap();
        let read_fd = read_fd.into_raw_fd();
        let write_fd = write_fd.into_raw_fd();

        let mut reactor = EpollReactor::new().unwrap();
        let fired = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let fired_clone = std::sync::Arc::clone(&fired);
        reactor.set_handler(
            EventClass::Aio,
            Box::new(move |_fd| {
                fired_clone.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }),
        );
        reactor.add(read_fd, EventClass::Aio).unwrap();

        let borrowed = unsafe { BorrowedFd::borrow_raw(write_fd) };
        unistd::write(borrowed, b"x").unwrap();
        reactor.run_once(100).unwrap();
        assert!(fired.load(std::sync::atomic::Ordering::SeqCst));

        let _ = unistd::close(read_fd);
        let _ = unistd::close(write_fd);
    }
}

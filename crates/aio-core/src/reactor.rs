//! Event reactor abstraction.
//!
//! The reactor is a dependency of this engine, not a part of it: the
//! engine registers exactly one file descriptor — the completion pipe's
//! read end — under one event class, and otherwise never touches the
//! reactor again until shutdown. Everything else (epoll vs. kqueue,
//! edge vs. level triggering, how other fds are managed) is the reactor's
//! own business.
//!
//! # Implementors
//!
//! - `EpollReactor` (`aio-workers`, default): a minimal level-triggered
//!   epoll loop, just enough to drive the engine end to end in tests and
//!   the smoke binary.

use std::os::unix::io::RawFd;

/// Which class of event a registration is for.
///
/// Only `Aio` is consumed by this engine; the enum exists so a reactor
/// shared with unrelated subsystems can dispatch on more than one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    Aio,
}

/// A reactor-invoked handler for a registered fd.
///
/// Returning `Err` logs but never causes the reactor to deregister the fd;
/// the completion drain handler treats a drain error as transient.
pub type Handler = Box<dyn FnMut(RawFd) -> crate::Result<()> + Send>;

/// The event loop the engine registers its completion fd with.
pub trait Reactor {
    /// Install the handler invoked for every fd registered under `class`.
    fn set_handler(&mut self, class: EventClass, handler: Handler);

    /// Start watching `fd` for readability, dispatching to the handler
    /// installed for `class`.
    fn add(&mut self, fd: RawFd, class: EventClass) -> crate::Result<()>;

    /// Stop watching `fd`. Idempotent: removing an fd that isn't
    /// registered is not an error.
    fn del(&mut self, fd: RawFd) -> crate::Result<()>;
}

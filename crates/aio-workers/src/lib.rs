//! Default implementations of the `aio-core` traits: a fixed thread pool,
//! a pipe-based completion channel, a minimal epoll reactor, and a
//! standard-library-backed resolver.

pub mod epoll_reactor;
pub mod fixed_pool;
pub mod pipe;
pub mod resolver_impl;
pub mod worker;

pub use epoll_reactor::EpollReactor;
pub use fixed_pool::{FixedPool, Hook};
pub use pipe::UnixPipe;
pub use resolver_impl::StdResolver;

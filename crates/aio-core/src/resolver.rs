//! Hostname / address-info resolution abstraction.
//!
//! # Implementors
//!
//! - `StdResolver` (`aio-workers`, default): backed by
//!   `std::net::ToSocketAddrs`, which calls `getaddrinfo(3)` under the
//!   hood on every platform this crate targets. Reentrant, so the
//!   default build path never takes the engine's `pipe_lock` around a
//!   lookup — only the `legacy_resolver` feature (simulating a platform
//!   without a thread-safe resolver) does.

use crate::task::{AddressFamily, GetAddrInfoRequest};
use std::net::IpAddr;

/// Resolves hostnames to addresses on a worker thread.
pub trait Resolver: Send + Sync {
    /// Resolve `hostname` to a single address of the requested family.
    ///
    /// Returns the resolver's own error code on failure (stored verbatim
    /// into `TaskRecord::error` by the worker executor).
    fn resolve(&self, family: AddressFamily, hostname: &str) -> Result<IpAddr, i32>;

    /// Resolve `request.host` (+ optional service) into zero or more
    /// socket addresses, writing them into `request.results` in place.
    ///
    /// Returns `0` on success, a nonzero error code on failure.
    fn getaddrinfo(&self, request: &mut GetAddrInfoRequest) -> i32;
}

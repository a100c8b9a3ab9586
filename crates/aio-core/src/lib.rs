//! # aio-core — Trait definitions for the async I/O offload engine
//!
//! This crate defines the trait boundaries between the engine (`aio-engine`)
//! and its collaborators. Each trait models one capability the engine treats
//! as a black box: a reactor to register a completion fd with, a thread pool
//! to run blocking syscalls, a resolver to turn hostnames into addresses.
//!
//! Default (safe) implementations live in `aio-workers`. Nothing in this
//! crate depends on a concrete implementation — swapping one is a type
//! parameter change at the call site, never a change here.

pub mod buffer;
pub mod error;
pub mod pool;
pub mod reactor;
pub mod resolver;
pub mod task;

pub use error::{AioError, Result};
pub use task::{Callback, TaskId, TaskKind, TaskRecord, WriteOffset};

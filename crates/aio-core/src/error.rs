//! Engine error types.

use std::fmt;

#[derive(Debug)]
pub enum AioError {
    /// `Engine::init` called a second time.
    AlreadyInitialized,
    /// `Engine::init` called without a usable reactor, or reactor registration failed.
    NoReactor,
    /// Submission after `destroy`/shutdown.
    NotInitialized,
    /// The thread pool's queue rejected the task (full, or pool shut down).
    WorkerUnavailable,
    /// A resolved address could not be rendered into the caller's buffer.
    /// Replaces the C ancestor's overloaded `BAD_IPV6_ADDRESS`, which was
    /// reused for both address families.
    AddressFormat,
    /// Hostname resolution failed; carries the resolver's own error code.
    ResolutionFailed(i32),
    /// Raw OS error (errno).
    Os(i32),
}

impl fmt::Display for AioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialized => write!(f, "engine already initialized"),
            Self::NoReactor => write!(f, "no reactor available to register with"),
            Self::NotInitialized => write!(f, "engine not initialized"),
            Self::WorkerUnavailable => write!(f, "worker pool unavailable"),
            Self::AddressFormat => write!(f, "resolved address does not fit the output buffer"),
            Self::ResolutionFailed(e) => write!(f, "resolution failed: code {}", e),
            Self::Os(e) => write!(f, "OS error: errno {}", e),
        }
    }
}

impl AioError {
    /// The raw code this error maps to when stored into `TaskRecord::error`
    /// (an `i32`, not an `AioError`) rather than returned synchronously.
    /// Only variants that can actually occur on that path carry a
    /// meaningful mapping; `-1` is used for the rest.
    pub fn error_code(&self) -> i32 {
        match self {
            // Chosen well outside the valid errno range so it can never be
            // confused with a real OS error reported on the same field.
            Self::AddressFormat => -9000,
            Self::ResolutionFailed(code) | Self::Os(code) => *code,
            _ => -1,
        }
    }
}

impl std::error::Error for AioError {}

impl From<std::io::Error> for AioError {
    fn from(e: std::io::Error) -> Self {
        match e.raw_os_error() {
            Some(errno) => Self::Os(errno),
            None => Self::Os(0),
        }
    }
}

pub type Result<T> = std::result::Result<T, AioError>;

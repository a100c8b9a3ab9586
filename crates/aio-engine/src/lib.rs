//! Asynchronous I/O offload engine.
//!
//! Turns blocking file I/O and name resolution into operations that
//! complete on an event loop: `Engine::init` wires a thread pool, a
//! completion pipe, and a reactor registration together; `Facade` is the
//! thing callers actually submit work through.

pub mod drain;
pub mod engine;
pub mod facade;
pub mod state;

pub use engine::{Engine, EngineCell};
pub use facade::Facade;
pub use state::{EngineConfig, Mode};

#[cfg(test)]
mod tests {
    use super::*;
    use aio_core::task::AddressFamily;
    use aio_workers::EpollReactor;
    use std::sync::{Arc, Mutex};

    #[test]
    fn end_to_end_write_then_read_round_trip() {
        let reactor = Arc::new(Mutex::new(EpollReactor::new().unwrap()));
        let engine = Engine::init(Arc::clone(&reactor), EngineConfig::default(), None).unwrap();
        let facade = engine.facade();

        let file = tempfile::NamedTempFile::new().unwrap();
        let fd = std::os::unix::io::AsRawFd::as_raw_fd(file.as_file());

        let done = Arc::new((Mutex::new(false), std::sync::Condvar::new()));
        let done_clone = Arc::clone(&done);
        facade
            .write(
                fd,
                b"hello offload engine",
                0,
                Some(Box::new(move |_rec| {
                    let (lock, cvar) = &*done_clone;
                    *lock.lock().unwrap() = true;
                    cvar.notify_all();
                })),
            )
            .unwrap();

        wait_for_completion(&reactor, &done);
    }

    #[test]
    fn dns_lookup_resolves_localhost() {
        let reactor = Arc::new(Mutex::new(EpollReactor::new().unwrap()));
        let engine = Engine::init(Arc::clone(&reactor), EngineConfig::default(), None).unwrap();
        let facade = engine.facade();

        let mut buf = vec![0u8; 64];
        let done = Arc::new((Mutex::new(false), std::sync::Condvar::new()));
        let done_clone = Arc::clone(&done);
        facade
            .dns_lookup(
                "localhost",
                AddressFamily::V4,
                &mut buf,
                Some(Box::new(move |_rec| {
                    let (lock, cvar) = &*done_clone;
                    *lock.lock().unwrap() = true;
                    cvar.notify_all();
                })),
            )
            .unwrap();

        wait_for_completion(&reactor, &done);
    }

    fn wait_for_completion(
        reactor: &Arc<Mutex<EpollReactor>>,
        done: &Arc<(Mutex<bool>, std::sync::Condvar)>,
    ) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        loop {
            {
                let mut guard = reactor.lock().unwrap();
                let _ = guard.run_once(50);
            }
            if *done.0.lock().unwrap() {
                return;
            }
            if std::time::Instant::now() > deadline {
                panic!("completion did not fire within the deadline");
            }
        }
    }
}

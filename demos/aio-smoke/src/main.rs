//! Drives a small offload engine end to end: a positioned write, a read
//! back of what was written, and a DNS lookup, all completing through a
//! real epoll reactor on the main thread.

use aio_core::task::AddressFamily;
use aio_workers::EpollReactor;
use aio_engine::{Engine, EngineConfig};

use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn main() {
    env_logger::init();

    let reactor = Arc::new(Mutex::new(EpollReactor::new().expect("epoll init")));
    let engine = Engine::init(Arc::clone(&reactor), EngineConfig::default(), None)
        .expect("engine init");
    let facade = engine.facade();

    let outstanding = Arc::new(AtomicUsize::new(0));

    let file = tempfile::NamedTempFile::new().expect("temp file");
    let fd = file.as_file().as_raw_fd();
    let payload = b"aio-smoke round trip";

    outstanding.fetch_add(1, Ordering::SeqCst);
    let outstanding_clone = Arc::clone(&outstanding);
    facade
        .write(
            fd,
            payload,
            0,
            Some(Box::new(move |record| {
                log::info!("write completed: ret={} error={}", record.ret, record.error);
                outstanding_clone.fetch_sub(1, Ordering::SeqCst);
            })),
        )
        .expect("submit write");

    let mut read_buf = vec![0u8; payload.len()];
    let read_ptr = read_buf.as_mut_ptr();
    let read_len = read_buf.len();
    outstanding.fetch_add(1, Ordering::SeqCst);
    let outstanding_clone = Arc::clone(&outstanding);
    facade
        .read(
            fd,
            unsafe { std::slice::from_raw_parts_mut(read_ptr, read_len) },
            0,
            Some(Box::new(move |record| {
                log::info!("read completed: ret={} error={}", record.ret, record.error);
                outstanding_clone.fetch_sub(1, Ordering::SeqCst);
            })),
        )
        .expect("submit read");

    let mut dns_buf = vec![0u8; 64];
    outstanding.fetch_add(1, Ordering::SeqCst);
    let outstanding_clone = Arc::clone(&outstanding);
    facade
        .dns_lookup(
            "localhost",
            AddressFamily::V4,
            &mut dns_buf,
            Some(Box::new(move |record| {
                log::info!(
                    "dns lookup completed: ret={} error={}",
                    record.ret,
                    record.error
                );
                outstanding_clone.fetch_sub(1, Ordering::SeqCst);
            })),
        )
        .expect("submit dns lookup");

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while outstanding.load(Ordering::SeqCst) > 0 {
        {
            let mut guard = reactor.lock().unwrap();
            let _ = guard.run_once(100);
        }
        if std::time::Instant::now() > deadline {
            eprintln!("timed out waiting for completions");
            std::process::exit(1);
        }
    }

    println!("all operations completed");
}

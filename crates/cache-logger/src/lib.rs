//! Thin wrapper around `log` + `ringlog`, the way the teacher's `logger`
//! crate backs every Pelikan server. Provides process-wide log
//! initialization plus a `Klog` trait for the per-request access log line
//! (opcode, key, reply code) that `crates/core`'s handlers emit.

use ringlog::LogBuilder;
use std::time::Duration;

pub use ringlog::Level;

/// Initializes the global logger. Must be called once, at process start,
/// before any `log::info!`/`debug!`/`klog!` calls. Spawns a background
/// thread that periodically flushes the ring buffer to stdout.
pub fn init(level: Level) {
    let (logger, mut drain) = LogBuilder::new()
        .output(Box::new(std::io::stdout()))
        .log_queue_depth(4096)
        .single_message_size(1024)
        .build()
        .expect("failed to build logger");

    log::set_boxed_logger(Box::new(logger)).expect("logger already initialized");
    log::set_max_level(level.to_level_filter());

    std::thread::Builder::new()
        .name("log-drain".into())
        .spawn(move || loop {
            drain.flush();
            std::thread::sleep(Duration::from_millis(100));
        })
        .expect("failed to spawn log drain thread");
}

/// Implemented by each request type to record a structured access-log
/// line once its response is known. Mirrors `protocol-memcache`'s
/// `Klog` trait, generalized from memcache opcodes to this cache's own
/// opcode set.
pub trait Klog {
    type Response;

    fn klog(&self, response: &Self::Response);
}

/// Emits one access-log line at the `info` level under the `klog` target,
/// matching the `klog!` macro used throughout `protocol-memcache`.
#[macro_export]
macro_rules! klog {
    ($($arg:tt)*) => {
        log::info!(target: "klog", $($arg)*);
    };
}

pub use klog;

pub mod builders;
pub mod plugs;

use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use pipework::logging::{LogContext, LogOptions};
use pipework::paths::AbsolutePath;
use pipework::types::LogLevel;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Log context used by tests: debug level, no colors.
pub fn test_log_context() -> LogContext {
    LogContext::new(LogOptions {
        level: LogLevel::Debug,
        colors: false,
        task_width: 0,
        log_file: None,
    })
}

/// Absolute path of a (possibly nonexistent) build file inside `dir`.
pub fn build_file_in(dir: impl AsRef<Path>, name: &str) -> AbsolutePath {
    AbsolutePath::new(dir.as_ref().join(name)).expect("test directories are absolute")
}

/// A cloneable invocation counter for task bodies.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

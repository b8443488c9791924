pub mod builders;
pub mod recorder;

use std::sync::Once;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use taskpool::logging::LOG_ENV_VAR;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows up for failing
/// tests. The filter is read from `TASKPOOL_LOG` like the binary does,
/// e.g. `TASKPOOL_LOG=taskpool=debug`; default is `warn` to keep stress
/// tests quiet.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_names(true)
            .init();
    });
}

/// Run `f` on its own thread and fail the test if it takes longer than
/// 10 seconds, so a deadlocked pool fails instead of hanging the suite.
pub fn with_timeout<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        let _ = tx.send(f());
    });

    match rx.recv_timeout(Duration::from_secs(10)) {
        Ok(value) => {
            let _ = handle.join();
            value
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match handle.join() {
            Err(panic) => std::panic::resume_unwind(panic),
            Ok(()) => panic!("test body finished without producing a value"),
        },
        Err(mpsc::RecvTimeoutError::Timeout) => panic!("Test timed out after 10 seconds"),
    }
}

//! Ctrl+C handling and run timeouts.
//!
//! Both feed one shared `AtomicBool`. The walker and the classifier poll
//! it (the classifier once per size group) and wind down when it is set;
//! resolution never starts on an interrupted run.
//!
//! ```rust,no_run
//! use dupe_eraser::signal::install_handler;
//! use std::time::Duration;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! handler.arm_timeout(Duration::from_secs(60));
//! let flag = handler.get_flag();
//! // pass `flag` to FileEnumerator / ClassifierConfig
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

/// Exit code for an interrupted run (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once Ctrl+C was pressed, the timeout elapsed or
    /// [`request_shutdown`](Self::request_shutdown) was called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag itself, for worker components.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Set the flag once `timeout` has elapsed.
    ///
    /// The watchdog is a detached thread; it does not keep the process
    /// alive after `main` returns.
    pub fn arm_timeout(&self, timeout: Duration) -> thread::JoinHandle<()> {
        let flag = self.get_flag();
        thread::spawn(move || {
            thread::sleep(timeout);
            if !flag.swap(true, Ordering::SeqCst) {
                log::warn!("Time budget of {:?} exhausted, stopping", timeout);
            }
        })
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler.
///
/// Calling this again (tests run `run_app` many times per process) resets
/// and returns the already installed handler. If another component owns
/// the signal hook, an unhooked handler is returned that still honours
/// [`ShutdownHandler::request_shutdown`] and timeouts.
///
/// # Errors
///
/// Currently always succeeds; the `Result` is kept for callers that want
/// to surface installation failures.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing current group...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
        }
        Err(e) => log::debug!("Ctrl+C handler unavailable ({}), using unhooked handler", e),
    }
    let handler = GLOBAL_HANDLER.get_or_init(|| handler).clone();
    handler.reset();
    Ok(handler)
}

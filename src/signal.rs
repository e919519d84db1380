//! Ctrl+C handling.
//!
//! A single `Arc<AtomicBool>` is shared by the walker, the hasher and the
//! comparator. The handler only sets the flag; each stage polls it between
//! files and unwinds with [`CompareError::Interrupted`], which maps to exit
//! code 130.
//!
//! ```rust,no_run
//! use dirmatch::compare::CompareConfig;
//! use dirmatch::signal::install_handler;
//!
//! let handler = install_handler();
//! let config = CompareConfig::default().with_shutdown_flag(handler.flag());
//! ```
//!
//! [`CompareError::Interrupted`]: crate::compare::CompareError::Interrupted

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// A handler with no shutdown requested and no signal hook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) was called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag for `CompareConfig`, `WalkerConfig` or `Hasher`.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// `ctrlc` accepts one hook per process. Later calls (for instance from tests
/// that run the app several times) get the installed handler back with its
/// flag cleared. If the hook was registered by someone else, an unhooked
/// handler is returned; it still honours [`ShutdownHandler::request_shutdown`].
pub fn install_handler() -> ShutdownHandler {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    let flag = handler.flag();
    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Finishing current file...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => GLOBAL_HANDLER.get_or_init(|| handler).clone(),
        Err(e) => {
            log::debug!("Ctrl+C hook not installed ({e}), using unhooked handler");
            let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new).clone();
            handler.reset();
            handler
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handler_is_clear() {
        assert!(!ShutdownHandler::new().is_shutdown_requested());
    }

    #[test]
    fn test_request_and_reset() {
        let handler = ShutdownHandler::new();
        handler.request_shutdown();
        assert!(handler.is_shutdown_requested());
        handler.reset();
        assert!(!handler.is_shutdown_requested());
    }

    #[test]
    fn test_flag_is_shared_both_ways() {
        let handler = ShutdownHandler::new();
        let flag = handler.flag();
        let cloned = handler.clone();

        flag.store(true, Ordering::SeqCst);
        assert!(handler.is_shutdown_requested());
        assert!(cloned.is_shutdown_requested());
    }

    #[test]
    fn test_install_twice_shares_one_flag() {
        let first = install_handler();
        let second = install_handler();
        assert!(Arc::ptr_eq(&first.flag(), &second.flag()));
    }

    #[test]
    fn test_handler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ShutdownHandler>();
    }
}

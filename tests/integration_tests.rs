use std::sync::{Mutex, MutexGuard};

/// Serializes tests that read or write `DIRMATCH_*` variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}

mod integration {
    mod app_tests;
    mod compare_tests;
    mod config_tests;
    mod error_continuation_tests;
    mod scenario_tests;
}

//! Integration tests for the full stack
//!
//! Drives an `Interpreter` the way a front end would: enumerate commands,
//! autocomplete, submit input, and read back output and entity state.
//! Set `RUST_LOG=parley_engine=debug` to see dispatch traces.

use tracing_subscriber::EnvFilter;

mod session;

/// Routes engine logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

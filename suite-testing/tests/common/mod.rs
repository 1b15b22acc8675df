//! Shared test utilities

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Route tracing output through the test writer; respects `RUST_LOG`.
/// Safe to call from every test.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

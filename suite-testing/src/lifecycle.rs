//! Suite lifecycle contract
//!
//! A suite groups related cases behind four hooks: one pair that runs once
//! around the whole suite, and one pair that runs around every case.

use crate::handle::{Handle, Scope};

/// Setup and teardown hooks a suite must provide.
///
/// `set_up_suite` receives the top-level reporting handle so the suite can
/// build handle-bound helpers once and reuse them across every case.
/// An `Err` from a hook is reported as a failure of the scope it runs in.
pub trait TestSuite<H: Handle = Scope> {
    /// Called once before the first case runs
    fn set_up_suite(&mut self, t: &mut H) -> anyhow::Result<()>;

    /// Called once after the last case finishes, on every exit path
    fn tear_down_suite(&mut self) -> anyhow::Result<()>;

    /// Called before each case
    fn set_up(&mut self) -> anyhow::Result<()>;

    /// Called after each case, even when the case or its setup failed
    fn tear_down(&mut self) -> anyhow::Result<()>;
}

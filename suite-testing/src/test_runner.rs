//! Suite runner
//!
//! Drives the lifecycle of one suite against a reporting handle:
//!
//! 1. `SetUpSuite` with the top-level handle
//! 2. for every discovered case, in discovery order, a child scope named
//!    after the case running `SetUp`, the case body and `TearDown`
//! 3. `TearDownSuite`
//!
//! Both teardowns are owned by guards, so they run on every exit path.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, debug_span, trace, warn};

use crate::config::RunnerConfig;
use crate::error::{Hook, SuiteError};
use crate::handle::{panic_message, Handle};
use crate::lifecycle::TestSuite;
use crate::test_discovery::{Case, Members, TestDiscovery};

/// Test runner
#[derive(Debug, Clone, Default)]
pub struct TestRunner {
    discovery: TestDiscovery,
}

impl TestRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner that treats members starting with `prefix` as cases
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            discovery: TestDiscovery::new(prefix),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::with_prefix(config.case_prefix.clone())
    }

    pub fn case_prefix(&self) -> &str {
        self.discovery.prefix()
    }

    /// Set up the suite, run each of its cases in its own child scope of
    /// `t`, and tear the suite down.
    pub fn run<H, S>(&self, t: &mut H, suite: &mut S)
    where
        H: Handle,
        S: TestSuite<H> + Members<H>,
    {
        let cases = self.discovery.discover(suite);
        let _span = debug_span!("suite", name = t.name()).entered();
        debug!(
            cases = cases.len(),
            prefix = self.case_prefix(),
            "running suite"
        );

        let mut scope = SuiteScope::new(suite, t);
        if !scope.set_up() {
            return;
        }

        for case in &cases {
            let (suite, t) = scope.parts();
            trace!(case = case.name(), "dispatching case");
            t.run(case.name(), |t| run_case(suite, case, t));
        }
    }
}

/// Run `suite` against `t` with the default case prefix
pub fn run<H, S>(t: &mut H, suite: &mut S)
where
    H: Handle,
    S: TestSuite<H> + Members<H>,
{
    TestRunner::default().run(t, suite)
}

fn run_case<H, S>(suite: &mut S, case: &Case<S, H>, t: &mut H)
where
    H: Handle,
    S: TestSuite<H>,
{
    let mut scope = CaseScope::new(suite, t);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| scope.exercise(case)));

    if let Err(payload) = &outcome {
        // A scope already failed by `fatal` or `error` keeps that message
        if !scope.t.failed() {
            if let Some(message) = panic_message(&**payload) {
                let err = if scope.body_started {
                    SuiteError::case_panicked(case.name(), message)
                } else {
                    SuiteError::hook_panicked(Hook::SetUp, message)
                };
                warn!(%err, "case terminated abruptly");
                scope.t.error(err.to_string());
            }
        }
    }

    // TearDown runs here, outside of any unwinding
    drop(scope);

    if outcome.is_err() {
        t.fail_now();
    }
}

/// Owns suite teardown for the duration of a run
struct SuiteScope<'a, S, H>
where
    H: Handle,
    S: TestSuite<H>,
{
    suite: &'a mut S,
    t: &'a mut H,
}

impl<'a, S, H> SuiteScope<'a, S, H>
where
    H: Handle,
    S: TestSuite<H>,
{
    fn new(suite: &'a mut S, t: &'a mut H) -> Self {
        Self { suite, t }
    }

    fn parts(&mut self) -> (&mut S, &mut H) {
        (&mut *self.suite, &mut *self.t)
    }

    /// Run `SetUpSuite`. On failure the error is reported on the top-level
    /// handle and no case may run.
    fn set_up(&mut self) -> bool {
        trace!("SetUpSuite");
        let (suite, t) = self.parts();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| suite.set_up_suite(t)));

        let err = match outcome {
            Ok(Ok(())) => return true,
            Ok(Err(source)) => SuiteError::hook(Hook::SetUpSuite, source),
            Err(payload) => match panic_message(payload.as_ref()) {
                Some(message) => SuiteError::hook_panicked(Hook::SetUpSuite, message),
                None => {
                    warn!("suite setup stopped, skipping all cases");
                    self.t.fail();
                    return false;
                }
            },
        };

        warn!(%err, "suite setup failed, skipping all cases");
        self.t.error(err.to_string());
        false
    }
}

impl<S, H> Drop for SuiteScope<'_, S, H>
where
    H: Handle,
    S: TestSuite<H>,
{
    fn drop(&mut self) {
        trace!("TearDownSuite");
        let suite = &mut *self.suite;
        let err = match panic::catch_unwind(AssertUnwindSafe(|| suite.tear_down_suite())) {
            Ok(Ok(())) => return,
            Ok(Err(source)) => SuiteError::hook(Hook::TearDownSuite, source),
            Err(payload) => match panic_message(payload.as_ref()) {
                Some(message) => SuiteError::hook_panicked(Hook::TearDownSuite, message),
                None => {
                    self.t.fail();
                    return;
                }
            },
        };
        warn!(%err, "suite teardown failed");
        self.t.error(err.to_string());
    }
}

/// Owns case teardown for the duration of one case
struct CaseScope<'a, S, H>
where
    H: Handle,
    S: TestSuite<H>,
{
    suite: &'a mut S,
    t: &'a mut H,
    body_started: bool,
}

impl<'a, S, H> CaseScope<'a, S, H>
where
    H: Handle,
    S: TestSuite<H>,
{
    fn new(suite: &'a mut S, t: &'a mut H) -> Self {
        Self {
            suite,
            t,
            body_started: false,
        }
    }

    fn exercise(&mut self, case: &Case<S, H>) {
        trace!(case = case.name(), "SetUp");
        if let Err(source) = self.suite.set_up() {
            let err = SuiteError::hook(Hook::SetUp, source);
            warn!(case = case.name(), %err, "case setup failed, skipping body");
            self.t.error(err.to_string());
            return;
        }

        self.body_started = true;
        if let Err(source) = case.call(self.suite, self.t) {
            self.t.error(SuiteError::case(case.name(), source).to_string());
        }
    }
}

impl<S, H> Drop for CaseScope<'_, S, H>
where
    H: Handle,
    S: TestSuite<H>,
{
    fn drop(&mut self) {
        trace!("TearDown");
        let suite = &mut *self.suite;
        let err = match panic::catch_unwind(AssertUnwindSafe(|| suite.tear_down())) {
            Ok(Ok(())) => return,
            Ok(Err(source)) => SuiteError::hook(Hook::TearDown, source),
            Err(payload) => match panic_message(payload.as_ref()) {
                Some(message) => SuiteError::hook_panicked(Hook::TearDown, message),
                None => {
                    self.t.fail();
                    return;
                }
            },
        };
        warn!(%err, "case teardown failed");
        self.t.error(err.to_string());
    }
}

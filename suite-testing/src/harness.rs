//! Entry points built on the bundled reporting facility

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;

use crate::config::RunnerConfig;
use crate::handle::{Handle, Scope, Sink};
use crate::lifecycle::TestSuite;
use crate::test_discovery::Members;
use crate::test_report::{SilentReporter, TestReport, TestReporter};
use crate::test_runner::TestRunner;

/// Owns a reporter and drives one root scope
pub struct Harness {
    reporter: Box<dyn TestReporter>,
}

impl Harness {
    pub fn new(reporter: impl TestReporter + 'static) -> Self {
        Self {
            reporter: Box::new(reporter),
        }
    }

    /// Harness that only produces the returned report
    pub fn silent() -> Self {
        Self::new(SilentReporter)
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            reporter: config.format.reporter(config.verbose),
        }
    }

    /// Run `f` against a fresh root scope named `name` and collect every
    /// scope it creates into a report.
    pub fn run<F>(self, name: &str, f: F) -> TestReport
    where
        F: FnOnce(&mut Scope),
    {
        let sink = Rc::new(Sink::new(self.reporter, TestReport::new(name.to_string())));
        sink.reporter.on_suite_start(name);

        let start = Instant::now();
        let mut root = Scope::root(name, Rc::clone(&sink));
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(&mut root))) {
            root.record_panic(payload.as_ref());
        }

        let mut report = sink.report.borrow().clone();
        report.duration_ms = start.elapsed().as_millis() as u64;
        report.root_failed = root.failed();
        report.errors = root.errors().to_vec();

        info!(
            suite = name,
            passed = report.stats.passed,
            failed = report.stats.failed,
            duration_ms = report.duration_ms,
            "suite finished"
        );
        sink.reporter.on_suite_finish(&report);

        report
    }

    /// Run a suite with `runner` under a root scope named `name`
    pub fn run_suite<S>(self, runner: &TestRunner, name: &str, suite: &mut S) -> TestReport
    where
        S: TestSuite + Members,
    {
        self.run(name, |t| runner.run(t, suite))
    }
}

/// Load configuration and run `suite` with the configured prefix and reporter
pub fn run_suite<S>(name: &str, suite: &mut S) -> Result<TestReport>
where
    S: TestSuite + Members,
{
    let config = RunnerConfig::load(None)?;
    Ok(run_suite_with(&config, name, suite))
}

pub fn run_suite_with<S>(config: &RunnerConfig, name: &str, suite: &mut S) -> TestReport
where
    S: TestSuite + Members,
{
    Harness::from_config(config).run_suite(&TestRunner::from_config(config), name, suite)
}

/// Run `suite` and panic with the list of failures if anything failed.
///
/// Meant to be the whole body of a `#[test]` function.
pub fn assert_suite<S>(name: &str, suite: &mut S)
where
    S: TestSuite + Members,
{
    let config = match RunnerConfig::load(None) {
        Ok(config) => config,
        Err(err) => panic!("suite {} could not start: {:#}", name, err),
    };

    assert_suite_with(&config, name, suite);
}

/// [`assert_suite`] with an explicit configuration
pub fn assert_suite_with<S>(config: &RunnerConfig, name: &str, suite: &mut S)
where
    S: TestSuite + Members,
{
    let report = run_suite_with(config, name, suite);

    if !report.is_success() {
        panic!("suite {} failed:\n{}", name, report.failure_summary());
    }
}

//! Test suites with shared setup and teardown
//!
//! A suite groups related cases behind four lifecycle hooks. Cases are the
//! suite members whose name starts with a configurable prefix (`Test` by
//! default); each runs in its own named child scope of the reporting handle,
//! between `SetUp` and `TearDown`, while `SetUpSuite` and `TearDownSuite`
//! run once around all of them.

pub mod config;
pub mod error;
pub mod handle;
pub mod harness;
pub mod lifecycle;
pub mod test_discovery;
pub mod test_report;
pub mod test_runner;

pub use config::RunnerConfig;
pub use error::{Hook, SuiteError};
pub use handle::{Handle, Scope};
pub use harness::{assert_suite, assert_suite_with, run_suite, run_suite_with, Harness};
pub use lifecycle::TestSuite;
pub use test_discovery::{
    is_case_name, Case, CaseOutput, Member, Members, TestDiscovery, DEFAULT_CASE_PREFIX,
};
pub use test_report::{
    CaseRecord, ConsoleReporter, JUnitReporter, JsonReporter, ReportFormat, SilentReporter,
    TestReport, TestReporter, TestResult,
};
pub use test_runner::{run, TestRunner};

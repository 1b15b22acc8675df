//! Lifecycle ordering and failure isolation tests

mod common;

use anyhow::bail;
use suite_testing::{
    suite_members, Handle, Harness, Scope, TestReport, TestResult, TestRunner, TestSuite,
};

/// Records every hook and case invocation in order
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    set_up_suite_calls: usize,
    tear_down_suite_calls: usize,
    set_up_calls: usize,
    tear_down_calls: usize,
    suite_handle_name: Option<String>,
    fail_set_up_suite: bool,
    fail_set_up_on_call: Option<usize>,
    fail_tear_down_on_call: Option<usize>,
    fail_tear_down_suite: bool,
    panic_set_up_on_call: Option<usize>,
    panic_tear_down_on_call: Option<usize>,
    panic_first_case: bool,
    panic_tear_down_suite: bool,
}

impl TestSuite for Recorder {
    fn set_up_suite(&mut self, t: &mut Scope) -> anyhow::Result<()> {
        self.set_up_suite_calls += 1;
        self.suite_handle_name = Some(t.name().to_string());
        self.events.push("SetUpSuite".to_string());
        if self.fail_set_up_suite {
            bail!("database unavailable");
        }
        Ok(())
    }

    fn tear_down_suite(&mut self) -> anyhow::Result<()> {
        self.tear_down_suite_calls += 1;
        self.events.push("TearDownSuite".to_string());
        if self.fail_tear_down_suite {
            bail!("could not drop schema");
        }
        if self.panic_tear_down_suite {
            panic!("schema boom");
        }
        Ok(())
    }

    fn set_up(&mut self) -> anyhow::Result<()> {
        self.set_up_calls += 1;
        self.events.push("SetUp".to_string());
        if self.fail_set_up_on_call == Some(self.set_up_calls) {
            bail!("truncate failed");
        }
        if self.panic_set_up_on_call == Some(self.set_up_calls) {
            panic!("setup boom");
        }
        Ok(())
    }

    fn tear_down(&mut self) -> anyhow::Result<()> {
        self.tear_down_calls += 1;
        self.events.push("TearDown".to_string());
        if self.fail_tear_down_on_call == Some(self.tear_down_calls) {
            bail!("rollback failed");
        }
        if self.panic_tear_down_on_call == Some(self.tear_down_calls) {
            panic!("teardown boom");
        }
        Ok(())
    }
}

#[allow(non_snake_case)]
impl Recorder {
    fn TestFirst(&mut self, _t: &mut Scope) {
        self.events.push("TestFirst".to_string());
        if self.panic_first_case {
            panic!("body boom");
        }
        assert_eq!(self.set_up_suite_calls, 1);
        assert_eq!(self.tear_down_suite_calls, 0);
        assert_eq!(self.set_up_calls, 1);
        assert_eq!(self.tear_down_calls, 0);
    }

    fn TestSecond(&mut self, _t: &mut Scope) {
        self.events.push("TestSecond".to_string());
        assert_eq!(self.set_up_suite_calls, 1);
        assert_eq!(self.tear_down_suite_calls, 0);
        assert_eq!(self.set_up_calls, 2);
        assert_eq!(self.tear_down_calls, 1);
    }

    fn helper(&mut self, t: &mut Scope) {
        self.events.push("helper".to_string());
        t.fatal("helper must not run as a case");
    }
}

suite_members!(Recorder => [TestFirst, helper, TestSecond]);

fn run_silent<S>(name: &str, suite: &mut S) -> TestReport
where
    S: TestSuite + suite_testing::Members,
{
    common::init_tracing();
    Harness::silent().run_suite(&TestRunner::new(), name, suite)
}

#[test]
fn test_two_cases_one_helper() {
    let mut suite = Recorder::default();
    let report = run_silent("Recorder", &mut suite);

    assert!(report.is_success(), "{}", report.failure_summary());
    assert_eq!(report.stats.total, 2);
    assert_eq!(suite.set_up_suite_calls, 1);
    assert_eq!(suite.tear_down_suite_calls, 1);
    assert_eq!(suite.set_up_calls, 2);
    assert_eq!(suite.tear_down_calls, 2);
    assert!(!suite.events.contains(&"helper".to_string()));
}

#[test]
fn test_lifecycle_order() {
    let mut suite = Recorder::default();
    run_silent("Recorder", &mut suite);

    assert_eq!(
        suite.events,
        [
            "SetUpSuite",
            "SetUp",
            "TestFirst",
            "TearDown",
            "SetUp",
            "TestSecond",
            "TearDown",
            "TearDownSuite",
        ]
    );
}

#[test]
fn test_case_names_used_verbatim() {
    let mut suite = Recorder::default();
    let report = run_silent("Recorder", &mut suite);

    let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
    let paths: Vec<&str> = report.results.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(names, ["TestFirst", "TestSecond"]);
    assert_eq!(paths, ["Recorder/TestFirst", "Recorder/TestSecond"]);
}

#[test]
fn test_suite_setup_receives_top_level_handle() {
    let mut suite = Recorder::default();
    run_silent("Threaded", &mut suite);

    assert_eq!(suite.suite_handle_name.as_deref(), Some("Threaded"));
}

#[test]
fn test_suite_setup_failure_skips_cases() {
    let mut suite = Recorder {
        fail_set_up_suite: true,
        ..Recorder::default()
    };
    let report = run_silent("Recorder", &mut suite);

    assert_eq!(report.stats.total, 0);
    assert_eq!(suite.set_up_calls, 0);
    assert_eq!(suite.tear_down_suite_calls, 1);
    assert_eq!(suite.events, ["SetUpSuite", "TearDownSuite"]);
    assert!(report.root_failed);
    assert_eq!(report.errors, ["SetUpSuite failed: database unavailable"]);
}

#[test]
fn test_case_setup_failure_skips_body_but_tears_down() {
    let mut suite = Recorder {
        fail_set_up_on_call: Some(1),
        ..Recorder::default()
    };
    let report = run_silent("Recorder", &mut suite);

    assert_eq!(
        suite.events,
        [
            "SetUpSuite",
            "SetUp",
            "TearDown",
            "SetUp",
            "TestSecond",
            "TearDown",
            "TearDownSuite",
        ]
    );
    match report.result("TestFirst") {
        Some(TestResult::Fail { error, .. }) => assert_eq!(error, "SetUp failed: truncate failed"),
        other => panic!("expected TestFirst to fail, got {:?}", other),
    }
    assert!(report.result("TestSecond").is_some_and(TestResult::is_pass));
}

#[test]
fn test_case_teardown_failure_is_scoped_to_case() {
    let mut suite = Recorder {
        fail_tear_down_on_call: Some(1),
        ..Recorder::default()
    };
    let report = run_silent("Recorder", &mut suite);

    assert_eq!(report.stats.failed, 1);
    assert_eq!(suite.tear_down_suite_calls, 1);
    match report.result("TestFirst") {
        Some(TestResult::Fail { error, .. }) => assert_eq!(error, "TearDown failed: rollback failed"),
        other => panic!("expected TestFirst to fail, got {:?}", other),
    }
    assert!(report.result("TestSecond").is_some_and(TestResult::is_pass));
    assert!(report.errors.is_empty());
}

#[test]
fn test_suite_teardown_failure_reported_on_root() {
    let mut suite = Recorder {
        fail_tear_down_suite: true,
        ..Recorder::default()
    };
    let report = run_silent("Recorder", &mut suite);

    assert_eq!(report.stats.passed, 2);
    assert!(!report.is_success());
    assert_eq!(report.errors, ["TearDownSuite failed: could not drop schema"]);
}

#[test]
fn test_case_setup_panic_still_tears_down() {
    let mut suite = Recorder {
        panic_set_up_on_call: Some(1),
        ..Recorder::default()
    };
    let report = run_silent("Recorder", &mut suite);

    assert_eq!(
        suite.events,
        [
            "SetUpSuite",
            "SetUp",
            "TearDown",
            "SetUp",
            "TestSecond",
            "TearDown",
            "TearDownSuite",
        ]
    );
    assert_eq!(failure_of(&report, "TestFirst"), "SetUp panicked: setup boom");
    assert!(report.result("TestSecond").is_some_and(TestResult::is_pass));
}

#[test]
fn test_case_teardown_panic_is_labelled() {
    let mut suite = Recorder {
        panic_tear_down_on_call: Some(1),
        ..Recorder::default()
    };
    let report = run_silent("Recorder", &mut suite);

    assert_eq!(
        failure_of(&report, "TestFirst"),
        "TearDown panicked: teardown boom"
    );
    assert!(report.result("TestSecond").is_some_and(TestResult::is_pass));
    assert_eq!(suite.tear_down_suite_calls, 1);
}

#[test]
fn test_body_panic_survives_teardown_panic() {
    let mut suite = Recorder {
        panic_first_case: true,
        panic_tear_down_on_call: Some(1),
        ..Recorder::default()
    };
    let report = run_silent("Recorder", &mut suite);

    assert_eq!(
        failure_of(&report, "TestFirst"),
        "case TestFirst panicked: body boom\nTearDown panicked: teardown boom"
    );
    assert!(report.result("TestSecond").is_some_and(TestResult::is_pass));
    assert_eq!(
        suite.events,
        [
            "SetUpSuite",
            "SetUp",
            "TestFirst",
            "TearDown",
            "SetUp",
            "TestSecond",
            "TearDown",
            "TearDownSuite",
        ]
    );
}

#[test]
fn test_suite_teardown_panic_reported_on_root() {
    let mut suite = Recorder {
        panic_tear_down_suite: true,
        ..Recorder::default()
    };
    let report = run_silent("Recorder", &mut suite);

    assert_eq!(report.stats.passed, 2);
    assert_eq!(suite.tear_down_suite_calls, 1);
    assert_eq!(report.errors, ["TearDownSuite panicked: schema boom"]);
}

/// Cases that fail in each of the ways a case can fail
#[derive(Default)]
struct Failing {
    events: Vec<String>,
}

impl TestSuite for Failing {
    fn set_up_suite(&mut self, _t: &mut Scope) -> anyhow::Result<()> {
        self.events.push("SetUpSuite".to_string());
        Ok(())
    }

    fn tear_down_suite(&mut self) -> anyhow::Result<()> {
        self.events.push("TearDownSuite".to_string());
        Ok(())
    }

    fn set_up(&mut self) -> anyhow::Result<()> {
        self.events.push("SetUp".to_string());
        Ok(())
    }

    fn tear_down(&mut self) -> anyhow::Result<()> {
        self.events.push("TearDown".to_string());
        Ok(())
    }
}

#[allow(non_snake_case)]
impl Failing {
    fn TestReturnsError(&mut self, _t: &mut Scope) -> anyhow::Result<()> {
        self.events.push("TestReturnsError".to_string());
        bail!("row count mismatch")
    }

    fn TestPanics(&mut self, _t: &mut Scope) {
        self.events.push("TestPanics".to_string());
        panic!("index out of bounds");
    }

    fn TestFatal(&mut self, t: &mut Scope) {
        self.events.push("TestFatal".to_string());
        t.fatal("precondition not met");
    }

    fn TestReportsError(&mut self, t: &mut Scope) {
        self.events.push("TestReportsError".to_string());
        t.error("first problem");
        t.error("second problem");
    }

    fn TestPasses(&mut self, t: &mut Scope) {
        self.events.push("TestPasses".to_string());
        t.log("all good");
    }
}

suite_members!(Failing => [
    TestReturnsError,
    TestPanics,
    TestFatal,
    TestReportsError,
    TestPasses,
]);

fn failure_of(report: &TestReport, name: &str) -> String {
    match report.result(name) {
        Some(TestResult::Fail { error, .. }) => error.clone(),
        other => panic!("expected {} to fail, got {:?}", name, other),
    }
}

#[test]
fn test_failures_do_not_cross_case_boundaries() {
    let mut suite = Failing::default();
    let report = run_silent("Failing", &mut suite);

    assert_eq!(report.stats.total, 5);
    assert_eq!(report.stats.failed, 4);
    assert!(report.result("TestPasses").is_some_and(TestResult::is_pass));
    assert!(report.errors.is_empty());

    let mut expected = vec!["SetUpSuite"];
    for case in [
        "TestReturnsError",
        "TestPanics",
        "TestFatal",
        "TestReportsError",
        "TestPasses",
    ] {
        expected.extend(["SetUp", case, "TearDown"]);
    }
    expected.push("TearDownSuite");
    assert_eq!(suite.events, expected);
}

#[test]
fn test_failure_messages_attributed_to_case() {
    let mut suite = Failing::default();
    let report = run_silent("Failing", &mut suite);

    assert_eq!(
        failure_of(&report, "TestReturnsError"),
        "case TestReturnsError failed: row count mismatch"
    );
    assert_eq!(
        failure_of(&report, "TestPanics"),
        "case TestPanics panicked: index out of bounds"
    );
    assert_eq!(failure_of(&report, "TestFatal"), "precondition not met");
    assert_eq!(
        failure_of(&report, "TestReportsError"),
        "first problem\nsecond problem"
    );

    match report.result("TestPasses") {
        Some(TestResult::Pass { output, .. }) => assert_eq!(output.as_deref(), Some("all good")),
        other => panic!("expected TestPasses to pass, got {:?}", other),
    }
}

/// Suite whose setup panics instead of returning an error
#[derive(Default)]
struct PanickingSetUp {
    tear_down_suite_calls: usize,
    cases_run: usize,
}

impl TestSuite for PanickingSetUp {
    fn set_up_suite(&mut self, _t: &mut Scope) -> anyhow::Result<()> {
        panic!("fixture file missing");
    }

    fn tear_down_suite(&mut self) -> anyhow::Result<()> {
        self.tear_down_suite_calls += 1;
        Ok(())
    }

    fn set_up(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn tear_down(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[allow(non_snake_case)]
impl PanickingSetUp {
    fn TestNeverRuns(&mut self, _t: &mut Scope) {
        self.cases_run += 1;
    }
}

suite_members!(PanickingSetUp => [TestNeverRuns]);

#[test]
fn test_suite_setup_panic_still_tears_down() {
    let mut suite = PanickingSetUp::default();
    let report = run_silent("Panicking", &mut suite);

    assert_eq!(suite.cases_run, 0);
    assert_eq!(suite.tear_down_suite_calls, 1);
    assert_eq!(report.stats.total, 0);
    assert_eq!(report.errors, ["SetUpSuite panicked: fixture file missing"]);
}

/// Suite with no cases at all
#[derive(Default)]
struct Empty {
    set_up_suite_calls: usize,
    tear_down_suite_calls: usize,
}

impl TestSuite for Empty {
    fn set_up_suite(&mut self, _t: &mut Scope) -> anyhow::Result<()> {
        self.set_up_suite_calls += 1;
        Ok(())
    }

    fn tear_down_suite(&mut self) -> anyhow::Result<()> {
        self.tear_down_suite_calls += 1;
        Ok(())
    }

    fn set_up(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn tear_down(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Empty {
    fn describe(&mut self, _t: &mut Scope) {}
}

suite_members!(Empty => [describe]);

#[test]
fn test_suite_without_cases() {
    let mut suite = Empty::default();
    let report = run_silent("Empty", &mut suite);

    assert!(report.is_success());
    assert_eq!(report.stats.total, 0);
    assert_eq!(suite.set_up_suite_calls, 1);
    assert_eq!(suite.tear_down_suite_calls, 1);
}

#[test]
fn test_discovery_is_fresh_per_run() {
    let mut suite = Recorder::default();
    let runner = TestRunner::new();

    let first = Harness::silent().run_suite(&runner, "Recorder", &mut suite);
    suite = Recorder::default();
    let second = Harness::silent().run_suite(&runner, "Recorder", &mut suite);

    assert_eq!(first.stats.total, 2);
    assert_eq!(second.stats.total, 2);
    assert_eq!(suite.set_up_suite_calls, 1);
}

//! Test reporting module
//!
//! Records the outcome of every named scope and renders it through one of
//! several reporters.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::SuiteError;

/// Outcome of a single scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TestResult {
    /// Scope passed
    Pass {
        duration_ms: u64,
        output: Option<String>,
    },

    /// Scope failed or terminated abruptly
    Fail {
        duration_ms: u64,
        error: String,
        output: Option<String>,
    },
}

impl TestResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, TestResult::Fail { .. })
    }

    pub fn duration_ms(&self) -> u64 {
        match self {
            TestResult::Pass { duration_ms, .. } | TestResult::Fail { duration_ms, .. } => {
                *duration_ms
            }
        }
    }
}

/// A finished child scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Name the scope was created with
    pub name: String,

    /// Slash-separated path from the root scope
    pub path: String,

    pub result: TestResult,
}

/// Test statistics
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

/// Test report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    /// Name of the root scope
    pub name: String,

    pub started_at: DateTime<Utc>,

    /// Finished scopes in completion order
    pub results: Vec<CaseRecord>,

    /// Failures recorded directly on the root scope, e.g. a failed suite setup
    pub errors: Vec<String>,

    /// Whether the root scope itself was marked failed
    pub root_failed: bool,

    /// Total duration in milliseconds
    pub duration_ms: u64,

    pub stats: TestStats,
}

impl TestReport {
    pub fn new(name: String) -> Self {
        Self {
            name,
            started_at: Utc::now(),
            results: Vec::new(),
            errors: Vec::new(),
            root_failed: false,
            duration_ms: 0,
            stats: TestStats::default(),
        }
    }

    pub fn add_result(&mut self, record: CaseRecord) {
        self.stats.total += 1;

        match &record.result {
            TestResult::Pass { .. } => self.stats.passed += 1,
            TestResult::Fail { .. } => self.stats.failed += 1,
        }

        self.results.push(record);
    }

    pub fn is_success(&self) -> bool {
        !self.root_failed && self.stats.failed == 0
    }

    /// Look up a recorded scope by its name
    pub fn result(&self, name: &str) -> Option<&TestResult> {
        self.results
            .iter()
            .find(|record| record.name == name)
            .map(|record| &record.result)
    }

    pub fn failed_cases(&self) -> impl Iterator<Item = &CaseRecord> {
        self.results.iter().filter(|record| record.result.is_fail())
    }

    /// Human readable list of everything that failed
    pub fn failure_summary(&self) -> String {
        let mut summary = String::new();

        for error in &self.errors {
            let _ = writeln!(summary, "  {}: {}", self.name, error);
        }

        for record in self.failed_cases() {
            if let TestResult::Fail { error, .. } = &record.result {
                let _ = writeln!(summary, "  {}: {}", record.path, error);
            }
        }

        summary
    }
}

/// Test reporter trait
pub trait TestReporter {
    /// Called when the root scope starts
    fn on_suite_start(&self, name: &str);

    /// Called when a child scope starts
    fn on_test_start(&self, path: &str);

    /// Called when a child scope finishes
    fn on_test_finish(&self, record: &CaseRecord);

    /// Called when the root scope finishes
    fn on_suite_finish(&self, report: &TestReport);
}

/// Output format selected through configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Console,
    Json,
    Junit,
    Silent,
}

impl ReportFormat {
    pub fn reporter(self, verbose: bool) -> Box<dyn TestReporter> {
        match self {
            ReportFormat::Console => Box::new(ConsoleReporter::new(verbose)),
            ReportFormat::Json => Box::new(JsonReporter::new()),
            ReportFormat::Junit => Box::new(JUnitReporter::new()),
            ReportFormat::Silent => Box::new(SilentReporter),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(ReportFormat::Console),
            "json" => Ok(ReportFormat::Json),
            "junit" => Ok(ReportFormat::Junit),
            "silent" => Ok(ReportFormat::Silent),
            _ => Err(SuiteError::unknown_format(s)),
        }
    }
}

/// Console test reporter
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn print_test_result(&self, record: &CaseRecord) {
        let status = match &record.result {
            TestResult::Pass { duration_ms, .. } => {
                format!("{} ({}ms)", "PASS".green(), duration_ms)
            }
            TestResult::Fail {
                duration_ms, error, ..
            } => {
                format!("{} ({}ms): {}", "FAIL".red(), duration_ms, error)
            }
        };

        println!("{} ... {}", record.path, status);

        if self.verbose {
            match &record.result {
                TestResult::Pass {
                    output: Some(output),
                    ..
                }
                | TestResult::Fail {
                    output: Some(output),
                    ..
                } => {
                    println!("  Output: {}", output.dimmed());
                }
                _ => {}
            }
        }
    }
}

impl TestReporter for ConsoleReporter {
    fn on_suite_start(&self, name: &str) {
        println!("\n{} {}\n", "Running".bold(), name);
    }

    fn on_test_start(&self, path: &str) {
        if self.verbose {
            println!("Running {} ...", path);
        }
    }

    fn on_test_finish(&self, record: &CaseRecord) {
        if self.verbose || record.result.is_fail() {
            self.print_test_result(record);
        }
    }

    fn on_suite_finish(&self, report: &TestReport) {
        println!("\n{}", "Test Summary".bold().underline());
        println!();

        let stats = &report.stats;

        if stats.passed > 0 {
            println!("  {} passed", stats.passed.to_string().green());
        }
        if stats.failed > 0 {
            println!("  {} failed", stats.failed.to_string().red());
        }

        println!();
        println!(
            "Total: {} cases in {:.2}s",
            stats.total,
            report.duration_ms as f64 / 1000.0
        );

        if report.is_success() {
            println!("\n{}", "All cases passed!".green().bold());
        } else {
            println!("\n{}", "Some cases failed.".red().bold());
            println!("\nFailures:");
            print!("{}", report.failure_summary());
        }
    }
}

/// JSON test reporter
#[derive(Default)]
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(report: &TestReport) -> serde_json::Result<String> {
        let document = serde_json::json!({
            "name": report.name,
            "started_at": report.started_at,
            "duration_ms": report.duration_ms,
            "success": report.is_success(),
            "errors": report.errors,
            "stats": report.stats,
            "results": report.results,
        });

        serde_json::to_string_pretty(&document)
    }
}

impl TestReporter for JsonReporter {
    fn on_suite_start(&self, _name: &str) {}

    fn on_test_start(&self, _path: &str) {}

    fn on_test_finish(&self, _record: &CaseRecord) {}

    fn on_suite_finish(&self, report: &TestReport) {
        match Self::render(report) {
            Ok(json) => println!("{}", json),
            Err(err) => error!(%err, "failed to serialize test report"),
        }
    }
}

/// JUnit XML test reporter
#[derive(Default)]
pub struct JUnitReporter;

impl JUnitReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(report: &TestReport) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            xml,
            "<testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" time=\"{}\" timestamp=\"{}\">",
            escape_xml(&report.name),
            report.stats.total,
            report.stats.failed,
            report.errors.len(),
            report.duration_ms as f64 / 1000.0,
            report.started_at.format("%Y-%m-%dT%H:%M:%S"),
        );

        for error in &report.errors {
            let _ = writeln!(xml, "  <error message=\"{}\" />", escape_xml(error));
        }

        for record in &report.results {
            let time = record.result.duration_ms() as f64 / 1000.0;
            match &record.result {
                TestResult::Pass { .. } => {
                    let _ = writeln!(
                        xml,
                        "  <testcase name=\"{}\" time=\"{}\" />",
                        escape_xml(&record.path),
                        time,
                    );
                }
                TestResult::Fail { error, .. } => {
                    let _ = writeln!(
                        xml,
                        "  <testcase name=\"{}\" time=\"{}\">",
                        escape_xml(&record.path),
                        time,
                    );
                    let _ = writeln!(xml, "    <failure message=\"{}\" />", escape_xml(error));
                    xml.push_str("  </testcase>\n");
                }
            }
        }

        xml.push_str("</testsuite>\n");
        xml
    }
}

impl TestReporter for JUnitReporter {
    fn on_suite_start(&self, _name: &str) {}

    fn on_test_start(&self, _path: &str) {}

    fn on_test_finish(&self, _record: &CaseRecord) {}

    fn on_suite_finish(&self, report: &TestReport) {
        print!("{}", Self::render(report));
    }
}

/// Reporter that prints nothing; the returned [`TestReport`] is the only output
pub struct SilentReporter;

impl TestReporter for SilentReporter {
    fn on_suite_start(&self, _name: &str) {}

    fn on_test_start(&self, _path: &str) {}

    fn on_test_finish(&self, _record: &CaseRecord) {}

    fn on_suite_finish(&self, _report: &TestReport) {}
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#10;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

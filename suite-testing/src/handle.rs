//! Reporting handles
//!
//! The runner only talks to the reporting facility through [`Handle`]: it asks
//! for a named child scope per case and reports failures on whichever scope is
//! current. [`Scope`] is the facility bundled with this crate; it records every
//! child scope into a [`TestReport`] and forwards progress to a [`TestReporter`].

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, debug_span};

use crate::test_report::{CaseRecord, TestReport, TestReporter, TestResult};

/// A reportable unit of work owned by the host reporting facility
pub trait Handle: Sized {
    /// Display name of this scope
    fn name(&self) -> &str;

    /// Run `f` inside a named child scope whose outcome is recorded
    /// independently. Returns whether the child passed.
    fn run<F>(&mut self, name: &str, f: F) -> bool
    where
        F: FnOnce(&mut Self);

    /// Attach a message to this scope without failing it
    fn log(&mut self, message: impl Into<String>);

    /// Record a failure message and mark the scope failed
    fn error(&mut self, message: impl Into<String>);

    /// Mark the scope failed and keep running
    fn fail(&mut self);

    fn failed(&self) -> bool;

    /// Mark the scope failed and stop it immediately
    fn fail_now(&mut self) -> !;

    fn fatal(&mut self, message: impl Into<String>) -> ! {
        self.error(message);
        self.fail_now()
    }
}

/// Unwind payload used by [`Scope::fail_now`]. Its message is already on the scope.
pub(crate) struct FailNow;

/// Extract a readable message from a panic payload.
///
/// Returns `None` for payloads raised by `fail_now`, which carry no message of
/// their own.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    if payload.is::<FailNow>() {
        None
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        Some((*s).to_string())
    } else if let Some(s) = payload.downcast_ref::<String>() {
        Some(s.clone())
    } else {
        Some("non-string panic payload".to_string())
    }
}

/// Shared destination for everything recorded during one harness run
pub(crate) struct Sink {
    pub(crate) reporter: Box<dyn TestReporter>,
    pub(crate) report: RefCell<TestReport>,
}

impl Sink {
    pub(crate) fn new(reporter: Box<dyn TestReporter>, report: TestReport) -> Self {
        Self {
            reporter,
            report: RefCell::new(report),
        }
    }
}

/// Handle of the bundled reporting facility
pub struct Scope {
    name: String,
    path: String,
    failed: bool,
    errors: Vec<String>,
    logs: Vec<String>,
    sink: Rc<Sink>,
}

impl Scope {
    pub(crate) fn root(name: &str, sink: Rc<Sink>) -> Self {
        Self {
            name: name.to_string(),
            path: name.to_string(),
            failed: false,
            errors: Vec::new(),
            logs: Vec::new(),
            sink,
        }
    }

    fn child(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: format!("{}/{}", self.path, name),
            failed: false,
            errors: Vec::new(),
            logs: Vec::new(),
            sink: Rc::clone(&self.sink),
        }
    }

    /// Slash-separated path from the root scope, e.g. `Inventory/TestInsert`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub(crate) fn record_panic(&mut self, payload: &(dyn Any + Send)) {
        if let Some(message) = panic_message(payload) {
            self.errors.push(format!("panicked: {}", message));
        }
        self.failed = true;
    }

    fn into_record(self, duration_ms: u64) -> CaseRecord {
        let output = if self.logs.is_empty() {
            None
        } else {
            Some(self.logs.join("\n"))
        };

        let result = if self.failed {
            let error = if self.errors.is_empty() {
                "failed".to_string()
            } else {
                self.errors.join("\n")
            };
            TestResult::Fail {
                duration_ms,
                error,
                output,
            }
        } else {
            TestResult::Pass {
                duration_ms,
                output,
            }
        };

        CaseRecord {
            name: self.name,
            path: self.path,
            result,
        }
    }
}

impl Handle for Scope {
    fn name(&self) -> &str {
        &self.name
    }

    fn run<F>(&mut self, name: &str, f: F) -> bool
    where
        F: FnOnce(&mut Self),
    {
        let mut child = self.child(name);
        let _span = debug_span!("scope", path = %child.path).entered();

        self.sink.reporter.on_test_start(&child.path);
        let start = Instant::now();

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(&mut child))) {
            child.record_panic(payload.as_ref());
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let passed = !child.failed;
        debug!(passed, duration_ms, "scope finished");

        let record = child.into_record(duration_ms);
        self.sink.reporter.on_test_finish(&record);
        self.sink.report.borrow_mut().add_result(record);

        // A failing sub-unit fails its parent
        if !passed {
            self.failed = true;
        }

        passed
    }

    fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.failed = true;
    }

    fn fail(&mut self) {
        self.failed = true;
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn fail_now(&mut self) -> ! {
        self.failed = true;
        panic::resume_unwind(Box::new(FailNow))
    }
}

//! Test discovery module
//!
//! Rust has no method reflection, so a suite exposes its callable surface as
//! an ordered list of named [`Member`]s (usually generated by
//! [`suite_members!`](crate::suite_members)). Discovery keeps the members whose
//! name carries the case prefix.

use tracing::trace;

use crate::error::Hook;
use crate::handle::{Handle, Scope};

/// Prefix that marks a member as a case unless configured otherwise
pub const DEFAULT_CASE_PREFIX: &str = "Test";

type MemberFn<S, H> = dyn Fn(&mut S, &mut H) -> anyhow::Result<()>;

/// Return types accepted from a case method
pub trait CaseOutput {
    fn into_result(self) -> anyhow::Result<()>;
}

impl CaseOutput for () {
    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> CaseOutput for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// A named callable on a suite that takes the reporting handle
pub struct Member<S, H = Scope> {
    name: String,
    func: Box<MemberFn<S, H>>,
}

impl<S, H> Member<S, H> {
    pub fn new<F, O>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut S, &mut H) -> O + 'static,
        O: CaseOutput,
    {
        Self {
            name: name.into(),
            func: Box::new(move |suite: &mut S, t: &mut H| func(suite, t).into_result()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The callable surface of a suite, in declaration order
pub trait Members<H: Handle = Scope>: Sized {
    fn members(&self) -> Vec<Member<Self, H>>;
}

/// A discovered case
pub struct Case<S, H = Scope> {
    member: Member<S, H>,
}

impl<S, H> Case<S, H> {
    /// Display name of the case, used verbatim for its child scope
    pub fn name(&self) -> &str {
        self.member.name()
    }

    pub(crate) fn call(&self, suite: &mut S, t: &mut H) -> anyhow::Result<()> {
        (self.member.func)(suite, t)
    }
}

/// Whether `name` marks a case under `prefix`.
///
/// A literal, case-sensitive prefix test. Lifecycle hook names never qualify.
pub fn is_case_name(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix) && !Hook::ALL.iter().any(|hook| hook.name() == name)
}

/// Test discovery
#[derive(Debug, Clone)]
pub struct TestDiscovery {
    prefix: String,
}

impl Default for TestDiscovery {
    fn default() -> Self {
        Self::new(DEFAULT_CASE_PREFIX)
    }
}

impl TestDiscovery {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Enumerate the suite's members and keep the cases, in member order
    pub fn discover<S, H>(&self, suite: &S) -> Vec<Case<S, H>>
    where
        H: Handle,
        S: Members<H>,
    {
        suite
            .members()
            .into_iter()
            .filter(|member| {
                let is_case = is_case_name(member.name(), &self.prefix);
                trace!(member = member.name(), is_case, "discovery");
                is_case
            })
            .map(|member| Case { member })
            .collect()
    }
}

/// Implement [`Members`] for a suite from a list of its methods.
///
/// Each method must take `&mut self` and the reporting handle, and return
/// `()` or a `Result<(), E>`. Member names are the method identifiers, so
/// with the default prefix case methods are named like `TestInsertRow`.
///
/// ```ignore
/// suite_members!(InventorySuite => [TestInsert, TestDelete, helper]);
/// suite_members!(InventorySuite, MyHandle => [TestInsert]);
/// ```
#[macro_export]
macro_rules! suite_members {
    ($suite:ty => [$($member:ident),* $(,)?]) => {
        $crate::suite_members!($suite, $crate::Scope => [$($member),*]);
    };
    ($suite:ty, $handle:ty => [$($member:ident),* $(,)?]) => {
        impl $crate::Members<$handle> for $suite {
            fn members(&self) -> ::std::vec::Vec<$crate::Member<Self, $handle>> {
                ::std::vec![
                    $($crate::Member::new(::std::stringify!($member), <$suite>::$member)),*
                ]
            }
        }
    };
}

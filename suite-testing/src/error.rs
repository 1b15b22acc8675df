//! Error types for suite execution and configuration

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SuiteError>;

/// The four lifecycle hooks every suite provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    SetUpSuite,
    TearDownSuite,
    SetUp,
    TearDown,
}

impl Hook {
    pub const ALL: [Hook; 4] = [Hook::SetUpSuite, Hook::TearDownSuite, Hook::SetUp, Hook::TearDown];

    /// Member name of the hook as it would appear on the suite
    pub fn name(self) -> &'static str {
        match self {
            Hook::SetUpSuite => "SetUpSuite",
            Hook::TearDownSuite => "TearDownSuite",
            Hook::SetUp => "SetUp",
            Hook::TearDown => "TearDown",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("{hook} failed: {source:#}")]
    Hook {
        hook: Hook,
        #[source]
        source: anyhow::Error,
    },

    #[error("{hook} panicked: {message}")]
    HookPanicked { hook: Hook, message: String },

    #[error("case {name} failed: {source:#}")]
    Case {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("case {name} panicked: {message}")]
    CasePanicked { name: String, message: String },

    #[error("case prefix must not be empty")]
    EmptyCasePrefix,

    #[error("unknown report format: {format}")]
    UnknownFormat { format: String },
}

impl SuiteError {
    pub fn hook(hook: Hook, source: impl Into<anyhow::Error>) -> Self {
        Self::Hook {
            hook,
            source: source.into(),
        }
    }

    pub fn hook_panicked(hook: Hook, message: impl Into<String>) -> Self {
        Self::HookPanicked {
            hook,
            message: message.into(),
        }
    }

    pub fn case(name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Case {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn case_panicked(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CasePanicked {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn unknown_format(format: impl Into<String>) -> Self {
        Self::UnknownFormat {
            format: format.into(),
        }
    }
}

//! Configuration management

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SuiteError;
use crate::test_discovery::DEFAULT_CASE_PREFIX;
use crate::test_report::ReportFormat;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "SUITE_CONFIG";

/// Config file looked up in the working directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "suite.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Member name prefix that marks a case
    #[serde(default = "default_case_prefix")]
    pub case_prefix: String,

    /// Reporter used by the bundled harness
    #[serde(default)]
    pub format: ReportFormat,

    /// Print passing cases and their output
    #[serde(default)]
    pub verbose: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            case_prefix: default_case_prefix(),
            format: ReportFormat::default(),
            verbose: false,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from file, then apply environment overrides.
    ///
    /// Without an explicit path, `SUITE_CONFIG` is consulted, then
    /// `suite.toml` in the working directory. A missing file means defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path.to_owned(),
            None => Self::default_config_path(),
        };

        let mut config = Self::read(&config_path)?;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Read a config file without consulting the environment.
    /// A missing file means defaults.
    pub fn read(config_path: &Path) -> Result<Self> {
        let config = if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?
        } else {
            debug!(path = %config_path.display(), "no config file, using defaults");
            Self::default()
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Apply `SUITE_CASE_PREFIX`, `SUITE_FORMAT` and `SUITE_VERBOSE` from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SuiteError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("SUITE_CASE_PREFIX") {
            self.case_prefix = prefix;
        }

        if let Some(format) = lookup("SUITE_FORMAT") {
            self.format = format.parse()?;
        }

        if let Some(verbose) = lookup("SUITE_VERBOSE") {
            self.verbose = matches!(verbose.trim(), "1" | "true" | "yes");
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), SuiteError> {
        if self.case_prefix.is_empty() {
            return Err(SuiteError::EmptyCasePrefix);
        }
        Ok(())
    }

    fn default_config_path() -> PathBuf {
        env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

fn default_case_prefix() -> String {
    DEFAULT_CASE_PREFIX.to_string()
}

//! Configuration file handling
//!
//! Settings are layered: built-in defaults, then `conformance.toml`, then
//! command-line overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::{self, config_path};
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Target program settings
    #[serde(default)]
    pub target: TargetConfig,

    /// Fixture layout settings
    #[serde(default)]
    pub fixtures: FixtureConfig,

    /// Run behavior settings
    #[serde(default)]
    pub run: RunConfig,
}

/// Configuration for the program under test
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Path to the built interpreter executable
    #[serde(default = "default_program")]
    pub program: PathBuf,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
        }
    }
}

fn default_program() -> PathBuf {
    PathBuf::from(paths::DEFAULT_PROGRAM_PATH)
}

/// Where test sources live and how they are named
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConfig {
    /// Directory scanned for test sources
    #[serde(default = "default_fixture_dir")]
    pub dir: PathBuf,

    /// Extension (without the dot) of test source files
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            dir: default_fixture_dir(),
            extension: default_extension(),
        }
    }
}

fn default_fixture_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_FIXTURE_DIR)
}

fn default_extension() -> String {
    paths::DEFAULT_SOURCE_EXTENSION.to_string()
}

/// Run behavior
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Per-case timeout in seconds; no limit when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Stop at the first failing case
    #[serde(default)]
    pub fail_fast: bool,
}

impl RunConfig {
    /// Configured timeout as a duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            return Self::load_from(&path);
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runner cannot honor
    pub fn validate(&self) -> Result<()> {
        let ext = &self.fixtures.extension;
        if ext.is_empty() || ext.starts_with('.') {
            return Err(Error::Config(format!(
                "fixtures.extension must be a bare extension like \"b\", got {:?}",
                ext
            )));
        }
        if self.run.timeout_secs == Some(0) {
            return Err(Error::Config(
                "run.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

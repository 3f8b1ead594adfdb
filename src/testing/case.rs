//! Test case naming conventions
//!
//! A case is a source file plus two optional siblings formed by appending
//! `.in` (fed to stdin) and `.out` (expected stdout) to the full source path.

use std::path::{Path, PathBuf};

use crate::common::paths::{with_suffix, STDIN_SUFFIX, STDOUT_SUFFIX};
use crate::common::{Error, Result};

/// The three paths that make up one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Base name: the source file name without its extension
    pub name: String,
    /// Script passed to the target program
    pub source: PathBuf,
    /// Optional file fed to the target program's stdin
    pub stdin_fixture: PathBuf,
    /// Optional file holding the exact expected stdout
    pub stdout_fixture: PathBuf,
}

impl TestCase {
    /// Derive a case from a source path
    ///
    /// Fails with `InvalidFixtureName` unless `source` carries `extension`.
    /// Only paths produced by discovery should be passed here.
    pub fn resolve(source: &Path, extension: &str) -> Result<Self> {
        if source.extension().and_then(|e| e.to_str()) != Some(extension) {
            return Err(Error::invalid_fixture_name(source, extension));
        }

        Ok(Self {
            name: case_name(source),
            source: source.to_path_buf(),
            stdin_fixture: with_suffix(source, STDIN_SUFFIX),
            stdout_fixture: with_suffix(source, STDOUT_SUFFIX),
        })
    }

    /// Whether a stdin fixture is present on disk
    pub fn has_stdin(&self) -> bool {
        self.stdin_fixture.is_file()
    }

    /// Whether an expected-output fixture is present on disk
    pub fn has_expected_output(&self) -> bool {
        self.stdout_fixture.is_file()
    }
}

/// Display name for a source path: its file name minus the extension
pub fn case_name(source: &Path) -> String {
    source
        .file_stem()
        .unwrap_or(source.as_os_str())
        .to_string_lossy()
        .into_owned()
}

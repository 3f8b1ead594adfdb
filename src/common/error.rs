//! Error types for the conformance runner
//!
//! Per-case failures (missing source, non-zero exit, output mismatch, timeout)
//! and fatal run errors (missing build, bad config) share one enum so a case
//! outcome can carry the exact failure with its diagnostics.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Bytes shown per side of an output mismatch before truncating
const MISMATCH_PREVIEW_BYTES: usize = 200;

/// Main error type for the conformance runner
#[derive(Error, Debug)]
pub enum Error {
    // === Precondition Errors ===
    #[error("Target program not found at '{}'. Build it first (e.g. 'meson compile -C builddir')", .0.display())]
    BuildMissing(PathBuf),

    #[error("Failed to read fixture directory '{}': {error}", .path.display())]
    FixtureDirUnreadable {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    // === Fixture Errors ===
    #[error("Not a test source '{}': expected a '.{expected}' file", .path.display())]
    InvalidFixtureName { path: PathBuf, expected: String },

    #[error("Test source '{}' does not exist", .0.display())]
    SourceMissing(PathBuf),

    #[error("Failed to read fixture '{}': {error}", .path.display())]
    FixtureRead {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    // === Execution Errors ===
    #[error("Failed to launch target program '{}': {error}", .program.display())]
    SpawnFailed {
        program: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("Target program exited with {}", describe_exit(.code))]
    NonZeroExit { code: Option<i32> },

    #[error(
        "Output mismatch\n    expected: {}\n    actual:   {}",
        preview_bytes(.expected),
        preview_bytes(.actual)
    )]
    OutputMismatch { expected: Vec<u8>, actual: Vec<u8> },

    #[error("Target program timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    // === Suite Errors ===
    #[error("{failed} of {run} test cases failed{}", stop_note(.stopped_early))]
    TestsFailed {
        failed: usize,
        run: usize,
        stopped_early: bool,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid fixture name error
    pub fn invalid_fixture_name(path: &Path, expected: &str) -> Self {
        Self::InvalidFixtureName {
            path: path.to_path_buf(),
            expected: expected.to_string(),
        }
    }

    /// Create a fixture read error
    pub fn fixture_read(path: &Path, error: io::Error) -> Self {
        Self::FixtureRead {
            path: path.to_path_buf(),
            error,
        }
    }

    /// Create a spawn failure error
    pub fn spawn_failed(program: &Path, error: io::Error) -> Self {
        Self::SpawnFailed {
            program: program.to_path_buf(),
            error,
        }
    }

    /// Stable machine-readable code for this error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::BuildMissing(_) => "BUILD_MISSING",
            Error::FixtureDirUnreadable { .. } => "FIXTURE_DIR_UNREADABLE",
            Error::InvalidFixtureName { .. } => "INVALID_FIXTURE_NAME",
            Error::SourceMissing(_) => "SOURCE_MISSING",
            Error::FixtureRead { .. } => "FIXTURE_READ",
            Error::SpawnFailed { .. } => "SPAWN_FAILED",
            Error::NonZeroExit { .. } => "NONZERO_EXIT",
            Error::OutputMismatch { .. } => "OUTPUT_MISMATCH",
            Error::Timeout(_) => "TIMEOUT",
            Error::TestsFailed { .. } => "TESTS_FAILED",
            Error::Config(_) | Error::ConfigParse(_) => "CONFIG",
            Error::Io(_) | Error::Json(_) => "INTERNAL",
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

fn stop_note(stopped_early: &bool) -> &'static str {
    if *stopped_early {
        " (stopped at first failure)"
    } else {
        ""
    }
}

/// Render bytes as an escaped string literal, truncated for display
fn preview_bytes(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(MISMATCH_PREVIEW_BYTES)];
    let mut rendered = format!("{:?}", String::from_utf8_lossy(shown));
    if bytes.len() > MISMATCH_PREVIEW_BYTES {
        rendered.push_str(&format!("... ({} bytes total)", bytes.len()));
    }
    rendered
}

//! Conventional filesystem locations
//!
//! All paths are relative to the directory the runner is invoked from,
//! which is expected to be the root of the interpreter's source tree.

use std::path::{Path, PathBuf};

/// Where the build places the target program
pub const DEFAULT_PROGRAM_PATH: &str = "./builddir/mlbf";

/// Directory holding the test sources and their fixtures
pub const DEFAULT_FIXTURE_DIR: &str = "./tests";

/// Extension marking a file as a test source
pub const DEFAULT_SOURCE_EXTENSION: &str = "b";

/// Suffix appended to a source path to find its stdin fixture
pub const STDIN_SUFFIX: &str = ".in";

/// Suffix appended to a source path to find its expected stdout fixture
pub const STDOUT_SUFFIX: &str = ".out";

/// Name of the optional project-local configuration file
const CONFIG_FILE_NAME: &str = "conformance.toml";

/// Get the path to the default configuration file
pub fn config_path() -> PathBuf {
    PathBuf::from(".").join(CONFIG_FILE_NAME)
}

/// Append a suffix to the full path, keeping the existing extension
///
/// `tests/hello.b` + `.out` gives `tests/hello.b.out`.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut joined = path.as_os_str().to_os_string();
    joined.push(suffix);
    PathBuf::from(joined)
}

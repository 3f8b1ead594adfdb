//! Test runner implementation
//!
//! Runs the target program once per discovered case, strictly one at a
//! time, and turns each run into a tagged outcome instead of aborting the
//! suite on the first failure.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;

use crate::common::config::Config;
use crate::common::{Error, Result};

use super::case::{case_name, TestCase};
use super::discovery::discover;

/// Everything the suite runner needs to know
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Path to the target program executable
    pub program: PathBuf,
    /// Directory scanned for test sources
    pub fixture_dir: PathBuf,
    /// Source file extension, without the dot
    pub extension: String,
    /// Per-case limit; waits forever when unset
    pub timeout: Option<Duration>,
    /// Stop after the first failing case
    pub fail_fast: bool,
}

impl From<&Config> for RunSettings {
    fn from(config: &Config) -> Self {
        Self {
            program: config.target.program.clone(),
            fixture_dir: config.fixtures.dir.clone(),
            extension: config.fixtures.extension.clone(),
            timeout: config.run.timeout(),
            fail_fast: config.run.fail_fast,
        }
    }
}

/// Captured output of one target program run
#[derive(Debug)]
pub struct ExecutionResult {
    pub stdout: Vec<u8>,
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

/// How a single case ended
#[derive(Debug)]
pub enum Outcome {
    Passed,
    Failed(Error),
}

/// Result of a test case
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub source: PathBuf,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Passed)
    }

    /// The failure, if the case failed
    pub fn error(&self) -> Option<&Error> {
        match &self.outcome {
            Outcome::Passed => None,
            Outcome::Failed(e) => Some(e),
        }
    }
}

/// Outcomes of a whole suite, in discovery order
#[derive(Debug, Default)]
pub struct RunSummary {
    pub results: Vec<TestResult>,
    /// Set when fail-fast skipped the remaining cases
    pub stopped_early: bool,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Turn a failed run into the error reported at exit
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(Error::TestsFailed {
            failed: self.failed(),
            run: self.results.len(),
            stopped_early: self.stopped_early,
        })
    }
}

/// Whether the target program has been built
pub fn target_exists(program: &Path) -> bool {
    program.is_file()
}

/// Run every discovered case against the target program
///
/// Fails before running anything if the target program is missing or the
/// fixture directory cannot be read. Per-case failures are recorded in the
/// summary, never returned as errors.
pub async fn run_suite(settings: &RunSettings) -> Result<RunSummary> {
    if !target_exists(&settings.program) {
        return Err(Error::BuildMissing(settings.program.clone()));
    }

    let sources = discover(&settings.fixture_dir, &settings.extension)?;
    let mut summary = RunSummary::default();
    let total = sources.len();

    for (i, source) in sources.enumerate() {
        let result = match TestCase::resolve(&source, &settings.extension) {
            Ok(case) => run_case(settings, &case).await,
            Err(e) => TestResult {
                name: case_name(&source),
                source,
                outcome: Outcome::Failed(e),
                elapsed: Duration::ZERO,
            },
        };

        let failed = !result.passed();
        summary.results.push(result);

        if failed && settings.fail_fast {
            summary.stopped_early = i + 1 < total;
            break;
        }
    }

    tracing::info!(
        passed = summary.passed(),
        failed = summary.failed(),
        "Test run finished"
    );

    Ok(summary)
}

/// Run and verify a single case
pub async fn run_case(settings: &RunSettings, case: &TestCase) -> TestResult {
    let started = Instant::now();

    let outcome = match execute(&settings.program, case, settings.timeout).await {
        Ok(execution) => match verify(case, &execution) {
            Ok(()) => Outcome::Passed,
            Err(e) => Outcome::Failed(e),
        },
        Err(e) => Outcome::Failed(e),
    };

    match &outcome {
        Outcome::Passed => tracing::info!(case = %case.name, "Test passed"),
        Outcome::Failed(e) => tracing::warn!(case = %case.name, kind = e.kind(), "Test failed: {}", e),
    }

    TestResult {
        name: case.name.clone(),
        source: case.source.clone(),
        outcome,
        elapsed: started.elapsed(),
    }
}

/// Launch `<program> <source>` and collect its stdout and exit code
///
/// Stdin comes from the case's `.in` fixture when present, otherwise it is
/// closed so the program sees EOF immediately. Stderr is left attached to
/// the console.
pub async fn execute(
    program: &Path,
    case: &TestCase,
    timeout: Option<Duration>,
) -> Result<ExecutionResult> {
    if !case.source.exists() {
        return Err(Error::SourceMissing(case.source.clone()));
    }

    let stdin = open_stdin(&case.stdin_fixture)?;

    let mut command = Command::new(program);
    command
        .arg(&case.source)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    tracing::debug!(
        program = %program.display(),
        source = %case.source.display(),
        "Launching target program"
    );

    let child = command
        .spawn()
        .map_err(|e| Error::spawn_failed(program, e))?;
    // Releases our copy of the stdin fixture handle
    drop(command);

    let pid = child.id();
    let wait = child.wait_with_output();
    let output = match timeout {
        Some(limit) => match tokio::time::timeout(limit, wait).await {
            Ok(output) => output,
            Err(_) => {
                kill_process_group(pid);
                return Err(Error::Timeout(limit));
            }
        },
        None => wait.await,
    }?;

    Ok(ExecutionResult {
        stdout: output.stdout,
        code: output.status.code(),
    })
}

/// Check an execution against the case's expectations
///
/// A non-zero exit fails before any output comparison. Without an `.out`
/// fixture only the exit code is checked.
pub fn verify(case: &TestCase, execution: &ExecutionResult) -> Result<()> {
    if execution.code != Some(0) {
        return Err(Error::NonZeroExit {
            code: execution.code,
        });
    }

    let expected = match std::fs::read(&case.stdout_fixture) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::fixture_read(&case.stdout_fixture, e)),
    };

    if expected != execution.stdout {
        return Err(Error::OutputMismatch {
            expected,
            actual: execution.stdout.clone(),
        });
    }

    Ok(())
}

fn open_stdin(path: &Path) -> Result<Stdio> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Stdio::null()),
        Err(e) => return Err(Error::fixture_read(path, e)),
    };

    // Opening a directory succeeds on Unix; the child would only fail on read
    let metadata = file
        .metadata()
        .map_err(|e| Error::fixture_read(path, e))?;
    if !metadata.is_file() {
        return Err(Error::fixture_read(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    Ok(Stdio::from(file))
}

/// Kill the target program and anything it spawned
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else { return };
    // The child leads its own group, so -pid addresses every descendant
    let result = unsafe { libc::kill(-(pid as i32), libc::SIGKILL) };
    if result != 0 {
        tracing::debug!(pid, "Process group already exited");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    /// Stand-in interpreter: each source file is a shell script
    const SHELL: &str = "/bin/sh";

    fn settings(fixtures: &Path) -> RunSettings {
        RunSettings {
            program: PathBuf::from(SHELL),
            fixture_dir: fixtures.to_path_buf(),
            extension: "b".to_string(),
            timeout: None,
            fail_fast: false,
        }
    }

    fn write_case(fixtures: &Path, name: &str, script: &str) -> TestCase {
        let source = fixtures.join(format!("{}.b", name));
        fs::write(&source, script).unwrap();
        TestCase::resolve(&source, "b").unwrap()
    }

    #[tokio::test]
    async fn test_hello_world_passes() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let case = write_case(dir.path(), "hello", "printf 'Hello, World!'\n");
        fs::write(&case.stdout_fixture, "Hello, World!").unwrap();

        let result = run_case(&settings, &case).await;
        assert!(result.passed(), "unexpected failure: {:?}", result.error());
        assert_eq!(result.name, "hello");
    }

    #[tokio::test]
    async fn test_stdin_fixture_is_fed_to_program() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let case = write_case(dir.path(), "echo", "cat\n");
        fs::write(&case.stdin_fixture, "abc").unwrap();
        fs::write(&case.stdout_fixture, "abc").unwrap();

        let result = run_case(&settings, &case).await;
        assert!(result.passed(), "unexpected failure: {:?}", result.error());
    }

    #[tokio::test]
    async fn test_missing_stdin_fixture_gives_eof() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let case = write_case(dir.path(), "drain", "cat\n");

        let execution = execute(&settings.program, &case, None).await.unwrap();
        assert_eq!(execution.code, Some(0));
        assert!(execution.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_even_with_matching_output() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let case = write_case(dir.path(), "bad", "printf ok\nexit 1\n");
        fs::write(&case.stdout_fixture, "ok").unwrap();

        let result = run_case(&settings, &case).await;
        match result.error() {
            Some(Error::NonZeroExit { code }) => assert_eq!(*code, Some(1)),
            other => panic!("expected NonZeroExit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_byte_difference_is_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let case = write_case(dir.path(), "off_by_one", "printf 'abd'\n");
        fs::write(&case.stdout_fixture, "abc").unwrap();

        let result = run_case(&settings, &case).await;
        match result.error() {
            Some(Error::OutputMismatch { expected, actual }) => {
                assert_eq!(expected, b"abc");
                assert_eq!(actual, b"abd");
            }
            other => panic!("expected OutputMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_without_out_fixture_only_checks_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("runs.b");
        fs::write(&source, "").unwrap();
        let case = TestCase::resolve(&source, "b").unwrap();

        let clean = ExecutionResult {
            stdout: b"anything at all".to_vec(),
            code: Some(0),
        };
        assert!(verify(&case, &clean).is_ok());

        let crashed = ExecutionResult {
            stdout: Vec::new(),
            code: None,
        };
        assert!(matches!(
            verify(&case, &crashed),
            Err(Error::NonZeroExit { code: None })
        ));
    }

    #[tokio::test]
    async fn test_missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let case = TestCase::resolve(&dir.path().join("ghost.b"), "b").unwrap();

        let result = run_case(&settings, &case).await;
        assert!(matches!(result.error(), Some(Error::SourceMissing(_))));
    }

    #[tokio::test]
    async fn test_hanging_program_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.timeout = Some(Duration::from_millis(200));
        let case = write_case(dir.path(), "hang", "exec sleep 30\n");

        let started = Instant::now();
        let result = run_case(&settings, &case).await;
        assert!(matches!(result.error(), Some(Error::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_build_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = dir.path().join("tests");
        fs::create_dir(&fixtures).unwrap();
        let marker = dir.path().join("ran");
        write_case(&fixtures, "touch", &format!("touch '{}'\n", marker.display()));

        let settings = RunSettings {
            program: dir.path().join("builddir").join("mlbf"),
            fixture_dir: fixtures,
            extension: "b".to_string(),
            timeout: None,
            fail_fast: false,
        };

        let err = run_suite(&settings).await.unwrap_err();
        assert_eq!(err.kind(), "BUILD_MISSING");
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_suite_runs_every_case_after_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = dir.path().join("tests");
        fs::create_dir(&fixtures).unwrap();
        let settings = settings(&fixtures);
        write_case(&fixtures, "a_fails", "exit 3\n");
        write_case(&fixtures, "b_passes", "true\n");

        let summary = run_suite(&settings).await.unwrap();
        let names: Vec<&str> = summary.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a_fails", "b_passes"]);
        assert_eq!(summary.passed(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.stopped_early);
        assert!(matches!(
            summary.into_result(),
            Err(Error::TestsFailed { failed: 1, run: 2, stopped_early: false })
        ));
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = dir.path().join("tests");
        fs::create_dir(&fixtures).unwrap();
        let mut settings = settings(&fixtures);
        settings.fail_fast = true;
        write_case(&fixtures, "a_fails", "exit 3\n");
        write_case(&fixtures, "b_passes", "true\n");

        let summary = run_suite(&settings).await.unwrap();
        assert_eq!(summary.results.len(), 1);
        assert!(summary.stopped_early);
    }

    #[tokio::test]
    async fn test_repeated_runs_give_identical_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = dir.path().join("tests");
        fs::create_dir(&fixtures).unwrap();
        let settings = settings(&fixtures);
        let hello = write_case(&fixtures, "hello", "printf 'Hello, World!'\n");
        fs::write(&hello.stdout_fixture, "Hello, World!").unwrap();
        write_case(&fixtures, "bad", "exit 1\n");

        let outcomes = |summary: RunSummary| -> Vec<(String, Option<&'static str>)> {
            summary
                .results
                .iter()
                .map(|r| (r.name.clone(), r.error().map(Error::kind)))
                .collect()
        };

        let first = outcomes(run_suite(&settings).await.unwrap());
        let second = outcomes(run_suite(&settings).await.unwrap());
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                ("bad".to_string(), Some("NONZERO_EXIT")),
                ("hello".to_string(), None)
            ]
        );
    }

    #[tokio::test]
    async fn test_non_executable_program_fails_each_case_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = dir.path().join("tests");
        fs::create_dir(&fixtures).unwrap();
        let program = dir.path().join("mlbf");
        fs::write(&program, "not executable").unwrap();
        write_case(&fixtures, "first", "true\n");
        write_case(&fixtures, "second", "true\n");

        let mut settings = settings(&fixtures);
        settings.program = program;
        assert!(target_exists(&settings.program));

        let summary = run_suite(&settings).await.unwrap();
        assert_eq!(summary.results.len(), 2);
        for result in &summary.results {
            assert!(
                matches!(result.error(), Some(Error::SpawnFailed { .. })),
                "expected SpawnFailed for {}, got {:?}",
                result.name,
                result.error()
            );
        }
    }

    #[tokio::test]
    async fn test_unreadable_out_fixture_is_a_fixture_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let case = write_case(dir.path(), "odd_out", "printf ok\n");
        fs::create_dir(&case.stdout_fixture).unwrap();

        let result = run_case(&settings, &case).await;
        match result.error() {
            Some(Error::FixtureRead { path, .. }) => assert_eq!(path, &case.stdout_fixture),
            other => panic!("expected FixtureRead, got {:?}", other),
        }
        assert_eq!(result.error().map(Error::kind), Some("FIXTURE_READ"));
    }

    #[tokio::test]
    async fn test_directory_in_fixture_is_rejected_before_launch() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let marker = dir.path().join("ran");
        let case = write_case(
            dir.path(),
            "odd_in",
            &format!("touch '{}'\ncat\n", marker.display()),
        );
        fs::create_dir(&case.stdin_fixture).unwrap();

        let result = run_case(&settings, &case).await;
        match result.error() {
            Some(Error::FixtureRead { path, .. }) => assert_eq!(path, &case.stdin_fixture),
            other => panic!("expected FixtureRead, got {:?}", other),
        }
        assert!(!marker.exists());
    }

    /// Alive and not a zombie waiting to be reaped
    #[cfg(target_os = "linux")]
    fn process_alive(pid: i32) -> bool {
        if unsafe { libc::kill(pid, 0) } != 0 {
            return false;
        }
        match fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => !stat
                .rsplit(')')
                .next()
                .is_some_and(|rest| rest.trim_start().starts_with('Z')),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_background_descendants() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.timeout = Some(Duration::from_millis(500));
        let pid_file = dir.path().join("sleeper.pid");
        let case = write_case(
            dir.path(),
            "spawns",
            &format!("sleep 30 &\necho $! > '{}'\nwait\n", pid_file.display()),
        );

        let result = run_case(&settings, &case).await;
        assert!(matches!(result.error(), Some(Error::Timeout(_))));

        let sleeper: i32 = fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while process_alive(sleeper) && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!process_alive(sleeper), "sleep {} outlived the timeout", sleeper);
    }
}

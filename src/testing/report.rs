//! Human and JSON rendering of test runs

use colored::Colorize;
use serde::Serialize;

use crate::common::{Error, Result};

use super::case::TestCase;
use super::runner::{RunSummary, TestResult};

/// Print a run for a terminal
///
/// Failures are always shown. Passing cases and the totals line only appear
/// in verbose mode, so a clean run prints nothing.
pub fn print_human(summary: &RunSummary, verbose: bool) {
    for result in &summary.results {
        match result.error() {
            None if verbose => println!(
                "  {} {} {}",
                "✓".green(),
                result.name,
                format!("({} ms)", result.elapsed.as_millis()).dimmed()
            ),
            None => {}
            Some(e) => println!("{}", failure_line(&result.name, e)),
        }
    }

    if verbose {
        let totals = format!("{} passed, {} failed", summary.passed(), summary.failed());
        if summary.is_success() {
            println!("\n{}", totals.green().bold());
        } else {
            println!("\n{}", totals.red().bold());
        }
    }
}

fn failure_line(name: &str, error: &Error) -> String {
    format!("  {} {}: {}", "✗".red(), name.red().bold(), error)
}

#[derive(Serialize)]
struct JsonRun<'a> {
    passed: usize,
    failed: usize,
    stopped_early: bool,
    cases: Vec<JsonCase<'a>>,
}

#[derive(Serialize)]
struct JsonCase<'a> {
    name: &'a str,
    source: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    elapsed_ms: u64,
}

impl<'a> From<&'a TestResult> for JsonCase<'a> {
    fn from(result: &'a TestResult) -> Self {
        let error = result.error();
        Self {
            name: &result.name,
            source: result.source.display().to_string(),
            status: if error.is_none() { "passed" } else { "failed" },
            kind: error.map(|e| e.kind()),
            message: error.map(|e| e.to_string()),
            elapsed_ms: result.elapsed.as_millis() as u64,
        }
    }
}

/// Render a run as a JSON document
pub fn to_json(summary: &RunSummary) -> Result<String> {
    let run = JsonRun {
        passed: summary.passed(),
        failed: summary.failed(),
        stopped_early: summary.stopped_early,
        cases: summary.results.iter().map(JsonCase::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&run)?)
}

/// A discovered case and which fixtures it has
#[derive(Serialize)]
pub struct CaseListing {
    pub name: String,
    pub source: String,
    pub stdin: bool,
    pub expected_output: bool,
}

impl From<&TestCase> for CaseListing {
    fn from(case: &TestCase) -> Self {
        Self {
            name: case.name.clone(),
            source: case.source.display().to_string(),
            stdin: case.has_stdin(),
            expected_output: case.has_expected_output(),
        }
    }
}

/// Print discovered cases for a terminal
pub fn print_listing(cases: &[CaseListing]) {
    if cases.is_empty() {
        println!("{}", "No test cases found".dimmed());
        return;
    }

    for case in cases {
        let mut fixtures = Vec::new();
        if case.stdin {
            fixtures.push(".in");
        }
        if case.expected_output {
            fixtures.push(".out");
        }
        let fixtures = if fixtures.is_empty() {
            "exit code only".to_string()
        } else {
            fixtures.join(" ")
        };
        println!("  {}  {}", case.name.bold(), fixtures.dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Outcome;
    use std::path::PathBuf;
    use std::time::Duration;

    fn result(name: &str, outcome: Outcome) -> TestResult {
        TestResult {
            name: name.to_string(),
            source: PathBuf::from(format!("tests/{}.b", name)),
            outcome,
            elapsed: Duration::from_millis(7),
        }
    }

    #[test]
    fn test_json_report_shape() {
        let summary = RunSummary {
            results: vec![
                result("hello", Outcome::Passed),
                result("bad", Outcome::Failed(Error::NonZeroExit { code: Some(1) })),
            ],
            stopped_early: false,
        };

        let json: serde_json::Value = serde_json::from_str(&to_json(&summary).unwrap()).unwrap();
        assert_eq!(json["passed"], 1);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["stopped_early"], false);

        let cases = json["cases"].as_array().unwrap();
        assert_eq!(cases[0]["name"], "hello");
        assert_eq!(cases[0]["status"], "passed");
        assert!(cases[0].get("kind").is_none());
        assert_eq!(cases[1]["status"], "failed");
        assert_eq!(cases[1]["kind"], "NONZERO_EXIT");
        assert_eq!(cases[1]["message"], "Target program exited with code 1");
        assert_eq!(cases[1]["elapsed_ms"], 7);
    }

    #[test]
    fn test_failure_line_names_case_and_reason() {
        colored::control::set_override(false);
        let line = failure_line("bad", &Error::NonZeroExit { code: Some(1) });
        assert_eq!(line, "  ✗ bad: Target program exited with code 1");
    }
}

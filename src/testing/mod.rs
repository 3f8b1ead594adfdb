//! Conformance test runner
//!
//! Discovers `.b` sources in the fixture directory, runs the target program
//! on each one and compares its stdout byte-for-byte with the `.out` fixture.

mod case;
mod discovery;
pub mod report;
mod runner;

pub use case::{case_name, TestCase};
pub use discovery::{discover, Discovery};
pub use runner::{
    execute, run_case, run_suite, target_exists, verify, ExecutionResult, Outcome, RunSettings,
    RunSummary, TestResult,
};

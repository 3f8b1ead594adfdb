//! mlbf conformance runner
//!
//! This library discovers brainfuck test scripts, runs the target
//! interpreter on each, and verifies exit codes and stdout against fixtures.

pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};

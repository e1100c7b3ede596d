//! Integration tests for promotion runs
//!
//! Each test builds a pipeline repository cloned from a bare remote, runs a
//! workflow through the library with scripted operator input, and inspects
//! the files, branches and commits that result.

pub mod cli;
pub mod config_layout;
pub mod safety;
pub mod workflows;

pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod git;
pub mod ui;
pub mod validation;
pub mod workflow;

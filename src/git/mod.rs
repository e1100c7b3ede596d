//! Git operations for promotion runs
//!
//! This module provides:
//! - Repository discovery and the per-run lock
//! - Base sync and promotion branch resolution
//! - Staging, committing and pushing the promoted file

pub mod branch;
pub mod publish;
pub mod repo;
pub mod runner;

pub use branch::{branch_state, checkout, current_branch, sync_base, BranchState, CheckoutOutcome};
pub use repo::{find_repo_root, has_uncommitted_changes, RunLock};
pub use runner::check_git_available;

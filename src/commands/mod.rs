//! Subcommand implementations

pub mod completions;
pub mod promote;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::git;

/// Repository and configuration shared by every subcommand.
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub repo_root: PathBuf,
    pub config: Config,
}

impl RepoContext {
    /// Locate the repository containing `start` and load its configuration.
    pub fn discover(start: &Path, config_path: Option<&Path>, service: Option<String>) -> Result<Self> {
        git::check_git_available()?;
        let repo_root = git::find_repo_root(start)?;
        let config = Config::load(&repo_root, config_path)?.with_service(service);
        config.validate()?;
        tracing::debug!(repo = %repo_root.display(), "repository context ready");
        Ok(Self { repo_root, config })
    }
}

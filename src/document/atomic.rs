//! Verified atomic replacement of a values file.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::PromoteError;

/// Replace `path` with `content`, but only if `verify` accepts what landed on disk.
///
/// The content goes to a temp file in the same directory, is synced, read back
/// and handed to `verify`. Only then is it renamed over the target. On any
/// failure the temp file is dropped (and deleted) and the target is left
/// exactly as it was.
pub fn write_verified<F>(path: &Path, content: &str, verify: F) -> Result<()>
where
    F: FnOnce(&str) -> Result<(), PromoteError>,
{
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut staging =
        NamedTempFile::new_in(parent).context("Failed to create staging temp file")?;
    staging
        .write_all(content.as_bytes())
        .context("Failed to write staged values file")?;
    staging
        .as_file()
        .sync_all()
        .context("Failed to sync staged values file to disk")?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(staging.path(), metadata.permissions())
            .context("Failed to copy permissions onto staged values file")?;
    }

    let landed = fs::read_to_string(staging.path()).context("Failed to re-read staged values file")?;
    verify(&landed)?;

    staging
        .persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "values file replaced");
    Ok(())
}

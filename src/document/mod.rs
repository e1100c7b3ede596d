//! Values-file access: read and rewrite single scalar fields in place.
//!
//! Fields are addressed by a [`Locator`]: either a 1-based line number or a
//! structural [`KeyPath`]. Rewrites replace only the scalar text of the
//! addressed line, so comments, quoting and layout survive untouched.

pub mod atomic;
pub mod keypath;
pub mod scalar;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::PromoteError;
use keypath::{locate_line, KeyPath};
use scalar::{parse_slot, rewrite_slot};

pub use atomic::write_verified;

/// Where a field lives inside a values file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// 1-based line number
    Line(usize),
    #[serde(deserialize_with = "deserialize_key_path")]
    Key(KeyPath),
}

fn deserialize_key_path<'de, D>(deserializer: D) -> std::result::Result<KeyPath, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    KeyPath::parse(&raw).map_err(serde::de::Error::custom)
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Line(line) => write!(f, "line {line}"),
            Locator::Key(path) => write!(f, "key {path}"),
        }
    }
}

/// A field value together with the line it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRead {
    /// 1-based line number
    pub line: usize,
    pub value: String,
}

/// One intended change to a values file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    pub locator: Locator,
    pub value: String,
}

/// In-memory snapshot of a values file.
#[derive(Debug, Clone)]
pub struct ValuesFile {
    path: PathBuf,
    content: String,
}

impl ValuesFile {
    /// Load a values file. A missing file is a precondition failure.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PromoteError::Precondition(format!(
                    "file not found: {}",
                    path.display()
                ))
                .into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        Ok(Self::from_content(path, content))
    }

    pub fn from_content(path: &Path, content: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Read the scalar a locator points at.
    pub fn read(&self, locator: &Locator) -> Result<FieldRead, PromoteError> {
        let lines = self.line_bodies();
        let idx = self.line_index(locator, &lines)?;
        let slot = parse_slot(lines[idx]).ok_or_else(|| {
            PromoteError::Precondition(format!(
                "{} line {} holds no scalar value: '{}'",
                self.path.display(),
                idx + 1,
                lines[idx].trim()
            ))
        })?;

        Ok(FieldRead {
            line: idx + 1,
            value: slot.value,
        })
    }

    /// Build the content that results from applying `edits`.
    ///
    /// Nothing is written; the returned string still has to pass
    /// [`ValuesFile::verify_rewrite`] before it may replace the file.
    pub fn rewrite(&self, edits: &[FieldEdit]) -> Result<String, PromoteError> {
        let lines = split_lines(&self.content);
        let bodies: Vec<&str> = lines.iter().map(|(body, _)| *body).collect();
        let mut replaced: Vec<Option<String>> = vec![None; lines.len()];

        for edit in edits {
            let idx = self.line_index(&edit.locator, &bodies)?;
            if replaced[idx].is_some() {
                return Err(PromoteError::Precondition(format!(
                    "two edits target {} line {}",
                    self.path.display(),
                    idx + 1
                )));
            }
            let slot = parse_slot(bodies[idx]).ok_or_else(|| {
                PromoteError::Precondition(format!(
                    "{} line {} holds no scalar value",
                    self.path.display(),
                    idx + 1
                ))
            })?;
            replaced[idx] = Some(rewrite_slot(bodies[idx], &slot, &edit.value));
        }

        let mut out = String::with_capacity(self.content.len() + 64);
        for ((body, ending), new_body) in lines.iter().zip(replaced) {
            out.push_str(new_body.as_deref().unwrap_or(body));
            out.push_str(ending);
        }
        Ok(out)
    }

    /// Check that `new_content` is exactly this file with `edits` applied.
    ///
    /// Every edited field must read back as its intended value, no other line
    /// may differ, and a file that parsed as YAML before must still parse.
    pub fn verify_rewrite(&self, new_content: &str, edits: &[FieldEdit]) -> Result<(), PromoteError> {
        let rewritten = ValuesFile::from_content(&self.path, new_content);
        let before = self.line_bodies();
        let mut targets = Vec::with_capacity(edits.len());

        for edit in edits {
            let read = rewritten.read(&edit.locator).map_err(|e| {
                PromoteError::Verification(format!("re-reading {}: {e}", edit.locator))
            })?;
            if read.value != edit.value {
                return Err(PromoteError::Verification(format!(
                    "{} line {} reads '{}', expected '{}'",
                    self.path.display(),
                    read.line,
                    read.value,
                    edit.value
                )));
            }
            targets.push(self.line_index(&edit.locator, &before)?);
        }

        let after = rewritten.line_bodies();
        if before.len() != after.len() {
            return Err(PromoteError::Verification(format!(
                "{} changed from {} to {} lines",
                self.path.display(),
                before.len(),
                after.len()
            )));
        }
        if let Some(idx) = (0..before.len()).find(|i| before[*i] != after[*i] && !targets.contains(i)) {
            return Err(PromoteError::Verification(format!(
                "{} line {} changed but was not targeted",
                self.path.display(),
                idx + 1
            )));
        }

        if serde_yaml::from_str::<serde_yaml::Value>(&self.content).is_ok() {
            if let Err(e) = serde_yaml::from_str::<serde_yaml::Value>(new_content) {
                return Err(PromoteError::Verification(format!(
                    "{} is no longer valid YAML: {e}",
                    self.path.display()
                )));
            }
        }

        Ok(())
    }

    fn line_bodies(&self) -> Vec<&str> {
        split_lines(&self.content)
            .into_iter()
            .map(|(body, _)| body)
            .collect()
    }

    /// 0-based index of the line a locator addresses.
    fn line_index(&self, locator: &Locator, lines: &[&str]) -> Result<usize, PromoteError> {
        match locator {
            Locator::Line(line) => {
                if *line == 0 || *line > lines.len() {
                    return Err(PromoteError::Precondition(format!(
                        "{} has {} lines, line {line} is out of range",
                        self.path.display(),
                        lines.len()
                    )));
                }
                Ok(line - 1)
            }
            Locator::Key(path) => {
                let doc: serde_yaml::Value = serde_yaml::from_str(&self.content).map_err(|e| {
                    PromoteError::Precondition(format!(
                        "{} is not valid YAML: {e}",
                        self.path.display()
                    ))
                })?;
                let (steps, expected) = path.resolve(&doc).ok_or_else(|| {
                    PromoteError::Precondition(format!(
                        "{} has no scalar at key {path}",
                        self.path.display()
                    ))
                })?;
                let idx = locate_line(lines, &steps).ok_or_else(|| {
                    PromoteError::Precondition(format!(
                        "key {path} in {} is not a single-line block scalar",
                        self.path.display()
                    ))
                })?;
                let on_line = parse_slot(lines[idx]).map(|slot| slot.value);
                if on_line.as_deref() != Some(expected.as_str()) {
                    return Err(PromoteError::Precondition(format!(
                        "key {path} resolved to {} line {} but its text does not match the parsed value '{expected}'",
                        self.path.display(),
                        idx + 1
                    )));
                }
                Ok(idx)
            }
        }
    }
}

/// Split content into (body, line ending) pairs, keeping `\r\n`, `\n` or
/// nothing for an unterminated last line.
fn split_lines(content: &str) -> Vec<(&str, &str)> {
    content
        .split_inclusive('\n')
        .map(|line| {
            if let Some(body) = line.strip_suffix("\r\n") {
                (body, "\r\n")
            } else if let Some(body) = line.strip_suffix('\n') {
                (body, "\n")
            } else {
                (line, "")
            }
        })
        .collect()
}

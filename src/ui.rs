//! Operator-facing terminal I/O
//!
//! Status lines use the four categories operators are used to (info,
//! success, warning, error). Prompts read from any `BufRead` so runs can be
//! scripted in tests.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

use crate::error::PromoteError;

/// Answer to the publish confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}

/// Parse a confirmation answer.
///
/// Only the exact spellings y/Y/yes/Yes/YES and n/N/no/No/NO are accepted;
/// anything else is an input error.
pub fn parse_confirmation(answer: &str) -> Result<Confirmation, PromoteError> {
    match answer.trim() {
        "y" | "Y" | "yes" | "Yes" | "YES" => Ok(Confirmation::Yes),
        "n" | "N" | "no" | "No" | "NO" => Ok(Confirmation::No),
        other => Err(PromoteError::Input(format!(
            "invalid confirmation '{}': answer yes or no",
            other.escape_debug()
        ))),
    }
}

/// Terminal (or scripted) console used by a promotion run.
pub struct Console<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// Consume the console and hand back the output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    pub fn info(&mut self, msg: &str) -> Result<()> {
        writeln!(self.out, "{} {msg}", "ℹ".blue().bold())?;
        Ok(())
    }

    pub fn success(&mut self, msg: &str) -> Result<()> {
        writeln!(self.out, "{} {msg}", "✓".green().bold())?;
        Ok(())
    }

    pub fn warn(&mut self, msg: &str) -> Result<()> {
        writeln!(self.out, "{} {msg}", "⚠".yellow().bold())?;
        Ok(())
    }

    /// Write raw, already formatted text.
    pub fn print(&mut self, text: &str) -> Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }

    /// Prompt for a line of input; EOF reads as an empty answer.
    pub fn prompt(&mut self, label: &str) -> Result<String> {
        write!(self.out, "{} ", format!("{label}:").bold())?;
        self.out.flush()?;

        let mut input = String::new();
        self.input
            .read_line(&mut input)
            .with_context(|| format!("Failed to read {label}"))?;
        if input.is_empty() {
            writeln!(self.out)?;
        }
        Ok(input.trim().to_string())
    }

    /// Prompt for a value that must not be empty.
    pub fn prompt_required(&mut self, label: &str) -> Result<String> {
        let value = self.prompt(label)?;
        if value.is_empty() {
            return Err(PromoteError::Input(format!("{label} is required")).into());
        }
        Ok(value)
    }

    /// Ask the single publish confirmation.
    pub fn confirm(&mut self, question: &str) -> Result<Confirmation> {
        let answer = self.prompt(&format!("{question} [yes/no]"))?;
        Ok(parse_confirmation(&answer)?)
    }
}

/// Print an error chain the way every run reports failure.
pub fn report_error(err: &anyhow::Error) {
    let label = crate::error::categorize(err)
        .map(|typed| format!("error[{}]:", typed.label()))
        .unwrap_or_else(|| "error:".to_string());
    eprintln!("{} {err:#}", label.red().bold());
}

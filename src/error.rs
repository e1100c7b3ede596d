//! Error categories for promotion runs
//!
//! Every failure a run can hit is fatal and non-retried. The category only
//! decides how the failure is labelled when it reaches the terminal.

/// Typed failure raised by the promotion engine.
///
/// These travel inside `anyhow::Error` so callers can keep adding context;
/// `main` downcasts to pick the label.
#[derive(Debug, thiserror::Error)]
pub enum PromoteError {
    /// Empty prompt value, malformed identifier, or unknown confirmation answer.
    #[error("invalid input: {0}")]
    Input(String),

    /// Config file unreadable, malformed, or referencing unknown placeholders.
    #[error("config error: {0}")]
    Config(String),

    /// A read-only check failed before anything was touched.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The rewritten content did not hold the intended value.
    #[error("verification failed: {0}")]
    Verification(String),

    /// A git command exited non-zero.
    #[error("git error: {0}")]
    Git(String),

    /// The checked-out branch no longer matches what the operator approved.
    #[error("plan drift: {0}")]
    PlanDrift(String),
}

impl PromoteError {
    /// Short label used as the prefix of the terminal diagnostic.
    pub fn label(&self) -> &'static str {
        match self {
            PromoteError::Input(_) => "input",
            PromoteError::Config(_) => "config",
            PromoteError::Precondition(_) => "precondition",
            PromoteError::Verification(_) => "verification",
            PromoteError::Git(_) => "git",
            PromoteError::PlanDrift(_) => "drift",
        }
    }
}

/// Find the first `PromoteError` in an error chain, if any.
pub fn categorize(err: &anyhow::Error) -> Option<&PromoteError> {
    err.chain().find_map(|cause| cause.downcast_ref::<PromoteError>())
}

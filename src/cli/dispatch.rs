use anyhow::Result;
use clap::CommandFactory;
use promote::commands::completions::{generate_completions, Shell};
use promote::commands::{promote as workflows, status, RepoContext};
use promote::ui::Console;
use promote::workflow::WorkflowKind;
use std::io::{self, StdinLock, Stdout};
use std::path::PathBuf;
use std::str::FromStr;

use super::types::{Cli, Commands};

pub fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        repo,
        config,
        service,
        command,
        ..
    } = cli;

    let (kind, args) = match command {
        Commands::Completions { shell } => {
            let shell = Shell::from_str(&shell)?;
            generate_completions(&mut Cli::command(), shell, &mut io::stdout());
            return Ok(());
        }
        Commands::Status => {
            let ctx = context(repo, config, service)?;
            return status::execute(&ctx, &mut console());
        }
        Commands::Prod {
            flags,
            change_request,
        } => (WorkflowKind::Prod, flags.into_args(None, change_request)),
        Commands::QaPreprod { flags, ruleset } => {
            (WorkflowKind::QaPreprod, flags.into_args(ruleset, None))
        }
        Commands::QaProd { flags } => (WorkflowKind::QaProd, flags.into_args(None, None)),
        Commands::Stage { flags } => (WorkflowKind::Stage, flags.into_args(None, None)),
    };

    let ctx = context(repo, config, service)?;
    let outcome = workflows::execute(kind, &ctx, &args, &mut console())?;
    tracing::debug!(?outcome, "run finished");
    Ok(())
}

fn context(repo: Option<PathBuf>, config: Option<PathBuf>, service: Option<String>) -> Result<RepoContext> {
    let start = match repo {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    RepoContext::discover(&start, config.as_deref(), service)
}

fn console() -> Console<StdinLock<'static>, Stdout> {
    Console::new(io::stdin().lock(), io::stdout())
}

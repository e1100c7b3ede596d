use clap::{ArgAction, Args, Parser, Subcommand};
use promote::commands::promote::PromoteArgs;
use promote::validation::{
    clap_change_request_validator, clap_ruleset_validator, clap_ticket_validator,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "promote")]
#[command(about = "Promote rulesets through the QA → Stage → Prod values files", long_about = None)]
#[command(version)]
#[command(subcommand_help_heading = "Commands")]
pub struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// Config file (default: promote.toml at the repository root)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Service name substituted into values file paths
    #[arg(long, global = true)]
    pub service: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every workflow
#[derive(Args, Debug, Clone)]
pub struct RunFlags {
    /// Ticket id used in the branch name and commit message
    #[arg(short, long, value_parser = clap_ticket_validator)]
    pub ticket: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Show the plan and diff, then stop
    #[arg(long)]
    pub dry_run: bool,

    /// Commit but do not push
    #[arg(long)]
    pub no_push: bool,
}

impl RunFlags {
    pub fn into_args(self, ruleset: Option<String>, change_request: Option<String>) -> PromoteArgs {
        PromoteArgs {
            ticket: self.ticket,
            ruleset,
            change_request,
            yes: self.yes,
            dry_run: self.dry_run,
            no_push: self.no_push,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Promote the Stage ruleset to Prod (requires QA job_stage Prod and QA == Stage)
    Prod {
        #[command(flatten)]
        flags: RunFlags,

        /// Change request id for the commit message (prompted after confirmation)
        #[arg(long, value_parser = clap_change_request_validator)]
        change_request: Option<String>,
    },

    /// Point QA at a new ruleset and set job_stage to Pre_prod
    QaPreprod {
        #[command(flatten)]
        flags: RunFlags,

        /// Ruleset filename to deploy to QA
        #[arg(short, long, value_parser = clap_ruleset_validator)]
        ruleset: Option<String>,
    },

    /// Set QA job_stage to Prod (requires QA == Stage)
    QaProd {
        #[command(flatten)]
        flags: RunFlags,
    },

    /// Copy the QA ruleset to Stage
    Stage {
        #[command(flatten)]
        flags: RunFlags,
    },

    /// Show every managed field and whether the promotion gates hold
    Status,

    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish)
        shell: String,
    },
}

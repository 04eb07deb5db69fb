//! This file defines the command-line interface (CLI) for the envfilter
//! application, including all available commands and their arguments.
//! License: MIT OR Apache-2.0

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "envfilter",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Filter, inject, and externalize environment variables around a command",
    long_about = "envfilter prepares the environment of a command the way a CI step would: it runs a configurable chain of rules that remove, redact, or reject variables whose values match a pattern, injects fixed variables, and can save selected variables to files for the duration of the command, deleting them afterwards no matter how the command ends.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `envfilter` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Applies the rule chain to the current environment and prints the result.
    #[command(about = "Apply the rule chain to the current environment and print the result.")]
    Apply(ApplyCommand),

    /// Runs a command with the filtered environment and externalized variables.
    #[command(about = "Run a command with the filtered environment and externalized variables.")]
    Run(RunCommand),

    /// Validates a configuration file and lists its rules.
    #[command(about = "Validate a configuration file and list its rules.")]
    Check(CheckCommand),

    /// Externalizes variables and saves the cleanup obligation for a later `teardown`.
    #[command(about = "Externalize variables to files and save the cleanup record for a later teardown.")]
    Setup(SetupCommand),

    /// Deletes the files recorded by an earlier `setup`.
    #[command(about = "Delete the files recorded by an earlier setup.")]
    Teardown(TeardownCommand),
}

/// Options shared by every command that prepares an environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Path to the rule configuration file (YAML).
    #[arg(long = "config", value_name = "FILE", env = "ENVFILTER_CONFIG", help = "Path to the rule configuration file (YAML).")]
    pub config: Option<PathBuf>,

    /// Extra variables to load on top of the process environment.
    #[arg(long = "env-file", value_name = "FILE", help = "Load additional variables from a dotenv file.")]
    pub env_file: Option<PathBuf>,

    /// Job name of the current run; without it no run exclusions are evaluated.
    #[arg(long = "job", value_name = "NAME", help = "Job name of the current run (enables run exclusions).")]
    pub job: Option<String>,

    /// Build number of the current run.
    #[arg(long = "build-number", value_name = "N", default_value_t = 0, help = "Build number of the current run.")]
    pub build_number: u64,

    /// Run parameters as KEY=VALUE pairs.
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_val, help = "Run parameter as KEY=VALUE (repeatable).")]
    pub params: Vec<(String, String)>,

    /// Name of the step the environment is prepared for.
    #[arg(long = "subject", value_name = "NAME", default_value = "command", help = "Name of the step the environment is prepared for.")]
    pub subject: String,

    /// Category of the step, matched by descriptor matchers.
    #[arg(long = "category", value_name = "CATEGORY", help = "Category of the step (e.g. 'shell'), matched by descriptor matchers.")]
    pub category: Option<String>,

    /// Name of the execution channel.
    #[arg(long = "channel", value_name = "NAME", default_value = "local", help = "Name of the execution channel.")]
    pub channel: String,
}

/// Arguments for the `apply` command.
#[derive(Parser, Debug)]
pub struct ApplyCommand {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Print the environment as a JSON object instead of KEY=VALUE lines.
    #[arg(long = "json", help = "Print the environment as a JSON object.")]
    pub json: bool,
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunCommand {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Workspace directory; the command runs here and files go to `<workspace>@tmp`.
    #[arg(long = "workspace", short = 'w', value_name = "DIR", help = "Workspace directory (defaults to the current directory).")]
    pub workspace: Option<PathBuf>,

    /// The command to run, after `--`.
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckCommand {
    /// Path to the rule configuration file (YAML).
    #[arg(long = "config", value_name = "FILE", env = "ENVFILTER_CONFIG", help = "Path to the rule configuration file (YAML).")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `setup` command.
#[derive(Parser, Debug)]
pub struct SetupCommand {
    #[command(flatten)]
    pub context: ContextArgs,

    #[arg(long = "workspace", short = 'w', value_name = "DIR", help = "Workspace directory (defaults to the current directory).")]
    pub workspace: Option<PathBuf>,

    /// Where to save the cleanup record.
    #[arg(long = "disposer-out", value_name = "FILE", help = "Where to save the cleanup record (JSON).")]
    pub disposer_out: PathBuf,
}

/// Arguments for the `teardown` command.
#[derive(Parser, Debug)]
pub struct TeardownCommand {
    /// Cleanup record written by `setup`.
    #[arg(long = "disposer", value_name = "FILE", help = "Cleanup record written by `setup`.")]
    pub disposer: PathBuf,

    #[arg(long = "workspace", short = 'w', value_name = "DIR", help = "Workspace directory (defaults to the current directory).")]
    pub workspace: Option<PathBuf>,
}

/// Parses a `KEY=VALUE` pair.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid KEY=VALUE: no `=` found in `{}`", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_val_splits_on_first_equals() {
        assert_eq!(parse_key_val("A=b=c"), Ok(("A".to_string(), "b=c".to_string())));
        assert_eq!(parse_key_val("A="), Ok(("A".to_string(), String::new())));
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn run_requires_a_command_after_double_dash() {
        let cli = Cli::try_parse_from(["envfilter", "run", "--workspace", "/w", "--", "sh", "-c", "true"]).unwrap();
        match cli.command {
            Commands::Run(run) => assert_eq!(run.command, ["sh", "-c", "true"]),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["envfilter", "run"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

// envfilter/src/commands/mod.rs
//! Subcommand implementations and the plumbing they share: locating the
//! configuration, taking the environment snapshot, and describing the run.

pub mod apply;
pub mod check;
pub mod run;
pub mod setup;
pub mod teardown;

use anyhow::{Context, Result};
use log::{debug, info};
use std::io;
use std::path::{Path, PathBuf};

use envfilter_core::{
    apply_rules, merge_configs, ApplicabilityContext, Channel, EnvVars, FilterConfig, RunIdentity, Subject,
    Workspace, WriterSink,
};

use crate::cli::{Cli, Commands, ContextArgs};

/// Runs the selected subcommand and returns the process exit code.
pub async fn dispatch(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Apply(cmd) => apply::run_apply(cmd),
        Commands::Run(cmd) => run::run_command(cmd).await,
        Commands::Check(cmd) => check::run_check(cmd),
        Commands::Setup(cmd) => setup::run_setup(cmd),
        Commands::Teardown(cmd) => teardown::run_teardown(cmd),
    }
}

/// Location of the per-user configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("envfilter").join("config.yaml"))
}

/// Loads the per-user configuration and the one named on the command line.
pub fn load_config(explicit: Option<&Path>) -> Result<FilterConfig> {
    load_layered_config(default_config_path().as_deref(), explicit)
}

/// Layers `explicit` over the file at `default_path`.
///
/// Rules from the explicit file run after the per-user rules; its `env2file`
/// section, if any, replaces the per-user one. A missing per-user file is
/// skipped, a missing explicit file is an error.
pub fn load_layered_config(default_path: Option<&Path>, explicit: Option<&Path>) -> Result<FilterConfig> {
    let defaults = match default_path {
        Some(path) if path.is_file() => FilterConfig::load_from_file(path)?,
        _ => {
            debug!("No per-user configuration file found.");
            FilterConfig::default()
        }
    };
    let user = explicit.map(|path| FilterConfig::load_from_file(path)).transpose()?;
    Ok(merge_configs(defaults, user))
}

/// Takes the process environment and layers an optional dotenv file on top.
pub fn environment_snapshot(env_file: Option<&Path>) -> Result<EnvVars> {
    let mut env = EnvVars::from_process();
    if let Some(path) = env_file {
        let entries = dotenvy::from_path_iter(path)
            .with_context(|| format!("Failed to open env file {}", path.display()))?;
        let mut loaded = 0usize;
        for entry in entries {
            let (key, value) = entry.with_context(|| format!("Failed to parse env file {}", path.display()))?;
            env.put(key, value);
            loaded += 1;
        }
        info!("Loaded {} variable(s) from {}.", loaded, path.display());
    }
    Ok(env)
}

/// Builds the run identity, if a job name was given.
pub fn run_identity(args: &ContextArgs) -> Option<RunIdentity> {
    let job = args.job.as_ref()?;
    let run = args
        .params
        .iter()
        .fold(RunIdentity::new(job.clone(), args.build_number), |run, (name, value)| {
            run.with_parameter(name.clone(), value.clone())
        });
    Some(run)
}

pub fn subject(args: &ContextArgs) -> Subject {
    match &args.category {
        Some(category) => Subject::describable(args.subject.clone(), category.clone()),
        None => Subject::opaque(args.subject.clone()),
    }
}

/// The workspace directory, defaulting to the current directory.
pub fn workspace(dir: Option<&Path>) -> Result<Workspace> {
    let root = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };
    Ok(Workspace::new(root))
}

/// The loaded configuration together with the filtered environment.
pub struct Prepared {
    pub config: FilterConfig,
    pub env: EnvVars,
}

/// Loads everything named by `args` and runs the rule chain over the
/// snapshot. Diagnostic lines go to stderr.
pub fn prepare_environment(args: &ContextArgs) -> Result<Prepared> {
    let config = load_config(args.config.as_deref())?;
    let mut env = environment_snapshot(args.env_file.as_deref())?;

    let run = run_identity(args);
    let subject = subject(args);
    let channel = Channel::new(args.channel.clone());
    let mut sink = WriterSink::new(io::stderr());

    let applied = apply_rules(
        &config.rules,
        &mut env,
        ApplicabilityContext::new(run.as_ref(), &subject, &channel),
        &mut sink,
    )
    .context("Environment preparation failed")?;
    debug!("{} of {} rule(s) applied to {}.", applied, config.rules.len(), subject);

    Ok(Prepared { config, env })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use test_log::test;

    #[test]
    fn run_identity_requires_a_job_name() {
        let mut args = ContextArgs::default();
        args.params = vec![("P".into(), "1".into())];
        assert!(run_identity(&args).is_none());

        args.job = Some("deploy".into());
        args.build_number = 7;
        let run = run_identity(&args).unwrap();
        assert_eq!(run.job_name, "deploy");
        assert_eq!(run.build_number, 7);
        assert_eq!(run.parameter("P"), Some("1"));
    }

    #[test]
    fn subject_is_describable_only_with_a_category() {
        let mut args = ContextArgs {
            subject: "step".into(),
            ..ContextArgs::default()
        };
        assert_eq!(subject(&args).category, None);
        args.category = Some("shell".into());
        assert_eq!(subject(&args).category.as_deref(), Some("shell"));
    }

    #[test]
    fn env_file_overrides_process_values() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "ENVFILTER_TEST_FROM_FILE=loaded")?;
        let env = environment_snapshot(Some(file.path()))?;
        assert_eq!(env.get("ENVFILTER_TEST_FROM_FILE"), Some("loaded"));
        Ok(())
    }

    fn config_file(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn explicit_config_is_layered_over_per_user_config() -> Result<()> {
        let per_user = config_file(
            "rules:\n  - type: variable_contributing\n    key: CI\n    value: \"true\"\nenv2file:\n  variables: [A]\n",
        );
        let explicit = config_file("rules:\n  - type: regex_value\n    regex: \"secret.*\"\n    action: redact\n");

        let config = load_layered_config(Some(per_user.path()), Some(explicit.path()))?;

        assert_eq!(config.rules.len(), 2);
        assert!(matches!(config.rules[0], envfilter_core::Rule::VariableContributing(_)));
        assert!(matches!(config.rules[1], envfilter_core::Rule::RegexValue(_)));
        assert_eq!(config.env2file.map(|w| w.variables().to_vec()), Some(vec!["A".to_string()]));
        Ok(())
    }

    #[test]
    fn missing_per_user_config_is_skipped_but_missing_explicit_config_is_not() -> Result<()> {
        let absent = Path::new("/no/such/envfilter/config.yaml");
        assert!(load_layered_config(Some(absent), None)?.is_empty());
        assert!(load_layered_config(None, Some(absent)).is_err());
        Ok(())
    }

    #[test]
    fn missing_env_file_is_an_error() {
        assert!(environment_snapshot(Some(Path::new("/no/such/.env"))).is_err());
    }
}

// envfilter/src/commands/run.rs
//! `envfilter run`: prepare the environment, externalize the configured
//! variables, run the command, and delete the files however it ends.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::Path;
use std::process::ExitStatus;
use tokio::process::Command;

use envfilter_core::{DisposerGuard, EnvVars, SetupFailure, WriterSink};

use super::{prepare_environment, workspace};
use crate::cli::RunCommand;
use crate::output;
use crate::signals::Interrupts;

pub async fn run_command(cmd: RunCommand) -> Result<u8> {
    info!("Starting run operation.");
    let mut interrupts = Interrupts::install().context("Failed to install signal handlers")?;
    let prepared = prepare_environment(&cmd.context)?;
    let workspace = workspace(cmd.workspace.as_deref())?;
    if let Some(root) = workspace.root() {
        fs::create_dir_all(root).with_context(|| format!("Failed to create workspace {}", root.display()))?;
    }
    let wrapper = prepared.config.env2file.unwrap_or_default();
    let mut sink = WriterSink::new(io::stderr());

    let outcome = match wrapper.setup(&prepared.env, &workspace, &mut sink) {
        Ok(outcome) => outcome,
        Err(SetupFailure { error, disposer }) => {
            disposer.tear_down(&workspace, &mut sink);
            return Err(error).context("Failed to externalize environment variables");
        }
    };

    let guard = DisposerGuard::new(outcome.disposer, workspace.clone());
    let child_env = prepared.env.overlaid(&outcome.overrides);
    let verdict = execute(&cmd.command, &child_env, workspace.root(), &mut interrupts).await;
    let report = guard.finish(&mut sink);

    if !report.is_clean() {
        output::warn_msg(format!("{} externalized file(s) could not be deleted.", report.failures.len()));
    }
    verdict
}

/// Spawns `argv` with exactly `env` and waits for it or for a cancellation
/// signal. On cancellation the child is killed and reaped before returning.
async fn execute(argv: &[String], env: &EnvVars, cwd: Option<&Path>, interrupts: &mut Interrupts) -> Result<u8> {
    let (program, args) = argv.split_first().context("No command given")?;

    let mut command = Command::new(program);
    command.args(args).env_clear().envs(env.iter()).kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to start '{}'", program))?;
    debug!("Started '{}' with {} variable(s).", program, env.len());

    tokio::select! {
        status = child.wait() => {
            let status = status.with_context(|| format!("Failed to wait for '{}'", program))?;
            info!("'{}' exited with {}.", program, status);
            Ok(exit_code(status))
        }
        interrupt = interrupts.recv() => {
            warn!("Received {}; stopping '{}'.", interrupt.name(), program);
            if let Err(e) = child.kill().await {
                warn!("Failed to stop '{}': {}", program, e);
            }
            Ok(interrupt.exit_code())
        }
    }
}

/// Maps a child status onto our own exit code.
fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code).unwrap_or(1);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return u8::try_from(128 + signal).unwrap_or(1);
        }
    }
    1
}

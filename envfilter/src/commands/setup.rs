// envfilter/src/commands/setup.rs
//! `envfilter setup`: externalize variables and hand the cleanup record to a
//! later `envfilter teardown`, possibly in another process.

use anyhow::{Context, Result};
use log::info;
use std::io::{self, Write};

use envfilter_core::{EnvVars, SetupFailure, WriterSink};

use super::{prepare_environment, workspace};
use crate::cli::SetupCommand;
use crate::output;

pub fn run_setup(cmd: SetupCommand) -> Result<u8> {
    let prepared = prepare_environment(&cmd.context)?;
    let workspace = workspace(cmd.workspace.as_deref())?;
    let wrapper = prepared.config.env2file.unwrap_or_default();
    let mut sink = WriterSink::new(io::stderr());

    let (disposer, result) = match wrapper.setup(&prepared.env, &workspace, &mut sink) {
        Ok(outcome) => (outcome.disposer, Ok(outcome.overrides)),
        Err(SetupFailure { error, disposer }) => (disposer, Err(error)),
    };

    // Saved even on failure: partial writes still need deleting.
    disposer
        .save(&cmd.disposer_out)
        .with_context(|| format!("Failed to save cleanup record to {}", cmd.disposer_out.display()))?;
    info!("Saved {} path(s) to {}.", disposer.len(), cmd.disposer_out.display());

    let overrides = result.context("Failed to externalize environment variables")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_exports(&mut out, &overrides)?;
    out.flush()?;

    output::success_msg(format!(
        "Externalized {} variable(s); run `envfilter teardown --disposer {}` when done.",
        overrides.len(),
        cmd.disposer_out.display()
    ));
    Ok(0)
}

/// Writes `export NAME='value'` lines that a POSIX shell can `eval`.
pub fn write_exports<W: Write>(out: &mut W, overrides: &EnvVars) -> io::Result<()> {
    for (name, path) in overrides {
        writeln!(out, "export {}={}", name, shell_quote(path))?;
    }
    Ok(())
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

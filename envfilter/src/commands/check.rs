// envfilter/src/commands/check.rs
//! `envfilter check`: validate a configuration and list what it would do.

use anyhow::Result;
use std::io::{self, Write};

use envfilter_core::{EnvironmentRule, FilterConfig};

use super::{default_config_path, load_config};
use crate::cli::CheckCommand;
use crate::output;

pub fn run_check(cmd: CheckCommand) -> Result<u8> {
    let source = cmd
        .config
        .clone()
        .or_else(|| default_config_path().filter(|p| p.is_file()));
    let config = load_config(cmd.config.as_deref())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, &config)?;

    match source {
        Some(path) => output::success_msg(format!(
            "{} is valid ({} rule(s)).",
            path.display(),
            config.rules.len()
        )),
        None => output::info_msg("No configuration file found; nothing to check."),
    }
    Ok(0)
}

/// Lists rules in execution order, then the externalized variables.
pub fn write_summary<W: Write>(out: &mut W, config: &FilterConfig) -> io::Result<()> {
    if config.rules.is_empty() {
        writeln!(out, "No rules configured.")?;
    }
    for (index, rule) in config.rules.iter().enumerate() {
        writeln!(out, "{:>3}. {}", index + 1, rule.describe())?;
    }
    if let Some(wrapper) = &config.env2file {
        writeln!(out, "env2file: {}", wrapper.variables().join(", "))?;
    }
    Ok(())
}

// envfilter/src/commands/apply.rs
//! `envfilter apply`: print the environment a step would receive.

use anyhow::{Context, Result};
use log::info;
use std::io::{self, Write};

use envfilter_core::EnvVars;

use super::prepare_environment;
use crate::cli::ApplyCommand;

pub fn run_apply(cmd: ApplyCommand) -> Result<u8> {
    info!("Starting apply operation.");
    let prepared = prepare_environment(&cmd.context)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_environment(&mut out, &prepared.env, cmd.json)?;
    out.flush().context("Failed to flush stdout")?;
    Ok(0)
}

/// Writes `env` as sorted `KEY=VALUE` lines or as one JSON object.
pub fn write_environment<W: Write>(out: &mut W, env: &EnvVars, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, env).context("Failed to serialize environment")?;
        writeln!(out)?;
    } else {
        for (key, value) in env {
            writeln!(out, "{}={}", key, value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_output_is_sorted_key_value_lines() {
        let env: EnvVars = [("B", "2"), ("A", "1")].into_iter().collect();
        let mut buf = Vec::new();
        write_environment(&mut buf, &env, false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "A=1\nB=2\n");
    }

    #[test]
    fn json_output_is_a_flat_object() {
        let env: EnvVars = [("A", "1")].into_iter().collect();
        let mut buf = Vec::new();
        write_environment(&mut buf, &env, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value, serde_json::json!({ "A": "1" }));
    }
}

// envfilter/src/commands/teardown.rs
//! `envfilter teardown`: delete the files recorded by `envfilter setup`.

use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::io;

use envfilter_core::{Disposer, WriterSink};

use super::workspace;
use crate::cli::TeardownCommand;
use crate::output;

/// Teardown problems are reported but never turn into a failing exit code.
pub fn run_teardown(cmd: TeardownCommand) -> Result<u8> {
    let disposer = Disposer::load(&cmd.disposer)
        .with_context(|| format!("Failed to read cleanup record {}", cmd.disposer.display()))?;
    let workspace = workspace(cmd.workspace.as_deref())?;
    let mut sink = WriterSink::new(io::stderr());

    info!("Tearing down {} path(s) from {}.", disposer.len(), cmd.disposer.display());
    let report = disposer.tear_down(&workspace, &mut sink);

    if report.is_clean() {
        if let Err(e) = fs::remove_file(&cmd.disposer) {
            log::warn!("Failed to remove cleanup record {}: {}", cmd.disposer.display(), e);
        }
        output::success_msg(format!("Deleted {} file(s).", report.deleted.len()));
    } else {
        output::warn_msg(format!(
            "{} file(s) could not be deleted; the cleanup record was kept at {}.",
            report.failures.len(),
            cmd.disposer.display()
        ));
    }
    Ok(0)
}

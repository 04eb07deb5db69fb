// envfilter-core/src/env2file.rs
//! Externalizes selected environment variables to files for the duration of
//! one execution.
//!
//! Setup writes each configured, present variable to `<name>.txt` inside the
//! workspace's scoped temporary directory (`<workspace>@tmp`) and overrides the
//! variable with the file's absolute path. Every written path is recorded in a
//! [`Disposer`], the obligation to delete those files once the execution is
//! over. A disposer carries only path strings, so it can be serialized and
//! torn down from another process.
//!
//! In-process hosts should prefer [`run_wrapped`] or [`DisposerGuard`], which
//! tear down on every exit path including panics.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::env_vars::EnvVars;
use crate::errors::{EnvFilterError, Result};

/// Suffix of the per-workspace temporary directory.
pub const TEMP_DIR_SUFFIX: &str = "@tmp";

/// Extension of every externalized variable file.
pub const FILE_EXTENSION: &str = "txt";

/// Handle to the workspace of the current execution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Workspace {
    root: Option<PathBuf>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// A handle for executions that have no workspace at all.
    pub fn none() -> Self {
        Self { root: None }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// The scoped temporary directory, a sibling of the workspace named
    /// `<workspace>@tmp`. `None` when there is no workspace or it has no parent.
    pub fn temp_dir(&self) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        let name = root.file_name()?;
        let parent = root.parent()?;
        let mut dir_name = name.to_os_string();
        dir_name.push(TEMP_DIR_SUFFIX);
        Some(parent.join(dir_name))
    }

    /// Resolves `path` relative to the workspace; absolute paths stay as-is.
    pub fn child(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        }
    }
}

/// The files written by one setup, in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposer {
    paths: Vec<PathBuf>,
}

impl Disposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| EnvFilterError::Serialization(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| EnvFilterError::Serialization(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Deletes every recorded file, in recorded order.
    ///
    /// Best-effort: a failed deletion is reported to `sink` and in the returned
    /// report, and the remaining files are still deleted. Files that are
    /// already gone count as deleted. Consumes the disposer, so teardown cannot
    /// run twice for the same setup.
    pub fn tear_down(self, workspace: &Workspace, sink: &mut dyn DiagnosticSink) -> TeardownReport {
        let mut report = TeardownReport::default();
        for path in self.paths {
            let target = workspace.child(&path);
            match fs::remove_file(&target) {
                Ok(()) => {
                    debug!("Deleted {}", target.display());
                    report.deleted.push(path);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("{} was already gone", target.display());
                    report.deleted.push(path);
                }
                Err(e) => {
                    warn!("Failed to delete {}: {}", target.display(), e);
                    sink.println(&format!("Failed to delete {}: {}", target.display(), e));
                    report.failures.push(TeardownFailure {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }
        report
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a teardown. Failures never change the execution's verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub deleted: Vec<PathBuf>,
    pub failures: Vec<TeardownFailure>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a successful setup.
#[derive(Debug)]
pub struct SetupOutcome {
    /// Variable name to file path, merged over the environment of the wrapped execution.
    pub overrides: EnvVars,
    pub disposer: Disposer,
}

/// A failed setup, with the files it managed to write before failing.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct SetupFailure {
    #[source]
    pub error: EnvFilterError,
    pub disposer: Disposer,
}

/// Saves environment variables to files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Env2FileWrapper {
    variables: Vec<String>,
}

impl Env2FileWrapper {
    pub fn new<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a newline-separated list of variable names.
    pub fn from_conjoined(text: &str) -> Self {
        Self::new(text.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn variables_conjoined(&self) -> String {
        self.variables.join("\n")
    }

    /// Writes each configured, present variable to its file.
    ///
    /// Paths are recorded into `disposer` as soon as a write is attempted, so
    /// on error the caller still holds every file that may exist.
    pub fn set_up(
        &self,
        env: &EnvVars,
        workspace: &Workspace,
        sink: &mut dyn DiagnosticSink,
        disposer: &mut Disposer,
    ) -> Result<EnvVars> {
        let mut overrides = EnvVars::new();
        let mut tmp: Option<PathBuf> = None;

        for variable in &self.variables {
            let Some(value) = env.get(variable) else {
                debug!("Variable '{}' is not set; nothing to write.", variable);
                continue;
            };
            validate_variable_name(variable)?;

            let dir = match tmp.take() {
                Some(dir) => dir,
                None => scoped_temp_dir(workspace)?,
            };
            let output = dir.join(format!("{}.{}", variable, FILE_EXTENSION));
            tmp = Some(dir);

            disposer.record(output.clone());
            fs::write(&output, value.as_bytes())?;

            let path = output.to_string_lossy().into_owned();
            sink.println(&format!("Wrote {} to {}", variable, path));
            overrides.put(variable.as_str(), path);
        }
        Ok(overrides)
    }

    /// Runs [`set_up`](Self::set_up) with a fresh disposer.
    pub fn setup(
        &self,
        env: &EnvVars,
        workspace: &Workspace,
        sink: &mut dyn DiagnosticSink,
    ) -> std::result::Result<SetupOutcome, SetupFailure> {
        let mut disposer = Disposer::new();
        match self.set_up(env, workspace, sink, &mut disposer) {
            Ok(overrides) => Ok(SetupOutcome { overrides, disposer }),
            Err(error) => Err(SetupFailure { error, disposer }),
        }
    }
}

/// Variable names become file names, so they must stay inside the directory.
pub fn validate_variable_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(EnvFilterError::Config(format!(
            "'{}' cannot be used as a file name",
            name
        )));
    }
    Ok(())
}

fn scoped_temp_dir(workspace: &Workspace) -> Result<PathBuf> {
    let tmp = workspace
        .temp_dir()
        .ok_or_else(|| EnvFilterError::FatalSetup("no workspace".to_string()))?;
    fs::create_dir_all(&tmp)
        .map_err(|e| EnvFilterError::FatalSetup(format!("no workspace: {}: {}", tmp.display(), e)))?;
    Ok(std::path::absolute(&tmp)?)
}

/// Tears a disposer down when dropped, unless [`finish`](Self::finish) did it first.
///
/// The drop path covers panics and early returns; its diagnostics go to the
/// `log` facade since the host sink is out of reach there.
#[derive(Debug)]
pub struct DisposerGuard {
    disposer: Option<Disposer>,
    workspace: Workspace,
}

impl DisposerGuard {
    pub fn new(disposer: Disposer, workspace: Workspace) -> Self {
        Self {
            disposer: Some(disposer),
            workspace,
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        self.disposer.as_ref().map(Disposer::paths).unwrap_or(&[])
    }

    pub fn finish(mut self, sink: &mut dyn DiagnosticSink) -> TeardownReport {
        match self.disposer.take() {
            Some(disposer) => disposer.tear_down(&self.workspace, sink),
            None => TeardownReport::default(),
        }
    }
}

impl Drop for DisposerGuard {
    fn drop(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            if !disposer.is_empty() {
                warn!("Execution ended abnormally; deleting {} externalized file(s).", disposer.len());
            }
            disposer.tear_down(&self.workspace, &mut LogSink);
        }
    }
}

/// The output of the wrapped body plus how its teardown went.
#[derive(Debug)]
pub struct WrappedRun<T> {
    pub output: T,
    pub teardown: TeardownReport,
}

/// Sets up `wrapper`, runs `body` with the rewritten environment, then tears
/// down on every path.
///
/// A setup failure tears down whatever was written and returns the setup
/// error without running `body`. A panic in `body` tears down before the panic
/// continues. The body's output is returned as-is; teardown problems only
/// show up in [`WrappedRun::teardown`].
pub fn run_wrapped<T, F>(
    wrapper: &Env2FileWrapper,
    env: &EnvVars,
    workspace: &Workspace,
    sink: &mut dyn DiagnosticSink,
    body: F,
) -> Result<WrappedRun<T>>
where
    F: FnOnce(&EnvVars, &mut dyn DiagnosticSink) -> T,
{
    let outcome = match wrapper.setup(env, workspace, &mut *sink) {
        Ok(outcome) => outcome,
        Err(SetupFailure { error, disposer }) => {
            disposer.tear_down(workspace, &mut *sink);
            return Err(error);
        }
    };

    let guard = DisposerGuard::new(outcome.disposer, workspace.clone());
    let effective = env.overlaid(&outcome.overrides);
    let output = body(&effective, &mut *sink);
    let teardown = guard.finish(sink);

    Ok(WrappedRun { output, teardown })
}

// envfilter-core/tests/env2file_tests.rs
//! Integration tests for the externalize-to-file wrapper: setup, the wrapped
//! execution, and teardown on every exit path.

use anyhow::Result;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};
use test_log::test;

use envfilter_core::{
    run_wrapped, BufferedSink, DiagnosticSink, Disposer, EnvFilterError, EnvVars, Env2FileWrapper, Workspace,
};

/// A workspace `<tmp>/p` whose scoped temp dir is `<tmp>/p@tmp`.
fn workspace() -> (TempDir, Workspace, PathBuf) {
    let root = tempdir().expect("Failed to create temporary directory");
    let ws_dir = root.path().join("p");
    fs::create_dir_all(&ws_dir).expect("Failed to create workspace");
    let tmp = root.path().join("p@tmp");
    (root, Workspace::new(ws_dir), tmp)
}

fn dir_is_empty(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

#[test]
fn value_round_trips_through_file_and_is_cleaned_up() -> Result<()> {
    let (_root, ws, tmp) = workspace();
    let env: EnvVars = [("VAL", "the value")].into_iter().collect();
    let wrapper = Env2FileWrapper::new(["VAL"]);
    let mut sink = BufferedSink::new();

    let outcome = wrapper.setup(&env, &ws, &mut sink)?;

    let path = PathBuf::from(outcome.overrides.get("VAL").expect("VAL override"));
    assert!(path.is_absolute());
    assert_eq!(path.file_name().unwrap(), "VAL.txt");
    assert!(path.to_string_lossy().contains("p@tmp"));
    assert_eq!(fs::read_to_string(&path)?, "the value");
    assert_eq!(outcome.disposer.paths(), [path.clone()]);
    assert_eq!(sink.lines(), [format!("Wrote VAL to {}", path.display())]);

    let report = outcome.disposer.tear_down(&ws, &mut sink);

    assert!(report.is_clean());
    assert!(!path.exists());
    assert!(dir_is_empty(&tmp));
    Ok(())
}

#[test]
fn missing_variable_writes_nothing() -> Result<()> {
    let (_root, ws, tmp) = workspace();
    let env = EnvVars::new();
    let wrapper = Env2FileWrapper::new(["MISSING"]);
    let mut sink = BufferedSink::new();

    let outcome = wrapper.setup(&env, &ws, &mut sink)?;

    assert!(outcome.overrides.is_empty());
    assert!(outcome.disposer.is_empty());
    assert!(!tmp.exists());

    let report = outcome.disposer.tear_down(&ws, &mut sink);
    assert!(report.deleted.is_empty() && report.failures.is_empty());
    assert!(sink.lines().is_empty());
    Ok(())
}

#[test]
fn variables_are_written_in_configured_order_and_existing_files_overwritten() -> Result<()> {
    let (_root, ws, tmp) = workspace();
    fs::create_dir_all(&tmp)?;
    fs::write(tmp.join("B.txt"), "stale")?;
    let env: EnvVars = [("A", "alpha"), ("B", "beta")].into_iter().collect();
    let wrapper = Env2FileWrapper::new(["B", "NOPE", "A"]);
    let mut sink = BufferedSink::new();

    let outcome = wrapper.setup(&env, &ws, &mut sink)?;

    let names: Vec<String> = outcome
        .disposer
        .paths()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["B.txt", "A.txt"]);
    assert_eq!(fs::read_to_string(tmp.join("B.txt"))?, "beta");
    assert!(!outcome.overrides.contains_key("NOPE"));

    outcome.disposer.tear_down(&ws, &mut sink);
    assert!(dir_is_empty(&tmp));
    Ok(())
}

#[test]
fn no_workspace_is_fatal_only_when_something_must_be_written() {
    let env: EnvVars = [("VAL", "v")].into_iter().collect();
    let mut sink = BufferedSink::new();

    let failure = Env2FileWrapper::new(["VAL"])
        .setup(&env, &Workspace::none(), &mut sink)
        .unwrap_err();
    assert!(matches!(failure.error, EnvFilterError::FatalSetup(ref m) if m == "no workspace"));
    assert!(failure.disposer.is_empty());

    let outcome = Env2FileWrapper::new(["UNSET"])
        .setup(&env, &Workspace::none(), &mut sink)
        .expect("nothing to write, so no workspace is needed");
    assert!(outcome.disposer.is_empty());
}

#[test]
fn unusable_scoped_directory_is_a_fatal_setup_error() -> Result<()> {
    let (_root, ws, tmp) = workspace();
    fs::write(&tmp, "not a directory")?;
    let env: EnvVars = [("VAL", "v")].into_iter().collect();
    let mut sink = BufferedSink::new();

    let failure = Env2FileWrapper::new(["VAL"]).setup(&env, &ws, &mut sink).unwrap_err();

    assert!(
        matches!(failure.error, EnvFilterError::FatalSetup(ref m) if m.starts_with("no workspace: ")),
        "unexpected error: {:?}",
        failure.error
    );
    assert!(failure.disposer.is_empty());
    assert!(sink.lines().is_empty());
    Ok(())
}

#[test]
fn disposer_survives_a_process_boundary_as_json() -> Result<()> {
    let (root, ws, tmp) = workspace();
    let env: EnvVars = [("VAL", "v")].into_iter().collect();
    let mut sink = BufferedSink::new();

    let outcome = Env2FileWrapper::new(["VAL"]).setup(&env, &ws, &mut sink)?;
    let saved = root.path().join("disposer.json");
    outcome.disposer.save(&saved)?;

    let restored = Disposer::load(&saved)?;
    assert_eq!(restored, outcome.disposer);
    restored.tear_down(&ws, &mut sink);

    assert!(dir_is_empty(&tmp));
    Ok(())
}

#[test]
fn run_wrapped_exposes_files_during_body_and_returns_its_verdict() -> Result<()> {
    let (_root, ws, tmp) = workspace();
    let env: EnvVars = [("VAL", "the value"), ("KEEP", "k")].into_iter().collect();
    let wrapper = Env2FileWrapper::new(["VAL"]);
    let mut sink = BufferedSink::new();

    let run = run_wrapped(&wrapper, &env, &ws, &mut sink, |effective, sink| {
        let path = effective.get("VAL").unwrap_or_default().to_string();
        let content = fs::read_to_string(&path).unwrap_or_default();
        sink.println(&format!("loaded {} from {}", content, path));
        assert_eq!(effective.get("KEEP"), Some("k"));
        Err::<(), String>("body failed".to_string())
    })?;

    assert_eq!(run.output, Err("body failed".to_string()));
    assert!(run.teardown.is_clean());
    assert!(sink.contains("loaded the value from "));
    assert!(sink.contains("VAL.txt"));
    assert!(dir_is_empty(&tmp));
    Ok(())
}

#[test]
fn run_wrapped_tears_down_when_body_panics() {
    let (_root, ws, tmp) = workspace();
    let env: EnvVars = [("VAL", "v")].into_iter().collect();
    let wrapper = Env2FileWrapper::new(["VAL"]);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut sink = BufferedSink::new();
        run_wrapped(&wrapper, &env, &ws, &mut sink, |_, _| -> () {
            panic!("interrupted");
        })
    }));

    assert!(result.is_err());
    assert!(tmp.exists());
    assert!(dir_is_empty(&tmp));
}

#[test]
fn run_wrapped_skips_body_when_setup_fails() {
    let env: EnvVars = [("VAL", "v")].into_iter().collect();
    let mut sink = BufferedSink::new();
    let mut ran = false;

    let err = run_wrapped(&Env2FileWrapper::new(["VAL"]), &env, &Workspace::none(), &mut sink, |_, _| {
        ran = true;
    })
    .unwrap_err();

    assert_eq!(err.to_string(), "no workspace");
    assert!(!ran);
}

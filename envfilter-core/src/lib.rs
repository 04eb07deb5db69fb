// envfilter-core/src/lib.rs
//! # envfilter Core Library
//!
//! `envfilter-core` prepares the environment of a unit of work (a build step,
//! a shell command) before it runs, and cleans up after it. It provides:
//!
//! * rule-based filtering of variable values with a remediation action
//!   (remove, redact, or fail);
//! * unconditional injection of a fixed variable;
//! * externalization of selected variables to files, with an explicit cleanup
//!   obligation that is honoured on every exit path.
//!
//! The library does not run builds. A host hands it an environment snapshot and
//! a diagnostic sink, and owns the decision of when teardown runs (or delegates
//! it to [`run_wrapped`]).
//!
//! ## Modules
//!
//! * `env_vars`: The ordered environment map passed through the rule chain.
//! * `diagnostics`: Sinks for the human-readable lines rules emit.
//! * `context`: Run, subject and channel identities used for gating.
//! * `matchers`: Run exclusion predicates and subject category matchers.
//! * `applicability`: The gate that decides whether a rule participates.
//! * `compiler`: Full-match pattern compilation and caching.
//! * `rules`: The `EnvironmentRule` trait, concrete rules and chain dispatch.
//! * `env2file`: The externalize-to-file wrapper and its disposer.
//! * `config`: YAML rule configuration, validation and merging.
//! * `errors`: The library error type.
//!
//! ## Usage Example
//!
//! ```rust
//! use envfilter_core::{
//!     apply_rules, ApplicabilityContext, BufferedSink, Channel, EnvVars, FilterConfig, Subject,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = FilterConfig::from_yaml_str(r#"
//! rules:
//!   - type: regex_value
//!     regex: "ghp_[A-Za-z0-9]+"
//!     action: redact
//!   - type: variable_contributing
//!     key: CI
//!     value: "true"
//! "#)?;
//!
//!     let mut env: EnvVars = [("GITHUB_TOKEN", "ghp_abc123")].into_iter().collect();
//!     let mut sink = BufferedSink::new();
//!     let subject = Subject::opaque("example");
//!     let channel = Channel::local();
//!
//!     apply_rules(&config.rules, &mut env, ApplicabilityContext::new(None, &subject, &channel), &mut sink)?;
//!
//!     assert_eq!(env.get("GITHUB_TOKEN"), Some("REDACTED"));
//!     assert_eq!(env.get("CI"), Some("true"));
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Rule and wrapper operations return [`EnvFilterError`]. Configuration file
//! loading returns `anyhow::Result` so that file and parse context is kept.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod applicability;
pub mod compiler;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod env2file;
pub mod env_vars;
pub mod errors;
pub mod matchers;
pub mod rules;

/// Re-exports the configuration types for loading and merging rule sets.
pub use config::{merge_configs, FilterConfig, MAX_PATTERN_LENGTH};

/// Re-exports the custom error type for clear error reporting.
pub use errors::{EnvFilterError, PROHIBITED_VALUE_REASON};

pub use applicability::Applicability;
pub use context::{ApplicabilityContext, Channel, RuleContext, RunIdentity, Subject};
pub use diagnostics::{BufferedSink, DiagnosticSink, LogSink, WriterSink};
pub use env_vars::EnvVars;
pub use matchers::{DescriptorMatcher, RunMatcher};

/// Re-exports the rule trait, the concrete rules and the chain dispatcher.
pub use rules::{
    apply_rules, EnvironmentRule, FilterAction, RegexValueFilter, Rule, VariableContributingFilter, REDACTED,
};

/// Re-exports the externalize-to-file wrapper and its lifecycle types.
pub use env2file::{
    run_wrapped, Disposer, DisposerGuard, Env2FileWrapper, SetupFailure, SetupOutcome, TeardownFailure,
    TeardownReport, Workspace, WrappedRun,
};

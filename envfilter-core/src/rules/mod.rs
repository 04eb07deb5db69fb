// envfilter-core/src/rules/mod.rs
//! Environment rules and the host-side dispatch over a rule chain.
//!
//! The [`EnvironmentRule`] trait decouples the host from the concrete rule
//! kinds. Each rule is borrowed for the duration of one call and receives the
//! environment map by exclusive reference; it never keeps either around.
//!
//! To add a new rule kind, create a file in this directory, implement
//! `EnvironmentRule` for it and add a variant to [`Rule`].
//!
//! # License
//! MIT OR APACHE 2.0

use log::debug;
use serde::{Deserialize, Serialize};

use crate::context::{ApplicabilityContext, Channel, RuleContext, RunIdentity, Subject};
use crate::diagnostics::DiagnosticSink;
use crate::env_vars::EnvVars;
use crate::errors::Result;

pub mod regex_value;
pub mod variable_contributing;

pub use regex_value::{FilterAction, RegexValueFilter, REDACTED};
pub use variable_contributing::VariableContributingFilter;

/// A rule that takes part in preparing a build's environment.
pub trait EnvironmentRule {
    /// Whether the rule participates for this run, subject and channel.
    fn is_applicable(&self, run: Option<&RunIdentity>, subject: &Subject, channel: &Channel) -> bool;

    /// Mutates `env` in place, or fails the whole preparation pass.
    fn filter(&self, env: &mut EnvVars, ctx: &mut RuleContext<'_>) -> Result<()>;

    /// One-line description for listings.
    fn describe(&self) -> String;
}

/// The configured rule kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    RegexValue(RegexValueFilter),
    VariableContributing(VariableContributingFilter),
}

impl Rule {
    fn inner(&self) -> &dyn EnvironmentRule {
        match self {
            Rule::RegexValue(r) => r,
            Rule::VariableContributing(r) => r,
        }
    }
}

impl EnvironmentRule for Rule {
    fn is_applicable(&self, run: Option<&RunIdentity>, subject: &Subject, channel: &Channel) -> bool {
        self.inner().is_applicable(run, subject, channel)
    }

    fn filter(&self, env: &mut EnvVars, ctx: &mut RuleContext<'_>) -> Result<()> {
        self.inner().filter(env, ctx)
    }

    fn describe(&self) -> String {
        self.inner().describe()
    }
}

impl From<RegexValueFilter> for Rule {
    fn from(rule: RegexValueFilter) -> Self {
        Rule::RegexValue(rule)
    }
}

impl From<VariableContributingFilter> for Rule {
    fn from(rule: VariableContributingFilter) -> Self {
        Rule::VariableContributing(rule)
    }
}

/// Runs `rules` over `env` in order, skipping rules that are not applicable.
///
/// The first failing rule aborts the chain; mutations made by earlier rules
/// (and by earlier keys of the failing rule) are kept. Returns the number of
/// rules that were applied.
pub fn apply_rules<R: EnvironmentRule>(
    rules: &[R],
    env: &mut EnvVars,
    applicability: ApplicabilityContext<'_>,
    sink: &mut dyn DiagnosticSink,
) -> Result<usize> {
    let mut applied = 0;
    for rule in rules {
        if !rule.is_applicable(applicability.run, applicability.subject, applicability.channel) {
            debug!("Skipping inapplicable rule: {}", rule.describe());
            continue;
        }
        debug!("Applying rule: {}", rule.describe());
        rule.filter(env, &mut RuleContext::new(&mut *sink))?;
        applied += 1;
    }
    Ok(applied)
}

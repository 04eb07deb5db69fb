// envfilter-core/src/rules/regex_value.rs
//! A rule that inspects variable values against a full-match pattern and
//! remediates every matching variable with a [`FilterAction`].
//! License: MIT OR APACHE 2.0

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::applicability::Applicability;
use crate::compiler::get_or_compile;
use crate::context::{Channel, RuleContext, RunIdentity, Subject};
use crate::diagnostics::DiagnosticSink;
use crate::env_vars::EnvVars;
use crate::errors::{EnvFilterError, Result};
use crate::matchers::{DescriptorMatcher, RunMatcher};
use crate::rules::EnvironmentRule;

/// The literal value written by [`FilterAction::Redact`].
pub const REDACTED: &str = "REDACTED";

/// What to do with a variable whose value matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAction {
    Remove,
    Redact,
    Fail,
}

impl FilterAction {
    pub const ALL: [FilterAction; 3] = [FilterAction::Remove, FilterAction::Redact, FilterAction::Fail];

    /// Applies the action to `key` in the live map.
    ///
    /// Every action writes its diagnostic line before touching the map.
    pub fn filter(self, env: &mut EnvVars, key: &str, sink: &mut dyn DiagnosticSink) -> Result<()> {
        match self {
            FilterAction::Remove => {
                sink.println(&format!(
                    "Removing environment variable '{}' because its value matched a prohibited pattern",
                    key
                ));
                env.remove(key);
                Ok(())
            }
            FilterAction::Redact => {
                sink.println(&format!(
                    "Redacting value of environment variable '{}' because it matched a prohibited pattern",
                    key
                ));
                env.put(key, REDACTED);
                Ok(())
            }
            FilterAction::Fail => {
                sink.println(&format!(
                    "Failing because environment variable '{}' matched a prohibited pattern",
                    key
                ));
                Err(EnvFilterError::prohibited(key))
            }
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FilterAction::Remove => "Remove the variable",
            FilterAction::Redact => "Redact the value",
            FilterAction::Fail => "Fail the build",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegexValueFilter {
    /// Optional label used in listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    descriptor_matcher: Option<DescriptorMatcher>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    exclusions: Vec<RunMatcher>,
    action: FilterAction,
}

impl RegexValueFilter {
    pub fn new(
        regex: Option<String>,
        descriptor_matcher: Option<DescriptorMatcher>,
        action: FilterAction,
    ) -> Self {
        Self {
            name: None,
            regex,
            descriptor_matcher,
            exclusions: Vec::new(),
            action,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_exclusions(mut self, exclusions: Vec<RunMatcher>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// The configured pattern. An empty pattern counts as no pattern.
    pub fn regex(&self) -> Option<&str> {
        self.regex.as_deref().filter(|r| !r.is_empty())
    }

    pub fn descriptor_matcher(&self) -> Option<&DescriptorMatcher> {
        self.descriptor_matcher.as_ref()
    }

    pub fn exclusions(&self) -> &[RunMatcher] {
        &self.exclusions
    }

    pub fn action(&self) -> FilterAction {
        self.action
    }

    pub fn applicability(&self) -> Applicability<'_> {
        Applicability::new(self.descriptor_matcher.as_ref(), &self.exclusions)
    }

    /// Compiles the pattern and every exclusion so configuration errors
    /// surface before any environment is touched.
    pub fn validate(&self) -> Result<()> {
        if let Some(pattern) = self.regex() {
            get_or_compile(pattern)?;
        }
        for exclusion in &self.exclusions {
            exclusion.validate()?;
        }
        Ok(())
    }

    /// Keys whose value fully matches the pattern, collected in one pass.
    fn matching_keys(&self, env: &EnvVars, pattern: &str) -> Result<BTreeSet<String>> {
        let regex = get_or_compile(pattern)?;
        Ok(env
            .iter()
            .filter(|(_, value)| regex.is_match(value))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

impl EnvironmentRule for RegexValueFilter {
    fn is_applicable(&self, run: Option<&RunIdentity>, subject: &Subject, channel: &Channel) -> bool {
        self.applicability().is_applicable(run, subject, channel)
    }

    fn filter(&self, env: &mut EnvVars, ctx: &mut RuleContext<'_>) -> Result<()> {
        let Some(pattern) = self.regex() else {
            return Ok(());
        };

        let keys = self.matching_keys(env, pattern)?;
        debug!("Pattern {:?} matched {} variable(s).", pattern, keys.len());

        for key in &keys {
            self.action.filter(env, key, ctx.sink())?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let label = self.name.as_deref().unwrap_or("regex value filter");
        match self.regex() {
            Some(p) => format!("{}: /{}/ -> {}", label, p, self.action.display_name()),
            None => format!("{}: (no pattern)", label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::BufferedSink;

    fn env(pairs: &[(&str, &str)]) -> EnvVars {
        pairs.iter().copied().collect()
    }

    fn run_filter(filter: &RegexValueFilter, env: &mut EnvVars) -> (Result<()>, BufferedSink) {
        let mut sink = BufferedSink::new();
        let result = filter.filter(env, &mut RuleContext::new(&mut sink));
        (result, sink)
    }

    #[test]
    fn redact_replaces_whole_value() {
        let filter = RegexValueFilter::new(Some("hunter[0-9]+".into()), None, FilterAction::Redact);
        let mut vars = env(&[("PASSWORD", "hunter42"), ("USER", "alice")]);
        let (result, sink) = run_filter(&filter, &mut vars);
        result.unwrap();
        assert_eq!(vars.get("PASSWORD"), Some(REDACTED));
        assert_eq!(vars.get("USER"), Some("alice"));
        assert_eq!(sink.lines().len(), 1);
        assert!(sink.contains("'PASSWORD'"));
    }

    #[test]
    fn substring_match_is_not_a_match() {
        let filter = RegexValueFilter::new(Some("hunter".into()), None, FilterAction::Redact);
        let mut vars = env(&[("PASSWORD", "hunter42")]);
        let (result, sink) = run_filter(&filter, &mut vars);
        result.unwrap();
        assert_eq!(vars.get("PASSWORD"), Some("hunter42"));
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn remove_deletes_only_matching_keys() {
        let filter = RegexValueFilter::new(Some("ghp_[A-Za-z0-9]+".into()), None, FilterAction::Remove);
        let mut vars = env(&[("GH", "ghp_abc123"), ("GH2", "ghp_zzz"), ("HOME", "/home/me")]);
        let (result, _) = run_filter(&filter, &mut vars);
        result.unwrap();
        assert!(!vars.contains_key("GH"));
        assert!(!vars.contains_key("GH2"));
        assert_eq!(vars.get("HOME"), Some("/home/me"));
    }

    #[test]
    fn fail_names_key_and_leaves_value() {
        let filter = RegexValueFilter::new(Some("secret.*".into()), None, FilterAction::Fail);
        let mut vars = env(&[("TOKEN", "secret123")]);
        let (result, sink) = run_filter(&filter, &mut vars);
        let err = result.unwrap_err();
        assert_eq!(err.filtered_key(), Some("TOKEN"));
        assert!(err.to_string().contains("TOKEN"));
        assert!(err.to_string().contains("matched prohibited value"));
        assert_eq!(vars.get("TOKEN"), Some("secret123"));
        assert!(sink.contains("TOKEN"));
    }

    #[test]
    fn fail_stops_at_first_key_in_sorted_order() {
        let filter = RegexValueFilter::new(Some("x".into()), None, FilterAction::Fail);
        let mut vars = env(&[("B", "x"), ("A", "x")]);
        let (result, sink) = run_filter(&filter, &mut vars);
        assert_eq!(result.unwrap_err().filtered_key(), Some("A"));
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn missing_or_empty_pattern_is_a_no_op() {
        let original = env(&[("A", ""), ("B", "b")]);
        for regex in [None, Some(String::new())] {
            let filter = RegexValueFilter::new(regex, None, FilterAction::Remove);
            let mut vars = original.clone();
            let (result, sink) = run_filter(&filter, &mut vars);
            result.unwrap();
            assert_eq!(vars, original);
            assert!(sink.lines().is_empty());
        }
    }

    #[test]
    fn invalid_pattern_fails_before_mutation() {
        let filter = RegexValueFilter::new(Some("(".into()), None, FilterAction::Remove);
        let original = env(&[("A", "(")]);
        let mut vars = original.clone();
        let (result, _) = run_filter(&filter, &mut vars);
        assert!(result.unwrap_err().is_pattern_error());
        assert_eq!(vars, original);
        assert!(filter.validate().is_err());
    }

    #[test]
    fn yaml_shape_round_trips_through_serde() {
        let yaml = r#"
regex: "secret.*"
action: redact
descriptor_matcher:
  only: [shell]
exclusions:
  - job_name: "release/.*"
"#;
        let filter: RegexValueFilter = serde_yml::from_str(yaml).unwrap();
        assert_eq!(filter.regex(), Some("secret.*"));
        assert_eq!(filter.action(), FilterAction::Redact);
        assert_eq!(filter.exclusions().len(), 1);
        assert_eq!(
            filter.descriptor_matcher(),
            Some(&DescriptorMatcher::Only(vec!["shell".to_string()]))
        );
    }
}

// envfilter-core/src/rules/variable_contributing.rs
//! A rule that unconditionally contributes one variable.

use serde::{Deserialize, Serialize};

use crate::context::{Channel, RuleContext, RunIdentity, Subject};
use crate::env_vars::EnvVars;
use crate::errors::Result;
use crate::rules::EnvironmentRule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableContributingFilter {
    key: String,
    value: String,
}

impl VariableContributingFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl EnvironmentRule for VariableContributingFilter {
    fn is_applicable(&self, _run: Option<&RunIdentity>, _subject: &Subject, _channel: &Channel) -> bool {
        true
    }

    fn filter(&self, env: &mut EnvVars, ctx: &mut RuleContext<'_>) -> Result<()> {
        ctx.println(&format!("Setting environment variable '{}'", self.key));
        env.put(self.key.as_str(), self.value.as_str());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("set {}", self.key)
    }
}

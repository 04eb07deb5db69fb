// envfilter-core/src/matchers.rs
//! Predicates used by the applicability gate.
//!
//! * [`RunMatcher`] selects execution runs; a rule is excluded from a run when
//!   any of its run matchers matches.
//! * [`DescriptorMatcher`] selects subject categories (e.g. `shell`, `batch`).

use log::warn;
use serde::{Deserialize, Serialize};

use crate::compiler::get_or_compile;
use crate::context::RunIdentity;
use crate::errors::Result;

/// A predicate over an execution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMatcher {
    /// Full-match regex against the run's job name.
    JobName(String),
    /// Matches when the run carries a parameter with exactly this value.
    Parameter { name: String, value: String },
}

impl RunMatcher {
    pub fn test(&self, run: &RunIdentity) -> bool {
        match self {
            RunMatcher::JobName(pattern) => match get_or_compile(pattern) {
                Ok(re) => re.is_match(&run.job_name),
                Err(e) => {
                    // Validation rejects these up front; a bad matcher never excludes.
                    warn!("Ignoring job name matcher: {}", e);
                    false
                }
            },
            RunMatcher::Parameter { name, value } => run.parameter(name) == Some(value.as_str()),
        }
    }

    /// Checks that the matcher can be evaluated.
    pub fn validate(&self) -> Result<()> {
        if let RunMatcher::JobName(pattern) = self {
            get_or_compile(pattern)?;
        }
        Ok(())
    }
}

/// A predicate over a subject's category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorMatcher {
    /// Only these categories are applicable.
    Only(Vec<String>),
    /// Every category except these is applicable.
    Except(Vec<String>),
}

impl DescriptorMatcher {
    pub fn test(&self, category: &str) -> bool {
        match self {
            DescriptorMatcher::Only(ids) => ids.iter().any(|id| id == category),
            DescriptorMatcher::Except(ids) => !ids.iter().any(|id| id == category),
        }
    }
}

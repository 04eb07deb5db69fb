// envfilter-core/src/context.rs
//! Invocation context types.
//!
//! The host describes *who* is asking for an environment with three values:
//! the execution run (optional; absent during configuration validation), the
//! subject being evaluated (a build step, a shell launcher, ...) and the
//! execution channel. Rules only read these to decide whether they take part.
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::diagnostics::DiagnosticSink;

/// Identity of one execution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// Full name of the job, e.g. `folder/pipeline`.
    pub job_name: String,
    pub build_number: u64,
    /// Build parameters, available to exclusion predicates.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl RunIdentity {
    pub fn new(job_name: impl Into<String>, build_number: u64) -> Self {
        Self {
            job_name: job_name.into(),
            build_number,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.job_name, self.build_number)
    }
}

/// The object a rule is being evaluated for.
///
/// A subject with a `category` is describable and can be gated by a
/// descriptor matcher; one without is never gated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub category: Option<String>,
}

impl Subject {
    pub fn describable(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: Some(category.into()),
        }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.category {
            Some(c) => write!(f, "{} ({})", self.name, c),
            None => f.write_str(&self.name),
        }
    }
}

/// The launcher/agent channel the unit of work will execute on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn local() -> Self {
        Self::new("local")
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Bundles the three applicability inputs for dispatch over a rule chain.
#[derive(Debug, Clone, Copy)]
pub struct ApplicabilityContext<'a> {
    pub run: Option<&'a RunIdentity>,
    pub subject: &'a Subject,
    pub channel: &'a Channel,
}

impl<'a> ApplicabilityContext<'a> {
    pub fn new(run: Option<&'a RunIdentity>, subject: &'a Subject, channel: &'a Channel) -> Self {
        Self {
            run,
            subject,
            channel,
        }
    }
}

/// Per-call context handed to `EnvironmentRule::filter`.
pub struct RuleContext<'a> {
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> RuleContext<'a> {
    pub fn new(sink: &'a mut dyn DiagnosticSink) -> Self {
        Self { sink }
    }

    pub fn sink(&mut self) -> &mut dyn DiagnosticSink {
        &mut *self.sink
    }

    pub fn println(&mut self, line: &str) {
        self.sink.println(line);
    }
}

impl fmt::Debug for RuleContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleContext").finish_non_exhaustive()
    }
}

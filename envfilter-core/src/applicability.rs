// envfilter-core/src/applicability.rs
//! The applicability gate.
//!
//! Decides whether a rule participates in an invocation at all, independent of
//! the variable contents. Decision order:
//!
//! 1. A configured descriptor matcher that rejects the subject's category wins.
//! 2. Without a run identity (configuration validation, ad-hoc evaluation) the
//!    rule always applies.
//! 3. Otherwise the rule applies unless any exclusion matches the run.

use log::debug;

use crate::context::{Channel, RunIdentity, Subject};
use crate::matchers::{DescriptorMatcher, RunMatcher};

/// A borrowed view over a rule's gating configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Applicability<'a> {
    pub descriptor_matcher: Option<&'a DescriptorMatcher>,
    pub exclusions: &'a [RunMatcher],
}

impl<'a> Applicability<'a> {
    pub fn new(descriptor_matcher: Option<&'a DescriptorMatcher>, exclusions: &'a [RunMatcher]) -> Self {
        Self {
            descriptor_matcher,
            exclusions,
        }
    }

    pub fn is_applicable(&self, run: Option<&RunIdentity>, subject: &Subject, channel: &Channel) -> bool {
        if let (Some(matcher), Some(category)) = (self.descriptor_matcher, subject.category.as_deref()) {
            if !matcher.test(category) {
                debug!("{} is not one of the configured applicable descriptors", subject);
                return false;
            }
        }

        let Some(run) = run else {
            debug!("Run is absent for {} and {}, so always including it", channel, subject);
            return true;
        };

        if self.exclusions.iter().any(|m| m.test(run)) {
            debug!("{} is being excluded", run);
            return false;
        }

        debug!("No exclusions apply to {}", run);
        true
    }
}

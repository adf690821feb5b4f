//! Trigger-match evaluation.
//!
//! Decides whether a push satisfies a workflow's push rule. Pure: no I/O, no
//! logging. Callers that want to report an ignored branch filter read the
//! `branch_filter_ignored` flag of [`TriggerDecision::Matched`].

use crate::{BranchFilter, PathPattern, PushEvent, PushRule, SkipReason, TriggerConfig};

/// Verdict for one push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// The push satisfies the rule.
    Matched {
        /// `true` if the rule's branch filter had an unsupported shape and was
        /// passed through without being evaluated.
        branch_filter_ignored: bool,
    },
    /// The push does not satisfy the rule.
    Skip(SkipReason),
}

impl TriggerDecision {
    /// Returns `true` for [`TriggerDecision::Matched`].
    pub fn is_match(self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Returns `true` if `event` on `branch` should produce a build under `config`.
pub fn should_trigger(config: &TriggerConfig, branch: &str, event: &PushEvent) -> bool {
    evaluate(config, branch, event).is_match()
}

/// Evaluates `config` against a push to `branch`, reporting why it was skipped.
pub fn evaluate(config: &TriggerConfig, branch: &str, event: &PushEvent) -> TriggerDecision {
    let Some(rule) = config.push() else {
        return TriggerDecision::Skip(SkipReason::NoPushRule);
    };

    let branch_filter_ignored = match &rule.branches {
        BranchFilter::Any => false,
        BranchFilter::Exact(names) => {
            if !names.iter().any(|name| name == branch) {
                return TriggerDecision::Skip(SkipReason::BranchNotListed);
            }
            false
        }
        BranchFilter::Unsupported => true,
    };

    if !paths_match(rule, event) {
        return TriggerDecision::Skip(SkipReason::NoMatchingPath);
    }

    TriggerDecision::Matched {
        branch_filter_ignored,
    }
}

fn paths_match(rule: &PushRule, event: &PushEvent) -> bool {
    let Some(patterns) = &rule.paths else {
        return true;
    };
    // A pattern too large to compile can never match.
    let compiled: Vec<PathPattern> = patterns
        .iter()
        .filter_map(|p| PathPattern::new(p).ok())
        .collect();
    event
        .changed_files()
        .any(|file| compiled.iter().any(|pattern| pattern.matches(file)))
}

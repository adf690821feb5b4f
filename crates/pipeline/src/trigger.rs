//! Trigger configuration extracted from a workflow file.
//!
//! Workflow files are loosely typed: the `on:` key can be a string, a list of
//! event names, or a mapping from event name to filters, and every filter can
//! be malformed. Parsing is therefore done against [`serde_yaml::Value`] and is
//! total: any shape that is not understood degrades to "filter not
//! configured" instead of an error. Only YAML syntax errors fail.

use serde_yaml::Value;

/// Event name this system reacts to.
const PUSH_EVENT: &str = "push";

/// The push-trigger portion of a workflow's `on:` block.
///
/// Read-only once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerConfig {
    push: Option<PushRule>,
}

/// Filters attached to the `push` event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushRule {
    pub branches: BranchFilter,
    /// Path patterns; `None` when the workflow declares no path filter.
    pub paths: Option<Vec<String>>,
}

/// Shape of a push rule's `branches` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BranchFilter {
    /// No usable branch filter; every branch passes.
    #[default]
    Any,
    /// The branch must equal one of these names exactly.
    Exact(Vec<String>),
    /// A mapping-shaped filter (include/exclude globs). Not evaluated; every
    /// branch passes and the caller is told so.
    Unsupported,
}

impl TriggerConfig {
    /// Builds a configuration from an explicit push rule.
    pub fn with_push(rule: PushRule) -> Self {
        Self { push: Some(rule) }
    }

    /// Parses the trigger configuration out of a workflow file's YAML text.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if `text` is not syntactically valid YAML.
    pub fn from_workflow_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        let document: Value = serde_yaml::from_str(text)?;
        Ok(Self::from_workflow(&document))
    }

    /// Extracts the trigger configuration from an already parsed workflow.
    pub fn from_workflow(document: &Value) -> Self {
        let push = match document.get("on") {
            Some(Value::Mapping(events)) => events.get(PUSH_EVENT).map(PushRule::from_value),
            Some(Value::String(event)) if event == PUSH_EVENT => Some(PushRule::default()),
            Some(Value::Sequence(events))
                if events.iter().any(|e| e.as_str() == Some(PUSH_EVENT)) =>
            {
                Some(PushRule::default())
            }
            _ => None,
        };
        Self { push }
    }

    /// The push rule, if the workflow reacts to pushes at all.
    pub fn push(&self) -> Option<&PushRule> {
        self.push.as_ref()
    }
}

impl PushRule {
    fn from_value(value: &Value) -> Self {
        let Value::Mapping(filters) = value else {
            // `push:` with no body, or a scalar: no filters.
            return Self::default();
        };

        let branches = match filters.get("branches") {
            Some(Value::Sequence(items)) => BranchFilter::Exact(strings(items)),
            Some(Value::Mapping(_)) => BranchFilter::Unsupported,
            _ => BranchFilter::Any,
        };

        let paths = match filters.get("paths") {
            Some(Value::Sequence(items)) => Some(strings(items)),
            _ => None,
        };

        Self { branches, paths }
    }
}

fn strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect()
}

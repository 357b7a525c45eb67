//! Pause-point contexts and responses

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Actions a reviewer can take at a pause point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HilAction {
    /// Accept the phase output as-is
    Approve,

    /// Accept edited prompts or results in place of the phase output
    Edit,

    /// Re-run the current phase (post-execution pauses only)
    Retry,

    /// Advance without applying this phase's output
    Skip,

    /// End the run; terminal
    Abort,
}

impl HilAction {
    /// Parse an action from its surface form (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Some(Self::Approve),
            "edit" => Some(Self::Edit),
            "retry" => Some(Self::Retry),
            "skip" => Some(Self::Skip),
            "abort" => Some(Self::Abort),
            _ => None,
        }
    }

    /// The canonical surface form of this action
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Edit => "edit",
            Self::Retry => "retry",
            Self::Skip => "skip",
            Self::Abort => "abort",
        }
    }
}

impl fmt::Display for HilAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a reviewer sees at one pause point
///
/// Built fresh at each pause; never reused. `results` is an opaque,
/// phase-specific payload the presentation layer renders as it sees fit.
#[derive(Debug, Clone)]
pub struct HilContext {
    /// Pipeline phase this pause belongs to
    pub phase: String,

    /// Name of the agent whose work is under review
    pub agent: String,

    /// True when pausing before the phase has produced anything
    pub pre_execution: bool,

    /// System prompt the phase will use (or used)
    pub system_prompt: String,

    /// User prompt the phase will use (or used)
    pub user_prompt: String,

    /// Opaque phase-specific payload
    pub results: Value,

    /// Presentation hints and counters
    pub metadata: BTreeMap<String, String>,

    /// Actions the reviewer may legally choose here
    pub available_actions: BTreeSet<HilAction>,
}

impl HilContext {
    /// Context for a pause before the phase executes
    ///
    /// Pre-execution pauses never offer RETRY: there is nothing yet to
    /// retry.
    pub fn pre_execution(phase: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            agent: agent.into(),
            pre_execution: true,
            system_prompt: String::new(),
            user_prompt: String::new(),
            results: Value::Null,
            metadata: BTreeMap::new(),
            available_actions: [
                HilAction::Approve,
                HilAction::Edit,
                HilAction::Skip,
                HilAction::Abort,
            ]
            .into_iter()
            .collect(),
        }
    }

    /// Context for a pause over completed phase output
    ///
    /// All five actions are on the table.
    pub fn post_execution(phase: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            agent: agent.into(),
            pre_execution: false,
            system_prompt: String::new(),
            user_prompt: String::new(),
            results: Value::Null,
            metadata: BTreeMap::new(),
            available_actions: [
                HilAction::Approve,
                HilAction::Edit,
                HilAction::Retry,
                HilAction::Skip,
                HilAction::Abort,
            ]
            .into_iter()
            .collect(),
        }
    }

    /// Attach the prompts under review, builder-style
    pub fn with_prompts(
        mut self,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        self.system_prompt = system_prompt.into();
        self.user_prompt = user_prompt.into();
        self
    }

    /// Attach the phase output payload, builder-style
    pub fn with_results(mut self, results: Value) -> Self {
        self.results = results;
        self
    }

    /// Attach a metadata entry, builder-style
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether the given action is legal at this pause point
    pub fn allows(&self, action: HilAction) -> bool {
        self.available_actions.contains(&action)
    }
}

/// The reviewer's decision at one pause point
#[derive(Debug, Clone)]
pub struct HilResponse {
    /// The chosen action
    pub action: HilAction,

    /// Replacement system prompt (EDIT only)
    pub edited_system_prompt: Option<String>,

    /// Replacement user prompt (EDIT only)
    pub edited_user_prompt: Option<String>,

    /// Replacement phase output (EDIT only)
    pub edited_results: Option<Value>,

    /// Free-form note from the reviewer
    pub message: Option<String>,
}

impl HilResponse {
    /// A plain response with the given action and nothing else
    pub fn action(action: HilAction) -> Self {
        Self {
            action,
            edited_system_prompt: None,
            edited_user_prompt: None,
            edited_results: None,
            message: None,
        }
    }

    /// An APPROVE response
    pub fn approve() -> Self {
        Self::action(HilAction::Approve)
    }

    /// An ABORT response carrying an explanation
    pub fn abort(message: impl Into<String>) -> Self {
        let mut response = Self::action(HilAction::Abort);
        response.message = Some(message.into());
        response
    }

    /// An EDIT response replacing the phase output
    pub fn edit_results(results: Value) -> Self {
        let mut response = Self::action(HilAction::Edit);
        response.edited_results = Some(results);
        response
    }

    /// Attach a reviewer note, builder-style
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

//! Flow phase state machine — tracks which of the four screens is active.

use serde::{Deserialize, Serialize};

/// The phases of the lead-capture flow.
///
/// Exactly one phase is active at a time. The happy path runs
/// CompanyInput → ContextEdit → Loading → Done; a job that finishes before
/// any user context is needed jumps CompanyInput → Done directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    /// Step 1: work email, company name, company domain.
    CompanyInput,
    /// Step 2: edit the backend's pre-filled company context.
    ContextEdit,
    /// Step 3: waiting on the backend to finish the job.
    Loading,
    /// Step 4: job complete.
    Done,
}

impl FlowPhase {
    /// Check if a transition from `self` to `target` is part of the flow
    /// graph. The navigator never blocks on this — gating happens upstream
    /// in validation and the controller — so it is advisory only.
    pub fn can_transition_to(&self, target: FlowPhase) -> bool {
        use FlowPhase::*;
        matches!(
            (self, target),
            // Forward
            (CompanyInput, ContextEdit)
                | (CompanyInput, Done)
                | (ContextEdit, Loading)
                | (Loading, Done)
                // Back to the start
                | (ContextEdit, CompanyInput)
                | (Loading, CompanyInput)
        )
    }

    /// Whether this phase is terminal. Reaching `Done` is one-way: no
    /// further polling or submission happens for the flow instance.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl Default for FlowPhase {
    fn default() -> Self {
        Self::CompanyInput
    }
}

impl std::fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CompanyInput => "company_input",
            Self::ContextEdit => "context_edit",
            Self::Loading => "loading",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

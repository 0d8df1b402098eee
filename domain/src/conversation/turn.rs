//! Per-turn state machine
//!
//! Each inbound message runs one fresh pass through these states:
//!
//! ```text
//! Idle ─▶ Classifying ─┬─▶ Clarifying ───────────────────────────────┐
//!                      ├─▶ PreferenceGating ─┬─▶ Clarifying          │
//!                      │                     └─▶ Routing             │
//!                      ├─▶ Routing ─┬─▶ Executing ─▶ Formatting ─▶ Done
//!                      │            ├─▶ Clarifying (invalid args)    │
//!                      │            └─▶ Done (no action mapped)      │
//!                      └─▶ Done (canned intent) ◀────────────────────┘
//!
//! any non-terminal state ─▶ ErrorHandling ─▶ Done
//! ```

use serde::{Deserialize, Serialize};

/// States visited while processing one user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Idle,
    Classifying,
    Clarifying,
    PreferenceGating,
    Routing,
    Executing,
    Formatting,
    Done,
    ErrorHandling,
}

impl TurnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::Classifying => "classifying",
            TurnState::Clarifying => "clarifying",
            TurnState::PreferenceGating => "preference_gating",
            TurnState::Routing => "routing",
            TurnState::Executing => "executing",
            TurnState::Formatting => "formatting",
            TurnState::Done => "done",
            TurnState::ErrorHandling => "error_handling",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Done)
    }

    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition_to(&self, next: TurnState) -> bool {
        use TurnState::*;

        if next == ErrorHandling {
            return !matches!(self, Done | ErrorHandling);
        }
        matches!(
            (self, next),
            (Idle, Classifying)
                | (Classifying, Clarifying)
                | (Classifying, PreferenceGating)
                | (Classifying, Routing)
                | (Classifying, Done)
                | (PreferenceGating, Clarifying)
                | (PreferenceGating, Routing)
                | (Clarifying, Done)
                | (Routing, Clarifying)
                | (Routing, Executing)
                | (Routing, Done)
                | (Executing, Formatting)
                | (Formatting, Done)
                | (ErrorHandling, Done)
        )
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered record of the states one turn passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnTrace {
    states: Vec<TurnState>,
}

impl TurnTrace {
    pub fn new() -> Self {
        Self {
            states: vec![TurnState::Idle],
        }
    }

    pub fn current(&self) -> TurnState {
        self.states.last().copied().unwrap_or(TurnState::Idle)
    }

    /// Move to `next`. Returns false and leaves the trace unchanged when
    /// the transition is not allowed.
    pub fn advance(&mut self, next: TurnState) -> bool {
        if !self.current().can_transition_to(next) {
            return false;
        }
        self.states.push(next);
        true
    }

    pub fn states(&self) -> &[TurnState] {
        &self.states
    }

    pub fn visited(&self, state: TurnState) -> bool {
        self.states.contains(&state)
    }
}

impl Default for TurnTrace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TurnState::*;

    #[test]
    fn test_happy_path() {
        let mut trace = TurnTrace::new();
        for next in [Classifying, PreferenceGating, Routing, Executing, Formatting, Done] {
            assert!(trace.advance(next), "rejected {}", next);
        }
        assert!(trace.current().is_terminal());
        assert_eq!(trace.states().len(), 7);
    }

    #[test]
    fn test_clarifying_cannot_execute() {
        assert!(!Clarifying.can_transition_to(Routing));
        assert!(!Clarifying.can_transition_to(Executing));
        assert!(Clarifying.can_transition_to(Done));
    }

    #[test]
    fn test_error_handling_reachable_from_non_terminal() {
        for state in [Idle, Classifying, PreferenceGating, Routing, Executing, Formatting, Clarifying] {
            assert!(state.can_transition_to(ErrorHandling));
        }
        assert!(!Done.can_transition_to(ErrorHandling));
        assert!(ErrorHandling.can_transition_to(Done));
    }

    #[test]
    fn test_rejected_transition_leaves_trace() {
        let mut trace = TurnTrace::new();
        assert!(!trace.advance(Executing));
        assert_eq!(trace.current(), Idle);
        assert!(!trace.visited(Executing));
    }
}

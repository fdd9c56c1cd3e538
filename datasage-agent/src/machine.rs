//! Transition decisions for the retry state machine.
//!
//! The machine has five states: Generate, Validate, Execute, and the two
//! terminal Done states. Generation always flows into validation; these
//! functions decide the two conditional edges. The iteration counter
//! ticks on entry to Generate (see `AgentState::enter_generation`) and
//! the cap is the only bound on total work.

use datasage_core::{AgentState, MAX_ITERATIONS};

/// Where the machine goes after the Validate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterValidation {
    /// Verdict was valid: execute the candidate.
    Execute,
    /// Rejected with attempts remaining: regenerate with feedback.
    Retry,
    /// Rejected at the cap: terminal failure, return the last attempt.
    GiveUp,
}

/// Where the machine goes after a failed Execute state. (A successful
/// execution is terminal success and never consults this.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterExecution {
    /// Runtime error with attempts remaining: regenerate with feedback.
    Retry,
    /// Runtime error at the cap: terminal failure.
    GiveUp,
}

pub fn after_validation(state: &AgentState) -> AfterValidation {
    if state.is_valid() {
        AfterValidation::Execute
    } else if state.iterations >= MAX_ITERATIONS {
        AfterValidation::GiveUp
    } else {
        AfterValidation::Retry
    }
}

pub fn after_execution(state: &AgentState) -> AfterExecution {
    if state.iterations >= MAX_ITERATIONS {
        AfterExecution::GiveUp
    } else {
        AfterExecution::Retry
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(iterations: u32, valid: Option<bool>) -> AgentState {
        let mut state = AgentState::new("q", "schema", vec![]);
        for _ in 0..iterations {
            state = state.enter_generation();
        }
        match valid {
            Some(true) => state.accepted("ok"),
            Some(false) => state.rejected("no"),
            None => state,
        }
    }

    #[test]
    fn test_valid_always_proceeds_to_execute() {
        for iterations in 1..=MAX_ITERATIONS {
            let state = state_at(iterations, Some(true));
            assert_eq!(after_validation(&state), AfterValidation::Execute);
        }
    }

    #[test]
    fn test_invalid_below_cap_retries() {
        assert_eq!(
            after_validation(&state_at(1, Some(false))),
            AfterValidation::Retry
        );
        assert_eq!(
            after_validation(&state_at(2, Some(false))),
            AfterValidation::Retry
        );
    }

    #[test]
    fn test_invalid_at_cap_gives_up() {
        assert_eq!(
            after_validation(&state_at(MAX_ITERATIONS, Some(false))),
            AfterValidation::GiveUp
        );
    }

    #[test]
    fn test_execution_failure_below_cap_retries() {
        let state = state_at(1, Some(true)).execution_failed("Runtime Error: boom");
        assert_eq!(after_execution(&state), AfterExecution::Retry);
    }

    #[test]
    fn test_execution_failure_at_cap_gives_up() {
        let state = state_at(MAX_ITERATIONS, Some(true)).execution_failed("Runtime Error: boom");
        assert_eq!(after_execution(&state), AfterExecution::GiveUp);
    }
}

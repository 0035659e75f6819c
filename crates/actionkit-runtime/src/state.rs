//! Execution state machine of a single `execute_action` call

use actionkit_core::ErrorCode;
use std::fmt;

/// Pipeline phase in which a call can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lookup,
    Validate,
    Authorize,
    Execute,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Lookup => "lookup",
            Phase::Validate => "validate",
            Phase::Authorize => "authorize",
            Phase::Execute => "execute",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Started → Validated → Authorized → Executed → Completed`, or `Failed`
/// from any non-terminal state. Notification dispatch happens after
/// `Completed` and is not a state of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    Started,
    Validated,
    Authorized,
    Executed,
    Completed,
    Failed { phase: Phase, code: ErrorCode },
}

impl ExecutionState {
    pub fn name(&self) -> &'static str {
        match self {
            ExecutionState::Started => "started",
            ExecutionState::Validated => "validated",
            ExecutionState::Authorized => "authorized",
            ExecutionState::Executed => "executed",
            ExecutionState::Completed => "completed",
            ExecutionState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionState::Completed | ExecutionState::Failed { .. })
    }

    pub fn can_transition_to(&self, next: &ExecutionState) -> bool {
        use ExecutionState::*;
        match (self, next) {
            (Started, Validated) | (Validated, Authorized) | (Authorized, Executed) | (Executed, Completed) => true,
            (from, Failed { .. }) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionState::Failed { phase, code } => write!(f, "failed({}, {})", phase, code),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            ExecutionState::Started,
            ExecutionState::Validated,
            ExecutionState::Authorized,
            ExecutionState::Executed,
            ExecutionState::Completed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(&pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(!ExecutionState::Started.can_transition_to(&ExecutionState::Executed));
        assert!(!ExecutionState::Completed.can_transition_to(&ExecutionState::Started));
    }

    #[test]
    fn test_failure_from_any_open_state() {
        let failed = ExecutionState::Failed { phase: Phase::Authorize, code: ErrorCode::Unauthorized };
        assert!(ExecutionState::Started.can_transition_to(&failed));
        assert!(ExecutionState::Executed.can_transition_to(&failed));
        assert!(!ExecutionState::Completed.can_transition_to(&failed));
        assert!(!failed.can_transition_to(&failed));
        assert_eq!(failed.to_string(), "failed(authorize, UNAUTHORIZED)");
    }
}

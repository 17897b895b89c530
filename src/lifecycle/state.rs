//! Lifecycle state machine.

use serde::Serialize;

/// Where the manager is in its start/stop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No recording and nothing in flight.
    #[default]
    Idle,
    /// Obtaining a session key.
    Authenticating,
    /// The client is running and logging.
    Recording,
    /// A graceful stop has been requested.
    Stopping,
}

impl LifecycleState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Idle -> Authenticating
    /// - Authenticating -> Recording
    /// - Authenticating -> Idle
    /// - Recording -> Stopping
    /// - Recording -> Idle
    /// - Stopping -> Idle
    pub fn can_transition_to(&self, target: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (*self, target),
            (Idle, Authenticating)
                | (Authenticating, Recording)
                | (Authenticating, Idle)
                | (Recording, Stopping)
                | (Recording, Idle)
                | (Stopping, Idle)
        )
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `Ok(())` if the transition is valid, or an error otherwise.
    pub fn transition_to(&mut self, target: LifecycleState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::ScribeError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// A recording session exists (running or winding down).
    pub fn is_active(&self) -> bool {
        matches!(self, LifecycleState::Recording | LifecycleState::Stopping)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, LifecycleState::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Authenticating => "authenticating",
            LifecycleState::Recording => "recording",
            LifecycleState::Stopping => "stopping",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let mut state = LifecycleState::Idle;
        assert!(state.transition_to(LifecycleState::Authenticating).is_ok());
        assert!(state.transition_to(LifecycleState::Recording).is_ok());
        assert!(state.transition_to(LifecycleState::Stopping).is_ok());
        assert!(state.transition_to(LifecycleState::Idle).is_ok());
        assert_eq!(state, LifecycleState::Idle);
    }

    #[test]
    fn test_auth_failure_returns_to_idle() {
        let mut state = LifecycleState::Authenticating;
        assert!(state.transition_to(LifecycleState::Idle).is_ok());
    }

    #[test]
    fn test_invalid_idle_to_stopping() {
        let mut state = LifecycleState::Idle;
        assert!(state.transition_to(LifecycleState::Stopping).is_err());
        // State should remain unchanged
        assert_eq!(state, LifecycleState::Idle);
    }

    #[test]
    fn test_invalid_skip_authentication() {
        let mut state = LifecycleState::Idle;
        assert!(state.transition_to(LifecycleState::Recording).is_err());
        let mut state = LifecycleState::Stopping;
        assert!(state.transition_to(LifecycleState::Recording).is_err());
    }

    #[test]
    fn test_is_active() {
        assert!(!LifecycleState::Idle.is_active());
        assert!(!LifecycleState::Authenticating.is_active());
        assert!(LifecycleState::Recording.is_active());
        assert!(LifecycleState::Stopping.is_active());
    }

    #[test]
    fn test_default() {
        assert_eq!(LifecycleState::default(), LifecycleState::Idle);
        assert!(LifecycleState::default().is_idle());
    }
}

//! Error types for troupe-scribe.

use thiserror::Error;

use crate::auth::AuthError;
use crate::lifecycle::LifecycleState;

/// Main error type for troupe-scribe operations.
#[derive(Error, Debug)]
pub enum ScribeError {
    /// Login against the EAccess service failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The tmux driver reported a failure.
    #[error("multiplexer error: {0}")]
    Multiplexer(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid lifecycle transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    /// Recording was torn down before the scripted sign-off.
    #[error("recording session was killed")]
    Killed,

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    TaskJoin(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<tokio::task::JoinError> for ScribeError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskJoin(e.to_string())
    }
}

impl From<crate::config::ConfigError> for ScribeError {
    fn from(e: crate::config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

/// Convenience Result type for troupe-scribe operations.
pub type Result<T> = std::result::Result<T, ScribeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthStage;

    #[test]
    fn test_auth_error_is_transparent() {
        let err: ScribeError = AuthError::CharacterNotFound("Ragge".into()).into();
        assert!(matches!(err, ScribeError::Auth(_)));
        assert!(err.to_string().contains("Ragge"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ScribeError = io_err.into();
        assert!(matches!(err, ScribeError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_transition_display() {
        let err = ScribeError::InvalidStateTransition {
            from: LifecycleState::Idle,
            to: LifecycleState::Stopping,
        };
        assert!(err.to_string().contains("Idle"));
        assert!(err.to_string().contains("Stopping"));
    }

    #[test]
    fn test_stage_in_message() {
        let err: ScribeError = AuthError::ProtocolParse {
            stage: AuthStage::Login,
            detail: "no KEY field".into(),
        }
        .into();
        assert!(err.to_string().contains("login"));
    }
}

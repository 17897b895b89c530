//! Login failure taxonomy.

use std::fmt;

use thiserror::Error;

/// The exchange of the EAccess handshake that was in flight when a failure
/// occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    Connect,
    Challenge,
    Login,
    GameSelect,
    CharacterList,
    CharacterSelect,
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthStage::Connect => "connect",
            AuthStage::Challenge => "challenge",
            AuthStage::Login => "login",
            AuthStage::GameSelect => "game-select",
            AuthStage::CharacterList => "character-list",
            AuthStage::CharacterSelect => "character-select",
        };
        f.write_str(name)
    }
}

/// Errors raised while obtaining a session key.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Connection failure, read timeout or premature end of stream.
    #[error("transport error during {stage}: {source}")]
    Transport {
        stage: AuthStage,
        #[source]
        source: std::io::Error,
    },

    /// The server answered with something we could not understand.
    #[error("malformed response during {stage}: {detail}")]
    ProtocolParse { stage: AuthStage, detail: String },

    /// The account has no character with the requested name.
    #[error("character not found: {0}")]
    CharacterNotFound(String),

    /// A credential contains bytes the ASCII wire protocol cannot carry.
    #[error("credential field '{0}' must be ASCII")]
    NonAscii(&'static str),
}

impl AuthError {
    pub(crate) fn transport(stage: AuthStage, source: std::io::Error) -> Self {
        Self::Transport { stage, source }
    }

    pub(crate) fn parse(stage: AuthStage, detail: impl Into<String>) -> Self {
        Self::ProtocolParse {
            stage,
            detail: detail.into(),
        }
    }

    /// Whether another attempt might succeed.
    ///
    /// Only transport failures are transient; parse failures and unknown
    /// characters are deterministic.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Transport { .. })
    }

    /// Stage at which the failure occurred, if it is tied to one.
    pub fn stage(&self) -> Option<AuthStage> {
        match self {
            AuthError::Transport { stage, .. } | AuthError::ProtocolParse { stage, .. } => {
                Some(*stage)
            }
            AuthError::CharacterNotFound(_) => Some(AuthStage::CharacterList),
            AuthError::NonAscii(_) => None,
        }
    }
}

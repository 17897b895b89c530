//! Account credentials and the session key they are exchanged for.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::AuthError;

/// Login details for one account and the character to play.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub character: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        character: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            character: character.into(),
        }
    }

    /// Check that every field can travel over the ASCII protocol.
    pub fn validate(&self) -> Result<(), AuthError> {
        for (field, value) in [
            ("username", &self.username),
            ("password", &self.password),
            ("character", &self.character),
        ] {
            if !value.is_ascii() {
                return Err(AuthError::NonAscii(field));
            }
        }
        Ok(())
    }

    /// True when all three fields are filled in.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty() && !self.character.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("character", &self.character)
            .finish()
    }
}

/// One-shot key handed out by the login server for opening a game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

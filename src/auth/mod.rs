//! EAccess challenge-response login.
//!
//! This module turns account credentials into a one-shot session key:
//! - password obfuscation against the server's challenge key
//! - line framing with bounded reads
//! - character lookup in the account's character list
//!
//! # Example
//!
//! ```no_run
//! use troupe_scribe::auth::{Authenticator, Credentials, EAccessClient};
//!
//! let client = EAccessClient::default();
//! let creds = Credentials::new("account", "secret", "Ragge");
//! let key = client.authenticate(&creds).unwrap();
//! println!("session key: {}", key);
//! ```

mod cipher;
mod credentials;
mod eaccess;
mod error;

pub use cipher::obfuscate_password;
pub use credentials::{Credentials, SessionKey};
pub use eaccess::{
    find_character, handshake, parse_character_list, parse_session_key, Authenticator,
    EAccessClient, DEFAULT_GAME_CODE, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_READ_TIMEOUT,
};
pub use error::{AuthError, AuthStage};

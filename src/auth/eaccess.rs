//! EAccess login client.
//!
//! The exchange is a fixed sequence of tab-separated, newline-terminated
//! lines. Every request gets exactly one response line:
//!
//! | request                 | response                         |
//! |-------------------------|----------------------------------|
//! | `K`                     | challenge key                    |
//! | `A\tuser\tobfuscated`   | `...KEY\t<hex>\t...`             |
//! | `G\t<game>`             | game info (ignored)              |
//! | `C`                     | character list                   |
//! | `L\t<token>\tPLAY`      | launch info (ignored)            |

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info};

use super::cipher::obfuscate_password;
use super::{AuthError, AuthStage, Credentials, SessionKey};

/// Default login host.
pub const DEFAULT_HOST: &str = "access.simutronics.com";

/// Default login port.
pub const DEFAULT_PORT: u16 = 7900;

/// Default game code sent in the game-select line.
pub const DEFAULT_GAME_CODE: &str = "DR";

/// Default bound on every read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Index of the first `(token, name)` pair in the character list response.
const CHARACTER_LIST_OFFSET: usize = 5;

/// Exchanges credentials for a session key.
///
/// Implementations block; callers run them on the blocking pool.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, credentials: &Credentials) -> Result<SessionKey, AuthError>;
}

/// Authenticator that talks to a live EAccess server over TCP.
#[derive(Debug, Clone)]
pub struct EAccessClient {
    host: String,
    port: u16,
    game_code: String,
    read_timeout: Duration,
}

impl EAccessClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            game_code: DEFAULT_GAME_CODE.to_string(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_game_code(mut self, game_code: impl Into<String>) -> Self {
        self.game_code = game_code.into();
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    fn connect(&self) -> Result<TcpStream, AuthError> {
        let transport = |e| AuthError::transport(AuthStage::Connect, e);

        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(transport)?;

        let mut last_err = std::io::Error::new(
            ErrorKind::AddrNotAvailable,
            format!("no address resolved for {}", self.host),
        );
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.read_timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.read_timeout))
                        .map_err(transport)?;
                    stream
                        .set_write_timeout(Some(self.read_timeout))
                        .map_err(transport)?;
                    return Ok(stream);
                }
                Err(e) => last_err = e,
            }
        }
        Err(transport(last_err))
    }
}

impl Default for EAccessClient {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl Authenticator for EAccessClient {
    fn authenticate(&self, credentials: &Credentials) -> Result<SessionKey, AuthError> {
        info!(host = %self.host, port = self.port, "Authenticating with EAccess");
        credentials.validate()?;
        let stream = self.connect()?;
        let key = handshake(stream, credentials, &self.game_code)?;
        info!("Authentication complete");
        Ok(key)
    }
}

/// Run the full login exchange over an already connected stream.
///
/// Read timeouts must be configured on the stream by the caller; a timed out
/// read surfaces as [`AuthError::Transport`].
pub fn handshake<S: Read + Write>(
    stream: S,
    credentials: &Credentials,
    game_code: &str,
) -> Result<SessionKey, AuthError> {
    credentials.validate()?;
    let mut conn = LineConn::new(stream);

    conn.send(AuthStage::Challenge, b"K\n")?;
    let challenge = conn.read_line(AuthStage::Challenge)?;
    let password = obfuscate_password(&challenge, credentials.password.as_bytes())
        .ok_or_else(|| {
            AuthError::parse(
                AuthStage::Challenge,
                format!(
                    "challenge key has {} bytes, password needs {}",
                    challenge.len(),
                    credentials.password.len()
                ),
            )
        })?;

    let mut login = Vec::with_capacity(password.len() + credentials.username.len() + 4);
    login.extend_from_slice(b"A\t");
    login.extend_from_slice(credentials.username.as_bytes());
    login.push(b'\t');
    login.extend_from_slice(&password);
    login.push(b'\n');
    conn.send(AuthStage::Login, &login)?;
    let response = conn.read_line(AuthStage::Login)?;
    let key = parse_session_key(&response)?;
    debug!("Session key received");

    conn.send(AuthStage::GameSelect, format!("G\t{game_code}\n").as_bytes())?;
    conn.read_line(AuthStage::GameSelect)?;

    conn.send(AuthStage::CharacterList, b"C\n")?;
    let listing = conn.read_line(AuthStage::CharacterList)?;
    let characters = parse_character_list(&listing);
    let token = find_character(&characters, &credentials.character)
        .ok_or_else(|| AuthError::CharacterNotFound(credentials.character.clone()))?;
    debug!(token, "Character matched");

    conn.send(
        AuthStage::CharacterSelect,
        format!("L\t{token}\tPLAY\n").as_bytes(),
    )?;
    conn.read_line(AuthStage::CharacterSelect)?;

    Ok(key)
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^.+?KEY\t([a-fA-F0-9]+)\t.*$").expect("session key regex is valid")
    })
}

/// Extract the session key from the login response line.
pub fn parse_session_key(line: &[u8]) -> Result<SessionKey, AuthError> {
    let text = std::str::from_utf8(line)
        .map_err(|_| AuthError::parse(AuthStage::Login, "response is not ASCII"))?;
    key_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| SessionKey::new(m.as_str()))
        .ok_or_else(|| AuthError::parse(AuthStage::Login, format!("no KEY field in {text:?}")))
}

/// Split the character list response into ordered `(token, name)` pairs.
///
/// A trailing unpaired field is ignored.
pub fn parse_character_list(line: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(line);
    let fields: Vec<&str> = text.split('\t').collect();
    fields
        .get(CHARACTER_LIST_OFFSET..)
        .unwrap_or_default()
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect()
}

/// Token of the first character whose name matches, ignoring ASCII case.
pub fn find_character<'a>(characters: &'a [(String, String)], name: &str) -> Option<&'a str> {
    characters
        .iter()
        .find(|(_, candidate)| candidate.eq_ignore_ascii_case(name))
        .map(|(token, _)| token.as_str())
}

/// Line framing over a byte stream.
struct LineConn<S> {
    inner: BufReader<S>,
}

impl<S: Read + Write> LineConn<S> {
    fn new(stream: S) -> Self {
        Self {
            inner: BufReader::new(stream),
        }
    }

    fn send(&mut self, stage: AuthStage, line: &[u8]) -> Result<(), AuthError> {
        let stream = self.inner.get_mut();
        stream
            .write_all(line)
            .and_then(|()| stream.flush())
            .map_err(|e| AuthError::transport(stage, e))
    }

    /// Read through the next newline and strip surrounding whitespace.
    fn read_line(&mut self, stage: AuthStage) -> Result<Vec<u8>, AuthError> {
        let mut buf = Vec::new();
        let n = self
            .inner
            .read_until(b'\n', &mut buf)
            .map_err(|e| match e.kind() {
                ErrorKind::WouldBlock | ErrorKind::TimedOut => AuthError::transport(
                    stage,
                    std::io::Error::new(ErrorKind::TimedOut, "read timed out"),
                ),
                _ => AuthError::transport(stage, e),
            })?;
        if n == 0 {
            return Err(AuthError::transport(
                stage,
                std::io::Error::new(ErrorKind::UnexpectedEof, "connection closed by server"),
            ));
        }
        Ok(trim_ascii(&buf).to_vec())
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace() && *b != 0x0b)
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace() && *b != 0x0b)
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

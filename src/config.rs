//! Configuration management for troupe-scribe.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::ServerConfig;
use crate::auth::{
    Credentials, EAccessClient, DEFAULT_GAME_CODE, DEFAULT_HOST as DEFAULT_EACCESS_HOST,
    DEFAULT_PORT as DEFAULT_EACCESS_PORT,
};
use crate::cli::Args;
use crate::lifecycle::LifecycleSettings;
use crate::recording::{
    RecordingSettings, Tmux, DEFAULT_GAME_HOST, DEFAULT_GAME_PORT, DEFAULT_INCLUDES,
    DEFAULT_SCRIPT_PATH, DEFAULT_SESSION, DEFAULT_SESSION_NAME, DEFAULT_SOCKET,
    DEFAULT_TRANSCRIPT_DIR,
};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account used to log in.
    pub credentials: Credentials,
    /// EAccess login server.
    pub eaccess: EAccessSection,
    /// Game server the client connects to.
    pub game: GameSection,
    /// Recording behaviour.
    pub recording: RecordingSection,
    /// Retry and wait bounds.
    pub lifecycle: LifecycleSection,
    /// Control API.
    pub server: ServerSection,
    /// Control API security.
    pub security: SecuritySection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// EAccess login server section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EAccessSection {
    pub host: String,
    pub port: u16,
    /// Game code sent when selecting the game.
    pub game_code: String,
    /// Bound on every read, in seconds.
    pub read_timeout_secs: u64,
}

impl Default for EAccessSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_EACCESS_HOST.to_string(),
            port: DEFAULT_EACCESS_PORT,
            game_code: DEFAULT_GAME_CODE.to_string(),
            read_timeout_secs: 5,
        }
    }
}

/// Game server section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSection {
    pub host: String,
    pub port: u16,
    /// tintin++ session name.
    pub session_name: String,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_GAME_HOST.to_string(),
            port: DEFAULT_GAME_PORT,
            session_name: DEFAULT_SESSION_NAME.to_string(),
        }
    }
}

/// Recording section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSection {
    /// Transcript file name prefix.
    pub log_prefix: String,
    pub transcript_dir: PathBuf,
    pub script_path: PathBuf,
    /// Client binary; the script path is appended.
    pub client_command: String,
    /// Files read by the launch script.
    pub includes: Vec<String>,
    /// Reserved tmux socket name.
    pub tmux_socket: String,
    pub tmux_session: String,
    pub warmup_secs: u64,
    pub tick_secs: u64,
    pub keep_alive_secs: u64,
    pub presence_action: String,
    pub keep_alive_action: String,
    pub sign_off: Vec<String>,
}

impl Default for RecordingSection {
    fn default() -> Self {
        let defaults = RecordingSettings::default();
        Self {
            log_prefix: defaults.log_prefix,
            transcript_dir: PathBuf::from(DEFAULT_TRANSCRIPT_DIR),
            script_path: PathBuf::from(DEFAULT_SCRIPT_PATH),
            client_command: defaults.client_command,
            includes: DEFAULT_INCLUDES.iter().map(|s| s.to_string()).collect(),
            tmux_socket: DEFAULT_SOCKET.to_string(),
            tmux_session: DEFAULT_SESSION.to_string(),
            warmup_secs: defaults.warmup.as_secs(),
            tick_secs: defaults.tick.as_secs(),
            keep_alive_secs: defaults.keep_alive.as_secs(),
            presence_action: defaults.presence_action,
            keep_alive_action: defaults.keep_alive_action,
            sign_off: defaults.sign_off,
        }
    }
}

/// Lifecycle section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleSection {
    pub auth_attempts: u32,
    pub stop_poll_attempts: u32,
    pub stop_poll_secs: u64,
}

impl Default for LifecycleSection {
    fn default() -> Self {
        Self {
            auth_attempts: 3,
            stop_poll_attempts: 12,
            stop_poll_secs: 15,
        }
    }
}

/// Control API server section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Control API security section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    /// Require a bearer key on every request except `/health`.
    pub auth_enabled: bool,
    /// Accepted API keys.
    pub api_keys: Vec<String>,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("SCRIBE_HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("SCRIBE_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        if let Some(key) = var("SCRIBE_API_KEY").filter(|k| !k.is_empty()) {
            self.add_api_key(key);
        }

        if let Some(username) = var("SCRIBE_USERNAME") {
            self.credentials.username = username;
        }
        if let Some(password) = var("SCRIBE_PASSWORD") {
            self.credentials.password = password;
        }
        if let Some(character) = var("SCRIBE_CHARACTER") {
            self.credentials.character = character;
        }
        if let Some(prefix) = var("SCRIBE_LOG_PREFIX") {
            self.recording.log_prefix = prefix;
        }

        if let Some(level) = var("SCRIBE_LOG_LEVEL").or_else(|| var("RUST_LOG")) {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref key) = args.api_key {
            self.add_api_key(key.clone());
        }

        if args.no_auth {
            self.security.auth_enabled = false;
        }

        if let Some(ref character) = args.character {
            self.credentials.character = character.clone();
        }
        if let Some(ref prefix) = args.log_prefix {
            self.recording.log_prefix = prefix.clone();
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Config::default();

        // Load from config file if specified
        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        // Apply environment variable overrides
        config.apply_env();

        // Apply CLI argument overrides (highest priority)
        config.apply_args(args);

        Ok(config)
    }

    fn add_api_key(&mut self, key: String) {
        self.security.auth_enabled = true;
        if !self.security.api_keys.contains(&key) {
            self.security.api_keys.push(key);
        }
    }

    /// Check that everything needed to record is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.credentials.is_complete() {
            return Err(ConfigError::MissingCredentials);
        }
        if self.recording.log_prefix.is_empty() {
            return Err(ConfigError::Invalid("recording.log_prefix is empty".into()));
        }
        for (name, secs) in [
            ("recording.tick_secs", self.recording.tick_secs),
            ("eaccess.read_timeout_secs", self.eaccess.read_timeout_secs),
            ("lifecycle.stop_poll_secs", self.lifecycle.stop_poll_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
        }
        if self.security.auth_enabled && self.security.api_keys.is_empty() {
            return Err(ConfigError::Invalid(
                "security.auth_enabled requires at least one API key".into(),
            ));
        }
        Ok(())
    }

    /// Login client for the configured EAccess server.
    pub fn eaccess_client(&self) -> EAccessClient {
        EAccessClient::new(&self.eaccess.host, self.eaccess.port)
            .with_game_code(&self.eaccess.game_code)
            .with_read_timeout(Duration::from_secs(self.eaccess.read_timeout_secs))
    }

    /// tmux driver on the reserved socket.
    pub fn tmux(&self) -> Tmux {
        Tmux::new(&self.recording.tmux_socket)
    }

    pub fn recording_settings(&self) -> RecordingSettings {
        let r = &self.recording;
        RecordingSettings {
            log_prefix: r.log_prefix.clone(),
            transcript_dir: r.transcript_dir.clone(),
            script_path: r.script_path.clone(),
            client_command: r.client_command.clone(),
            tmux_session: r.tmux_session.clone(),
            game_session: self.game.session_name.clone(),
            game_host: self.game.host.clone(),
            game_port: self.game.port,
            includes: r.includes.clone(),
            warmup: Duration::from_secs(r.warmup_secs),
            tick: Duration::from_secs(r.tick_secs),
            keep_alive: Duration::from_secs(r.keep_alive_secs),
            presence_action: r.presence_action.clone(),
            keep_alive_action: r.keep_alive_action.clone(),
            sign_off: r.sign_off.clone(),
        }
    }

    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            auth_attempts: self.lifecycle.auth_attempts,
            stop_poll_attempts: self.lifecycle.stop_poll_attempts,
            stop_poll_interval: Duration::from_secs(self.lifecycle.stop_poll_secs),
        }
    }

    /// Convert to ServerConfig for the control API.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port);
        if self.security.auth_enabled {
            server_config = server_config.with_api_keys(self.security.api_keys.iter().cloned());
        }
        Ok(server_config)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// Username, password or character is missing.
    MissingCredentials,
    /// A value is out of range.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::MissingCredentials => {
                write!(f, "username, password and character must all be set")
            }
            Self::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

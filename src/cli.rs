//! Command-line interface for troupe-scribe.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Control API bind address.
    pub host: Option<IpAddr>,
    /// Control API port.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// API key for the control API (overrides config file).
    pub api_key: Option<String>,
    /// Disable control API authentication.
    pub no_auth: bool,
    /// Character to play (overrides config file).
    pub character: Option<String>,
    /// Transcript file name prefix (overrides config file).
    pub log_prefix: Option<String>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('k') | Long("api-key") => {
                result.api_key = Some(parser.value()?.parse()?);
            }
            Long("no-auth") => {
                result.no_auth = true;
            }
            Short('C') | Long("character") => {
                result.character = Some(parser.value()?.parse()?);
            }
            Long("prefix") => {
                result.log_prefix = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"troupe-scribe {version}
Logs into DragonRealms and records a transcript on demand

USAGE:
    troupe-scribe [OPTIONS]

OPTIONS:
    -H, --host <ADDR>        Control API bind address [default: 127.0.0.1]
    -p, --port <PORT>        Control API port [default: 3000]
    -c, --config <FILE>      Path to configuration file (JSON)
    -k, --api-key <KEY>      API key for the control API
    -C, --character <NAME>   Character to play
        --prefix <PREFIX>    Transcript file name prefix
    -l, --log-level <LVL>    Log level (error, warn, info, debug, trace)
        --no-auth            Disable control API authentication
    -h, --help               Print help
    -V, --version            Print version

ENVIRONMENT VARIABLES:
    SCRIBE_HOST              Control API bind address (overrides config)
    SCRIBE_PORT              Control API port (overrides config)
    SCRIBE_API_KEY           Control API key (overrides config)
    SCRIBE_USERNAME          Account name
    SCRIBE_PASSWORD          Account password
    SCRIBE_CHARACTER         Character to play
    SCRIBE_LOG_PREFIX        Transcript file name prefix
    SCRIBE_LOG_LEVEL         Log level (overrides config)
    RUST_LOG                 Alternative log level setting

EXAMPLES:
    # Start with a config file
    troupe-scribe -c /etc/troupe-scribe/config.json

    # Start a recording through the control API
    curl -X POST -H 'Authorization: Bearer KEY' http://127.0.0.1:3000/api/v1/recording/start
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("troupe-scribe {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

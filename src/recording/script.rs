//! One-shot tintin++ launch script.

use std::fmt::Write as _;
use std::path::Path;

use crate::auth::SessionKey;
use crate::Result;

/// Default game server host.
pub const DEFAULT_GAME_HOST: &str = "prime.dr.game.play.net";

/// Default game server port.
pub const DEFAULT_GAME_PORT: u16 = 4901;

/// Default tintin++ session name.
pub const DEFAULT_SESSION_NAME: &str = "dr";

/// Default launch script location.
pub const DEFAULT_SCRIPT_PATH: &str = "dr.tin";

/// Config files pulled in after the built-in rules.
pub const DEFAULT_INCLUDES: &[&str] = &["tt/highlight.conf", "tt/function.conf"];

const ROUNDTIME_BODY: &str = "{#var CURRENT_RT %1; #var rtn @roundtime{}; #unvar $rtn; \
#delay {roundtime} {#showme <118>Roundtime complete.;} {%1}}";

/// Script that connects with a session key and installs the roundtime
/// tracker.
#[derive(Debug, Clone)]
pub struct LaunchScript<'a> {
    session_name: &'a str,
    host: &'a str,
    port: u16,
    key: &'a SessionKey,
    includes: Vec<String>,
}

impl<'a> LaunchScript<'a> {
    pub fn new(key: &'a SessionKey) -> Self {
        Self {
            session_name: DEFAULT_SESSION_NAME,
            host: DEFAULT_GAME_HOST,
            port: DEFAULT_GAME_PORT,
            key,
            includes: DEFAULT_INCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn server(mut self, session_name: &'a str, host: &'a str, port: u16) -> Self {
        self.session_name = session_name;
        self.host = host;
        self.port = port;
        self
    }

    pub fn includes(mut self, includes: Vec<String>) -> Self {
        self.includes = includes;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "#ses {} {} {};{};;",
            self.session_name, self.host, self.port, self.key
        );
        out.push_str("#nop Global Variables\n");
        out.push_str("#var {CURRENT_RT} {0};\n\n");
        out.push_str("#nop Global Roundtime Tracker\n");
        let _ = writeln!(out, "#action {{%?Roundtime: %1 sec%+}} {ROUNDTIME_BODY}");
        let _ = writeln!(out, "#action {{%?Roundtime %1 sec%+}} {ROUNDTIME_BODY}");
        out.push('\n');
        for include in &self.includes {
            let _ = writeln!(out, "#read {include}");
        }
        out
    }

    /// Write the script, replacing any previous one.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render())?;
        Ok(())
    }
}

//! Session configuration, loadable from TOML.
//!
//! Durations are written in human readable form, e.g., `connect_timeout = "500ms"`.
//!
//! ```
//! use std::time::Duration;
//!
//! use scpirs::SessionConfig;
//!
//! let config = SessionConfig::from_toml_str(
//!     r#"
//!     host = "insight-laser"
//!     prompt = "atlas ready>"
//!     terminator = "\n\r"
//!     command_timeout = "10s"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.port, 23);
//! assert_eq!(config.command_timeout, Duration::from_secs(10));
//! ```

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::InstrumentError;

/// Everything a [`crate::Session`] needs to know about how to reach and talk to an instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Instrument host name or IP address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Remote-control TCP port (default: 23, telnet).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout for establishing the channel and reading the banner.
    #[serde(default = "default_timeout")]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Default time to wait for the reply to a command.
    #[serde(default = "default_timeout")]
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,

    /// Ready prompt that terminates every reply.
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Line terminator appended to every command.
    #[serde(default = "default_terminator")]
    pub terminator: String,

    /// Read the greeting up to the first prompt right after connecting.
    #[serde(default = "default_true")]
    pub await_banner: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    23
}

fn default_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_prompt() -> String {
    ">".to_string()
}

fn default_terminator() -> String {
    "\n".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout: default_timeout(),
            command_timeout: default_timeout(),
            prompt: default_prompt(),
            terminator: default_terminator(),
            await_banner: default_true(),
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from a TOML string. Missing fields take their defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, InstrumentError> {
        let config: Self = toml::from_str(toml).map_err(|e| InstrumentError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InstrumentError> {
        let path = path.as_ref();
        let toml = std::fs::read_to_string(path)
            .map_err(|e| InstrumentError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&toml)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml_string(&self) -> Result<String, InstrumentError> {
        toml::to_string(self).map_err(|e| InstrumentError::Config(e.to_string()))
    }

    /// Set the host.
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Set the TCP port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the default command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the ready prompt.
    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = prompt.to_string();
        self
    }

    /// Set the line terminator.
    pub fn with_terminator(mut self, terminator: &str) -> Self {
        self.terminator = terminator.to_string();
        self
    }

    /// Choose whether to consume the greeting on connect.
    pub fn with_await_banner(mut self, await_banner: bool) -> Self {
        self.await_banner = await_banner;
        self
    }

    /// Reject values that would make framing impossible.
    fn check(&self) -> Result<(), InstrumentError> {
        if self.prompt.is_empty() {
            return Err(InstrumentError::Config("prompt must not be empty".to_string()));
        }
        if self.terminator.is_empty() {
            return Err(InstrumentError::Config(
                "terminator must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    fn test_empty_toml_gives_defaults() {
        assert_eq!(SessionConfig::from_toml_str("").unwrap(), SessionConfig::default());
    }

    #[rstest]
    fn test_toml_round_trip() {
        let config = SessionConfig::default()
            .with_host("insight-laser")
            .with_prompt("atlas ready>")
            .with_terminator("\n\r")
            .with_command_timeout(Duration::from_millis(1500));
        let toml = config.to_toml_string().unwrap();
        assert!(toml.contains("command_timeout = \"1s 500ms\""));
        assert_eq!(SessionConfig::from_toml_str(&toml).unwrap(), config);
    }

    #[rstest]
    #[case("prompt = \"\"")]
    #[case("terminator = \"\"")]
    #[case("port = \"telnet\"")]
    #[case("command_timeout = \"soon\"")]
    fn test_invalid_toml(#[case] toml: &str) {
        assert!(matches!(
            SessionConfig::from_toml_str(toml),
            Err(InstrumentError::Config(_))
        ));
    }

    #[rstest]
    fn test_missing_file() {
        assert!(matches!(
            SessionConfig::from_file("does/not/exist.toml"),
            Err(InstrumentError::Config(_))
        ));
    }
}

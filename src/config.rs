//! Client configuration: who we are and where to connect.

use core::fmt;

use tokio::time::Duration;

use crate::core::{
    common::Rgb,
    config::{DEFAULT_PORT, MAX_NAME_LEN, SERVER_NAME_LIMIT},
};
use crate::transport::tcp::TransportConfig;

/// Rejected configuration, reported before any connection is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyName,
    /// The name contains a character outside ASCII.
    NonAsciiName(String),
    NameTooLong { len: usize, max: usize },
    ZeroPayloadLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyName => f.write_str("player name must not be empty"),
            ConfigError::NonAsciiName(name) => {
                write!(f, "player name {:?} must contain only ASCII characters", name)
            }
            ConfigError::NameTooLong { len, max } => {
                write!(f, "player name is {} bytes, at most {} allowed", len, max)
            }
            ConfigError::ZeroPayloadLimit => f.write_str("maximum payload size must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Name and colour announced in the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    color: Rgb,
}

impl Identity {
    pub fn new(name: impl Into<String>, color: Rgb) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if !name.is_ascii() {
            return Err(ConfigError::NonAsciiName(name));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(ConfigError::NameTooLong {
                len: name.len(),
                max: MAX_NAME_LEN,
            });
        }
        if name.len() > SERVER_NAME_LIMIT {
            log::warn!(
                "name {:?} is longer than {} characters; the server will truncate it",
                name,
                SERVER_NAME_LIMIT
            );
        }
        Ok(Self { name, color })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Rgb {
        self.color
    }
}

/// Everything needed to start a session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `host:port` of the game server.
    pub server: String,
    pub name: String,
    pub color: Rgb,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Duration,
    pub max_payload: usize,
}

impl ClientConfig {
    pub fn new(server: impl Into<String>, name: impl Into<String>, color: Rgb) -> Self {
        let transport = TransportConfig::default();
        Self {
            server: server.into(),
            name: name.into(),
            color,
            read_timeout: transport.read_timeout,
            write_timeout: transport.write_timeout,
            max_payload: transport.max_payload,
        }
    }

    /// Check the configuration and derive the handshake identity.
    pub fn identity(&self) -> Result<Identity, ConfigError> {
        if self.max_payload == 0 {
            return Err(ConfigError::ZeroPayloadLimit);
        }
        Identity::new(self.name.clone(), self.color)
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            max_payload: self.max_payload,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(
            format!("127.0.0.1:{}", DEFAULT_PORT),
            "rust-snake",
            Rgb::new(0, 0, 255),
        )
    }
}

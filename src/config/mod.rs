//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// How this peer enters a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Bind and wait for an opponent; plays as Primary
    Host,
    /// Connect to a hosting peer; plays as Secondary
    Join,
    /// Single-peer round against the scripted opponent
    Solo,
}

impl FromStr for SessionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "host" => Ok(Self::Host),
            "join" => Ok(Self::Join),
            "solo" => Ok(Self::Solo),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// host | join | solo
    pub mode: SessionMode,
    /// Address to bind when hosting
    pub listen_addr: SocketAddr,
    /// Host address to connect to when joining
    pub remote_addr: Option<SocketAddr>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Scripted opponent difficulty, 1-10
    pub ai_level: u8,
    /// Fixed RNG seed for reproducible bot behavior
    pub ai_seed: Option<u64>,
    /// Rounds the bot driver plays before leaving to the menu
    pub max_rounds: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode: SessionMode = env::var("MODE")
            .unwrap_or_else(|_| "solo".to_string())
            .parse()?;

        let listen_addr = env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:7777".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddress("LISTEN_ADDR"))?;

        let remote_addr = match env::var("REMOTE_ADDR") {
            Ok(raw) => Some(
                raw.parse()
                    .map_err(|_| ConfigError::InvalidAddress("REMOTE_ADDR"))?,
            ),
            Err(_) => None,
        };
        if mode == SessionMode::Join && remote_addr.is_none() {
            return Err(ConfigError::Missing("REMOTE_ADDR"));
        }

        let ai_level: u8 = env::var("AI_LEVEL")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidNumber("AI_LEVEL"))?;
        if !(1..=10).contains(&ai_level) {
            return Err(ConfigError::InvalidAiLevel(ai_level));
        }

        let ai_seed = match env::var("AI_SEED") {
            Ok(raw) => Some(
                raw.parse()
                    .map_err(|_| ConfigError::InvalidNumber("AI_SEED"))?,
            ),
            Err(_) => None,
        };

        let max_rounds = env::var("MAX_ROUNDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidNumber("MAX_ROUNDS"))?;

        Ok(Self {
            mode,
            listen_addr,
            remote_addr,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            ai_level,
            ai_seed,
            max_rounds,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid address in {0}")]
    InvalidAddress(&'static str),

    #[error("Invalid MODE: {0} (expected host, join or solo)")]
    InvalidMode(String),

    #[error("Invalid numeric value for {0}")]
    InvalidNumber(&'static str),

    #[error("AI_LEVEL must be 1-10, got {0}")]
    InvalidAiLevel(u8),
}

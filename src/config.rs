//! Process configuration read from the environment.
//!
//! Every knob has a default so a bare `cargo run` starts an in-memory
//! server on port 3001. `.env` files are loaded by `main` before this runs.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use protocol::BoardId;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 300;
pub const DEFAULT_CLIENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid bind address {0}")]
    BindAddr(String),
}

impl protocol::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::BindAddr(_) => "E_CONFIG_BIND_ADDR",
        }
    }
}

/// Which origins the HTTP and socket endpoints accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Absent means events live in process memory only.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Boards the in-memory directory knows about. Empty accepts any id.
    pub memory_boards: Vec<BoardId>,
    /// Sessions silent for longer than this drop out of the member listing.
    pub session_idle: Duration,
    pub client_channel_capacity: usize,
    pub cors_origins: CorsOrigins,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let memory_boards = env_list(&lookup, "MEMORY_BOARDS").into_iter().map(BoardId::new).collect();
        let cors_origins = match env_list(&lookup, "CORS_ORIGIN") {
            list if list.is_empty() || list.iter().any(|o| o == "*") => CorsOrigins::Any,
            list => CorsOrigins::List(list),
        };

        Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port: env_parse(&lookup, "PORT", DEFAULT_PORT),
            database_url,
            db_max_connections: env_parse(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            memory_boards,
            session_idle: Duration::from_secs(env_parse(&lookup, "SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS)),
            client_channel_capacity: env_parse(&lookup, "CLIENT_CHANNEL_CAPACITY", DEFAULT_CLIENT_CHANNEL_CAPACITY)
                .max(1),
            cors_origins,
        }
    }

    /// Socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BindAddr`] if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::BindAddr(raw))
    }
}

/// Parse `key` with `T::from_str`, falling back to `default` when unset or malformed.
pub(crate) fn env_parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_list(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Vec<String> {
    lookup(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

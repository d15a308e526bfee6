//! HTTP listener configuration from the `HOST` and `PORT` environment variables.

use crate::errors::{Error, Result};

/// Address and port the HTTP server binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to listen on
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    /// Reads `HOST` and `PORT`, falling back to `0.0.0.0:5000`.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `PORT` is set but is not a valid port number.
    pub fn from_env() -> Result<Self> {
        Self::from_values(std::env::var("HOST").ok(), std::env::var("PORT").ok())
    }

    fn from_values(host: Option<String>, port: Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let port = match port {
            Some(raw) => raw.trim().parse().map_err(|e| Error::Config {
                message: format!("Invalid PORT '{raw}': {e}"),
            })?,
            None => defaults.port,
        };

        Ok(Self {
            host: host.unwrap_or(defaults.host),
            port,
        })
    }

    /// `host:port` string accepted by `tokio::net::TcpListener::bind`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

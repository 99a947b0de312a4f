use std::env;
use std::net::SocketAddr;

use crate::error::ServerError;

pub const DEFAULT_PORT: u16 = 12345;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub host: String,
    /// Shared secret every control-plane request must carry; `None` disables auth
    pub token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            token: env::var("PROXY_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ServerError> {
        let host = self.host.trim();
        // Bare IPv6 literals need brackets before a port can be appended
        let addr = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        };
        addr.parse()
            .map_err(|_| ServerError::InvalidAddress(addr))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "127.0.0.1".to_string(),
            token: None,
        }
    }
}

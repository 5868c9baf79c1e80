//! # Server Configuration
//!
//! Settings for `tienda serve`, resolved from CLI flags and environment
//! variables by clap and validated here.

use std::net::SocketAddr;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default requests per second across all clients.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Header carrying the admin API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Resolved HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Admin key. `None` refuses every admin request.
    pub api_key: Option<String>,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Single allowed CORS origin. `None` allows any origin.
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            api_key: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    /// Build a config from raw settings.
    ///
    /// Blank keys and origins count as absent.
    pub fn new(
        addr: &str,
        api_key: Option<String>,
        rate_limit: u32,
        cors_origin: Option<String>,
    ) -> Result<Self, String> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| format!("Invalid listen address '{}': {}", addr, e))?;
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        let cors_origin = cors_origin
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());

        if let Some(origin) = &cors_origin {
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                return Err(format!(
                    "Invalid CORS origin '{}': must start with http:// or https://",
                    origin
                ));
            }
        }

        Ok(Self {
            addr,
            api_key,
            rate_limit,
            cors_origin,
        })
    }

    /// Whether admin routes can ever succeed.
    pub fn admin_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

//! Application-level settings.

use std::net::SocketAddr;

use rand::RngCore;

use crate::env::{EnvReader, FromEnv};
use crate::error::ConfigError;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Settings every application reads at startup.
///
/// | Variable | Default        |
/// |----------|----------------|
/// | `ADDR`   | `0.0.0.0:8080` |
/// | `DEBUG`  | `false`        |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Address the server listens on.
    pub address: String,
    /// Enables development logging.
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDR.to_string(),
            debug: false,
        }
    }
}

impl FromEnv for AppConfig {
    fn from_env(env: &mut EnvReader) -> Self {
        let address = env.string("ADDR", Some(DEFAULT_ADDR));
        if address.parse::<SocketAddr>().is_err() {
            env.report(ConfigError::invalid_value(
                "ADDR",
                format!("{address:?} is not a socket address"),
            ));
        }
        Self {
            address,
            debug: env.bool("DEBUG", Some(false)),
        }
    }
}

impl AppConfig {
    /// Reads `.env` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        crate::env::load()
    }

    /// Returns the parsed listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.address
            .parse()
            .map_err(|e| ConfigError::invalid_value("ADDR", format!("{e}")))
    }
}

/// Generates a random 32-byte key, hex-encoded.
///
/// ```
/// let key = daedalus_config::generate_app_key();
/// assert_eq!(key.len(), 64);
/// ```
#[must_use]
pub fn generate_app_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

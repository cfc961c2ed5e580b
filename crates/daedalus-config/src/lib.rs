//! Environment-driven configuration for Daedalus.
//!
//! Settings are bound from environment variables through the [`FromEnv`]
//! trait. A `.env` file in the working directory is read first; variables
//! already set in the process win over it.
//!
//! ```no_run
//! use daedalus_config::AppConfig;
//!
//! # fn main() -> Result<(), daedalus_config::ConfigError> {
//! let config = AppConfig::load()?;
//! println!("listening on {}", config.address);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod env;
mod error;

pub use app::{generate_app_key, AppConfig, DEFAULT_ADDR};
pub use env::{load, EnvReader, FromEnv};
pub use error::ConfigError;

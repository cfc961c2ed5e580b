//! Logging setup for Daedalus applications.
//!
//! Everything in Daedalus logs through `tracing`. This crate installs a
//! `tracing-subscriber` stack with either JSON or human-readable output.

#![doc(html_root_url = "https://docs.rs/daedalus-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

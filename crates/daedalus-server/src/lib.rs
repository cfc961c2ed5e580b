//! # Daedalus Server
//!
//! Route registration, request dispatch and HTTP serving for Daedalus.
//!
//! - [`Router`] collects routes, middleware, resources and mounts
//! - [`DispatchTable`] runs the middleware chain for each request
//! - [`Server`] serves a table over HTTP/1.1 with graceful shutdown
//! - [`App`] wires environment settings, logging and the server together
//!
//! ## Example
//!
//! ```rust,ignore
//! use daedalus_core::handler_fn;
//! use daedalus_server::{Router, Server, ServerConfig};
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), daedalus_server::ServerError> {
//!     let mut router = Router::new();
//!     router.get("/", handler_fn(|ctx| Box::pin(async move {
//!         ctx.send_text("hello", StatusCode::OK)
//!     })));
//!
//!     Server::new(ServerConfig::default(), router.compile()?).run().await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod config;
mod dispatch;
mod error;
mod error_handler;
mod resource;
mod router;
mod server;
pub mod shutdown;
pub mod static_files;

pub use app::App;
pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_MAX_BODY_SIZE, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use dispatch::DispatchTable;
pub use error::{RouterError, ServerError};
pub use error_handler::{DefaultErrorHandler, ErrorBody, ErrorHandler};
pub use resource::{Controller, Resource, ResourceMethod};
pub use router::{MethodFilter, Route, RouteHandle, RouteId, Router, StandardHandler};
pub use server::Server;
pub use shutdown::{ConnectionTracker, ShutdownSignal};
pub use static_files::{StaticFileError, StaticFiles};

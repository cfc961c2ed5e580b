//! # Daedalus
//!
//! **A small web framework for server-rendered, htmx-driven applications**
//!
//! Daedalus gives you:
//!
//! - a radix-tree router with named routes, trailing-slash tolerance and
//!   convention-based resource controllers
//! - a per-request [`Context`](prelude::Context) with typed decoding,
//!   validation, htmx-aware redirects and Server-Sent Events
//! - explicit middleware continuation: a middleware calls `ctx.next()` to
//!   let the request through
//! - one pluggable error handler for every failure
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use daedalus::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     let mut app = App::from_env()?;
//!
//!     app.router_mut()
//!         .get("/hello/:name", handler_fn(|ctx| Box::pin(async move {
//!             let name = ctx.path_value("name").unwrap_or("world").to_string();
//!             ctx.send_text(format!("Hello, {name}!"), StatusCode::OK)
//!         })))
//!         .name("hello");
//!
//!     app.run().await
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request → global middleware → route middleware → handler
//!                     ↓ (error)          ↓ (error)     ↓ (error)
//!                     └──────────── ErrorHandler ──────┘
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use daedalus_core as core;

// Re-export server types
pub use daedalus_server as server;

// Re-export router types
pub use daedalus_router as router;

// Re-export SSE types
pub use daedalus_sse as sse;

// Re-export configuration types
pub use daedalus_config as config;

// Re-export logging setup
pub use daedalus_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use daedalus::prelude::*;
///
/// let mut router = Router::new();
/// router.get("/", handler_fn(|ctx| Box::pin(async move {
///     ctx.send_html("<h1>Home</h1>", StatusCode::OK)
/// })));
/// assert!(router.compile().is_ok());
/// ```
pub mod prelude {
    pub use daedalus_core::{
        handler_fn, BoxFuture, Context, Decoded, Error, FieldErrors, Handler, HandlerResult, Render, RequestId,
        Result, StatusError, Validate, Violations,
    };

    pub use daedalus_server::{
        App, Controller, DefaultErrorHandler, DispatchTable, ErrorHandler, Resource, ResourceMethod, Router,
        Server, ServerConfig, ServerError, ShutdownSignal,
    };

    pub use daedalus_config::{generate_app_key, AppConfig, ConfigError, EnvReader, FromEnv};

    pub use daedalus_sse::{SseConfig, SseEvent};

    pub use daedalus_telemetry::{init_logging, LogConfig, LogFormat};

    pub use http::StatusCode;
}

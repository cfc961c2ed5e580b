//! # Daedalus Core
//!
//! Core types and traits for the Daedalus request-dispatch engine.
//!
//! - [`Context`] - Per-request state passed through middleware and handlers
//! - [`Handler`] - The async unit of request processing
//! - [`Error`] / [`StatusError`] - Failure types and their status mapping
//! - [`Validate`] / [`Decoded`] - Payload decoding with field-level errors
//! - [`RouteIndex`] - Named routes for URL generation
//! - [`Render`] - Anything that can produce HTML

#![doc(html_root_url = "https://docs.rs/daedalus-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
pub mod decode;
mod error;
mod handler;
mod render;
mod response;
mod signal;
mod url;
mod validate;

pub use context::{Context, RequestId, HX_REDIRECT, HX_REQUEST};
pub use daedalus_router::Params;
pub use error::{retrieve_error_code, Error, Result, StatusError};
pub use handler::{boxed, handler_fn, BoxFuture, BoxHandler, Handler, HandlerResult};
pub use render::Render;
pub use response::{empty, full, HttpResponse, ResponseBody};
pub use signal::{Disconnect, DisconnectGuard};
pub use url::RouteIndex;
pub use validate::{rule_message, Decoded, FieldErrors, Validate, Violation, Violations};

//! The handler abstraction.
//!
//! Middleware and terminal route logic share one shape: an async function
//! from `&mut Context` to `Result<()>`. Middleware signals "keep going" by
//! calling [`Context::next`]; anything else stops the chain.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Result;

/// A boxed, `Send` future borrowing from `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of a handler or middleware call.
pub type HandlerResult = Result<()>;

/// A unit of request processing, used for middleware and route handlers.
///
/// Closures implement it through [`handler_fn`]; types with state implement
/// it directly.
///
/// # Example
///
/// ```
/// use daedalus_core::{BoxFuture, Context, Handler, HandlerResult, StatusError};
///
/// struct RequireHeader(&'static str);
///
/// impl Handler for RequireHeader {
///     fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
///         Box::pin(async move {
///             if ctx.header(self.0).is_none() {
///                 return Err(StatusError::unauthorized().into());
///             }
///             ctx.next();
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Processes the request held by `ctx`.
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        (self)(ctx)
    }
}

/// A shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

/// Pins down the closure signature so the borrow of the context can flow
/// into the returned future.
///
/// ```
/// use daedalus_core::handler_fn;
/// use http::StatusCode;
///
/// let hello = handler_fn(|ctx| Box::pin(async move {
///     ctx.send_text("hello", StatusCode::OK)
/// }));
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    f
}

/// Erases a handler into a [`BoxHandler`].
pub fn boxed<H: Handler>(handler: H) -> BoxHandler {
    Arc::new(handler)
}

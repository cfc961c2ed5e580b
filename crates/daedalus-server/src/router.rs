//! Route registration.
//!
//! A [`Router`] collects routes, global middleware and the error handler
//! during setup. [`Router::compile`] freezes everything into a
//! [`DispatchTable`] that serves requests.
//!
//! # Example
//!
//! ```rust
//! use daedalus_core::{handler_fn, StatusError};
//! use daedalus_server::Router;
//! use http::StatusCode;
//!
//! let mut router = Router::new();
//!
//! router.use_middleware(handler_fn(|ctx| Box::pin(async move {
//!     if ctx.header("x-blocked").is_some() {
//!         return Err(StatusError::forbidden().into());
//!     }
//!     ctx.next();
//!     Ok(())
//! })));
//!
//! router
//!     .get("/posts/:id", handler_fn(|ctx| Box::pin(async move {
//!         let id = ctx.path_value("id").unwrap_or_default().to_string();
//!         ctx.send_text(id, StatusCode::OK)
//!     })))
//!     .name("post.show");
//!
//! assert_eq!(router.make_url("post.show", &[("id", "7")]).unwrap(), "/posts/7");
//! let table = router.compile().unwrap();
//! assert!(table.entries().contains(&("GET".to_string(), "/posts/:id/".to_string())));
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use daedalus_core::{boxed, handler_fn, BoxFuture, BoxHandler, Handler, HttpResponse, Render, Result, RouteIndex};
use daedalus_sse::SseConfig;
use http::{Method, Request};

use crate::dispatch::DispatchTable;
use crate::error::RouterError;
use crate::error_handler::{DefaultErrorHandler, ErrorHandler};
use crate::resource::{Controller, Resource};
use crate::static_files::StaticFiles;

/// Which methods a route answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    /// Every method.
    Any,
    /// One method.
    Only(Method),
}

impl MethodFilter {
    /// Returns the method, or `None` for [`MethodFilter::Any`].
    #[must_use]
    pub const fn method(&self) -> Option<&Method> {
        match self {
            Self::Any => None,
            Self::Only(method) => Some(method),
        }
    }

    /// Label used in logs and the entry list. Empty for any-method routes.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Any => "",
            Self::Only(method) => method.as_str(),
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

/// A handler that sees the raw request and bypasses the middleware chain.
pub trait StandardHandler: Send + Sync + 'static {
    /// Produces the response for `request`.
    fn serve(&self, request: Request<Bytes>) -> BoxFuture<'static, HttpResponse>;
}

impl<F, Fut> StandardHandler for F
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    fn serve(&self, request: Request<Bytes>) -> BoxFuture<'static, HttpResponse> {
        Box::pin((self)(request))
    }
}

/// What a route runs once matched.
#[derive(Clone)]
pub(crate) enum Endpoint {
    /// Middleware chain, then this handler.
    Chain(BoxHandler),
    /// Raw request in, response out.
    Standard(Arc<dyn StandardHandler>),
}

/// Identifies a route inside its [`Router`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteId(usize);

/// A registered route.
pub struct Route {
    pub(crate) method: MethodFilter,
    pub(crate) pattern: String,
    pub(crate) endpoint: Endpoint,
    pub(crate) middleware: Vec<BoxHandler>,
    pub(crate) name: Option<String>,
}

impl Route {
    /// Returns the method filter.
    #[must_use]
    pub const fn method(&self) -> &MethodFilter {
        &self.method
    }

    /// Returns the pattern as registered.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the route name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the number of route-specific middleware.
    #[must_use]
    pub fn middleware_len(&self) -> usize {
        self.middleware.len()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("middleware", &self.middleware.len())
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Fluent access to a freshly registered route.
pub struct RouteHandle<'r> {
    id: RouteId,
    route: &'r mut Route,
}

impl RouteHandle<'_> {
    /// Appends route-specific middleware. It runs after all global
    /// middleware.
    pub fn middleware(self, handler: impl Handler) -> Self {
        self.route.middleware.push(boxed(handler));
        self
    }

    /// Names the route for [`Router::make_url`].
    pub fn name(self, name: impl Into<String>) -> Self {
        self.route.name = Some(name.into());
        self
    }

    /// Returns the route's identity.
    #[must_use]
    pub const fn id(&self) -> RouteId {
        self.id
    }
}

/// Route table under construction.
pub struct Router {
    routes: Vec<Option<Route>>,
    middleware: Vec<BoxHandler>,
    error_handler: Arc<dyn ErrorHandler>,
    sse: SseConfig,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes().collect::<Vec<_>>())
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Creates an empty router with the default error handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            middleware: Vec::new(),
            error_handler: Arc::new(DefaultErrorHandler),
            sse: SseConfig::default(),
        }
    }

    fn push(&mut self, method: MethodFilter, pattern: &str, endpoint: Endpoint) -> RouteHandle<'_> {
        let id = RouteId(self.routes.len());
        self.routes.push(None);
        let route = self.routes[id.0].insert(Route {
            method,
            pattern: pattern.trim().to_string(),
            endpoint,
            middleware: Vec::new(),
            name: None,
        });
        RouteHandle { id, route }
    }

    /// Registers `handler` for `method` at `pattern`.
    pub fn route(
        &mut self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        handler: impl Handler,
    ) -> RouteHandle<'_> {
        self.push(method.into(), pattern, Endpoint::Chain(boxed(handler)))
    }

    /// Registers a `GET` route.
    pub fn get(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.route(Method::GET, pattern, handler)
    }

    /// Registers a `POST` route.
    pub fn post(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.route(Method::POST, pattern, handler)
    }

    /// Registers a `PUT` route.
    pub fn put(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.route(Method::PUT, pattern, handler)
    }

    /// Registers a `PATCH` route.
    pub fn patch(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.route(Method::PATCH, pattern, handler)
    }

    /// Registers a `DELETE` route.
    pub fn delete(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.route(Method::DELETE, pattern, handler)
    }

    /// Registers a route answering every method.
    pub fn any(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.route(MethodFilter::Any, pattern, handler)
    }

    /// Registers a `GET` route that renders `component` with the current
    /// status.
    pub fn render<R: Render>(&mut self, pattern: &str, component: R) -> RouteHandle<'_> {
        let component = Arc::new(component);
        self.get(
            pattern,
            handler_fn(move |ctx| {
                let component = Arc::clone(&component);
                Box::pin(async move { ctx.render(&*component) })
            }),
        )
    }

    /// Registers a raw handler at `pattern` for every method.
    ///
    /// Raw handlers skip global and route middleware as well as the error
    /// handler.
    pub fn mount_standard(&mut self, pattern: &str, handler: impl StandardHandler) -> RouteHandle<'_> {
        self.push(MethodFilter::Any, pattern, Endpoint::Standard(Arc::new(handler)))
    }

    /// Serves files under `root_dir` at `url_prefix`.
    ///
    /// Missing files answer 404 and paths escaping the root answer 403.
    pub fn mount_static(&mut self, root_dir: impl AsRef<Path>, url_prefix: &str) -> RouteHandle<'_> {
        let prefix = url_prefix.trim().trim_end_matches('/').to_string();
        let pattern = format!("{prefix}/*filepath");
        let files = Arc::new(StaticFiles::new(root_dir).index("index.html"));

        self.mount_standard(&pattern, move |request: Request<Bytes>| {
            let files = Arc::clone(&files);
            let prefix = prefix.clone();
            async move { files.serve_under(&prefix, &request) }
        })
    }

    /// Appends global middleware. Global middleware runs for every route,
    /// in registration order, before route middleware.
    pub fn use_middleware(&mut self, handler: impl Handler) -> &mut Self {
        self.middleware.push(boxed(handler));
        self
    }

    /// Replaces the error handler.
    pub fn error_handler(&mut self, handler: impl ErrorHandler) -> &mut Self {
        self.error_handler = Arc::new(handler);
        self
    }

    /// Sets the event-stream settings used by every request.
    pub fn sse_config(&mut self, config: SseConfig) -> &mut Self {
        self.sse = config;
        self
    }

    /// Registers the CRUD routes of `controller` under `prefix`.
    pub fn resource<C: Controller>(&mut self, prefix: &str, controller: C) -> Resource<'_> {
        Resource::register(self, prefix, Arc::new(controller))
    }

    /// Builds a URL for the first route named `name`.
    pub fn make_url(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
        self.route_index().make_url(name, params)
    }

    /// Iterates the registered routes in order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().flatten()
    }

    /// Returns the route behind `id`, unless it was removed.
    #[must_use]
    pub fn get_route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn route_mut(&mut self, id: RouteId) -> Option<&mut Route> {
        self.routes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub(crate) fn remove(&mut self, id: RouteId) -> Option<Route> {
        self.routes.get_mut(id.0).and_then(Option::take)
    }

    fn route_index(&self) -> RouteIndex {
        let mut index = RouteIndex::new();
        for route in self.routes() {
            if let Some(name) = &route.name {
                index.push(name.clone(), route.pattern.clone());
            }
        }
        index
    }

    /// Freezes the registered routes into a dispatch table.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DuplicateRoute`] when two routes share a
    /// method and normalized pattern, and [`RouterError::InvalidPattern`]
    /// for patterns the table cannot hold.
    pub fn compile(self) -> std::result::Result<DispatchTable, RouterError> {
        let index = self.route_index();
        let routes = self.routes.into_iter().flatten().collect();
        DispatchTable::build(routes, self.middleware, self.error_handler, self.sse, index)
    }
}

//! Request dispatch.
//!
//! A [`DispatchTable`] is the frozen output of [`Router::compile`]. For every
//! request it finds the matching route, builds a fresh [`Context`] and runs
//! the chain on its own task:
//!
//! 1. global middleware, in registration order
//! 2. route middleware, in registration order
//! 3. the route handler
//!
//! Before each middleware call the continuation flag is cleared; a
//! middleware that returns `Ok` without calling [`Context::next`] stops the
//! chain. Any error stops the chain and goes to the [`ErrorHandler`].
//!
//! [`Router::compile`]: crate::Router::compile

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use daedalus_core::{
    full, handler_fn, BoxHandler, Context, Disconnect, HttpResponse, Params, RouteIndex, StatusError,
};
use daedalus_router::Router as RadixTree;
use daedalus_sse::SseConfig;
use http::{Request, Response, StatusCode};
use tokio::sync::oneshot;

use crate::error::RouterError;
use crate::error_handler::ErrorHandler;
use crate::router::{Endpoint, MethodFilter, Route};

/// How a chain run ended.
enum Outcome {
    /// The handler ran.
    Completed,
    /// A middleware returned without calling `next()`.
    Stopped,
}

/// The compiled request pipeline for one route.
pub(crate) struct Dispatcher {
    method: MethodFilter,
    pattern: String,
    global: Arc<[BoxHandler]>,
    middleware: Vec<BoxHandler>,
    endpoint: Endpoint,
}

impl Dispatcher {
    async fn run_chain(&self, ctx: &mut Context) -> daedalus_core::Result<Outcome> {
        for middleware in self.global.iter().chain(self.middleware.iter()) {
            ctx.reset_continuation();
            middleware.call(ctx).await?;
            if !ctx.should_continue() {
                return Ok(Outcome::Stopped);
            }
        }

        if let Endpoint::Chain(handler) = &self.endpoint {
            handler.call(ctx).await?;
        }
        Ok(Outcome::Completed)
    }

    /// Runs the whole pipeline for one request. Returns `None` when the
    /// response already left through an event stream.
    async fn serve(&self, mut ctx: Context, errors: &dyn ErrorHandler) -> Option<HttpResponse> {
        let start = Instant::now();
        let result = self.run_chain(&mut ctx).await;
        let duration = start.elapsed();

        match result {
            Err(err) => {
                if ctx.is_streaming() {
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        error = %err,
                        duration = ?duration,
                        "Error while streaming"
                    );
                } else {
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        error = %err,
                        duration = ?duration,
                        "Error handling request"
                    );
                    errors.handle(&mut ctx, err);
                }
            }
            Ok(outcome) => {
                if matches!(outcome, Outcome::Stopped) && !ctx.is_written() {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        path = %ctx.path(),
                        route = %format_args!("{} {}", self.method.label(), self.pattern),
                        "Middleware stopped the chain without writing a response"
                    );
                }
                log_completed(&ctx, duration);
            }
        }

        ctx.into_response()
    }
}

fn log_completed(ctx: &Context, duration: Duration) {
    let status = ctx.status();
    tracing::info!(
        request_id = %ctx.request_id(),
        method = %ctx.method(),
        path = %ctx.path(),
        status = status.as_u16(),
        status_text = status.canonical_reason().unwrap_or_default(),
        duration = ?duration,
        "Request completed"
    );
}

fn internal_error() -> HttpResponse {
    let mut response = Response::new(full(Bytes::new()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Frozen routes ready to serve requests.
///
/// Cheap to share: wrap it in an `Arc` and hand clones to every connection.
pub struct DispatchTable {
    tree: RadixTree<Arc<Dispatcher>>,
    fallback: Arc<Dispatcher>,
    errors: Arc<dyn ErrorHandler>,
    routes: Arc<RouteIndex>,
    sse: SseConfig,
    entries: Vec<(String, String)>,
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl DispatchTable {
    pub(crate) fn build(
        routes: Vec<Route>,
        global: Vec<BoxHandler>,
        errors: Arc<dyn ErrorHandler>,
        sse: SseConfig,
        index: RouteIndex,
    ) -> Result<Self, RouterError> {
        let global: Arc<[BoxHandler]> = global.into();
        let mut tree = RadixTree::new();
        let mut entries = Vec::with_capacity(routes.len() * 2);

        for route in routes {
            tracing::info!(
                method = %route.method.label(),
                pattern = %route.pattern,
                "Register route"
            );

            let label = route.method.label().to_string();
            entries.push((label.clone(), route.pattern.clone()));
            if route.pattern != "/" && !route.pattern.ends_with('/') {
                entries.push((label, format!("{}/", route.pattern)));
            }

            let method = route.method.method().cloned();
            let pattern = route.pattern.clone();
            let dispatcher = Arc::new(Dispatcher {
                method: route.method,
                pattern: route.pattern,
                global: Arc::clone(&global),
                middleware: route.middleware,
                endpoint: route.endpoint,
            });
            tree.insert(method.as_ref(), &pattern, dispatcher)?;
        }

        let not_found = handler_fn(|_ctx| Box::pin(async { Err(StatusError::not_found().into()) }));
        let fallback = Arc::new(Dispatcher {
            method: MethodFilter::Any,
            pattern: "/".to_string(),
            global,
            middleware: Vec::new(),
            endpoint: Endpoint::Chain(Arc::new(not_found)),
        });

        Ok(Self {
            tree,
            fallback,
            errors,
            routes: Arc::new(index),
            sse,
            entries,
        })
    }

    /// Lists the compiled `(method, pattern)` keys, trailing-slash twins
    /// included. Any-method routes have an empty method.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Returns the named-route index shared with every request.
    #[must_use]
    pub fn route_index(&self) -> &Arc<RouteIndex> {
        &self.routes
    }

    /// Handles one buffered request.
    ///
    /// The chain runs on its own task. Event streams start flowing as soon
    /// as the handler commits them; a panic inside the chain becomes a
    /// `500` and leaves other requests untouched.
    pub async fn dispatch(&self, request: Request<Bytes>) -> HttpResponse {
        let disconnect = Disconnect::new();
        let guard = disconnect.guard();

        let (dispatcher, params) = match self.tree.at(request.method(), request.uri().path()) {
            Some(found) => (Arc::clone(found.value), found.params),
            None => (Arc::clone(&self.fallback), Params::new()),
        };

        if let Endpoint::Standard(handler) = &dispatcher.endpoint {
            let method = request.method().clone();
            let path = request.uri().path().to_string();
            let start = Instant::now();
            let response = match tokio::spawn(handler.serve(request)).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::error!(error = %err, path = %path, "Standard handler panicked");
                    internal_error()
                }
            };
            tracing::info!(
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                duration = ?start.elapsed(),
                "Request completed"
            );
            guard.disarm();
            return response;
        }

        let (commit, committed) = oneshot::channel();
        let ctx = Context::new(request)
            .with_params(params)
            .with_routes(Arc::clone(&self.routes))
            .with_streaming(commit, self.sse.clone())
            .with_disconnect(disconnect);

        let errors = Arc::clone(&self.errors);
        let task = tokio::spawn(async move { dispatcher.serve(ctx, errors.as_ref()).await });

        let response = match committed.await {
            Ok(head) => head,
            Err(_) => match task.await {
                Ok(Some(response)) => response,
                Ok(None) => {
                    tracing::error!("Stream ended without a committed response");
                    internal_error()
                }
                Err(err) => {
                    tracing::error!(error = %err, "Request handler panicked");
                    internal_error()
                }
            },
        };

        guard.disarm();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Router;
    use daedalus_core::Error;
    use http::Method;
    use http_body_util::BodyExt;

    fn request(method: Method, uri: &str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    async fn text(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn hello() -> impl daedalus_core::Handler {
        handler_fn(|ctx| Box::pin(async move { ctx.send_text("hello", StatusCode::OK) }))
    }

    #[test]
    fn test_entries_include_trailing_slash_twins() {
        let mut router = Router::new();
        router.get("/", hello());
        router.get("/posts", hello());
        router.any("/ping", hello());

        let table = router.compile().unwrap();
        let entries: Vec<_> = table
            .entries()
            .iter()
            .map(|(m, p)| format!("{m} {p}"))
            .collect();
        assert_eq!(entries, vec!["GET /", "GET /posts", "GET /posts/", " /ping", " /ping/"]);
    }

    #[tokio::test]
    async fn test_trailing_slash_equivalence() {
        let mut router = Router::new();
        router.get("/posts", hello());
        router.any("/any", hello());
        let table = router.compile().unwrap();

        for uri in ["/posts", "/posts/"] {
            assert_eq!(table.dispatch(request(Method::GET, uri)).await.status(), StatusCode::OK);
        }
        for uri in ["/any", "/any/"] {
            assert_eq!(table.dispatch(request(Method::DELETE, uri)).await.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_static_route_for_other_verb_falls_through() {
        fn reply(body: &'static str) -> impl daedalus_core::Handler {
            handler_fn(move |ctx| Box::pin(async move { ctx.send_text(body, StatusCode::OK) }))
        }

        let mut router = Router::new();
        router.get("/posts/create", reply("create"));
        router.put("/posts/:id", reply("update"));
        router.get("/about", reply("about"));
        router.any("/:page", reply("page"));
        let table = router.compile().unwrap();

        let cases = [
            (Method::PUT, "/posts/create", "update"),
            (Method::PUT, "/posts/9", "update"),
            (Method::GET, "/posts/create", "create"),
            (Method::POST, "/about", "page"),
            (Method::GET, "/about/", "about"),
        ];
        for (method, uri, body) in cases {
            let response = table.dispatch(request(method.clone(), uri)).await;
            assert_eq!(response.status(), StatusCode::OK, "{method} {uri}");
            assert_eq!(text(response).await, body, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_unmatched_is_404_through_error_handler() {
        let mut router = Router::new();
        router.get("/posts", hello());
        let table = router.compile().unwrap();

        let response = table.dispatch(request(Method::GET, "/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(text(response).await, r#"{"code":404,"message":"Not Found"}"#);

        let response = table.dispatch(request(Method::POST, "/posts")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stop_without_write_uses_current_status() {
        let mut router = Router::new();
        router.use_middleware(handler_fn(|ctx| {
            Box::pin(async move {
                ctx.with_status(StatusCode::ACCEPTED);
                Ok(())
            })
        }));
        router.get("/", hello());
        let table = router.compile().unwrap();

        let response = table.dispatch(request(Method::GET, "/")).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(text(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let mut router = Router::new();
        router.get(
            "/boom",
            handler_fn(|ctx| {
                Box::pin(async move {
                    assert!(ctx.path() != "/boom", "handler exploded");
                    Ok(())
                })
            }),
        );
        router.get("/ok", hello());
        let table = router.compile().unwrap();

        let response = table.dispatch(request(Method::GET, "/boom")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = table.dispatch(request(Method::GET, "/ok")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_error_after_write_keeps_response() {
        let mut router = Router::new();
        router.get(
            "/",
            handler_fn(|ctx| {
                Box::pin(async move {
                    ctx.send_text("partial", StatusCode::OK)?;
                    Err(Error::other(std::io::Error::other("late failure")))
                })
            }),
        );
        let table = router.compile().unwrap();

        let response = table.dispatch(request(Method::GET, "/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "partial");
    }

    #[tokio::test]
    async fn test_standard_handler_bypasses_middleware() {
        let mut router = Router::new();
        router.use_middleware(handler_fn(|_ctx| {
            Box::pin(async move { Err(StatusError::forbidden().into()) })
        }));
        router.mount_standard("/raw", |_req: Request<Bytes>| async {
            Response::new(full("raw"))
        });
        let table = router.compile().unwrap();

        let response = table.dispatch(request(Method::GET, "/raw")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "raw");

        let response = table.dispatch(request(Method::GET, "/other")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

//! Convention-based CRUD route groups.
//!
//! [`Router::resource`] registers one route per [`Controller`] action under
//! a common prefix:
//!
//! | Method   | Path                | Action   |
//! |----------|---------------------|----------|
//! | `GET`    | `prefix/`           | `index`  |
//! | `GET`    | `prefix/create`     | `create` |
//! | `GET`    | `prefix/:id`        | `show`   |
//! | `GET`    | `prefix/:id/edit`   | `edit`   |
//! | `PUT`    | `prefix/:id`        | `update` |
//! | `DELETE` | `prefix/:id`        | `delete` |
//!
//! `store` is not registered automatically; call [`Resource::store`] to add
//! `POST prefix/`.

use std::fmt;
use std::sync::Arc;

use daedalus_core::{boxed, handler_fn, BoxFuture, Context, Handler, HandlerResult};
use http::Method;

use crate::router::{RouteId, Router};

/// A controller serving the CRUD actions of one resource.
///
/// Every action defaults to doing nothing, which yields an empty `200`.
///
/// # Example
///
/// ```rust
/// use daedalus_core::{BoxFuture, Context, HandlerResult};
/// use daedalus_server::{Controller, Router};
/// use http::StatusCode;
///
/// struct Posts;
///
/// impl Controller for Posts {
///     fn index<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
///         Box::pin(async move { ctx.send_text("all posts", StatusCode::OK) })
///     }
/// }
///
/// let mut router = Router::new();
/// router.resource("/posts", Posts);
/// assert_eq!(router.routes().count(), 6);
/// ```
#[allow(unused_variables)]
pub trait Controller: Send + Sync + 'static {
    /// Lists resources.
    fn index<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Ok(()) })
    }

    /// Shows the creation form.
    fn create<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Ok(()) })
    }

    /// Persists a new resource.
    fn store<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Ok(()) })
    }

    /// Shows one resource.
    fn show<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Ok(()) })
    }

    /// Shows the edit form.
    fn edit<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Ok(()) })
    }

    /// Applies changes to one resource.
    fn update<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Ok(()) })
    }

    /// Removes one resource.
    fn delete<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Ok(()) })
    }
}

/// The actions of a [`Controller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceMethod {
    /// `GET prefix/`
    Index,
    /// `GET prefix/create`
    Create,
    /// `POST prefix/`, only when requested.
    Store,
    /// `GET prefix/:id`
    Show,
    /// `GET prefix/:id/edit`
    Edit,
    /// `PUT prefix/:id`
    Update,
    /// `DELETE prefix/:id`
    Delete,
}

impl ResourceMethod {
    /// Actions registered by [`Router::resource`], in registration order.
    pub const REGISTERED: [Self; 6] = [
        Self::Index,
        Self::Create,
        Self::Show,
        Self::Edit,
        Self::Update,
        Self::Delete,
    ];

    fn method(self) -> Method {
        match self {
            Self::Index | Self::Create | Self::Show | Self::Edit => Method::GET,
            Self::Store => Method::POST,
            Self::Update => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }

    fn path(self, prefix: &str) -> String {
        match self {
            Self::Index | Self::Store => format!("{prefix}/"),
            Self::Create => format!("{prefix}/create"),
            Self::Show | Self::Update | Self::Delete => format!("{prefix}/:id"),
            Self::Edit => format!("{prefix}/:id/edit"),
        }
    }

    fn call<'a>(self, controller: &'a dyn Controller, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        match self {
            Self::Index => controller.index(ctx),
            Self::Create => controller.create(ctx),
            Self::Store => controller.store(ctx),
            Self::Show => controller.show(ctx),
            Self::Edit => controller.edit(ctx),
            Self::Update => controller.update(ctx),
            Self::Delete => controller.delete(ctx),
        }
    }
}

impl fmt::Display for ResourceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Index => "Index",
            Self::Create => "Create",
            Self::Store => "Store",
            Self::Show => "Show",
            Self::Edit => "Edit",
            Self::Update => "Update",
            Self::Delete => "Delete",
        };
        f.write_str(name)
    }
}

fn action(controller: Arc<dyn Controller>, method: ResourceMethod) -> impl Handler {
    handler_fn(move |ctx| {
        let controller = Arc::clone(&controller);
        Box::pin(async move { method.call(&*controller, ctx).await })
    })
}

/// The routes of one controller, borrowed from their [`Router`] until
/// setup moves on.
pub struct Resource<'r> {
    router: &'r mut Router,
    prefix: String,
    controller: Arc<dyn Controller>,
    routes: Vec<(ResourceMethod, RouteId)>,
}

impl fmt::Debug for Resource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("prefix", &self.prefix)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl<'r> Resource<'r> {
    pub(crate) fn register(router: &'r mut Router, prefix: &str, controller: Arc<dyn Controller>) -> Self {
        let prefix = prefix.trim().trim_end_matches('/').to_string();

        let routes = ResourceMethod::REGISTERED
            .iter()
            .map(|&method| {
                let handler = action(Arc::clone(&controller), method);
                let id = router
                    .route(method.method(), &method.path(&prefix), handler)
                    .id();
                (method, id)
            })
            .collect();

        Self {
            router,
            prefix,
            controller,
            routes,
        }
    }

    /// Removes the given actions. Their paths fall through to the
    /// framework's 404 unless another route claims them.
    pub fn exclude(&mut self, methods: &[ResourceMethod]) -> &mut Self {
        let router = &mut *self.router;
        self.routes.retain(|(method, id)| {
            if methods.contains(method) {
                router.remove(*id);
                false
            } else {
                true
            }
        });
        self
    }

    /// Adds the `POST prefix/` route for [`Controller::store`].
    pub fn store(&mut self) -> &mut Self {
        if self.route_id(ResourceMethod::Store).is_some() {
            return self;
        }
        let handler = action(Arc::clone(&self.controller), ResourceMethod::Store);
        let id = self
            .router
            .route(Method::POST, &ResourceMethod::Store.path(&self.prefix), handler)
            .id();
        self.routes.push((ResourceMethod::Store, id));
        self
    }

    /// Appends `handler` to every route still in this resource.
    pub fn use_middleware(&mut self, handler: impl Handler) -> &mut Self {
        let handler = boxed(handler);
        for (_, id) in &self.routes {
            if let Some(route) = self.router.route_mut(*id) {
                route.middleware.push(Arc::clone(&handler));
            }
        }
        self
    }

    /// Returns the route serving `method`, if it is part of the resource.
    #[must_use]
    pub fn route_id(&self, method: ResourceMethod) -> Option<RouteId> {
        self.routes
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, id)| *id)
    }

    /// Lists the actions still registered.
    #[must_use]
    pub fn methods(&self) -> Vec<ResourceMethod> {
        self.routes.iter().map(|(m, _)| *m).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::MethodFilter;

    struct Noop;
    impl Controller for Noop {}

    fn shape(router: &Router) -> Vec<(String, String)> {
        router
            .routes()
            .map(|r| (r.method().label().to_string(), r.pattern().to_string()))
            .collect()
    }

    #[test]
    fn test_registers_six_routes_in_order() {
        let mut router = Router::new();
        router.resource("/posts", Noop);

        let expected = [
            ("GET", "/posts/"),
            ("GET", "/posts/create"),
            ("GET", "/posts/:id"),
            ("GET", "/posts/:id/edit"),
            ("PUT", "/posts/:id"),
            ("DELETE", "/posts/:id"),
        ];
        let expected: Vec<_> = expected
            .iter()
            .map(|(m, p)| ((*m).to_string(), (*p).to_string()))
            .collect();
        assert_eq!(shape(&router), expected);
    }

    #[test]
    fn test_trailing_slash_prefix_is_trimmed() {
        let mut router = Router::new();
        router.resource("/posts/", Noop);
        assert_eq!(router.routes().next().map(|r| r.pattern().to_string()), Some("/posts/".to_string()));
    }

    #[test]
    fn test_exclude_removes_from_router() {
        let mut router = Router::new();
        let methods = router
            .resource("/posts", Noop)
            .exclude(&[ResourceMethod::Edit, ResourceMethod::Delete])
            .methods();

        assert_eq!(
            methods,
            vec![
                ResourceMethod::Index,
                ResourceMethod::Create,
                ResourceMethod::Show,
                ResourceMethod::Update
            ]
        );
        assert_eq!(router.routes().count(), 4);
        assert!(router.routes().all(|r| r.pattern() != "/posts/:id/edit"));
    }

    #[test]
    fn test_use_middleware_attaches_to_remaining_routes() {
        let mut router = Router::new();
        let noop = handler_fn(|ctx| {
            Box::pin(async move {
                ctx.next();
                Ok(())
            })
        });
        router
            .resource("/posts", Noop)
            .exclude(&[ResourceMethod::Create])
            .use_middleware(noop);

        assert!(router.routes().all(|r| r.middleware_len() == 1));
        assert_eq!(router.routes().count(), 5);
    }

    #[test]
    fn test_store_is_opt_in() {
        let mut router = Router::new();
        router.resource("/posts", Noop);
        assert!(router.routes().all(|r| r.method() != &MethodFilter::Only(Method::POST)));

        let mut router = Router::new();
        let mut posts = router.resource("/posts", Noop);
        posts.store().store();
        assert!(posts.route_id(ResourceMethod::Store).is_some());
        assert_eq!(router.routes().count(), 7);
    }

    #[test]
    fn test_resource_method_display() {
        assert_eq!(ResourceMethod::Index.to_string(), "Index");
        assert_eq!(ResourceMethod::Delete.to_string(), "Delete");
    }
}

//! Dispatch table facade over the radix tree.

use http::Method;

use crate::error::InsertError;
use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::Match;

/// A radix tree keyed by path pattern and HTTP method.
///
/// The router is generic over the stored value so the same tree can hold
/// operation names in benches and compiled dispatchers in the server.
///
/// # Example
///
/// ```rust
/// use daedalus_router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(Some(&Method::GET), "/posts/:id", "posts.show").unwrap();
/// router.insert(None, "/health", "health").unwrap();
///
/// let found = router.at(&Method::GET, "/posts/7/").unwrap();
/// assert_eq!(*found.value, "posts.show");
/// assert_eq!(found.params.get("id"), Some("7"));
///
/// assert!(router.at(&Method::POST, "/health").is_some());
/// ```
///
/// # Priority
///
/// 1. Static segments (`/posts/create`)
/// 2. Parameter segments (`/posts/:id`)
/// 3. Wildcards (`/assets/*file`)
///
/// Within one path, a dedicated method entry wins over an any-method entry.
/// A node that does not answer the request method is skipped, so lookup
/// falls back to the next candidate in this order.
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts `value` for `method` at `pattern`. `None` registers the value
    /// for every method.
    pub fn insert(
        &mut self,
        method: Option<&Method>,
        pattern: &str,
        value: T,
    ) -> Result<(), InsertError> {
        self.root.insert(method, pattern, value)?;
        self.route_count += 1;
        Ok(())
    }

    /// Looks up the value answering `method` at `path`.
    #[must_use]
    pub fn at(&self, method: &Method, path: &str) -> Option<Match<'_, T>> {
        let (value, params) = self.root.match_route(method, path)?;
        Some(Match { value, params })
    }

    /// Looks up the method table for `path`, regardless of method.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of inserted entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing was inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

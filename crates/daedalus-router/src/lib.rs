//! # Daedalus Router
//!
//! Radix tree dispatch table used by the Daedalus request-dispatch engine.
//!
//! Patterns use literal segments, `:name` parameters and a trailing
//! `*name` catch-all. Empty segments are ignored while inserting and while
//! matching, so a pattern and its trailing-slash twin share one entry.
//!
//! ```rust
//! use daedalus_router::{normalize, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(Some(&Method::GET), "/posts/:id/edit", 1_u32).unwrap();
//!
//! let found = router.at(&Method::GET, "/posts/3/edit/").unwrap();
//! assert_eq!(*found.value, 1);
//! assert_eq!(normalize("posts//3/"), "/posts/3");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method_router;
mod node;
mod params;
mod router;

pub use error::InsertError;
pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

/// A successful lookup: the stored value and the captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'a, T> {
    /// Value registered for the route.
    pub value: &'a T,
    /// Captured path parameters.
    pub params: Params,
}

/// Returns the canonical form of a pattern or path.
///
/// Empty segments are dropped and the result always starts with `/` and
/// never ends with one, except for the root itself.
#[must_use]
pub fn normalize(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 1);
    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/posts/"), "/posts");
        assert_eq!(normalize("posts/:id"), "/posts/:id");
    }

    #[test]
    fn test_resource_shaped_table() {
        let mut router = Router::new();
        router.insert(Some(&http::Method::GET), "/posts/", "index").unwrap();
        router.insert(Some(&http::Method::GET), "/posts/create", "create").unwrap();
        router.insert(Some(&http::Method::GET), "/posts/:id", "show").unwrap();
        router.insert(Some(&http::Method::GET), "/posts/:id/edit", "edit").unwrap();
        router.insert(Some(&http::Method::PUT), "/posts/:id", "update").unwrap();
        router.insert(Some(&http::Method::DELETE), "/posts/:id", "delete").unwrap();

        let show = router.at(&http::Method::GET, "/posts/7").unwrap();
        assert_eq!(*show.value, "show");
        assert_eq!(show.params.get("id"), Some("7"));
        assert_eq!(
            router.at(&http::Method::PUT, "/posts/7/").map(|m| *m.value),
            Some("update")
        );
        assert!(router.at(&http::Method::POST, "/posts").is_none());
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(path in "[a-z/:]{0,24}") {
            let once = normalize(&path);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(once.starts_with('/'));
        }

        #[test]
        fn trailing_slash_never_changes_match(segs in proptest::collection::vec("[a-z]{1,6}", 1..5)) {
            let pattern = format!("/{}", segs.join("/"));
            let mut router = Router::new();
            router.insert(Some(&http::Method::GET), &pattern, ()).unwrap();
            prop_assert!(router.at(&http::Method::GET, &pattern).is_some());
            let slashed = format!("{pattern}/");
            prop_assert!(router.at(&http::Method::GET, &slashed).is_some());
        }
    }
}

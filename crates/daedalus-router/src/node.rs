//! Radix tree nodes.
//!
//! Patterns are split on `/` into segments. Empty segments are dropped, so
//! `/posts`, `/posts/` and `posts` all land on the same node. This is what
//! gives the dispatch table its trailing-slash tolerance.
//!
//! Segment syntax:
//!
//! - `posts` matches the literal segment
//! - `:id` captures one segment as `id`
//! - `*path` captures the rest of the path (zero or more segments) as `path`

use http::Method;

use crate::error::InsertError;
use crate::method_router::MethodRouter;
use crate::params::Params;

/// Kind of a pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal segment.
    Static,
    /// Named parameter, `:name`.
    Param(String),
    /// Catch-all, `*name`.
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    segment: String,
    kind: SegmentKind,
    methods: Option<MethodRouter<T>>,
    /// Sorted by segment for binary search.
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
    wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn new(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    /// Returns the raw segment text.
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Returns the segment kind.
    #[must_use]
    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    /// Splits a pattern into typed segments.
    pub fn parse_pattern(pattern: &str) -> Vec<(String, SegmentKind)> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if let Some(name) = s.strip_prefix(':') {
                    (s.to_string(), SegmentKind::Param(name.to_string()))
                } else if let Some(name) = s.strip_prefix('*') {
                    (s.to_string(), SegmentKind::Wildcard(name.to_string()))
                } else {
                    (s.to_string(), SegmentKind::Static)
                }
            })
            .collect()
    }

    /// Inserts `value` under `pattern` for `method` (`None` for any method).
    pub fn insert(
        &mut self,
        method: Option<&Method>,
        pattern: &str,
        value: T,
    ) -> Result<(), InsertError> {
        let segments = Self::parse_pattern(pattern);
        if let Some(pos) = segments
            .iter()
            .position(|(_, k)| matches!(k, SegmentKind::Wildcard(_)))
        {
            if pos + 1 != segments.len() {
                return Err(InsertError::WildcardNotLast {
                    pattern: pattern.to_string(),
                });
            }
        }

        let target = self.descend(&segments, pattern)?;
        target
            .methods
            .get_or_insert_with(MethodRouter::new)
            .set(method, value)
            .map_err(|_| InsertError::Duplicate {
                method: method.map_or_else(|| "ANY".to_string(), ToString::to_string),
                pattern: crate::normalize(pattern),
            })
    }

    /// Walks (and grows) the tree down to the node for `segments`.
    fn descend(
        &mut self,
        segments: &[(String, SegmentKind)],
        pattern: &str,
    ) -> Result<&mut Node<T>, InsertError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return Ok(self);
        };

        let child = match kind {
            SegmentKind::Static => {
                let idx = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(idx) => idx,
                    Err(idx) => {
                        self.static_children
                            .insert(idx, Node::new(segment.clone(), SegmentKind::Static));
                        idx
                    }
                };
                &mut self.static_children[idx]
            }
            SegmentKind::Param(name) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::new(segment.clone(), kind.clone())));
                if let SegmentKind::Param(existing) = &child.kind {
                    if existing != name {
                        return Err(InsertError::ParamConflict {
                            existing: existing.clone(),
                            new: name.clone(),
                            pattern: pattern.to_string(),
                        });
                    }
                }
                child.as_mut()
            }
            SegmentKind::Wildcard(name) => {
                let child = self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new(segment.clone(), kind.clone())));
                if let SegmentKind::Wildcard(existing) = &child.kind {
                    if existing != name {
                        return Err(InsertError::ParamConflict {
                            existing: existing.clone(),
                            new: name.clone(),
                            pattern: pattern.to_string(),
                        });
                    }
                }
                child.as_mut()
            }
        };

        child.descend(remaining, pattern)
    }

    /// Matches a request path.
    ///
    /// Returns the method table of the matching node together with the
    /// captured parameters.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.match_filtered(None, path)
    }

    /// Matches a request path, only accepting nodes that answer `method`.
    ///
    /// A static node registered for other verbs does not shadow a param or
    /// wildcard sibling that answers `method`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<(&T, Params)> {
        let (methods, params) = self.match_filtered(Some(method), path)?;
        Some((methods.at(method)?, params))
    }

    fn match_filtered(
        &self,
        method: Option<&Method>,
        path: &str,
    ) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, method, &mut params)?;
        Some((methods, params))
    }

    fn accepts<'a>(&'a self, method: Option<&Method>) -> Option<&'a MethodRouter<T>> {
        let methods = self.methods.as_ref()?;
        match method {
            Some(method) if methods.at(method).is_none() => None,
            _ => Some(methods),
        }
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        method: Option<&Method>,
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            if let Some(methods) = self.accepts(method) {
                return Some(methods);
            }
            // A wildcard may capture nothing at all.
            return self.match_wildcard(segments, method, params);
        };

        // Static first, then param, then wildcard.
        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, method, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), (*segment).to_string());
                if let Some(found) = child.match_segments(remaining, method, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        self.match_wildcard(segments, method, params)
    }

    fn match_wildcard<'a>(
        &'a self,
        segments: &[&str],
        method: Option<&Method>,
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let child = self.wildcard_child.as_ref()?;
        let methods = child.accepts(method)?;
        if let SegmentKind::Wildcard(name) = &child.kind {
            params.push(name.clone(), segments.join("/"));
        }
        Some(methods)
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern_kinds() {
        let segments = Node::<()>::parse_pattern("/posts/:id/*rest");
        assert_eq!(
            segments,
            vec![
                ("posts".to_string(), SegmentKind::Static),
                (":id".to_string(), SegmentKind::Param("id".to_string())),
                ("*rest".to_string(), SegmentKind::Wildcard("rest".to_string())),
            ]
        );
    }

    #[test]
    fn test_parse_pattern_drops_empty_segments() {
        assert_eq!(
            Node::<()>::parse_pattern("/posts/"),
            Node::<()>::parse_pattern("/posts")
        );
        assert!(Node::<()>::parse_pattern("/").is_empty());
    }

    #[test]
    fn test_static_and_param_match() {
        let mut root = Node::root();
        root.insert(Some(&Method::GET), "/posts/:id", "show").unwrap();

        let (methods, params) = root.match_path("/posts/42").unwrap();
        assert_eq!(methods.at(&Method::GET), Some(&"show"));
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_static_priority_over_param() {
        let mut root = Node::root();
        root.insert(Some(&Method::GET), "/posts/create", "create").unwrap();
        root.insert(Some(&Method::GET), "/posts/:id", "show").unwrap();

        let (methods, params) = root.match_path("/posts/create").unwrap();
        assert_eq!(methods.at(&Method::GET), Some(&"create"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_backtracking_drops_stale_params() {
        let mut root = Node::root();
        root.insert(Some(&Method::GET), "/a/:x/b", "param").unwrap();
        root.insert(Some(&Method::GET), "/a/*rest", "wild").unwrap();

        let (methods, params) = root.match_path("/a/1/c").unwrap();
        assert_eq!(methods.at(&Method::GET), Some(&"wild"));
        assert_eq!(params.get("x"), None);
        assert_eq!(params.get("rest"), Some("1/c"));
    }

    #[test]
    fn test_wildcard_matches_empty_remainder() {
        let mut root = Node::root();
        root.insert(Some(&Method::GET), "/assets/*file", "static").unwrap();

        let (_, params) = root.match_path("/assets/").unwrap();
        assert_eq!(params.get("file"), Some(""));
    }

    #[test]
    fn test_wildcard_must_be_last() {
        let mut root = Node::<()>::root();
        let err = root
            .insert(Some(&Method::GET), "/files/*path/meta", ())
            .unwrap_err();
        assert!(matches!(err, InsertError::WildcardNotLast { .. }));
    }

    #[test]
    fn test_param_name_conflict() {
        let mut root = Node::root();
        root.insert(Some(&Method::GET), "/posts/:id", 1).unwrap();
        let err = root
            .insert(Some(&Method::PUT), "/posts/:slug", 2)
            .unwrap_err();
        assert!(matches!(err, InsertError::ParamConflict { .. }));
    }

    #[test]
    fn test_duplicate_insert() {
        let mut root = Node::root();
        root.insert(Some(&Method::GET), "/posts", 1).unwrap();
        let err = root.insert(Some(&Method::GET), "/posts/", 2).unwrap_err();
        assert_eq!(
            err,
            InsertError::Duplicate {
                method: "GET".to_string(),
                pattern: "/posts".to_string(),
            }
        );
    }

    #[test]
    fn test_root_path() {
        let mut root = Node::root();
        root.insert(None, "/", "home").unwrap();
        let (methods, _) = root.match_path("/").unwrap();
        assert_eq!(methods.at(&Method::PATCH), Some(&"home"));
    }

    #[test]
    fn test_static_sibling_for_other_verb_does_not_shadow() {
        let mut root = Node::root();
        root.insert(Some(&Method::GET), "/posts/create", "create").unwrap();
        root.insert(Some(&Method::PUT), "/posts/:id", "update").unwrap();
        root.insert(Some(&Method::GET), "/about", "about").unwrap();
        root.insert(None, "/:page", "page").unwrap();

        let (value, params) = root.match_route(&Method::PUT, "/posts/create").unwrap();
        assert_eq!(*value, "update");
        assert_eq!(params.get("id"), Some("create"));

        let (value, params) = root.match_route(&Method::POST, "/about").unwrap();
        assert_eq!(*value, "page");
        assert_eq!(params.get("page"), Some("about"));

        let (value, params) = root.match_route(&Method::GET, "/posts/create").unwrap();
        assert_eq!(*value, "create");
        assert!(params.is_empty());
    }

    #[test]
    fn test_wildcard_answers_other_verb() {
        let mut root = Node::root();
        root.insert(Some(&Method::GET), "/files/:name", "show").unwrap();
        root.insert(Some(&Method::DELETE), "/files/*path", "remove").unwrap();

        let (value, params) = root.match_route(&Method::DELETE, "/files/a.txt").unwrap();
        assert_eq!(*value, "remove");
        assert_eq!(params.get("name"), None);
        assert_eq!(params.get("path"), Some("a.txt"));
        assert!(root.match_route(&Method::POST, "/files/a.txt").is_none());
    }
}

//! Named-route URL reconstruction.

use crate::error::{Error, Result};

/// Read-only index of named route patterns.
///
/// The router builds one while compiling and shares it with every
/// request context through an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct RouteIndex {
    named: Vec<(String, String)>,
}

impl RouteIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `pattern` under `name`. Lookups resolve to the first entry
    /// with a given name.
    pub fn push(&mut self, name: impl Into<String>, pattern: impl Into<String>) {
        self.named.push((name.into(), pattern.into()));
    }

    /// Returns the pattern registered under `name`.
    #[must_use]
    pub fn pattern(&self, name: &str) -> Option<&str> {
        self.named
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.as_str())
    }

    /// Builds a URL for the route named `name`.
    ///
    /// Each `:key` (or `*key`) segment is replaced with the value supplied
    /// for `key`. A placeholder without a value is an error.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_core::RouteIndex;
    ///
    /// let mut index = RouteIndex::new();
    /// index.push("item.show", "/items/:id");
    ///
    /// assert_eq!(index.make_url("item.show", &[("id", "42")]).unwrap(), "/items/42");
    /// assert!(index.make_url("nonexistent", &[]).is_err());
    /// ```
    pub fn make_url(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
        let pattern = self.pattern(name).ok_or_else(|| Error::RouteNotFound {
            name: name.to_string(),
        })?;
        substitute(name, pattern, params)
    }

    /// Returns the number of named entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.named.len()
    }

    /// Returns true if no route is named.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named.is_empty()
    }
}

fn substitute(name: &str, pattern: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(pattern.len());
    for (i, segment) in pattern.split('/').enumerate() {
        if i > 0 {
            out.push('/');
        }
        match segment.strip_prefix(':').or_else(|| segment.strip_prefix('*')) {
            Some(key) => {
                let value = params
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| *v)
                    .ok_or_else(|| Error::MissingParam {
                        name: name.to_string(),
                        param: key.to_string(),
                    })?;
                out.push_str(value);
            }
            None => out.push_str(segment),
        }
    }
    Ok(out)
}

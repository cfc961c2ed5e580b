//! Per-path method table.
//!
//! A [`MethodRouter`] holds the values registered for one path, keyed by
//! HTTP method, plus an optional "any method" slot that answers for every
//! verb without a dedicated entry.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to values for a single path.
///
/// # Example
///
/// ```rust
/// use daedalus_router::MethodRouter;
/// use http::Method;
///
/// let mut methods = MethodRouter::new();
/// methods.set(Some(&Method::GET), "index").unwrap();
/// methods.set(None, "fallback").unwrap();
///
/// assert_eq!(methods.at(&Method::GET), Some(&"index"));
/// assert_eq!(methods.at(&Method::DELETE), Some(&"fallback"));
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    by_method: SmallVec<[(Method, T); 2]>,
    any: Option<T>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            by_method: SmallVec::new(),
            any: None,
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty method table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `method`, or in the any-method slot when `method`
    /// is `None`.
    ///
    /// The slot is never overwritten: when it is already taken the value is
    /// handed back as the error.
    pub fn set(&mut self, method: Option<&Method>, value: T) -> Result<(), T> {
        match method {
            None if self.any.is_some() => Err(value),
            None => {
                self.any = Some(value);
                Ok(())
            }
            Some(m) if self.by_method.iter().any(|(existing, _)| existing == m) => Err(value),
            Some(m) => {
                self.by_method.push((m.clone(), value));
                Ok(())
            }
        }
    }

    /// Returns the value answering `method`.
    ///
    /// A dedicated entry wins over the any-method slot.
    #[must_use]
    pub fn at(&self, method: &Method) -> Option<&T> {
        self.by_method
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, v)| v)
            .or(self.any.as_ref())
    }

    /// Returns true if an any-method value is registered.
    #[must_use]
    pub fn has_any(&self) -> bool {
        self.any.is_some()
    }

    /// Returns the methods with dedicated entries, in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.by_method.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_method.is_empty() && self.any.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let methods: MethodRouter<u8> = MethodRouter::new();
        assert!(methods.is_empty());
        assert_eq!(methods.at(&Method::GET), None);
    }

    #[test]
    fn test_dedicated_method_wins_over_any() {
        let mut methods = MethodRouter::new();
        methods.set(None, 0).unwrap();
        methods.set(Some(&Method::POST), 1).unwrap();

        assert_eq!(methods.at(&Method::POST), Some(&1));
        assert_eq!(methods.at(&Method::GET), Some(&0));
        assert!(methods.has_any());
    }

    #[test]
    fn test_duplicate_method_is_rejected() {
        let mut methods = MethodRouter::new();
        methods.set(Some(&Method::GET), "first").unwrap();

        assert_eq!(methods.set(Some(&Method::GET), "second"), Err("second"));
        assert_eq!(methods.at(&Method::GET), Some(&"first"));
    }

    #[test]
    fn test_duplicate_any_is_rejected() {
        let mut methods = MethodRouter::new();
        methods.set(None, 1).unwrap();
        assert_eq!(methods.set(None, 2), Err(2));
    }

    #[test]
    fn test_allowed_methods() {
        let mut methods = MethodRouter::new();
        methods.set(Some(&Method::GET), ()).unwrap();
        methods.set(Some(&Method::PUT), ()).unwrap();

        assert_eq!(methods.allowed_methods(), vec![Method::GET, Method::PUT]);
    }
}

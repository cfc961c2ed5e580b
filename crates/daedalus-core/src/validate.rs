//! Structural validation of decoded request data.
//!
//! Types opt in by implementing [`Validate`] and reporting every broken rule
//! to a [`Violations`] collector. The rule names follow the familiar tag
//! vocabulary (`required`, `min=3`, `email`, ...) and end up in the
//! user-facing message produced by [`rule_message`].
//!
//! ```
//! use daedalus_core::{Validate, Violations};
//!
//! struct SignUp {
//!     name: String,
//!     email: String,
//! }
//!
//! impl Validate for SignUp {
//!     fn validate(&self, v: &mut Violations) {
//!         v.required("Name", &self.name);
//!         v.email("Email", &self.email);
//!     }
//! }
//!
//! let errors = SignUp { name: String::new(), email: "a@b.io".into() }.field_errors();
//! assert_eq!(
//!     errors.get("Name"),
//!     Some("This field does not meet the following rule: \"required\".")
//! );
//! assert!(errors.get("Email").is_none());
//! ```

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;

use crate::error::Error;

/// Renders the user-facing message for a broken rule.
#[must_use]
pub fn rule_message(rule: &str) -> String {
    format!("This field does not meet the following rule: \"{rule}\".")
}

/// One broken rule on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Field name as exposed to clients.
    pub field: String,
    /// Rule name, e.g. `required` or `min=3`.
    pub rule: String,
}

/// Collector handed to [`Validate::validate`].
#[derive(Debug, Clone, Default)]
pub struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `field` broke `rule`.
    pub fn push(&mut self, field: impl Into<String>, rule: impl Into<String>) {
        self.items.push(Violation {
            field: field.into(),
            rule: rule.into(),
        });
    }

    /// Records `rule` for `field` unless `ok` holds.
    pub fn check(&mut self, field: &str, rule: &str, ok: bool) -> &mut Self {
        if !ok {
            self.push(field, rule);
        }
        self
    }

    /// `required`: the value is not blank.
    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, "required", !value.trim().is_empty())
    }

    /// `min=N`: at least `min` characters.
    pub fn min_len(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        let ok = value.chars().count() >= min;
        self.check(field, &format!("min={min}"), ok)
    }

    /// `max=N`: at most `max` characters.
    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        let ok = value.chars().count() <= max;
        self.check(field, &format!("max={max}"), ok)
    }

    /// `gte=N`: numeric lower bound.
    pub fn gte<T: PartialOrd + Display>(&mut self, field: &str, value: T, min: T) -> &mut Self {
        let ok = value >= min;
        self.check(field, &format!("gte={min}"), ok)
    }

    /// `lte=N`: numeric upper bound.
    pub fn lte<T: PartialOrd + Display>(&mut self, field: &str, value: T, max: T) -> &mut Self {
        let ok = value <= max;
        self.check(field, &format!("lte={max}"), ok)
    }

    /// `email`: a plausible address. Empty values pass; pair with
    /// [`required`](Self::required) when the field is mandatory.
    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, "email", value.is_empty() || looks_like_email(value))
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the recorded violations in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Violation] {
        &self.items
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
        && !value.chars().any(char::is_whitespace)
}

/// Field-level validation messages, keyed by field name.
///
/// Serializes as a flat JSON object, ready to be sent back to a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    fields: BTreeMap<String, String>,
}

impl FieldErrors {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message for `field`. A later message for the same field
    /// replaces the earlier one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.insert(field.into(), message.into());
    }

    /// Returns the message for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Returns true if no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterates over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<&Violations> for FieldErrors {
    fn from(violations: &Violations) -> Self {
        let mut errors = Self::new();
        for v in violations.as_slice() {
            errors.insert(v.field.clone(), rule_message(&v.rule));
        }
        errors
    }
}

/// Types that can check their own structural rules.
pub trait Validate {
    /// Reports every broken rule to `v`.
    fn validate(&self, v: &mut Violations);

    /// Runs [`validate`](Self::validate) and renders the messages.
    fn field_errors(&self) -> FieldErrors {
        let mut v = Violations::new();
        self.validate(&mut v);
        FieldErrors::from(&v)
    }
}

/// Outcome of `Context::decode_and_validate`.
#[derive(Debug)]
pub enum Decoded<T> {
    /// Decoded and no rule was broken.
    Valid(T),
    /// Decoded, but at least one rule was broken.
    Invalid(T, FieldErrors),
    /// The body could not be decoded at all.
    Malformed(Error),
}

impl<T> Decoded<T> {
    /// Returns true for [`Decoded::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Returns the field errors, empty unless the value was invalid.
    #[must_use]
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            Self::Invalid(_, errors) => errors.clone(),
            _ => FieldErrors::new(),
        }
    }

    /// Collapses into `(value, errors, ok)`; a malformed body becomes the
    /// error.
    pub fn into_parts(self) -> Result<(T, FieldErrors, bool), Error> {
        match self {
            Self::Valid(value) => Ok((value, FieldErrors::new(), true)),
            Self::Invalid(value, errors) => Ok((value, errors, false)),
            Self::Malformed(err) => Err(err),
        }
    }
}

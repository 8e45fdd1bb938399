//! # Namespace identifier.
//!
//! [`Namespace`] is an opaque, immutable token naming one partition of the
//! shared resource space. It is cheap to clone (`Arc<str>` inside) so every
//! loop handle, event and error can carry its own copy.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Opaque name of a resource partition served by exactly one control loop.
///
/// No validation is applied: the supervisor never interprets namespace names,
/// and duplicates are allowed (each produces an independent loop).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(Arc<str>);

impl Namespace {
    /// Creates a namespace from any string-like value.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the namespace as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for Namespace {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&String> for Namespace {
    fn from(s: &String) -> Self {
        Self(Arc::from(s.as_str()))
    }
}

impl From<Arc<str>> for Namespace {
    fn from(s: Arc<str>) -> Self {
        Self(s)
    }
}

impl From<&Namespace> for Namespace {
    fn from(ns: &Namespace) -> Self {
        ns.clone()
    }
}

impl From<Namespace> for Arc<str> {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Namespace {
    fn borrow(&self) -> &str {
        &self.0
    }
}

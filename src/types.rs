//! The `Type` label: the namespace over which scores, notes, and LHS
//! selection are keyed (spec §3 "Type").

use std::borrow::Cow;
use std::fmt;

/// A user-chosen label attached to fnodes by rules.
///
/// Cheap to clone (backed by `Cow<'static, str>`) so that the common case of
/// declaring types as `&'static str` literals in rule construction costs
/// nothing, while rules built at runtime can still supply an owned `String`.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Type(Cow<'static, str>);

impl Type {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Type {
    fn from(s: &'static str) -> Self {
        Type(Cow::Borrowed(s))
    }
}

impl From<String> for Type {
    fn from(s: String) -> Self {
        Type(Cow::Owned(s))
    }
}

impl From<&Type> for Type {
    fn from(t: &Type) -> Self {
        t.clone()
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.0)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Type {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! Error type for the canonicalizer.

use thiserror::Error;

/// The kind of value that made a tree unserializable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonErrorKind {
    /// A value that has no canonical representation (e.g. `undefined`).
    Undefined,
    /// A date/time value; callers must pass an ISO-8601 string instead.
    DateTime,
    /// An integer too large to round-trip through `i64`/`f64`.
    BigInteger,
    /// An associative or set container other than the canonical map/sequence.
    UnsupportedContainer,
    /// A regular expression value.
    Regex,
    /// A function or closure value.
    Function,
    /// A symbol value.
    Symbol,
    /// A non-finite number (`NaN`, `+Inf`, `-Inf`).
    NonFiniteNumber,
    /// A reference cycle in the value tree.
    CircularReference,
    /// An opaque, non-plain object instance.
    NonPlainObject,
    /// A mapping key that could be used for prototype pollution.
    DangerousKey,
}

impl std::fmt::Display for CanonErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Undefined => "undefined value",
            Self::DateTime => "date/time value",
            Self::BigInteger => "big-integer value",
            Self::UnsupportedContainer => "unsupported associative/set container",
            Self::Regex => "regex value",
            Self::Function => "function value",
            Self::Symbol => "symbol value",
            Self::NonFiniteNumber => "non-finite number",
            Self::CircularReference => "circular reference",
            Self::NonPlainObject => "non-plain object instance",
            Self::DangerousKey => "dangerous key",
        };
        f.write_str(s)
    }
}

/// Raised when a value tree cannot be canonicalized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} at {path}")]
pub struct CanonError {
    pub kind: CanonErrorKind,
    pub path: String,
}

impl CanonError {
    pub fn new(kind: CanonErrorKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

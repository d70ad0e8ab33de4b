//! The untrusted input tree and its validated canonical counterpart.
//!
//! [`RawValue`] is what callers build from a parsed JSON payload or
//! construct directly; it deliberately carries variants for every value
//! kind §4.1 forbids so call sites (and tests) can express them without
//! reaching for a foreign-language runtime concept. [`canon`](crate::canon)
//! converts a `RawValue` tree into the strict [`CanonValue`] tree, or fails
//! with a [`CanonError`](crate::CanonError) naming the offending path.

use std::collections::BTreeMap;

/// A value as it arrives at the boundary of the canonicalizer, before
/// validation. Only [`RawValue::Null`], [`RawValue::Bool`], [`RawValue::Int`],
/// [`RawValue::Float`], [`RawValue::Str`], [`RawValue::Seq`] and
/// [`RawValue::Map`] survive into a [`CanonValue`]; every other variant is
/// rejected with a typed, path-qualified error.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<RawValue>),
    /// Insertion order is irrelevant; [`canon`](crate::canon) sorts keys by
    /// Unicode code point before serializing.
    Map(Vec<(String, RawValue)>),

    /// No canonical representation (analogous to an uninitialized slot).
    Undefined,
    /// Must be supplied as an ISO-8601 string instead.
    DateTime(chrono::DateTime<chrono::Utc>),
    /// A decimal string too large to represent as `i64`/`f64`.
    BigInt(String),
    /// A `Set`-like container, distinct from an ordered sequence.
    Set(Vec<RawValue>),
    Regex(String),
    Function,
    Symbol(String),
    /// A cycle back to an ancestor node.
    Circular,
    /// An opaque object instance that is not a plain map/sequence.
    NonPlainObject(String),
}

impl RawValue {
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    pub fn map(pairs: impl IntoIterator<Item = (impl Into<String>, RawValue)>) -> Self {
        Self::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Convert a parsed JSON value into a `RawValue` tree. This is the only
    /// place a caller-provided JSON payload is parsed before hashing.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::String(s) => Self::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Self::Seq(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    // u64 values beyond i64::MAX have no lossless i64 form.
                    if u <= i64::MAX as u64 {
                        Self::Int(u as i64)
                    } else {
                        Self::BigInt(n.to_string())
                    }
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::BigInt(n.to_string())
                }
            }
        }
    }
}

/// The strict, validated value tree that [`crate::canon`] serializes.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonValue {
    Null,
    Bool(bool),
    Int(i64),
    /// A finite decimal number, stored in the bit pattern that must be
    /// serialized; non-finite values never reach this variant.
    Dec(f64),
    Str(String),
    Seq(Vec<CanonValue>),
    /// Keys are sorted by Unicode code point at construction time.
    Map(BTreeMap<String, CanonValue>),
}

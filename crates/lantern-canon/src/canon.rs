//! Strict canonical serialization.
//!
//! `canon()` is the single source of truth for turning a value tree into
//! the exact bytes that get hashed. Nothing else in this workspace is
//! allowed to define a competing notion of "canonical bytes" — see
//! `tests::no_other_crate_defines_hashing_primitives` for the drift check.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::{CanonError, CanonErrorKind};
use crate::value::{CanonValue, RawValue};

const DANGEROUS_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

/// Validate a [`RawValue`] tree and serialize it to canonical bytes.
///
/// Mapping keys are emitted in lexicographic code-point order, arrays keep
/// their original order, and every value that has no canonical
/// representation is rejected with a [`CanonError`] naming the offending
/// path (e.g. `$.a.b[2]`).
pub fn canon(value: &RawValue) -> Result<Vec<u8>, CanonError> {
    let validated = validate(value, "$")?;
    let mut out = Vec::new();
    write_value(&validated, &mut out);
    Ok(out)
}

fn validate(value: &RawValue, path: &str) -> Result<CanonValue, CanonError> {
    match value {
        RawValue::Null => Ok(CanonValue::Null),
        RawValue::Bool(b) => Ok(CanonValue::Bool(*b)),
        RawValue::Int(i) => Ok(CanonValue::Int(*i)),
        RawValue::Float(f) => {
            if f.is_finite() {
                Ok(CanonValue::Dec(*f))
            } else {
                Err(CanonError::new(CanonErrorKind::NonFiniteNumber, path))
            }
        }
        RawValue::Str(s) => Ok(CanonValue::Str(s.clone())),
        RawValue::Seq(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let child_path = format!("{path}[{i}]");
                out.push(validate(item, &child_path)?);
            }
            Ok(CanonValue::Seq(out))
        }
        RawValue::Map(pairs) => {
            let mut out = BTreeMap::new();
            for (key, val) in pairs {
                if DANGEROUS_KEYS.contains(&key.as_str()) {
                    let child_path = format!("{path}.{key}");
                    return Err(CanonError::new(CanonErrorKind::DangerousKey, child_path));
                }
                let child_path = format!("{path}.{key}");
                out.insert(key.clone(), validate(val, &child_path)?);
            }
            Ok(CanonValue::Map(out))
        }
        RawValue::Undefined => Err(CanonError::new(CanonErrorKind::Undefined, path)),
        RawValue::DateTime(_) => Err(CanonError::new(CanonErrorKind::DateTime, path)),
        RawValue::BigInt(_) => Err(CanonError::new(CanonErrorKind::BigInteger, path)),
        RawValue::Set(_) => Err(CanonError::new(CanonErrorKind::UnsupportedContainer, path)),
        RawValue::Regex(_) => Err(CanonError::new(CanonErrorKind::Regex, path)),
        RawValue::Function => Err(CanonError::new(CanonErrorKind::Function, path)),
        RawValue::Symbol(_) => Err(CanonError::new(CanonErrorKind::Symbol, path)),
        RawValue::Circular => Err(CanonError::new(CanonErrorKind::CircularReference, path)),
        RawValue::NonPlainObject(_) => {
            Err(CanonError::new(CanonErrorKind::NonPlainObject, path))
        }
    }
}

fn write_value(value: &CanonValue, out: &mut Vec<u8>) {
    match value {
        CanonValue::Null => out.extend_from_slice(b"null"),
        CanonValue::Bool(true) => out.extend_from_slice(b"true"),
        CanonValue::Bool(false) => out.extend_from_slice(b"false"),
        CanonValue::Int(i) => {
            let mut buf = String::new();
            let _ = write!(buf, "{i}");
            out.extend_from_slice(buf.as_bytes());
        }
        CanonValue::Dec(f) => write_finite_number(*f, out),
        CanonValue::Str(s) => write_json_string(s, out),
        CanonValue::Seq(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out);
            }
            out.push(b']');
        }
        CanonValue::Map(map) => {
            out.push(b'{');
            for (i, (key, val)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_json_string(key, out);
                out.push(b':');
                write_value(val, out);
            }
            out.push(b'}');
        }
    }
}

/// Render a finite `f64` the same way on every run: shortest round-tripping
/// decimal form, always containing a fractional part so `1.0` never
/// collapses into the integer lane.
fn write_finite_number(f: f64, out: &mut Vec<u8>) {
    let mut s = format!("{f}");
    if !s.contains('.') && !s.contains('e') && !s.contains('E') {
        s.push_str(".0");
    }
    out.extend_from_slice(s.as_bytes());
}

fn write_json_string(s: &str, out: &mut Vec<u8>) {
    out.push(b'"');
    for c in s.chars() {
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\u{0008}' => out.extend_from_slice(b"\\b"),
            '\u{000C}' => out.extend_from_slice(b"\\f"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                let mut buf = String::new();
                let _ = write!(buf, "\\u{:04x}", c as u32);
                out.extend_from_slice(buf.as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::RawValue as V;
    use proptest::prelude::*;

    #[test]
    fn order_insensitive_maps() {
        let a = V::map([("a", V::Int(1)), ("b", V::Int(2))]);
        let b = V::map([("b", V::Int(2)), ("a", V::Int(1))]);
        assert_eq!(canon(&a).unwrap(), canon(&b).unwrap());
    }

    #[test]
    fn arrays_preserve_order() {
        let a = V::Seq(vec![V::Int(1), V::Int(2)]);
        let b = V::Seq(vec![V::Int(2), V::Int(1)]);
        assert_ne!(canon(&a).unwrap(), canon(&b).unwrap());
    }

    #[test]
    fn rejects_undefined_with_path() {
        let v = V::map([("a", V::map([("b", V::Undefined)]))]);
        let err = canon(&v).unwrap_err();
        assert!(err.path.contains("$.a.b"), "path was {}", err.path);
    }

    #[test]
    fn rejects_dangerous_key() {
        let v = V::map([("__proto__", V::Int(1))]);
        let err = canon(&v).unwrap_err();
        assert_eq!(err.kind, CanonErrorKind::DangerousKey);
    }

    #[test]
    fn rejects_non_finite_number() {
        let v = V::map([("x", V::Float(f64::NAN))]);
        let err = canon(&v).unwrap_err();
        assert_eq!(err.kind, CanonErrorKind::NonFiniteNumber);
    }

    #[test]
    fn array_index_in_path() {
        let v = V::Seq(vec![V::Int(1), V::Int(2), V::Undefined]);
        let err = canon(&v).unwrap_err();
        assert_eq!(err.path, "$[2]");
    }

    proptest! {
        /// P1: canon is deterministic across repeated calls on the same tree.
        #[test]
        fn deterministic_canon(a in any::<i64>(), b in ".*", c in any::<bool>()) {
            let v = V::map([
                ("a", V::Int(a)),
                ("b", V::str(b)),
                ("c", V::Bool(c)),
            ]);
            let first = canon(&v).unwrap();
            let second = canon(&v).unwrap();
            prop_assert_eq!(first, second);
        }

        /// P2: key order never affects the serialized bytes.
        #[test]
        fn order_insensitive_prop(a in any::<i64>(), b in any::<i64>(), c in any::<i64>()) {
            let m1 = V::map([("a", V::Int(a)), ("b", V::Int(b)), ("c", V::Int(c))]);
            let m2 = V::map([("c", V::Int(c)), ("a", V::Int(a)), ("b", V::Int(b))]);
            prop_assert_eq!(canon(&m1).unwrap(), canon(&m2).unwrap());
        }
    }
}

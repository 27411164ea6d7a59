//! Subset containment between value trees.
//!
//! [`contains_subset`] answers whether everything the candidate (`subset`)
//! actually specifies is present, unchanged, in the reference (`superset`).
//! The reference may carry extra fields, keys and elements. Matching rules
//! depend on the candidate's shape:
//!
//! - struct records: both sides must declare the same fields in the same
//!   order. Hidden and zero-valued fields are not specified and are skipped;
//!   every other field must match the same field in the reference.
//! - map records: every key must exist in the reference and match. There is no
//!   zero-value exemption for map entries.
//! - sequences: order-insensitive multiset containment. Each candidate element
//!   consumes the first unused reference element that matches it.
//! - scalars: equality. Numbers compare by value, so `1` equals `1.0`.
//!
//! The first mismatch found in a depth-first walk is returned as is.

mod error;

use std::panic::{self, AssertUnwindSafe};

use indexmap::IndexMap;
use serde_json::Number;

pub use error::{ErrorKind, Mismatch, PathSegment, SubsetError, ValuePath};

use crate::logging::{debug, trace};
use crate::value::{Field, Record, Scalar, Value};

/// Trees deeper than this are rejected rather than walked.
pub const MAX_DEPTH: usize = 128;

/// Check whether `subset` is contained in `superset`.
///
/// Returns `Ok(())` on a match. A structural mismatch anywhere in the trees
/// yields [`SubsetError::NotASubset`]; a fault during traversal is caught here
/// and yields [`SubsetError::RecoveredFromPanic`].
///
/// Catching a panic does not silence it: the installed panic hook (by default
/// the one printing to stderr) still runs before the error is returned.
pub fn contains_subset(superset: &Value, subset: &Value) -> Result<(), SubsetError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        Matcher::default().contains(superset, subset)
    }))
    .unwrap_or_else(|payload| {
        Err(SubsetError::RecoveredFromPanic {
            message: panic_message(payload.as_ref()),
        })
    });

    if let Err(e) = &result {
        debug!("subset check failed: {e}");
    }
    result
}

/// Boolean mirror of [`contains_subset`]: true exactly when it returns `Ok`.
pub fn is_subset(superset: &Value, subset: &Value) -> bool {
    contains_subset(superset, subset).is_ok()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.to_owned()
    } else {
        "unknown fault".to_owned()
    }
}

/// Per-call traversal state. Only the current path is tracked.
#[derive(Default)]
struct Matcher {
    path: ValuePath,
}

impl Matcher {
    fn mismatch(&self, reason: Mismatch) -> SubsetError {
        SubsetError::NotASubset {
            path: self.path.to_owned(),
            reason,
        }
    }

    /// Recurse into a child node, keeping the path in step.
    fn descend(
        &mut self,
        segment: PathSegment,
        superset: &Value,
        subset: &Value,
    ) -> Result<(), SubsetError> {
        self.path.push(segment);
        let result = self.contains(superset, subset);
        self.path.pop();
        result
    }

    fn contains(&mut self, superset: &Value, subset: &Value) -> Result<(), SubsetError> {
        if self.path.depth() > MAX_DEPTH {
            return Err(SubsetError::RecoveredFromPanic {
                message: format!("value tree is deeper than {MAX_DEPTH} levels at {}", self.path),
            });
        }

        match (superset, subset) {
            (Value::Record(Record::Struct(sup)), Value::Record(Record::Struct(sub))) => {
                self.contains_fields(sup, sub)
            }
            (Value::Record(Record::Map(sup)), Value::Record(Record::Map(sub))) => {
                self.contains_entries(sup, sub)
            }
            (Value::Sequence(sup), Value::Sequence(sub)) => self.contains_elements(sup, sub),
            (Value::Scalar(sup), Value::Scalar(sub)) => self.scalar_equals(sup, sub),
            _ => Err(self.mismatch(Mismatch::Shape {
                expected: superset.kind_name(),
                found: subset.kind_name(),
            })),
        }
    }

    fn contains_fields(&mut self, sup: &[Field], sub: &[Field]) -> Result<(), SubsetError> {
        let same_shape = sup.len() == sub.len()
            && sup.iter().zip(sub).all(|(s, f)| s.name == f.name);
        if !same_shape {
            let names = |fields: &[Field]| -> Vec<String> {
                fields.iter().map(|f| f.name.to_owned()).collect()
            };
            return Err(self.mismatch(Mismatch::StructFields {
                expected: names(sup),
                found: names(sub),
            }));
        }

        for (reference, field) in sup.iter().zip(sub) {
            if !field.comparable || field.is_zero() {
                trace!("skipping unspecified field {}", field.name);
                continue;
            }
            self.descend(
                PathSegment::Key(field.name.to_owned()),
                &reference.value,
                &field.value,
            )?;
        }
        Ok(())
    }

    fn contains_entries(
        &mut self,
        sup: &IndexMap<String, Value>,
        sub: &IndexMap<String, Value>,
    ) -> Result<(), SubsetError> {
        for (key, value) in sub {
            let Some(reference) = sup.get(key) else {
                return Err(self.mismatch(Mismatch::MissingKey(key.to_owned())));
            };
            self.descend(PathSegment::Key(key.to_owned()), reference, value)?;
        }
        Ok(())
    }

    fn contains_elements(&mut self, sup: &[Value], sub: &[Value]) -> Result<(), SubsetError> {
        let mut used = vec![false; sup.len()];

        for (i, item) in sub.iter().enumerate() {
            self.path.push(PathSegment::Index(i));
            let found = self.first_unused_match(sup, &used, item);
            self.path.pop();

            match found? {
                Some(j) => used[j] = true,
                None => {
                    self.path.push(PathSegment::Index(i));
                    let err = self.mismatch(Mismatch::NoMatchingElement);
                    self.path.pop();
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Index of the first unused reference element matching `item`. Mismatches
    /// only rule a candidate out; faults abort the search.
    fn first_unused_match(
        &mut self,
        sup: &[Value],
        used: &[bool],
        item: &Value,
    ) -> Result<Option<usize>, SubsetError> {
        for (j, candidate) in sup.iter().enumerate() {
            if used[j] {
                continue;
            }
            match self.contains(candidate, item) {
                Ok(()) => return Ok(Some(j)),
                Err(e) if e.is_mismatch() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn scalar_equals(&self, sup: &Scalar, sub: &Scalar) -> Result<(), SubsetError> {
        let equal = match (sup, sub) {
            (Scalar::Number(a), Scalar::Number(b)) => numbers_equal(a, b),
            _ => sup == sub,
        };
        if equal {
            return Ok(());
        }
        let (sup, sub) = (Value::Scalar(sup.to_owned()), Value::Scalar(sub.to_owned()));
        let reason = if sup.kind_name() == sub.kind_name() {
            Mismatch::UnequalScalar {
                expected: sup.to_string(),
                found: sub.to_string(),
            }
        } else {
            Mismatch::Shape {
                expected: sup.kind_name(),
                found: sub.kind_name(),
            }
        };
        Err(self.mismatch(reason))
    }
}

/// Numeric equality regardless of how the number was written: integers are
/// compared exactly, anything involving a float as `f64`.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    if a.is_f64() || b.is_f64() {
        return matches!((a.as_f64(), b.as_f64()), (Some(a), Some(b)) if a == b);
    }
    // one negative i64, one u64 above i64::MAX
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn json(v: serde_json::Value) -> Value {
        v.into()
    }

    fn grant(code: &str, access: &str) -> Value {
        Value::record([
            Field::new("code", code.into()),
            Field::new("access", access.into()),
        ])
    }

    #[test]
    fn identical_values_match() {
        let v = json(json!({"a": [1, 2, {"b": "c"}], "d": null, "e": false}));
        assert!(contains_subset(&v, &v).is_ok());
    }

    #[test]
    fn extra_reference_keys_are_tolerated() {
        let sup = json(json!({"a": 1, "b": 2}));
        let sub = json(json!({"a": 1}));
        assert!(is_subset(&sup, &sub));
        assert!(!is_subset(&sub, &sup));
    }

    #[test]
    fn missing_map_key_reports_key_and_path() {
        let sup = json(json!({"outer": {"a": 1}}));
        let sub = json(json!({"outer": {"b": 1}}));
        let err = contains_subset(&sup, &sub).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotASubset);
        assert_eq!(err.to_string(), "not a subset: key `b` is missing at $.outer");
    }

    #[test]
    fn zero_valued_map_entries_still_count() {
        let sup = json(json!({"a": "x"}));
        let sub = json(json!({"a": ""}));
        assert!(!is_subset(&sup, &sub));

        let sub = json(json!({"b": ""}));
        assert!(!is_subset(&sup, &sub));
    }

    #[test]
    fn zero_valued_struct_fields_are_skipped() {
        let sup = Value::record([
            Field::new("code", "a".into()),
            Field::new("access", "full".into()),
        ]);
        let sub = Value::record([Field::new("code", "a".into()), Field::new("access", "".into())]);
        assert!(is_subset(&sup, &sub));
    }

    #[test]
    fn hidden_struct_fields_are_skipped() {
        let sup = Value::record([Field::new("code", "a".into()), Field::hidden("id", 1u64.into())]);
        let sub = Value::record([Field::new("code", "a".into()), Field::hidden("id", 2u64.into())]);
        assert!(is_subset(&sup, &sub));
    }

    #[test]
    fn structs_with_different_fields_never_match() {
        let sup = grant("a", "full");

        let fewer = Value::record([Field::new("code", "a".into())]);
        let err = contains_subset(&sup, &fewer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotASubset);
        assert_eq!(
            err.to_string(),
            "not a subset: expected a struct with fields [code, access], found fields [code] at $"
        );

        // a zero-valued extra field still changes the shape
        let other = Value::record([
            Field::new("code", "a".into()),
            Field::new("other", "".into()),
        ]);
        assert!(!is_subset(&sup, &other));

        let reordered = Value::record([
            Field::new("access", "full".into()),
            Field::new("code", "a".into()),
        ]);
        assert!(!is_subset(&sup, &reordered));
    }

    #[test]
    fn set_options_holding_zero_are_compared() {
        let sup = Value::record([
            Field::new("code", "a".into()),
            Field::new("name", "x".into()),
        ]);
        let unset = Value::record([
            Field::new("code", "a".into()),
            Field::new("name", Value::null()),
        ]);
        assert!(is_subset(&sup, &unset));

        let set_empty = Value::record([
            Field::new("code", "a".into()),
            Field::new("name", "".into()).explicitly_set(),
        ]);
        let err = contains_subset(&sup, &set_empty).unwrap_err();
        assert_eq!(err.to_string(), r#"not a subset: expected "x", found "" at $.name"#);
    }

    #[test]
    fn numbers_compare_by_value() {
        let sup = json(json!({"id": 1, "limit": -3, "ratio": 0.5}));
        assert!(is_subset(&sup, &json(json!({"id": 1.0}))));
        assert!(is_subset(&sup, &json(json!({"limit": -3.0, "ratio": 0.5}))));
        assert!(!is_subset(&sup, &json(json!({"id": 1.5}))));
        assert!(!is_subset(&sup, &json(json!({"limit": 3}))));

        assert!(!numbers_equal(&Number::from(-1i64), &Number::from(u64::MAX)));
        assert!(numbers_equal(&Number::from(u64::MAX), &Number::from(u64::MAX)));
    }

    #[test]
    fn sequences_ignore_order() {
        let sup = Value::sequence([grant("a", "full"), grant("b", "none")]);
        let sub = Value::sequence([grant("b", "none"), grant("a", "full")]);
        assert!(contains_subset(&sup, &sub).is_ok());
    }

    #[test]
    fn reference_elements_are_not_reused() {
        let sup = Value::sequence([grant("a", "full"), grant("b", "none")]);
        let sub = Value::sequence([grant("a", "full"), grant("a", "full")]);
        let err = contains_subset(&sup, &sub).unwrap_err();
        assert_eq!(err.to_string(), "not a subset: no unused element matches at $[1]");
    }

    #[test]
    fn empty_reference_sequence_never_contains_elements() {
        let sup = Value::Sequence(vec![]);
        assert!(is_subset(&sup, &Value::Sequence(vec![])));
        assert!(!is_subset(&sup, &Value::sequence([Value::from(1u64)])));
    }

    #[test]
    fn greedy_matching_takes_first_unused_element() {
        // The first sub element only constrains `code`, so it claims the first
        // reference element even though the second sub element needed it.
        let sup = Value::sequence([grant("a", "full"), grant("a", "none")]);
        let sub = Value::sequence([grant("a", ""), grant("a", "full")]);
        assert!(!is_subset(&sup, &sub));

        let sub = Value::sequence([grant("a", "full"), grant("a", "")]);
        assert!(is_subset(&sup, &sub));
    }

    #[test]
    fn shape_mismatches_fail_at_any_depth() {
        let sup = json(json!({"a": {"b": [1]}}));
        let sub = json(json!({"a": {"b": {"c": 1}}}));
        let err = contains_subset(&sup, &sub).unwrap_err();
        assert_eq!(
            err.to_string(),
            "not a subset: expected a sequence, found a map at $.a.b"
        );

        let sup = Value::record([Field::new("a", "x".into())]);
        let sub = json(json!({"a": "x"}));
        assert!(!is_subset(&sup, &sub));

        assert!(!is_subset(&Value::from("1"), &Value::from(1u64)));
    }

    #[test]
    fn unequal_scalars_report_both_values() {
        let err = contains_subset(&Value::from("full"), &Value::from("none")).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"not a subset: expected "full", found "none" at $"#
        );
    }

    #[test]
    fn overly_deep_trees_are_rejected() {
        let mut v = Value::from(1u64);
        for _ in 0..=MAX_DEPTH + 1 {
            v = Value::sequence([v]);
        }
        let err = contains_subset(&v, &v).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecoveredFromPanic);
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown fault");
    }
}

//! # Equivalence Predicate
//!
//! Deep structural equality over [`Value`]s.
//!
//! Two modes:
//! - **loose** (default): `Null` equals `Absent`, dates equal their epoch
//!   number, argument lists equal sequences, sequences compare regardless of
//!   element order, and primitives compare with abstract (`==`) equality.
//! - **strict**: none of the above coercions apply.
//!
//! The predicate is total: it never fails and never recurses forever. A pair
//! of containers already under comparison further up is assumed equal.

use crate::primitives::EQUAL_HOOK_KEY;
use crate::types::{default_order, Identity, Mapping, Sequence, Value};

/// Deep equality of `a` and `b`.
///
/// Steps, in order:
/// 1. strict sameness short-circuits to `true`
/// 2. an operand's own `equal` hook decides exclusively
/// 3. dates are normalized to their epoch scalar
/// 4. argument lists are normalized to sequences
/// 5. loose mode sorts sequence copies
/// 6. `NaN` equals only `NaN`
/// 7. two primitives compare with `==` / `===`
/// 8. `Null` vs `Absent` is equal only in loose mode
/// 9. a nullish operand equals nothing else
/// 10. containers compare key by key
#[must_use]
pub fn equals(a: &Value, b: &Value, strict: bool) -> bool {
    Comparison {
        strict,
        in_progress: Vec::new(),
    }
    .equal(a, b)
}

struct Comparison {
    strict: bool,
    in_progress: Vec<(Identity, Identity)>,
}

impl Comparison {
    fn equal(&mut self, a: &Value, b: &Value) -> bool {
        if a.same(b) {
            return true;
        }

        if let Some(verdict) = equal_hook(a, b).or_else(|| equal_hook(b, a)) {
            return verdict;
        }

        let is_date = |v: &Value| matches!(v, Value::Date(_));
        if self.strict && is_date(a) != is_date(b) {
            return false;
        }
        let is_arguments = |v: &Value| matches!(v, Value::Arguments(_));
        if self.strict && is_arguments(a) != is_arguments(b) {
            return false;
        }

        // Loose mode compares sorted copies; the cycle guard tracks the
        // operands' own handles.
        let origin = (a.identity(), b.identity());
        let a = self.normalize(a);
        let b = self.normalize(b);

        match (a.is_nan(), b.is_nan()) {
            (true, true) => return true,
            (true, false) | (false, true) => return false,
            (false, false) => {}
        }

        if is_primitive(&a) && is_primitive(&b) {
            return if self.strict {
                a.same(&b)
            } else {
                loose_eq(&a, &b)
            };
        }

        match (a.is_nullish(), b.is_nullish()) {
            (true, true) => return !self.strict || a.is_null() == b.is_null(),
            (true, false) | (false, true) => return false,
            (false, false) => {}
        }

        match (&a, &b) {
            (Value::Mapping(x), Value::Mapping(y)) => {
                self.guarded(
                    origin.0.unwrap_or(x.identity()),
                    origin.1.unwrap_or(y.identity()),
                    |c| c.equal_mappings(x, y),
                )
            }
            (Value::Sequence(x), Value::Sequence(y)) => {
                self.guarded(
                    origin.0.unwrap_or(x.identity()),
                    origin.1.unwrap_or(y.identity()),
                    |c| c.equal_sequences(x, y),
                )
            }
            _ => false,
        }
    }

    /// Dates become numbers, argument lists become sequences, and in loose
    /// mode sequences become sorted copies.
    fn normalize(&self, value: &Value) -> Value {
        match value {
            Value::Date(d) => Value::Number(d.millis() as f64),
            Value::Sequence(seq) | Value::Arguments(seq) if !self.strict => {
                let mut items = seq.to_vec();
                items.sort_by(default_order);
                Value::Sequence(Sequence::from_vec(items))
            }
            Value::Arguments(seq) => Value::Sequence(seq.clone()),
            other => other.clone(),
        }
    }

    fn guarded(
        &mut self,
        left: Identity,
        right: Identity,
        compare: impl FnOnce(&mut Self) -> bool,
    ) -> bool {
        let pair = (left, right);
        if self.in_progress.contains(&pair) {
            return true;
        }
        self.in_progress.push(pair);
        let verdict = compare(self);
        self.in_progress.pop();
        verdict
    }

    fn equal_mappings(&mut self, x: &Mapping, y: &Mapping) -> bool {
        if x.len() != y.len() {
            return false;
        }
        x.entries().iter().all(|(key, xv)| match y.get(key) {
            Some(yv) => self.equal(xv, &yv),
            None => false,
        })
    }

    fn equal_sequences(&mut self, x: &Sequence, y: &Sequence) -> bool {
        let (xs, ys) = (x.to_vec(), y.to_vec());
        xs.len() == ys.len() && xs.iter().zip(&ys).all(|(xv, yv)| self.equal(xv, yv))
    }
}

/// Ask `x`'s own `equal` hook about `other`, if `x` carries one.
fn equal_hook(x: &Value, other: &Value) -> Option<bool> {
    let hook = x.property_mapping()?.get(EQUAL_HOOK_KEY)?;
    let hook = hook.as_callable()?;
    Some(hook.call(std::slice::from_ref(other)).truthy())
}

/// Non-container, non-nullish. Callables count: they compare by identity.
fn is_primitive(value: &Value) -> bool {
    !value.is_container() && !value.is_nullish()
}

/// Abstract equality between two primitives.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Bool(x), _) => loose_eq(&Value::Number(bool_to_number(*x)), b),
        (_, Value::Bool(y)) => loose_eq(a, &Value::Number(bool_to_number(*y))),
        (Value::Number(x), Value::Text(y)) | (Value::Text(y), Value::Number(x)) => {
            *x == text_to_number(y)
        }
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Pattern(p), Value::Text(t)) | (Value::Text(t), Value::Pattern(p)) => {
            p.to_string() == *t
        }
        _ => a.same(b),
    }
}

fn bool_to_number(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Numeric conversion of text: surrounding whitespace is ignored, the empty
/// string is `0`, `0x`/`0o`/`0b` prefixes select a radix, and anything
/// unparseable is `NaN`.
pub(crate) fn text_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    let numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if numeric {
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::from_json_value as v;
    use crate::types::{Callable, DateValue, PatternValue};
    use serde_json::json;

    fn both_ways(a: &Value, b: &Value, strict: bool) -> bool {
        let forward = equals(a, b, strict);
        assert_eq!(forward, equals(b, a, strict), "asymmetric for {:?} / {:?}", a, b);
        forward
    }

    #[test]
    fn primitives() {
        assert!(both_ways(&v(json!(1)), &v(json!(1)), false));
        assert!(!both_ways(&v(json!(1)), &v(json!(2)), false));
        assert!(both_ways(&v(json!(true)), &v(json!(true)), false));
        assert!(!both_ways(&v(json!(true)), &v(json!(false)), false));
    }

    #[test]
    fn null_and_absent() {
        assert!(both_ways(&Value::Null, &Value::Null, false));
        assert!(both_ways(&Value::Absent, &Value::Absent, false));
        assert!(both_ways(&Value::Absent, &Value::Null, false));
        assert!(!both_ways(&Value::Absent, &Value::Null, true));
        assert!(!both_ways(&Value::Null, &v(json!({})), false));
        assert!(!both_ways(&Value::Null, &v(json!(0)), false));
    }

    #[test]
    fn loose_primitive_coercion() {
        assert!(both_ways(&v(json!("")), &v(json!(false)), false));
        assert!(both_ways(&v(json!("1")), &v(json!(1)), false));
        assert!(both_ways(&v(json!(" 0x10 ")), &v(json!(16)), false));
        assert!(!both_ways(&v(json!("1")), &v(json!(1)), true));
        assert!(!both_ways(&v(json!("abc")), &v(json!(0)), false));
    }

    #[test]
    fn nan_equals_only_nan() {
        let nan = Value::Number(f64::NAN);
        assert!(both_ways(&nan, &Value::Number(f64::NAN), false));
        assert!(both_ways(&nan, &Value::Number(f64::NAN), true));
        assert!(!both_ways(&nan, &v(json!(1)), false));
        assert!(!both_ways(&nan, &v(json!("NaN")), false));
    }

    #[test]
    fn mappings_ignore_key_order() {
        assert!(both_ways(&v(json!({"b": 2, "a": 1})), &v(json!({"a": 1, "b": 2})), true));
        assert!(!both_ways(
            &v(json!({"b": 2, "a": 1})),
            &v(json!({"a": 1, "b": 2, "c": 3})),
            false
        ));
        assert!(both_ways(
            &v(json!({"b": {"c": 3}, "a": 1})),
            &v(json!({"a": 1, "b": {"c": 3}})),
            false
        ));
        assert!(!both_ways(
            &v(json!({"b": {"c": 3}, "a": 1})),
            &v(json!({"a": 1, "b": [3]})),
            false
        ));
    }

    #[test]
    fn sequence_order_matters_only_when_strict() {
        let a = v(json!({"b": [1, 2, 3], "a": 1}));
        let b = v(json!({"a": 1, "b": [3, 2, 1]}));
        assert!(both_ways(&a, &b, false));
        assert!(!both_ways(&a, &b, true));
    }

    #[test]
    fn loose_sort_does_not_mutate_operands() {
        let a = v(json!([3, 1, 2]));
        let b = v(json!([1, 2, 3]));
        assert!(equals(&a, &b, false));
        assert!(equals(&a, &v(json!([3, 1, 2])), true));
    }

    #[test]
    fn empty_sequence_is_not_empty_mapping() {
        assert!(!both_ways(&v(json!([])), &v(json!({})), false));
    }

    #[test]
    fn dates_normalize_to_epoch() {
        let date = |ms| Value::mapping([("a", Value::Date(DateValue::from_millis(ms)))]);
        assert!(both_ways(&date(5), &date(5), false));
        assert!(both_ways(&date(5), &v(json!({"a": 5})), false));
        assert!(!both_ways(&date(5), &v(json!({"a": 5})), true));
        assert!(!both_ways(&date(5), &date(6), false));
    }

    #[test]
    fn arguments_normalize_to_sequences() {
        let args = || Value::mapping([("a", Value::arguments(vec![Value::from(5)]))]);
        assert!(both_ways(&args(), &args(), false));
        assert!(both_ways(&args(), &args(), true));
        assert!(both_ways(&args(), &v(json!({"a": [5]})), false));
        assert!(!both_ways(&args(), &v(json!({"a": [5]})), true));
    }

    #[test]
    fn patterns_compare_by_source() {
        let p = |s: &str| Value::Pattern(PatternValue::new(s, "g"));
        assert!(both_ways(&p("a+"), &p("a+"), true));
        assert!(!both_ways(&p("a+"), &p("b+"), false));
        assert!(both_ways(&p("a+"), &v(json!("/a+/g")), false));
    }

    #[test]
    fn callables_compare_by_identity() {
        let f = Value::Callable(Callable::new("f", |_| Value::Null));
        let g = Value::Callable(Callable::new("f", |_| Value::Null));
        assert!(both_ways(&f, &f.clone(), true));
        assert!(!both_ways(&f, &g, false));
        assert!(!both_ways(&f, &v(json!({})), false));
    }

    #[test]
    fn equal_hook_decides_exclusively() {
        let always = Value::Callable(Callable::new("equal", |_| Value::Bool(true)));
        let x = Value::mapping([("equal", always)]);
        assert!(equals(&x, &v(json!(42)), true));
        assert!(equals(&v(json!("anything")), &x, true));

        let never = Value::Callable(Callable::new("equal", |_| Value::Bool(false)));
        let y = Value::mapping([("equal", never)]);
        assert!(!equals(&y, &Value::mapping([("equal", Value::Null)]), false));
    }

    #[test]
    fn cyclic_operands_terminate() {
        let build = || {
            let m = Mapping::new();
            m.insert("self", Value::Mapping(m.clone()));
            m.insert("n", Value::from(1));
            Value::Mapping(m)
        };
        assert!(both_ways(&build(), &build(), true));
    }

    #[test]
    fn self_containing_sequences_terminate() {
        let build = || {
            let s = Sequence::new();
            s.push(Value::Sequence(s.clone()));
            Value::Sequence(s)
        };
        let (a, b) = (build(), build());
        assert!(both_ways(&a, &b, true));
        assert!(both_ways(&a, &b, false));

        let with_tail = |n: i32| {
            let s = Sequence::new();
            s.push(Value::from(n));
            s.push(Value::Sequence(s.clone()));
            Value::Sequence(s)
        };
        assert!(both_ways(&with_tail(1), &with_tail(1), false));
        assert!(!both_ways(&with_tail(1), &with_tail(2), false));
        assert!(!both_ways(&with_tail(1), &with_tail(2), true));
    }

    #[test]
    fn self_containing_arguments_terminate() {
        let s = Sequence::new();
        s.push(Value::Arguments(s.clone()));
        let args = Value::Arguments(s);
        assert!(both_ways(&args, &args.clone(), false));
        let t = Sequence::new();
        t.push(Value::Arguments(t.clone()));
        assert!(both_ways(&args, &Value::Arguments(t), false));
    }

    #[test]
    fn text_to_number_rules() {
        assert_eq!(text_to_number("  42 "), 42.0);
        assert_eq!(text_to_number(""), 0.0);
        assert_eq!(text_to_number("0b101"), 5.0);
        assert_eq!(text_to_number("-Infinity"), f64::NEG_INFINITY);
        assert!(text_to_number("inf").is_nan());
        assert!(text_to_number("1px").is_nan());
    }
}

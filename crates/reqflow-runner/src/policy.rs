//! The configurable equality policy for comparing adapter output
//! against `expect` mappings.

use std::collections::BTreeMap;

use reqflow_core::Value;

/// Output comparison rules.
///
/// Scalars compare exactly (integers and floats numerically);
/// mappings match by subset: every expected key must match, and extra
/// output keys are allowed unless `strict` is set. The `"non-empty"`
/// sentinel accepts any value that exists and is not null, an empty
/// string, or zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualityPolicy {
    /// Reject output keys that the expectation does not mention.
    pub strict: bool,
}

impl EqualityPolicy {
    /// Permissive policy: extra output keys are allowed.
    pub fn lenient() -> Self {
        Self { strict: false }
    }

    /// Strict policy: output keys must exactly match expected keys.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Compare an output mapping against an expectation.
    ///
    /// Returns every mismatch, so a report can show the full distance
    /// from the expectation rather than the first diff.
    pub fn compare(
        &self,
        expect: &BTreeMap<String, Value>,
        actual: &BTreeMap<String, Value>,
    ) -> Result<(), Vec<String>> {
        let mut mismatches = Vec::new();
        self.compare_maps(expect, actual, "", &mut mismatches);
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(mismatches)
        }
    }

    fn compare_maps(
        &self,
        expect: &BTreeMap<String, Value>,
        actual: &BTreeMap<String, Value>,
        path: &str,
        mismatches: &mut Vec<String>,
    ) {
        for (key, expected) in expect {
            let at = join_path(path, key);
            match actual.get(key) {
                None => mismatches.push(format!("missing output field `{at}`")),
                Some(value) => self.compare_value(expected, value, &at, mismatches),
            }
        }
        if self.strict {
            for key in actual.keys() {
                if !expect.contains_key(key) {
                    mismatches.push(format!(
                        "unexpected output field `{}`",
                        join_path(path, key)
                    ));
                }
            }
        }
    }

    fn compare_value(
        &self,
        expected: &Value,
        actual: &Value,
        path: &str,
        mismatches: &mut Vec<String>,
    ) {
        if expected.is_non_empty_sentinel() {
            if actual.is_empty() {
                mismatches.push(format!("`{path}` expected non-empty, got {actual}"));
            }
            return;
        }

        match (expected, actual) {
            (Value::Map(e), Value::Map(a)) => self.compare_maps(e, a, path, mismatches),
            _ => {
                if !scalar_eq(expected, actual) {
                    mismatches.push(format!("`{path}` expected {expected}, got {actual}"));
                }
            }
        }
    }
}

/// Exact scalar equality, with integers and floats compared
/// numerically so `200` matches `200.0`.
fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn map(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_subset_match_allows_extra_keys() {
        let expect = map(&[("status", Value::Int(200))]);
        let actual = map(&[
            ("status", Value::Int(200)),
            ("token", Value::String("abc123".into())),
        ]);
        assert!(EqualityPolicy::lenient().compare(&expect, &actual).is_ok());
    }

    #[test]
    fn test_strict_rejects_extra_keys() {
        let expect = map(&[("status", Value::Int(200))]);
        let actual = map(&[
            ("status", Value::Int(200)),
            ("token", Value::String("abc123".into())),
        ]);
        let mismatches = EqualityPolicy::strict().compare(&expect, &actual).unwrap_err();
        assert!(mismatches[0].contains("unexpected output field `token`"));
    }

    #[test]
    fn test_int_float_compare_numerically() {
        let expect = map(&[("status", Value::Int(200))]);
        let actual = map(&[("status", Value::Float(200.0))]);
        assert!(EqualityPolicy::lenient().compare(&expect, &actual).is_ok());
    }

    #[test_case(Value::String("abc123".into()), true; "string passes")]
    #[test_case(Value::Int(7), true; "number passes")]
    #[test_case(Value::Bool(false), true; "false is a real value")]
    #[test_case(Value::Null, false; "null fails")]
    #[test_case(Value::String(String::new()), false; "empty string fails")]
    #[test_case(Value::Int(0), false; "zero fails")]
    fn test_non_empty_sentinel(actual: Value, passes: bool) {
        let expect = map(&[("token", Value::String("non-empty".into()))]);
        let actual = map(&[("token", actual)]);
        assert_eq!(
            EqualityPolicy::lenient().compare(&expect, &actual).is_ok(),
            passes
        );
    }

    #[test]
    fn test_nested_mapping_subset() {
        let expect = map(&[(
            "user",
            Value::Map(map(&[("email", Value::String("a@b.com".into()))])),
        )]);
        let actual = map(&[(
            "user",
            Value::Map(map(&[
                ("email", Value::String("a@b.com".into())),
                ("age", Value::Int(3)),
            ])),
        )]);
        assert!(EqualityPolicy::lenient().compare(&expect, &actual).is_ok());
        assert!(EqualityPolicy::strict().compare(&expect, &actual).is_err());
    }

    #[test]
    fn test_all_mismatches_reported() {
        let expect = map(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
        let actual = map(&[("a", Value::Int(9))]);
        let mismatches = EqualityPolicy::lenient().compare(&expect, &actual).unwrap_err();
        assert_eq!(mismatches.len(), 2);
    }

    #[test]
    fn test_missing_field_fails_sentinel() {
        let expect = map(&[("token", Value::String("non-empty".into()))]);
        let actual = map(&[]);
        assert!(EqualityPolicy::lenient().compare(&expect, &actual).is_err());
    }
}

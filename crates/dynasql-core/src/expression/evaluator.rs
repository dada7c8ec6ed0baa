//! Predicate evaluation against items.
//!
//! Used for residual filters applied client-side, for merged-row filters in
//! JOINs, and by the in-memory store when it applies scan/query filters.

use std::cmp::Ordering;

use dynasql_model::{AttributeValue, Item};

use super::ast::{CompareOp, LogicalOp, Predicate};

/// Evaluate `predicate` against `item`.
///
/// A comparison on an attribute the item does not have is false, whatever
/// the operator. Values of different types are never equal; ordering
/// comparisons between them are false.
#[must_use]
pub fn matches(predicate: &Predicate, item: &Item) -> bool {
    match predicate {
        Predicate::Compare {
            attribute,
            op,
            value,
        } => item
            .get(attribute)
            .is_some_and(|actual| compare_values(actual, &value.to_attribute_value(), *op)),
        Predicate::Logical {
            op: LogicalOp::And,
            left,
            right,
        } => matches(left, item) && matches(right, item),
        Predicate::Logical {
            op: LogicalOp::Or,
            left,
            right,
        } => matches(left, item) || matches(right, item),
    }
}

/// Compare two attribute values with `op`.
///
/// Strings compare by UTF-8 bytes, numbers numerically, booleans with
/// `false < true`. Lists and maps only support (in)equality.
#[must_use]
pub fn compare_values(left: &AttributeValue, right: &AttributeValue, op: CompareOp) -> bool {
    match (left, right) {
        (AttributeValue::S(a), AttributeValue::S(b)) => compare_ord(a.as_bytes(), b.as_bytes(), op),
        (AttributeValue::N(a), AttributeValue::N(b)) => match compare_numbers(a, b) {
            Some(ordering) => ordering_satisfies(ordering, op),
            None => matches!(op, CompareOp::Ne),
        },
        (AttributeValue::Bool(a), AttributeValue::Bool(b)) => compare_ord(a, b, op),
        (AttributeValue::Null(_), AttributeValue::Null(_)) => {
            matches!(op, CompareOp::Eq | CompareOp::Le | CompareOp::Ge)
        }
        (AttributeValue::L(_), AttributeValue::L(_)) | (AttributeValue::M(_), AttributeValue::M(_)) => {
            match op {
                CompareOp::Eq => left == right,
                CompareOp::Ne => left != right,
                _ => false,
            }
        }
        // Different types are not comparable.
        _ => matches!(op, CompareOp::Ne),
    }
}

/// Typed equality used to match JOIN keys: numbers compare by value
/// (`1` equals `1.0`), everything else structurally. Values of different
/// types never match.
#[must_use]
pub fn values_equal(left: &AttributeValue, right: &AttributeValue) -> bool {
    match (left, right) {
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            compare_numbers(a, b).is_some_and(Ordering::is_eq)
        }
        _ => left == right,
    }
}

/// Numeric ordering of two number strings. `None` if either fails to parse
/// or the comparison is undefined (NaN).
pub(crate) fn compare_numbers(a: &str, b: &str) -> Option<Ordering> {
    let fa = a.trim().parse::<f64>().ok()?;
    let fb = b.trim().parse::<f64>().ok()?;
    fa.partial_cmp(&fb)
}

/// Generic ordered comparison.
fn compare_ord<T: Ord + ?Sized>(a: &T, b: &T, op: CompareOp) -> bool {
    ordering_satisfies(a.cmp(b), op)
}

fn ordering_satisfies(ordering: Ordering, op: CompareOp) -> bool {
    match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Ne => ordering.is_ne(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parse_condition;

    fn item(pairs: &[(&str, AttributeValue)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    fn eval(condition: &str, item: &Item) -> bool {
        matches(&parse_condition(condition).unwrap(), item)
    }

    #[test]
    fn test_should_compare_numbers_numerically() {
        let it = item(&[("age", AttributeValue::N("42".to_owned()))]);
        assert!(eval("age > 30", &it));
        assert!(eval("age = 42.0", &it));
        assert!(!eval("age < 5", &it));
        assert!(eval("age > 9", &it));
    }

    #[test]
    fn test_should_compare_strings_by_bytes() {
        let it = item(&[("city", AttributeValue::S("Seattle".to_owned()))]);
        assert!(eval("city = 'Seattle'", &it));
        assert!(eval("city > 'Boston'", &it));
        assert!(!eval("city = 'seattle'", &it));
    }

    #[test]
    fn test_should_be_false_for_missing_attribute() {
        let it = item(&[("a", AttributeValue::N("1".to_owned()))]);
        assert!(!eval("b = 1", &it));
        assert!(!eval("b <> 1", &it));
    }

    #[test]
    fn test_should_not_equate_different_types() {
        let it = item(&[("id", AttributeValue::S("1".to_owned()))]);
        assert!(!eval("id = 1", &it));
        assert!(eval("id <> 1", &it));
        assert!(!eval("id > 0", &it));
    }

    #[test]
    fn test_should_evaluate_and_or() {
        let it = item(&[
            ("age", AttributeValue::N("35".to_owned())),
            ("city", AttributeValue::S("Portland".to_owned())),
            ("vip", AttributeValue::Bool(true)),
        ]);
        assert!(!eval("age > 30 AND city = 'Seattle'", &it));
        assert!(eval("age > 30 AND city = 'Seattle' OR vip = TRUE", &it));
        assert!(eval("city = 'Seattle' OR age >= 35", &it));
    }

    #[test]
    fn test_should_match_join_keys_by_typed_value() {
        assert!(values_equal(
            &AttributeValue::N("7".to_owned()),
            &AttributeValue::N("7.0".to_owned())
        ));
        assert!(!values_equal(
            &AttributeValue::N("7".to_owned()),
            &AttributeValue::S("7".to_owned())
        ));
        assert!(values_equal(
            &AttributeValue::S("u1".to_owned()),
            &AttributeValue::S("u1".to_owned())
        ));
    }
}

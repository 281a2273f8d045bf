//! Local filter evaluation
//!
//! Same semantics the remote datastore applies:
//! - a missing field compares as `null`
//! - `=` / `!=` compare numbers by value (`1 == 1.0`), everything else structurally
//! - ordering operators compare numbers with numbers and strings with
//!   strings; any other pairing does not match
//! - `in` matches when the field equals any element of the value array

use datastore_core::{AggregateType, Comparison, Filter, FilterOperator};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Evaluate a filter against one model's fields
pub fn matches(filter: &Filter, fields: &BTreeMap<String, Value>) -> bool {
    match filter {
        Filter::Comparison(comparison) => compare(comparison, fields),
        Filter::And(operands) => operands.as_slice().iter().all(|f| matches(f, fields)),
        Filter::Or(operands) => operands.as_slice().iter().any(|f| matches(f, fields)),
        Filter::Not(operand) => !matches(operand, fields),
    }
}

fn compare(comparison: &Comparison, fields: &BTreeMap<String, Value>) -> bool {
    let actual = fields.get(&comparison.field).unwrap_or(&Value::Null);
    let expected = &comparison.value;
    match comparison.operator {
        FilterOperator::Equal => values_equal(actual, expected),
        FilterOperator::NotEqual => !values_equal(actual, expected),
        FilterOperator::Less => order(actual, expected) == Some(Ordering::Less),
        FilterOperator::LessOrEqual => matches!(
            order(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FilterOperator::Greater => order(actual, expected) == Some(Ordering::Greater),
        FilterOperator::GreaterOrEqual => matches!(
            order(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOperator::In => match expected {
            Value::Array(candidates) => candidates.iter().any(|c| values_equal(actual, c)),
            _ => false,
        },
    }
}

/// Equality with numeric normalization
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

/// Ordering between comparable values
///
/// Numbers order numerically, strings lexicographically; anything else
/// is incomparable.
pub fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Whether a value takes part in an aggregate of the given type
pub fn aggregatable(value: &Value, aggregate_type: Option<AggregateType>) -> bool {
    match aggregate_type {
        Some(AggregateType::Int) => value.is_i64() || value.is_u64(),
        Some(AggregateType::Float) => value.is_number(),
        Some(AggregateType::Str) => value.is_string(),
        None => value.is_number() || value.is_string(),
    }
}

/// Fold values into their minimum or maximum
///
/// Values incomparable with the running extreme are skipped.
pub fn extreme<'a>(
    values: impl IntoIterator<Item = &'a Value>,
    wanted: Ordering,
) -> Option<&'a Value> {
    let mut best: Option<&Value> = None;
    for value in values {
        best = match best {
            None => Some(value),
            Some(current) => match order(value, current) {
                Some(o) if o == wanted => Some(value),
                _ => Some(current),
            },
        };
    }
    best
}

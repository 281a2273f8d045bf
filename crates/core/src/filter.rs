//! Filter expression language
//!
//! A filter is a small algebraic tree evaluated by the remote datastore:
//!
//! ```text
//! Filter := Comparison { field, operator, value }
//!         | And [Filter, ...]     (non-empty)
//!         | Or  [Filter, ...]     (non-empty)
//!         | Not  Filter
//! ```
//!
//! This module only builds and encodes filters. Evaluation happens remotely
//! (or in the in-memory datastore of the engine crate).
//!
//! ## Wire Format
//!
//! | Node | Encoding |
//! |------|----------|
//! | Comparison | `{"field": f, "value": v, "operator": op}` |
//! | And | `{"and_filter": [..]}` |
//! | Or | `{"or_filter": [..]}` |
//! | Not | `{"not_filter": ..}` |
//!
//! Encoding is deterministic: structurally equal trees produce identical
//! payloads, structurally different trees produce different payloads.
//!
//! ## Usage
//!
//! ```
//! use datastore_core::Filter;
//! use serde_json::json;
//!
//! let filter = Filter::and(vec![
//!     Filter::eq("meeting_id", 5),
//!     Filter::eq("title", "Foo"),
//! ]).unwrap();
//!
//! assert_eq!(filter.to_value(), json!({"and_filter": [
//!     {"field": "meeting_id", "value": 5, "operator": "="},
//!     {"field": "title", "value": "Foo", "operator": "="},
//! ]}));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

/// Comparison operators understood by the datastore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Field equals value (a missing field equals `null`)
    #[serde(rename = "=")]
    Equal,
    /// Field differs from value
    #[serde(rename = "!=")]
    NotEqual,
    /// Field is strictly less than value
    #[serde(rename = "<")]
    Less,
    /// Field is less than or equal to value
    #[serde(rename = "<=")]
    LessOrEqual,
    /// Field is strictly greater than value
    #[serde(rename = ">")]
    Greater,
    /// Field is greater than or equal to value
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// Field is one of the values of the given array
    #[serde(rename = "in")]
    In,
}

impl FilterOperator {
    /// The operator's wire symbol
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "=",
            FilterOperator::NotEqual => "!=",
            FilterOperator::Less => "<",
            FilterOperator::LessOrEqual => "<=",
            FilterOperator::Greater => ">",
            FilterOperator::GreaterOrEqual => ">=",
            FilterOperator::In => "in",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf comparison `field <operator> value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Comparison {
    /// Field name the comparison applies to
    pub field: String,
    /// Right-hand side of the comparison
    pub value: Value,
    /// Comparison operator
    pub operator: FilterOperator,
}

impl Comparison {
    /// Create a comparison
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Comparison {
            field: field.into(),
            value: value.into(),
            operator,
        }
    }
}

/// Filter tree
///
/// `And` and `Or` always carry at least one operand. The only way to build
/// them is through [`Filter::and`] / [`Filter::or`] (or deserialization),
/// which reject empty operand lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FilterRepr", into = "FilterRepr")]
pub enum Filter {
    /// Leaf comparison
    Comparison(Comparison),
    /// All operands must match
    And(Operands),
    /// At least one operand must match
    Or(Operands),
    /// Operand must not match
    Not(Box<Filter>),
}

/// Non-empty operand list of an `And` / `Or` node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operands(Vec<Filter>);

impl Operands {
    fn new(operands: Vec<Filter>, combinator: &str) -> Result<Self> {
        if operands.is_empty() {
            return Err(Error::InvalidFilter(format!(
                "{} needs at least one operand",
                combinator
            )));
        }
        Ok(Operands(operands))
    }

    /// The operands, in construction order
    pub fn as_slice(&self) -> &[Filter] {
        &self.0
    }
}

impl Filter {
    /// Leaf comparison
    pub fn comparison(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        Filter::Comparison(Comparison::new(field, operator, value))
    }

    /// `field = value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::comparison(field, FilterOperator::Equal, value)
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::comparison(field, FilterOperator::NotEqual, value)
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::comparison(field, FilterOperator::Less, value)
    }

    /// `field <= value`
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::comparison(field, FilterOperator::LessOrEqual, value)
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::comparison(field, FilterOperator::Greater, value)
    }

    /// `field >= value`
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::comparison(field, FilterOperator::GreaterOrEqual, value)
    }

    /// `field in [values]`
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::comparison(field, FilterOperator::In, Value::Array(values))
    }

    /// Conjunction of the operands
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFilter` if `operands` is empty.
    pub fn and(operands: Vec<Filter>) -> Result<Self> {
        Ok(Filter::And(Operands::new(operands, "and_filter")?))
    }

    /// Disjunction of the operands
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFilter` if `operands` is empty.
    pub fn or(operands: Vec<Filter>) -> Result<Self> {
        Ok(Filter::Or(Operands::new(operands, "or_filter")?))
    }

    /// Negation of the operand
    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: Filter) -> Self {
        Filter::Not(Box::new(operand))
    }

    /// Canonical nested-map encoding of this filter
    pub fn to_value(&self) -> Value {
        match self {
            Filter::Comparison(c) => {
                let mut map = serde_json::Map::new();
                map.insert("field".to_string(), Value::String(c.field.clone()));
                map.insert("value".to_string(), c.value.clone());
                map.insert(
                    "operator".to_string(),
                    Value::String(c.operator.as_str().to_string()),
                );
                Value::Object(map)
            }
            Filter::And(ops) => junction_value("and_filter", ops),
            Filter::Or(ops) => junction_value("or_filter", ops),
            Filter::Not(inner) => {
                let mut map = serde_json::Map::new();
                map.insert("not_filter".to_string(), inner.to_value());
                Value::Object(map)
            }
        }
    }

    /// All field names referenced by this filter, in tree order
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::Comparison(c) => out.push(c.field.as_str()),
            Filter::And(ops) | Filter::Or(ops) => {
                for op in ops.as_slice() {
                    op.collect_fields(out);
                }
            }
            Filter::Not(inner) => inner.collect_fields(out),
        }
    }
}

impl From<Comparison> for Filter {
    fn from(c: Comparison) -> Self {
        Filter::Comparison(c)
    }
}

fn junction_value(key: &str, ops: &Operands) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(
        key.to_string(),
        Value::Array(ops.as_slice().iter().map(Filter::to_value).collect()),
    );
    Value::Object(map)
}

// =============================================================================
// Wire representation
// =============================================================================

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FilterRepr {
    And {
        and_filter: Vec<Filter>,
    },
    Or {
        or_filter: Vec<Filter>,
    },
    Not {
        not_filter: Box<Filter>,
    },
    Comparison(Comparison),
}

impl TryFrom<FilterRepr> for Filter {
    type Error = Error;

    fn try_from(repr: FilterRepr) -> Result<Self> {
        match repr {
            FilterRepr::And { and_filter } => Filter::and(and_filter),
            FilterRepr::Or { or_filter } => Filter::or(or_filter),
            FilterRepr::Not { not_filter } => Ok(Filter::Not(not_filter)),
            FilterRepr::Comparison(c) => Ok(Filter::Comparison(c)),
        }
    }
}

impl From<Filter> for FilterRepr {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Comparison(c) => FilterRepr::Comparison(c),
            Filter::And(ops) => FilterRepr::And { and_filter: ops.0 },
            Filter::Or(ops) => FilterRepr::Or { or_filter: ops.0 },
            Filter::Not(inner) => FilterRepr::Not { not_filter: inner },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

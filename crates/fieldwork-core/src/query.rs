//! Query model shared by every store backend
//!
//! A query names one collection, a conjunction of field filters and an
//! ordering. Backends that cannot push these down evaluate them with
//! [`Query::matches`] and [`Query::compare`].

use crate::types::{Document, DocumentData};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    /// Field value equals one of the values in an array
    In,
    /// Field is an array containing the value
    ArrayContains,
}

/// Single field predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Missing fields never match, except for `NotEq`.
    pub fn matches(&self, data: &DocumentData) -> bool {
        let Some(actual) = data.get(&self.field) else {
            return self.op == FilterOp::NotEq;
        };
        match self.op {
            FilterOp::Eq => values_equal(actual, &self.value),
            FilterOp::NotEq => !values_equal(actual, &self.value),
            FilterOp::Lt => compare_values(actual, &self.value) == Ordering::Less,
            FilterOp::Le => compare_values(actual, &self.value) != Ordering::Greater,
            FilterOp::Gt => compare_values(actual, &self.value) == Ordering::Greater,
            FilterOp::Ge => compare_values(actual, &self.value) != Ordering::Less,
            FilterOp::In => match &self.value {
                Value::Array(candidates) => candidates.iter().any(|c| values_equal(actual, c)),
                _ => false,
            },
            FilterOp::ArrayContains => match actual {
                Value::Array(items) => items.iter().any(|item| values_equal(item, &self.value)),
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Collection query: filters are AND-ed, orderings applied in sequence with
/// the document path as final tie-breaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
}

impl Query {
    pub fn collection(path: impl Into<String>) -> Self {
        Self {
            collection: path.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(field, value))
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Whether `doc` lives directly in this collection and passes every filter.
    pub fn matches(&self, doc: &Document) -> bool {
        doc.reference.collection() == self.collection
            && self.filters.iter().all(|f| f.matches(&doc.data))
    }

    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for order in &self.order_by {
            let left = a.data.get(&order.field).unwrap_or(&Value::Null);
            let right = b.data.get(&order.field).unwrap_or(&Value::Null);
            let ord = compare_values(left, right);
            let ord = match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.reference.cmp(&b.reference)
    }

    /// Filter and order `docs` in place.
    pub fn apply(&self, docs: &mut Vec<Document>) {
        docs.retain(|doc| self.matches(doc));
        docs.sort_by(|a, b| self.compare(a, b));
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Numbers compare numerically regardless of integer/float representation.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Ordering::Equal,
        _ => a == b,
    }
}

/// Total order over JSON values: null < bool < number < string < array < object.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ord = compare_values(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

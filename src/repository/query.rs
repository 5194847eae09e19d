//! Record Query
//!
//! Equality filters, a single ordering and an optional limit. This is the
//! whole query surface the pages need from a record store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A row as a JSON object keyed by column name
pub type Record = serde_json::Map<String, Value>;

/// `column = value`; a null value means `column IS NULL`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
    /// Place nulls after non-null values (otherwise before)
    pub nulls_last: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
            nulls_last: false,
        });
        self
    }

    /// Applies to the current ordering
    pub fn nulls_last(mut self) -> Self {
        if let Some(order) = self.order.as_mut() {
            order.nulls_last = true;
        }
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a record satisfies every filter
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|filter| {
            let actual = record.get(&filter.column).unwrap_or(&Value::Null);
            values_equal(actual, &filter.value)
        })
    }
}

/// Loose equality: numbers compare by value, booleans match 0/1
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Bool(x), Value::Number(n)) | (Value::Number(n), Value::Bool(x)) => {
            n.as_i64() == Some(i64::from(*x))
        }
        // Ids arrive as strings from some transports
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            s.parse::<f64>().ok() == n.as_f64()
        }
        _ => a == b,
    }
}

/// Numeric id of a record, if any
pub fn record_id(record: &Record) -> Option<i64> {
    match record.get("id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

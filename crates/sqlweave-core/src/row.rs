//! Row accessor capability.
//!
//! Batch statements carry a list of parameter rows. The compiler never
//! inspects a row directly: it asks the row for the value of a named field.
//! Structs get an implementation from `#[derive(Row)]` in `sqlweave-derive`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::value::SqlValue;

/// Read access to the named values of one parameter row.
pub trait RowAccessor: fmt::Debug + Send + Sync {
    /// Returns the value of `name`, or `None` when the row has no such field.
    fn value(&self, name: &str) -> Option<SqlValue>;
}

/// A shared parameter row.
pub type Row = Arc<dyn RowAccessor>;

/// Wraps a row accessor into a shared [`Row`].
pub fn row<R: RowAccessor + 'static>(accessor: R) -> Row {
    Arc::new(accessor)
}

impl RowAccessor for HashMap<String, SqlValue> {
    fn value(&self, name: &str) -> Option<SqlValue> {
        self.get(name).cloned()
    }
}

impl RowAccessor for BTreeMap<String, SqlValue> {
    fn value(&self, name: &str) -> Option<SqlValue> {
        self.get(name).cloned()
    }
}

impl RowAccessor for serde_json::Map<String, serde_json::Value> {
    fn value(&self, name: &str) -> Option<SqlValue> {
        self.get(name).map(json_to_sql)
    }
}

impl RowAccessor for serde_json::Value {
    fn value(&self, name: &str) -> Option<SqlValue> {
        self.as_object().and_then(|map| map.value(name))
    }
}

fn json_to_sql(value: &serde_json::Value) -> SqlValue {
    use serde_json::Value;

    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Int)
            .or_else(|| n.as_f64().map(SqlValue::Float))
            .unwrap_or_else(|| SqlValue::Text(n.to_string())),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

//! Parameter binding.
//!
//! [`ParamBinder`] writes a placeholder and records the bound value in one
//! step, so placeholders and parameters always correspond one to one.
//! Batch statements give the binder a [`RowCursor`]; named parameters then
//! read the value of the row under the cursor.

use std::sync::Arc;

use crate::dialect::PlaceholderStyle;
use crate::error::{CompileError, Result};
use crate::row::Row;
use crate::sink::SqlSink;
use crate::value::SqlValue;

/// A cursor over the parameter rows of a batch.
#[derive(Debug, Clone)]
pub struct RowCursor {
    rows: Arc<[Row]>,
    index: usize,
}

impl RowCursor {
    /// Creates a cursor on the first row.
    #[must_use]
    pub fn new(rows: impl Into<Arc<[Row]>>) -> Self {
        Self {
            rows: rows.into(),
            index: 0,
        }
    }

    /// The zero-based index of the current row.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row under the cursor.
    pub fn current(&self) -> Result<&Row> {
        self.rows
            .get(self.index)
            .ok_or(CompileError::RowCursorExhausted {
                index: self.index,
                rows: self.rows.len(),
            })
    }

    /// Reads `name` from the row under the cursor.
    pub fn current_value(&self, name: &str) -> Result<SqlValue> {
        self.current()?
            .value(name)
            .ok_or_else(|| CompileError::MissingRowValue {
                row: self.index,
                name: String::from(name),
            })
    }

    /// Moves to the next row.
    ///
    /// Fails with [`CompileError::RowCursorExhausted`] on the last row.
    pub fn advance(&mut self) -> Result<()> {
        if self.index + 1 >= self.rows.len() {
            return Err(CompileError::RowCursorExhausted {
                index: self.index,
                rows: self.rows.len(),
            });
        }
        self.index += 1;
        Ok(())
    }
}

/// Accumulates bind parameters in emission order.
#[derive(Debug, Clone)]
pub struct ParamBinder {
    style: PlaceholderStyle,
    params: Vec<SqlValue>,
    positional: bool,
    named: bool,
    cursor: Option<RowCursor>,
}

impl ParamBinder {
    /// Creates a binder without a row source.
    #[must_use]
    pub const fn new(style: PlaceholderStyle) -> Self {
        Self {
            style,
            params: Vec::new(),
            positional: false,
            named: false,
            cursor: None,
        }
    }

    /// Creates a binder reading named parameters from `cursor`.
    #[must_use]
    pub const fn with_cursor(style: PlaceholderStyle, cursor: RowCursor) -> Self {
        Self {
            style,
            params: Vec::new(),
            positional: false,
            named: false,
            cursor: Some(cursor),
        }
    }

    /// Writes a placeholder for `value` and records it.
    pub fn append_param(&mut self, sink: &mut SqlSink, value: SqlValue) {
        self.push(sink, value);
        self.positional = true;
    }

    /// Writes a placeholder for the current row's `name` value and records it.
    pub fn append_named(&mut self, sink: &mut SqlSink, name: &str) -> Result<()> {
        let value = self.current_row_value(name)?;
        self.push(sink, value);
        self.named = true;
        Ok(())
    }

    fn push(&mut self, sink: &mut SqlSink, value: SqlValue) {
        self.params.push(value);
        sink.placeholder(self.style, self.params.len());
    }

    /// Reads `name` from the current batch row.
    pub fn current_row_value(&self, name: &str) -> Result<SqlValue> {
        match &self.cursor {
            Some(cursor) => cursor.current_value(name),
            None => Err(CompileError::NamedParamOutsideBatch {
                name: String::from(name),
            }),
        }
    }

    /// Advances the row cursor.
    pub fn advance_row(&mut self) -> Result<()> {
        match &mut self.cursor {
            Some(cursor) => cursor.advance(),
            None => Err(CompileError::RowCursorExhausted { index: 0, rows: 0 }),
        }
    }

    /// The row cursor, if this binder has a row source.
    #[must_use]
    pub const fn cursor(&self) -> Option<&RowCursor> {
        self.cursor.as_ref()
    }

    /// Returns true when a positional parameter was bound.
    #[must_use]
    pub const fn has_positional(&self) -> bool {
        self.positional
    }

    /// Returns true when a named parameter was bound.
    #[must_use]
    pub const fn has_named(&self) -> bool {
        self.named
    }

    /// The parameters bound so far.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Number of parameters bound so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true when no parameter was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Consumes the binder into its parameters and row cursor.
    #[must_use]
    pub fn into_parts(self) -> (Vec<SqlValue>, Option<RowCursor>) {
        (self.params, self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::row;
    use serde_json::json;

    fn rows() -> Vec<Row> {
        vec![row(json!({"id": 1})), row(json!({"id": 2}))]
    }

    #[test]
    fn test_placeholders_follow_parameters() {
        let mut sink = SqlSink::new();
        let mut binder = ParamBinder::new(PlaceholderStyle::Dollar);
        binder.append_param(&mut sink, SqlValue::Int(1));
        binder.append_param(&mut sink, SqlValue::Text(String::from("a")));
        assert_eq!(sink.as_str(), "$1 $2");
        assert_eq!(binder.len(), sink.placeholder_count());
        assert!(binder.has_positional());
        assert!(!binder.has_named());
    }

    #[test]
    fn test_named_param_outside_batch() {
        let mut sink = SqlSink::new();
        let mut binder = ParamBinder::new(PlaceholderStyle::Question);
        let err = binder.append_named(&mut sink, "id").unwrap_err();
        assert!(matches!(err, CompileError::NamedParamOutsideBatch { name } if name == "id"));
        assert!(sink.is_empty());
        assert!(binder.is_empty());
    }

    #[test]
    fn test_named_param_reads_current_row() {
        let mut sink = SqlSink::new();
        let mut binder = ParamBinder::with_cursor(PlaceholderStyle::Question, RowCursor::new(rows()));
        binder.append_named(&mut sink, "id").unwrap();
        binder.advance_row().unwrap();
        binder.append_named(&mut sink, "id").unwrap();
        assert_eq!(binder.params(), &[SqlValue::Int(1), SqlValue::Int(2)]);
        assert!(binder.has_named());
    }

    #[test]
    fn test_cursor_exhaustion() {
        let mut cursor = RowCursor::new(rows());
        cursor.advance().unwrap();
        let err = cursor.advance().unwrap_err();
        assert!(matches!(
            err,
            CompileError::RowCursorExhausted { index: 1, rows: 2 }
        ));
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn test_missing_row_value() {
        let cursor = RowCursor::new(rows());
        let err = cursor.current_value("name").unwrap_err();
        assert!(matches!(err, CompileError::MissingRowValue { row: 0, .. }));
    }
}

//! SQLite dialect implementation.

use super::{keywords, Dialect, UpsertStyle};
use crate::ast::LockMode;

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn identifier_quote(&self) -> char {
        '"' // SQLite also accepts backticks, but double quotes are standard
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        keywords::SQLITE
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn write_timestamp_literal(&self, ts: &chrono::NaiveDateTime, out: &mut String) {
        out.push('\'');
        out.push_str(&ts.format("%Y-%m-%d %H:%M:%S%.f").to_string());
        out.push('\'');
    }

    fn supports_returning(&self) -> bool {
        true // SQLite 3.35.0+
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnConflict // SQLite 3.24.0+
    }

    fn supports_parenthesized_set_operand(&self) -> bool {
        false
    }

    fn supports_lock(&self, _mode: LockMode) -> bool {
        false
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("-1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    #[test]
    fn test_sqlite_dialect() {
        let dialect = SqliteDialect::new();
        assert_eq!(dialect.name(), "sqlite");
        assert_eq!(dialect.identifier_quote(), '"');
        assert!(dialect.supports_returning());
        assert_eq!(dialect.upsert_style(), UpsertStyle::OnConflict);
        assert!(!dialect.supports_lock(LockMode::Update));
        assert!(!dialect.supports_parenthesized_set_operand());
    }

    #[test]
    fn test_sqlite_bool_literal() {
        let mut out = String::new();
        SqliteDialect::new().render_literal(&SqlValue::Bool(false), &mut out);
        assert_eq!(out, "0");
    }
}

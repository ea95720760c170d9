//! SQL dialect support.
//!
//! Different databases have slightly different SQL syntax. A [`Dialect`] is
//! built once per target database and shared read-only by every compilation;
//! it supplies identifier quoting, keyword detection, literal rendering and
//! the feature flags the compiler consults.

mod generic;
pub mod keywords;
mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use generic::GenericDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::ast::LockMode;
use crate::value::SqlValue;

/// Bind parameter placeholder syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?`
    Question,
    /// `$1`, `$2`, ...
    Dollar,
}

impl PlaceholderStyle {
    /// Writes the placeholder for the 1-based parameter `index`.
    pub fn write(self, index: usize, out: &mut String) {
        match self {
            Self::Question => out.push('?'),
            Self::Dollar => {
                out.push('$');
                out.push_str(&index.to_string());
            }
        }
    }
}

/// How a dialect spells an insert-or-update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStyle {
    /// Upserts are not available.
    Unsupported,
    /// `ON CONFLICT (target) DO NOTHING | DO UPDATE SET ...`, incoming row as `EXCLUDED`.
    OnConflict,
    /// `ON DUPLICATE KEY UPDATE ...`, incoming row as `VALUES(col)`.
    OnDuplicateKey,
}

/// How a dialect spells an UPDATE that joins other tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiTableUpdate {
    /// Multi-table updates are not available.
    Unsupported,
    /// `UPDATE a JOIN b ON ... SET ...`
    Join,
    /// `UPDATE a SET ... FROM b WHERE ...`
    From,
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character (e.g., `"` for standard SQL, `` ` `` for MySQL).
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Words reserved by this dialect on top of standard SQL.
    fn reserved_words(&self) -> &'static [&'static str] {
        &[]
    }

    /// Returns true when `word` must not be used as a bare identifier.
    fn is_keyword(&self, word: &str) -> bool {
        keywords::is_standard(word) || keywords::contains(self.reserved_words(), word)
    }

    /// Returns true when `name` must be quoted to be used as an identifier.
    fn needs_quote(&self, name: &str) -> bool {
        let mut chars = name.chars();
        let plain = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        !plain || self.is_keyword(name)
    }

    /// Quotes an identifier, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Writes `name`, quoting it only when necessary.
    fn write_identifier(&self, name: &str, out: &mut String) {
        if self.needs_quote(name) {
            out.push_str(&self.quote_identifier(name));
        } else {
            out.push_str(name);
        }
    }

    /// Returns the parameter placeholder style.
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Question
    }

    /// Renders a boolean literal.
    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Writes a quoted string literal.
    fn write_text_literal(&self, text: &str, out: &mut String) {
        out.push('\'');
        out.push_str(&text.replace('\'', "''"));
        out.push('\'');
    }

    /// Writes a binary literal.
    fn write_blob_literal(&self, bytes: &[u8], out: &mut String) {
        out.push_str("X'");
        for byte in bytes {
            out.push_str(&format!("{byte:02X}"));
        }
        out.push('\'');
    }

    /// Writes a timestamp literal.
    fn write_timestamp_literal(&self, ts: &chrono::NaiveDateTime, out: &mut String) {
        out.push_str("TIMESTAMP '");
        out.push_str(&ts.format("%Y-%m-%d %H:%M:%S%.f").to_string());
        out.push('\'');
    }

    /// Writes a float literal that always reads back as a float.
    ///
    /// Non-finite values have no numeric literal form; they are written as the
    /// quoted input strings most engines accept for float columns.
    fn write_float_literal(&self, value: f64, out: &mut String) {
        if value.is_nan() {
            self.write_text_literal("NaN", out);
        } else if value.is_infinite() {
            let text = if value.is_sign_negative() { "-Infinity" } else { "Infinity" };
            self.write_text_literal(text, out);
        } else {
            out.push_str(&format!("{value:?}"));
        }
    }

    /// Renders a value as an inline literal.
    fn render_literal(&self, value: &SqlValue, out: &mut String) {
        match value {
            SqlValue::Null => out.push_str("NULL"),
            SqlValue::Bool(b) => out.push_str(self.bool_literal(*b)),
            SqlValue::Int(n) => out.push_str(&n.to_string()),
            SqlValue::Float(f) => self.write_float_literal(*f, out),
            SqlValue::Text(s) => self.write_text_literal(s, out),
            SqlValue::Blob(b) => self.write_blob_literal(b, out),
            SqlValue::Timestamp(ts) => self.write_timestamp_literal(ts, out),
        }
    }

    /// Returns whether the dialect supports RETURNING clause.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Returns the upsert syntax.
    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::Unsupported
    }

    /// Returns the multi-table UPDATE syntax.
    fn multi_table_update(&self) -> MultiTableUpdate {
        MultiTableUpdate::Unsupported
    }

    /// Whether `AS` may precede a table alias.
    fn supports_table_alias_as(&self) -> bool {
        true
    }

    /// Whether UPDATE SET targets are written `alias.column`.
    fn qualify_set_target(&self) -> bool {
        false
    }

    /// Whether standalone VALUES rows are written `ROW(...)`.
    fn values_row_constructor(&self) -> bool {
        false
    }

    /// Output label of the zero-based column of a standalone VALUES statement.
    fn values_column_label(&self, index: usize) -> String {
        format!("column{}", index + 1)
    }

    /// Whether set-operation operands may be parenthesized.
    fn supports_parenthesized_set_operand(&self) -> bool {
        true
    }

    /// Whether the row-lock clause is available.
    fn supports_lock(&self, mode: LockMode) -> bool {
        let _ = mode;
        true
    }

    /// The LIMIT value meaning "no limit", for dialects that reject a bare OFFSET.
    fn unbounded_limit(&self) -> Option<&'static str> {
        None
    }

    /// Whether single-table UPDATE/DELETE accept ORDER BY and LIMIT.
    fn supports_update_limit(&self) -> bool {
        false
    }

    /// Whether several statements may be sent as one text.
    fn supports_multi_statement(&self) -> bool {
        false
    }

    /// Separator between statements of a multi-statement text.
    fn statement_separator(&self) -> &'static str {
        ";"
    }
}

/// Dialects selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// ANSI SQL.
    #[default]
    Generic,
    /// PostgreSQL.
    Postgres,
    /// MySQL 8.
    Mysql,
    /// SQLite 3.35+.
    Sqlite,
}

impl DialectKind {
    /// Creates the dialect instance.
    #[must_use]
    pub fn build(self) -> Arc<dyn Dialect> {
        match self {
            Self::Generic => Arc::new(GenericDialect::new()),
            Self::Postgres => Arc::new(PostgresDialect::new()),
            Self::Mysql => Arc::new(MySqlDialect::new()),
            Self::Sqlite => Arc::new(SqliteDialect::new()),
        }
    }
}

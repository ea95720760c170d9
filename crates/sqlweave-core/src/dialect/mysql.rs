//! MySQL dialect.

use super::{keywords, Dialect, MultiTableUpdate, UpsertStyle};

/// MySQL 8 dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        keywords::MYSQL
    }

    fn write_text_literal(&self, text: &str, out: &mut String) {
        out.push('\'');
        for c in text.chars() {
            match c {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                '\0' => out.push_str("\\0"),
                _ => out.push(c),
            }
        }
        out.push('\'');
    }

    fn write_timestamp_literal(&self, ts: &chrono::NaiveDateTime, out: &mut String) {
        out.push_str("TIMESTAMP('");
        out.push_str(&ts.format("%Y-%m-%d %H:%M:%S%.f").to_string());
        out.push_str("')");
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnDuplicateKey
    }

    fn multi_table_update(&self) -> MultiTableUpdate {
        MultiTableUpdate::Join
    }

    fn qualify_set_target(&self) -> bool {
        true
    }

    fn values_row_constructor(&self) -> bool {
        true
    }

    fn values_column_label(&self, index: usize) -> String {
        format!("column_{index}")
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("18446744073709551615")
    }

    fn supports_update_limit(&self) -> bool {
        true
    }

    fn supports_multi_statement(&self) -> bool {
        true
    }
}

//! PostgreSQL dialect.

use super::{keywords, Dialect, MultiTableUpdate, PlaceholderStyle, UpsertStyle};

/// PostgreSQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        keywords::POSTGRES
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Dollar
    }

    fn write_blob_literal(&self, bytes: &[u8], out: &mut String) {
        out.push_str("'\\x");
        for byte in bytes {
            out.push_str(&format!("{byte:02x}"));
        }
        out.push_str("'::bytea");
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnConflict
    }

    fn multi_table_update(&self) -> MultiTableUpdate {
        MultiTableUpdate::From
    }
}

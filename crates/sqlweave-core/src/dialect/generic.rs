//! Generic SQL dialect.

use super::Dialect;

/// A generic SQL dialect using ANSI SQL standards.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn supports_multi_statement(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MultiTableUpdate, PlaceholderStyle, UpsertStyle};

    #[test]
    fn test_generic_dialect() {
        let dialect = GenericDialect::new();
        assert_eq!(dialect.name(), "generic");
        assert_eq!(dialect.identifier_quote(), '"');
        assert_eq!(dialect.placeholder_style(), PlaceholderStyle::Question);
        assert!(!dialect.supports_returning());
        assert_eq!(dialect.upsert_style(), UpsertStyle::Unsupported);
        assert_eq!(dialect.multi_table_update(), MultiTableUpdate::Unsupported);
        assert!(dialect.supports_multi_statement());
    }
}

//! Error types for statement compilation.
//!
//! Every error is a precondition violation detected while compiling; none of
//! them is transient and the compiler never retries.

use crate::clause::Clause;

/// Errors raised while compiling a statement.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A clause was opened out of order.
    #[error("illegal clause transition: {to} cannot follow {from}")]
    StatementStructure {
        /// The clause that was current.
        from: Clause,
        /// The clause that was being opened.
        to: Clause,
    },

    /// `build()` was called on an assembler that already produced output.
    #[error("statement assembler was already built")]
    AlreadyBuilt,

    /// The statement tree is structurally empty or self-contradictory.
    #[error("invalid statement: {0}")]
    InvalidStatement(String),

    /// A column reference could not be bound to a table in scope.
    #[error("unknown column '{column}'{}", alias_suffix(.alias.as_deref()))]
    UnknownColumn {
        /// The alias the reference was qualified with, if any.
        alias: Option<String>,
        /// The column name (`table.column` when the owner is known).
        column: String,
    },

    /// An unqualified reference matches a table registered more than once.
    #[error("ambiguous reference to table '{table}' in column '{column}', qualify it with an alias")]
    AmbiguousTable {
        /// The table registered more than once.
        table: String,
        /// The column being resolved.
        column: String,
    },

    /// The alias is already bound in the current scope.
    #[error("duplicate alias '{alias}' in the same scope")]
    DuplicateAlias {
        /// The offending alias.
        alias: String,
    },

    /// A write or batch scope tried to resolve a reference in an outer scope.
    #[error("column '{column}' is not visible in this {scope} scope and outer references are not allowed here")]
    CorrelationForbidden {
        /// The column being resolved.
        column: String,
        /// The scope kind that refused delegation.
        scope: &'static str,
    },

    /// A named parameter was used by a statement without a row source.
    #[error("named parameter ':{name}' used outside a batch statement")]
    NamedParamOutsideBatch {
        /// The parameter name.
        name: String,
    },

    /// The batch row cursor was advanced past the last row.
    #[error("row cursor exhausted: cannot advance past row {index} of {rows}")]
    RowCursorExhausted {
        /// The cursor position when advancing failed.
        index: usize,
        /// Number of rows in the batch.
        rows: usize,
    },

    /// The row accessor has no value for a named parameter.
    #[error("row {row} has no value for named parameter ':{name}'")]
    MissingRowValue {
        /// The zero-based row index.
        row: usize,
        /// The parameter name.
        name: String,
    },

    /// The statement needs a feature the active dialect lacks.
    #[error("dialect '{dialect}' does not support {feature}")]
    UnsupportedDialectFeature {
        /// The dialect name.
        dialect: &'static str,
        /// Description of the missing feature.
        feature: String,
    },

    /// The number of emitted statements differs from the declared batch size.
    #[error("internal error: emitted {emitted} statements for a batch that declares {expected}")]
    BatchSizeMismatch {
        /// The expected statement count.
        expected: usize,
        /// The number of statements emitted.
        emitted: usize,
    },

    /// Configuration could not be deserialized.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl CompileError {
    pub(crate) fn unknown_column(alias: Option<&str>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            alias: alias.map(String::from),
            column: column.into(),
        }
    }

    pub(crate) fn unsupported(dialect: &'static str, feature: impl Into<String>) -> Self {
        Self::UnsupportedDialectFeature {
            dialect,
            feature: feature.into(),
        }
    }
}

fn alias_suffix(alias: Option<&str>) -> String {
    alias.map_or_else(String::new, |a| format!(" (alias '{a}')"))
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_column_message_names_alias() {
        let err = CompileError::unknown_column(Some("o"), "order.colour");
        assert_eq!(
            err.to_string(),
            "unknown column 'order.colour' (alias 'o')"
        );
    }

    #[test]
    fn test_structure_error_names_transition() {
        let err = CompileError::StatementStructure {
            from: Clause::Start,
            to: Clause::Having,
        };
        assert_eq!(
            err.to_string(),
            "illegal clause transition: HAVING cannot follow <start>"
        );
    }
}

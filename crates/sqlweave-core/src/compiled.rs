//! Compiled statements.
//!
//! The output of the compiler: SQL text, the ordered parameter list and the
//! metadata the execution layer needs. Every statement records the byte
//! spans of its placeholders, so the diagnostic form with parameters
//! substituted in can be reproduced exactly.

use std::ops::Range;

use crate::ast::StatementKind;
use crate::dialect::Dialect;
use crate::value::SqlValue;

/// The part a physical statement plays for a split table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementRole {
    /// The statement addresses its table as a whole.
    Single,
    /// The parent half of a split table.
    Parent,
    /// The child half of a split table.
    Child,
}

/// How a generated primary key is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// The statement carries `RETURNING <key>`.
    Returning,
    /// The driver reports the last generated key.
    Driver,
}

/// A generated primary key to retrieve after execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKey {
    /// The key column.
    pub column: String,
    /// The retrieval strategy.
    pub strategy: KeyStrategy,
}

/// One physical SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub(crate) kind: StatementKind,
    pub(crate) role: StatementRole,
    pub(crate) table: String,
    pub(crate) sql: String,
    pub(crate) params: Vec<SqlValue>,
    pub(crate) placeholders: Vec<Range<usize>>,
    pub(crate) selection: Vec<String>,
    pub(crate) has_version_predicate: bool,
    pub(crate) has_named_parameter: bool,
    pub(crate) generated_key: Option<GeneratedKey>,
}

impl SqlStatement {
    /// The statement kind.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// The role of the statement for a split table.
    #[must_use]
    pub const fn role(&self) -> StatementRole {
        self.role
    }

    /// The physical name of the target table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The parameters, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Byte spans of the placeholders.
    #[must_use]
    pub fn placeholders(&self) -> &[Range<usize>] {
        &self.placeholders
    }

    /// Output labels of a query-shaped statement.
    #[must_use]
    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Whether an optimistic-lock version predicate is present.
    #[must_use]
    pub const fn has_version_predicate(&self) -> bool {
        self.has_version_predicate
    }

    /// Whether a named parameter was bound.
    #[must_use]
    pub const fn has_named_parameter(&self) -> bool {
        self.has_named_parameter
    }

    /// The generated key to retrieve, if any.
    #[must_use]
    pub const fn generated_key(&self) -> Option<&GeneratedKey> {
        self.generated_key.as_ref()
    }

    /// The SQL text with every parameter substituted as a literal.
    #[must_use]
    pub fn printable(&self, dialect: &dyn Dialect) -> String {
        printable(&self.sql, &self.placeholders, &self.params, dialect)
    }
}

/// Substitutes `params` into the placeholder spans of `sql`.
///
/// Placeholders without a parameter are left as written.
#[must_use]
pub fn printable(
    sql: &str,
    placeholders: &[Range<usize>],
    params: &[SqlValue],
    dialect: &dyn Dialect,
) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for (span, value) in placeholders.iter().zip(params) {
        out.push_str(&sql[last..span.start]);
        dialect.render_literal(value, &mut out);
        last = span.end;
    }
    out.push_str(&sql[last..]);
    out
}

/// Parent and child statements of one write on a split table.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedStatement {
    pub(crate) parent: SqlStatement,
    pub(crate) child: SqlStatement,
    pub(crate) parent_first: bool,
    pub(crate) child_key_slots: Vec<usize>,
}

impl PairedStatement {
    /// The statement on the parent table.
    #[must_use]
    pub const fn parent(&self) -> &SqlStatement {
        &self.parent
    }

    /// The statement on the child table.
    #[must_use]
    pub const fn child(&self) -> &SqlStatement {
        &self.child
    }

    /// Whether the parent statement runs first.
    #[must_use]
    pub const fn parent_first(&self) -> bool {
        self.parent_first
    }

    /// Indices of child parameters to fill with the parent's generated key.
    #[must_use]
    pub fn child_key_slots(&self) -> &[usize] {
        &self.child_key_slots
    }

    /// Both statements in execution order.
    #[must_use]
    pub fn in_order(&self) -> [&SqlStatement; 2] {
        if self.parent_first {
            [&self.parent, &self.child]
        } else {
            [&self.child, &self.parent]
        }
    }
}

/// One SQL template of a batch with the parameters of every row.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPart {
    pub(crate) statement: SqlStatement,
    pub(crate) params_per_row: usize,
    pub(crate) rows: usize,
    pub(crate) key_slots: Vec<usize>,
}

impl BatchPart {
    /// The template; its parameter list holds every row, row after row.
    #[must_use]
    pub const fn statement(&self) -> &SqlStatement {
        &self.statement
    }

    /// Number of parameters of one row.
    #[must_use]
    pub const fn params_per_row(&self) -> usize {
        self.params_per_row
    }

    /// Per-row parameter indices to fill with the generated parent key.
    #[must_use]
    pub fn key_slots(&self) -> &[usize] {
        &self.key_slots
    }

    /// The parameters of row `index`, or `None` past the last row.
    #[must_use]
    pub fn row_params(&self, index: usize) -> Option<&[SqlValue]> {
        if index >= self.rows {
            return None;
        }
        let start = index.checked_mul(self.params_per_row)?;
        let end = start.checked_add(self.params_per_row)?;
        self.statement.params.get(start..end)
    }

    /// The template with the parameters of row `index` substituted.
    #[must_use]
    pub fn printable_row(&self, index: usize, dialect: &dyn Dialect) -> Option<String> {
        let params = self.row_params(index)?;
        Some(printable(
            &self.statement.sql,
            &self.statement.placeholders,
            params,
            dialect,
        ))
    }
}

/// A statement executed once per parameter row.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatement {
    pub(crate) rows: usize,
    pub(crate) parts: Vec<BatchPart>,
}

impl BatchStatement {
    /// Number of parameter rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// The templates in execution order; two for a split table.
    #[must_use]
    pub fn parts(&self) -> &[BatchPart] {
        &self.parts
    }
}

/// One statement within a multi-statement text.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiItem {
    pub(crate) kind: StatementKind,
    pub(crate) role: StatementRole,
    pub(crate) table: String,
    pub(crate) span: Range<usize>,
    pub(crate) params: Range<usize>,
    pub(crate) selection: Vec<String>,
    pub(crate) has_version_predicate: bool,
    pub(crate) row: Option<usize>,
}

impl MultiItem {
    /// The statement kind.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// The role of the statement for a split table.
    #[must_use]
    pub const fn role(&self) -> StatementRole {
        self.role
    }

    /// The physical name of the target table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Byte span of the statement within the text.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Index range of the statement's parameters.
    #[must_use]
    pub fn param_range(&self) -> Range<usize> {
        self.params.clone()
    }

    /// Output labels of a query-shaped statement.
    #[must_use]
    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Whether an optimistic-lock version predicate is present.
    #[must_use]
    pub const fn has_version_predicate(&self) -> bool {
        self.has_version_predicate
    }

    /// The batch row the statement was produced for.
    #[must_use]
    pub const fn row(&self) -> Option<usize> {
        self.row
    }
}

/// Several statements joined into one text.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiStatement {
    pub(crate) sql: String,
    pub(crate) params: Vec<SqlValue>,
    pub(crate) placeholders: Vec<Range<usize>>,
    pub(crate) items: Vec<MultiItem>,
    pub(crate) rows: Option<usize>,
    pub(crate) has_named_parameter: bool,
}

impl MultiStatement {
    /// The whole text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Every parameter, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Byte spans of the placeholders.
    #[must_use]
    pub fn placeholders(&self) -> &[Range<usize>] {
        &self.placeholders
    }

    /// The statements of the text.
    #[must_use]
    pub fn items(&self) -> &[MultiItem] {
        &self.items
    }

    /// The text of statement `index`.
    #[must_use]
    pub fn item_sql(&self, index: usize) -> Option<&str> {
        self.items.get(index).and_then(|i| self.sql.get(i.span.clone()))
    }

    /// Number of batch rows, when produced from a batch.
    #[must_use]
    pub const fn rows(&self) -> Option<usize> {
        self.rows
    }

    /// The text with every parameter substituted as a literal.
    #[must_use]
    pub fn printable(&self, dialect: &dyn Dialect) -> String {
        printable(&self.sql, &self.placeholders, &self.params, dialect)
    }
}

/// The result of compiling one logical statement.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledStatement {
    /// One statement.
    Simple(SqlStatement),
    /// One INSERT whose generated key must be retrieved.
    GeneratedKey(SqlStatement),
    /// Parent and child statements of a split table.
    Paired(PairedStatement),
    /// Templates executed once per parameter row.
    Batch(BatchStatement),
    /// Statements joined into one text.
    Multi(MultiStatement),
}

impl CompiledStatement {
    /// The physical statements in execution order.
    ///
    /// Batch templates are listed once; multi-statement texts list none.
    #[must_use]
    pub fn statements(&self) -> Vec<&SqlStatement> {
        match self {
            Self::Simple(s) | Self::GeneratedKey(s) => vec![s],
            Self::Paired(p) => p.in_order().to_vec(),
            Self::Batch(b) => b.parts.iter().map(|p| &p.statement).collect(),
            Self::Multi(_) => Vec::new(),
        }
    }

    /// Number of statements the database executes for one row.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        match self {
            Self::Simple(_) | Self::GeneratedKey(_) => 1,
            Self::Paired(_) => 2,
            Self::Batch(b) => b.parts.len(),
            Self::Multi(m) => m.items.len(),
        }
    }

    /// The SQL text of the first statement, or the whole multi-statement text.
    #[must_use]
    pub fn sql(&self) -> &str {
        match self {
            Self::Multi(m) => &m.sql,
            other => other.statements().first().map_or("", |s| s.sql.as_str()),
        }
    }

    /// The parameters matching [`Self::sql`].
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        match self {
            Self::Multi(m) => &m.params,
            other => other.statements().first().map_or(&[], |s| s.params.as_slice()),
        }
    }

    /// Output labels of a query-shaped statement.
    #[must_use]
    pub fn selection(&self) -> &[String] {
        match self {
            Self::Multi(m) => m.items.first().map_or(&[], |i| i.selection.as_slice()),
            other => other
                .statements()
                .first()
                .map_or(&[], |s| s.selection.as_slice()),
        }
    }

    /// Whether any statement carries an optimistic-lock version predicate.
    #[must_use]
    pub fn has_version_predicate(&self) -> bool {
        match self {
            Self::Multi(m) => m.items.iter().any(|i| i.has_version_predicate),
            other => other.statements().iter().any(|s| s.has_version_predicate),
        }
    }

    /// Whether any named parameter was bound.
    #[must_use]
    pub fn has_named_parameter(&self) -> bool {
        match self {
            Self::Multi(m) => m.has_named_parameter,
            other => other.statements().iter().any(|s| s.has_named_parameter),
        }
    }

    /// Whether this is a batch, in either mode.
    #[must_use]
    pub const fn is_batch(&self) -> bool {
        match self {
            Self::Batch(_) => true,
            Self::Multi(m) => m.rows.is_some(),
            _ => false,
        }
    }

    /// Number of parameter rows of a batch.
    #[must_use]
    pub const fn row_count(&self) -> Option<usize> {
        match self {
            Self::Batch(b) => Some(b.rows),
            Self::Multi(m) => m.rows,
            _ => None,
        }
    }

    fn has_role(&self, role: StatementRole) -> bool {
        match self {
            Self::Multi(m) => m.items.iter().any(|i| i.role == role),
            other => other.statements().iter().any(|s| s.role == role),
        }
    }

    /// Whether a statement on the parent half of a split table is produced.
    #[must_use]
    pub fn need_query_parent(&self) -> bool {
        self.has_role(StatementRole::Parent)
    }

    /// Whether a statement on the child half of a split table is produced.
    #[must_use]
    pub fn need_query_child(&self) -> bool {
        self.has_role(StatementRole::Child)
    }

    /// The diagnostic text: every statement with its parameters substituted,
    /// separated by `;`. Batches show their first row.
    #[must_use]
    pub fn printable(&self, dialect: &dyn Dialect) -> String {
        match self {
            Self::Multi(m) => m.printable(dialect),
            Self::Batch(b) => b
                .parts
                .iter()
                .filter_map(|p| p.printable_row(0, dialect))
                .collect::<Vec<_>>()
                .join("; "),
            other => other
                .statements()
                .iter()
                .map(|s| s.printable(dialect))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

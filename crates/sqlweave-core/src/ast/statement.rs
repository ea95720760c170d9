//! Statement AST types.
//!
//! The tree is produced by a criteria builder and consumed read-only by the
//! compiler. Constructors here are thin conveniences over the public fields.

use serde::{Deserialize, Serialize};

use super::expr::Expr;
use crate::meta::{FieldRef, Table};
use crate::row::Row;

/// A predicate of a WHERE/ON/HAVING conjunction.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// The boolean expression.
    pub expr: Expr,
    /// Whether this is an optimistic-lock version predicate.
    pub version: bool,
}

impl Predicate {
    /// Creates a predicate explicitly flagged as a version check.
    #[must_use]
    pub const fn version(expr: Expr) -> Self {
        Self {
            expr,
            version: true,
        }
    }
}

impl From<Expr> for Predicate {
    fn from(expr: Expr) -> Self {
        let version = expr.is_version_check();
        Self { expr, version }
    }
}

/// Soft-delete filter applied to tables owning a visibility column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Only rows flagged visible.
    #[default]
    OnlyVisible,
    /// Only rows flagged invisible.
    OnlyInvisible,
    /// No filter.
    Both,
}

impl Visibility {
    /// The visibility flag value to filter on, if any.
    #[must_use]
    pub const fn flag(self) -> Option<bool> {
        match self {
            Self::OnlyVisible => Some(true),
            Self::OnlyInvisible => Some(false),
            Self::Both => None,
        }
    }
}

/// A projected column.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// An expression, with an optional output label.
    Expr {
        /// The expression.
        expr: Expr,
        /// The output label.
        alias: Option<String>,
    },
    /// Every column reachable through an alias (`alias.*`).
    AllOf(String),
}

impl Selection {
    /// Selects an expression under its natural label.
    #[must_use]
    pub fn expr(expr: impl Into<Expr>) -> Self {
        Self::Expr {
            expr: expr.into(),
            alias: None,
        }
    }

    /// Selects an expression under `alias`.
    #[must_use]
    pub fn labeled(expr: impl Into<Expr>, alias: &str) -> Self {
        Self::Expr {
            expr: expr.into(),
            alias: Some(String::from(alias)),
        }
    }

    /// Selects every column of `alias`.
    #[must_use]
    pub fn all_of(alias: &str) -> Self {
        Self::AllOf(String::from(alias))
    }
}

/// A row source in FROM or JOIN.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// A logical table.
    Table {
        /// The table.
        table: Table,
        /// The alias; defaults to the table name.
        alias: Option<String>,
    },
    /// A subquery.
    Derived {
        /// The subquery.
        query: Box<Query>,
        /// The alias, mandatory for derived tables.
        alias: String,
    },
}

impl TableSource {
    /// Creates a table source.
    #[must_use]
    pub fn table(table: &Table, alias: Option<&str>) -> Self {
        Self::Table {
            table: table.clone(),
            alias: alias.map(String::from),
        }
    }

    /// Creates a derived table source.
    #[must_use]
    pub fn derived(query: impl Into<Query>, alias: &str) -> Self {
        Self::Derived {
            query: Box::new(query.into()),
            alias: String::from(alias),
        }
    }

    /// The alias the source is registered under.
    #[must_use]
    pub fn alias(&self) -> &str {
        match self {
            Self::Table { table, alias } => alias.as_deref().unwrap_or_else(|| table.name()),
            Self::Derived { alias, .. } => alias,
        }
    }
}

/// Join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN
    Inner,
    /// LEFT OUTER JOIN
    Left,
    /// RIGHT OUTER JOIN
    Right,
    /// FULL OUTER JOIN
    Full,
    /// CROSS JOIN
    Cross,
}

impl JoinKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }

    /// Returns true for joins that keep unmatched rows.
    #[must_use]
    pub const fn is_outer(&self) -> bool {
        matches!(self, Self::Left | Self::Right | Self::Full)
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// The join type.
    pub kind: JoinKind,
    /// The joined source.
    pub source: TableSource,
    /// The ON conjunction (empty for CROSS JOIN).
    pub on: Vec<Predicate>,
}

impl Join {
    /// Creates a join.
    #[must_use]
    pub fn new(kind: JoinKind, source: TableSource, on: Vec<Predicate>) -> Self {
        Self { kind, source, on }
    }
}

/// An ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// The sort key.
    pub expr: Expr,
    /// Descending order.
    pub desc: bool,
}

impl Order {
    /// Ascending order on `expr`.
    #[must_use]
    pub fn asc(expr: impl Into<Expr>) -> Self {
        Self {
            expr: expr.into(),
            desc: false,
        }
    }

    /// Descending order on `expr`.
    #[must_use]
    pub fn desc(expr: impl Into<Expr>) -> Self {
        Self {
            expr: expr.into(),
            desc: true,
        }
    }
}

/// Row-lock modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// FOR UPDATE
    Update,
    /// FOR SHARE
    Share,
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    /// Whether DISTINCT is specified.
    pub distinct: bool,
    /// The projection; empty means `*`.
    pub selections: Vec<Selection>,
    /// The main source.
    pub from: TableSource,
    /// JOIN clauses.
    pub joins: Vec<Join>,
    /// WHERE conjunction.
    pub where_: Vec<Predicate>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// HAVING conjunction.
    pub having: Vec<Predicate>,
    /// ORDER BY items.
    pub order_by: Vec<Order>,
    /// LIMIT.
    pub limit: Option<u64>,
    /// OFFSET.
    pub offset: Option<u64>,
    /// Row lock.
    pub lock: Option<LockMode>,
    /// Soft-delete filter override.
    pub visibility: Option<Visibility>,
}

impl SelectStmt {
    /// Starts a SELECT over `source`.
    #[must_use]
    pub const fn new(source: TableSource) -> Self {
        Self {
            distinct: false,
            selections: Vec::new(),
            from: source,
            joins: Vec::new(),
            where_: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            lock: None,
            visibility: None,
        }
    }

    /// Starts a SELECT over `table` registered under `alias`.
    #[must_use]
    pub fn from_table(table: &Table, alias: &str) -> Self {
        Self::new(TableSource::table(table, Some(alias)))
    }

    /// Adds DISTINCT.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds a projected column.
    #[must_use]
    pub fn select(mut self, selection: Selection) -> Self {
        self.selections.push(selection);
        self
    }

    /// Adds a JOIN.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Adds a WHERE predicate.
    #[must_use]
    pub fn filter(mut self, predicate: impl Into<Predicate>) -> Self {
        self.where_.push(predicate.into());
        self
    }

    /// Adds a GROUP BY expression.
    #[must_use]
    pub fn group_by(mut self, expr: impl Into<Expr>) -> Self {
        self.group_by.push(expr.into());
        self
    }

    /// Adds a HAVING predicate.
    #[must_use]
    pub fn having(mut self, predicate: impl Into<Predicate>) -> Self {
        self.having.push(predicate.into());
        self
    }

    /// Adds an ORDER BY item.
    #[must_use]
    pub fn order_by(mut self, order: Order) -> Self {
        self.order_by.push(order);
        self
    }

    /// Sets LIMIT.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets OFFSET.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the row lock.
    #[must_use]
    pub const fn lock(mut self, mode: LockMode) -> Self {
        self.lock = Some(mode);
        self
    }

    /// Overrides the soft-delete filter.
    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// Set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// UNION
    Union,
    /// UNION ALL
    UnionAll,
    /// INTERSECT
    Intersect,
    /// EXCEPT
    Except,
}

impl SetOp {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

/// Two queries combined by a set operator.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundQuery {
    /// Left operand.
    pub left: Box<Query>,
    /// Operator.
    pub op: SetOp,
    /// Right operand.
    pub right: Box<Query>,
    /// ORDER BY over output labels.
    pub order_by: Vec<Order>,
    /// LIMIT.
    pub limit: Option<u64>,
    /// OFFSET.
    pub offset: Option<u64>,
}

/// A standalone VALUES statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesStmt {
    /// The rows; every row has the same width.
    pub rows: Vec<Vec<Expr>>,
    /// ORDER BY over output labels.
    pub order_by: Vec<Order>,
    /// LIMIT.
    pub limit: Option<u64>,
}

impl ValuesStmt {
    /// Creates a VALUES statement.
    #[must_use]
    pub const fn new(rows: Vec<Vec<Expr>>) -> Self {
        Self {
            rows,
            order_by: Vec::new(),
            limit: None,
        }
    }
}

/// A query-shaped statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// SELECT.
    Select(SelectStmt),
    /// Set operation.
    Compound(CompoundQuery),
    /// VALUES.
    Values(ValuesStmt),
}

impl Query {
    /// Combines two queries.
    #[must_use]
    pub fn compound(left: impl Into<Self>, op: SetOp, right: impl Into<Self>) -> Self {
        Self::Compound(CompoundQuery {
            left: Box::new(left.into()),
            op,
            right: Box::new(right.into()),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        })
    }

    /// Returns true when ORDER BY, LIMIT, OFFSET or a lock trail the query.
    #[must_use]
    pub fn has_trailer(&self) -> bool {
        match self {
            Self::Select(s) => {
                !s.order_by.is_empty() || s.limit.is_some() || s.offset.is_some() || s.lock.is_some()
            }
            Self::Compound(c) => !c.order_by.is_empty() || c.limit.is_some() || c.offset.is_some(),
            Self::Values(v) => !v.order_by.is_empty() || v.limit.is_some(),
        }
    }
}

impl From<SelectStmt> for Query {
    fn from(select: SelectStmt) -> Self {
        Self::Select(select)
    }
}

impl From<ValuesStmt> for Query {
    fn from(values: ValuesStmt) -> Self {
        Self::Values(values)
    }
}

/// Rows fed to an INSERT.
#[derive(Debug, Clone)]
pub enum InsertSource {
    /// Explicit value rows, one expression per listed column.
    Values(Vec<Vec<Expr>>),
    /// Domain rows read through the row accessor by column name.
    Rows(Vec<Row>),
    /// INSERT .. SELECT.
    Query(Box<Query>),
}

/// A `column = value` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// The assigned column.
    pub column: FieldRef,
    /// The new value.
    pub value: Expr,
}

impl Assignment {
    /// Creates an assignment.
    #[must_use]
    pub fn new(column: FieldRef, value: impl Into<Expr>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// What an upsert does with a conflicting row.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    /// Keep the existing row.
    DoNothing,
    /// Update the existing row.
    DoUpdate(Vec<Assignment>),
}

/// Upsert clause.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    /// The unique columns the conflict is detected on.
    pub target: Vec<FieldRef>,
    /// The action.
    pub action: ConflictAction,
}

/// An INSERT statement.
#[derive(Debug, Clone)]
pub struct InsertStmt {
    /// The target table.
    pub table: Table,
    /// The listed columns.
    pub columns: Vec<FieldRef>,
    /// The rows.
    pub source: InsertSource,
    /// Upsert clause.
    pub on_conflict: Option<OnConflict>,
    /// RETURNING expressions.
    pub returning: Vec<Expr>,
    /// Whether the generated primary key must be retrieved.
    pub return_generated_key: bool,
}

impl InsertStmt {
    /// Creates an INSERT of explicit value rows.
    #[must_use]
    pub fn values(table: &Table, columns: Vec<FieldRef>, rows: Vec<Vec<Expr>>) -> Self {
        Self::with_source(table, columns, InsertSource::Values(rows))
    }

    /// Creates an INSERT of domain rows.
    #[must_use]
    pub fn rows(table: &Table, columns: Vec<FieldRef>, rows: Vec<Row>) -> Self {
        Self::with_source(table, columns, InsertSource::Rows(rows))
    }

    /// Creates an INSERT .. SELECT.
    #[must_use]
    pub fn select(table: &Table, columns: Vec<FieldRef>, query: impl Into<Query>) -> Self {
        Self::with_source(table, columns, InsertSource::Query(Box::new(query.into())))
    }

    fn with_source(table: &Table, columns: Vec<FieldRef>, source: InsertSource) -> Self {
        Self {
            table: table.clone(),
            columns,
            source,
            on_conflict: None,
            returning: Vec::new(),
            return_generated_key: false,
        }
    }

    /// Adds an upsert clause.
    #[must_use]
    pub fn on_conflict(mut self, target: Vec<FieldRef>, action: ConflictAction) -> Self {
        self.on_conflict = Some(OnConflict { target, action });
        self
    }

    /// Adds RETURNING expressions.
    #[must_use]
    pub fn returning(mut self, exprs: Vec<Expr>) -> Self {
        self.returning = exprs;
        self
    }

    /// Requests the generated primary key.
    #[must_use]
    pub const fn generated_key(mut self) -> Self {
        self.return_generated_key = true;
        self
    }
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    /// The target table.
    pub table: Table,
    /// The target alias; defaults to the table name.
    pub alias: Option<String>,
    /// Joined tables (multi-table update).
    pub joins: Vec<Join>,
    /// SET assignments.
    pub assignments: Vec<Assignment>,
    /// WHERE conjunction.
    pub where_: Vec<Predicate>,
    /// ORDER BY items.
    pub order_by: Vec<Order>,
    /// LIMIT.
    pub limit: Option<u64>,
    /// RETURNING expressions.
    pub returning: Vec<Expr>,
    /// Soft-delete filter override.
    pub visibility: Option<Visibility>,
}

impl UpdateStmt {
    /// Starts an UPDATE of `table` under `alias`.
    #[must_use]
    pub fn new(table: &Table, alias: Option<&str>) -> Self {
        Self {
            table: table.clone(),
            alias: alias.map(String::from),
            joins: Vec::new(),
            assignments: Vec::new(),
            where_: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            returning: Vec::new(),
            visibility: None,
        }
    }

    /// The alias the target is registered under.
    #[must_use]
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.table.name())
    }

    /// Adds an assignment.
    #[must_use]
    pub fn set(mut self, column: FieldRef, value: impl Into<Expr>) -> Self {
        self.assignments.push(Assignment::new(column, value));
        self
    }

    /// Adds a JOIN.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Adds a WHERE predicate.
    #[must_use]
    pub fn filter(mut self, predicate: impl Into<Predicate>) -> Self {
        self.where_.push(predicate.into());
        self
    }

    /// Adds an ORDER BY item.
    #[must_use]
    pub fn order_by(mut self, order: Order) -> Self {
        self.order_by.push(order);
        self
    }

    /// Sets LIMIT.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Adds RETURNING expressions.
    #[must_use]
    pub fn returning(mut self, exprs: Vec<Expr>) -> Self {
        self.returning = exprs;
        self
    }

    /// Overrides the soft-delete filter.
    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    /// The target table.
    pub table: Table,
    /// The target alias; defaults to the table name.
    pub alias: Option<String>,
    /// WHERE conjunction.
    pub where_: Vec<Predicate>,
    /// ORDER BY items.
    pub order_by: Vec<Order>,
    /// LIMIT.
    pub limit: Option<u64>,
    /// RETURNING expressions.
    pub returning: Vec<Expr>,
    /// Soft-delete filter override.
    pub visibility: Option<Visibility>,
}

impl DeleteStmt {
    /// Starts a DELETE from `table` under `alias`.
    #[must_use]
    pub fn new(table: &Table, alias: Option<&str>) -> Self {
        Self {
            table: table.clone(),
            alias: alias.map(String::from),
            where_: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            returning: Vec::new(),
            visibility: None,
        }
    }

    /// The alias the target is registered under.
    #[must_use]
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.table.name())
    }

    /// Adds a WHERE predicate.
    #[must_use]
    pub fn filter(mut self, predicate: impl Into<Predicate>) -> Self {
        self.where_.push(predicate.into());
        self
    }

    /// Adds an ORDER BY item.
    #[must_use]
    pub fn order_by(mut self, order: Order) -> Self {
        self.order_by.push(order);
        self
    }

    /// Sets LIMIT.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Adds RETURNING expressions.
    #[must_use]
    pub fn returning(mut self, exprs: Vec<Expr>) -> Self {
        self.returning = exprs;
        self
    }

    /// Overrides the soft-delete filter.
    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// How a batch is sent to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// One SQL template executed once per row.
    #[default]
    Template,
    /// One statement per row, joined into a single text.
    MultiStatement,
}

/// A statement executed once per parameter row.
#[derive(Debug, Clone)]
pub struct BatchStmt {
    /// The statement; named parameters read the current row.
    pub statement: Box<Statement>,
    /// The parameter rows.
    pub rows: Vec<Row>,
    /// The emission mode.
    pub mode: BatchMode,
}

/// Statement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT or compound query.
    Select,
    /// Standalone VALUES.
    Values,
    /// INSERT.
    Insert,
    /// UPDATE.
    Update,
    /// DELETE.
    Delete,
}

impl StatementKind {
    /// Lowercase name, for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Values => "values",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// A logical statement.
#[derive(Debug, Clone)]
pub enum Statement {
    /// A query.
    Query(Query),
    /// INSERT.
    Insert(InsertStmt),
    /// UPDATE.
    Update(UpdateStmt),
    /// DELETE.
    Delete(DeleteStmt),
    /// One statement over many parameter rows.
    Batch(BatchStmt),
    /// Independent statements sent as one text.
    Multi(Vec<Statement>),
}

impl Statement {
    /// Wraps this statement into a batch over `rows`.
    #[must_use]
    pub fn batch(self, rows: Vec<Row>, mode: BatchMode) -> Self {
        Self::Batch(BatchStmt {
            statement: Box::new(self),
            rows,
            mode,
        })
    }

    /// Returns the kind of a single statement.
    #[must_use]
    pub fn kind(&self) -> Option<StatementKind> {
        match self {
            Self::Query(Query::Values(_)) => Some(StatementKind::Values),
            Self::Query(_) => Some(StatementKind::Select),
            Self::Insert(_) => Some(StatementKind::Insert),
            Self::Update(_) => Some(StatementKind::Update),
            Self::Delete(_) => Some(StatementKind::Delete),
            Self::Batch(b) => b.statement.kind(),
            Self::Multi(_) => None,
        }
    }
}

impl From<Query> for Statement {
    fn from(query: Query) -> Self {
        Self::Query(query)
    }
}

impl From<SelectStmt> for Statement {
    fn from(select: SelectStmt) -> Self {
        Self::Query(Query::Select(select))
    }
}

impl From<ValuesStmt> for Statement {
    fn from(values: ValuesStmt) -> Self {
        Self::Query(Query::Values(values))
    }
}

impl From<InsertStmt> for Statement {
    fn from(insert: InsertStmt) -> Self {
        Self::Insert(insert)
    }
}

impl From<UpdateStmt> for Statement {
    fn from(update: UpdateStmt) -> Self {
        Self::Update(update)
    }
}

impl From<DeleteStmt> for Statement {
    fn from(delete: DeleteStmt) -> Self {
        Self::Delete(delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::param;
    use crate::meta::ManagedColumn;

    fn accounts() -> Table {
        Table::builder("account")
            .primary_key("id")
            .column("name")
            .managed(ManagedColumn::Version, "version")
            .build()
    }

    #[test]
    fn test_predicate_detects_version() {
        let t = accounts();
        let p: Predicate = t.field("version").eq(param(2)).into();
        assert!(p.version);
        let p: Predicate = t.field("name").eq(param("a")).into();
        assert!(!p.version);
    }

    #[test]
    fn test_source_alias_defaults_to_table_name() {
        let t = accounts();
        assert_eq!(TableSource::table(&t, None).alias(), "account");
        assert_eq!(TableSource::table(&t, Some("a")).alias(), "a");
        assert_eq!(UpdateStmt::new(&t, None).alias(), "account");
    }

    #[test]
    fn test_statement_kind() {
        let t = accounts();
        let select: Statement = SelectStmt::from_table(&t, "a").into();
        assert_eq!(select.kind(), Some(StatementKind::Select));
        let batch = Statement::from(DeleteStmt::new(&t, None)).batch(vec![], BatchMode::Template);
        assert_eq!(batch.kind(), Some(StatementKind::Delete));
        assert_eq!(Statement::Multi(vec![]).kind(), None);
    }

    #[test]
    fn test_visibility_flags() {
        assert_eq!(Visibility::default().flag(), Some(true));
        assert_eq!(Visibility::OnlyInvisible.flag(), Some(false));
        assert_eq!(Visibility::Both.flag(), None);
    }
}

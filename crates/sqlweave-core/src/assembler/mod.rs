//! Statement assembly.
//!
//! [`SqlCompiler`] holds the immutable per-database state (dialect, router,
//! options) and hands out single-use [`StatementAssembler`]s. An assembler
//! walks one statement tree depth-first, writing every physical statement
//! into an emitter that owns the output sink, the parameter binder and the
//! scope stack. Subqueries and correlated lookups are written into the same
//! sink from nested scope frames.

mod batch;
mod dml;
mod expr;
mod select;

use std::mem;
use std::sync::Arc;

use tracing::debug;

use crate::ast::{Predicate, Statement, StatementKind};
use crate::binder::{ParamBinder, RowCursor};
use crate::clause::Clause;
use crate::compiled::{
    CompiledStatement, GeneratedKey, KeyStrategy, MultiItem, MultiStatement, PairedStatement,
    SqlStatement, StatementRole,
};
use crate::config::{CompileOptions, CompilerConfig};
use crate::dialect::Dialect;
use crate::error::{CompileError, Result};
use crate::inheritance::{plan_insert, plan_update};
use crate::meta::Table;
use crate::router::{key_in_predicates, KeyExpr, TableRouter};
use crate::scope::{self, FrameKind, ScopeResolver};
use crate::sink::SqlSink;
use crate::value::SqlValue;

/// Compiles statement trees for one target database.
///
/// A compiler is immutable once built and can be shared across threads;
/// every compilation uses its own assembler.
///
/// ```
/// use sqlweave_core::ast::{param, SelectStmt, Selection};
/// use sqlweave_core::dialect::DialectKind;
/// use sqlweave_core::{SqlCompiler, Table};
///
/// let users = Table::builder("users").primary_key("id").column("name").build();
/// let compiler = SqlCompiler::new(DialectKind::Postgres.build());
/// let query = SelectStmt::from_table(&users, "u")
///     .select(Selection::expr(users.field("name")))
///     .filter(users.field("id").eq(param(1)));
/// let compiled = compiler.compile(&query.into()).unwrap();
/// assert_eq!(compiled.sql(), "SELECT u.name FROM users AS u WHERE u.id = $1");
/// ```
#[derive(Debug, Clone)]
pub struct SqlCompiler {
    dialect: Arc<dyn Dialect>,
    router: TableRouter,
    options: CompileOptions,
}

impl SqlCompiler {
    /// Creates a compiler with default options and no routing.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            router: TableRouter::default(),
            options: CompileOptions::default(),
        }
    }

    /// Creates a compiler from its configuration.
    #[must_use]
    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            dialect: config.dialect.build(),
            router: TableRouter::new(config.routing.clone()),
            options: config.options(),
        }
    }

    /// Replaces the compile options.
    #[must_use]
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the table router.
    #[must_use]
    pub fn with_router(mut self, router: TableRouter) -> Self {
        self.router = router;
        self
    }

    /// The target dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        &*self.dialect
    }

    /// The compile options.
    #[must_use]
    pub const fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// The table router.
    #[must_use]
    pub const fn router(&self) -> &TableRouter {
        &self.router
    }

    /// Creates an assembler for `statement`.
    #[must_use]
    pub const fn assembler<'a>(&'a self, statement: &'a Statement) -> StatementAssembler<'a> {
        StatementAssembler {
            compiler: self,
            statement,
            finished: false,
        }
    }

    /// Compiles `statement`.
    pub fn compile(&self, statement: &Statement) -> Result<CompiledStatement> {
        self.assembler(statement).build()
    }

    fn ctx(&self) -> Ctx<'_> {
        Ctx {
            dialect: &*self.dialect,
            options: &self.options,
            router: &self.router,
        }
    }
}

/// Compiles one statement, once.
#[derive(Debug)]
pub struct StatementAssembler<'a> {
    compiler: &'a SqlCompiler,
    statement: &'a Statement,
    finished: bool,
}

impl StatementAssembler<'_> {
    /// Produces the compiled statement.
    ///
    /// The assembler is marked finished before compiling; a second call
    /// fails with [`CompileError::AlreadyBuilt`], even when the first failed.
    pub fn build(&mut self) -> Result<CompiledStatement> {
        if self.finished {
            return Err(CompileError::AlreadyBuilt);
        }
        self.finished = true;

        let ctx = self.compiler.ctx();
        let compiled = match self.statement {
            Statement::Batch(batch) => batch::compile_batch(ctx, batch)?,
            Statement::Multi(statements) => batch::compile_multi(ctx, statements)?,
            single => {
                let mut out = Output::separate(ctx, None);
                out.statement(single)?;
                out.into_compiled()?
            }
        };
        debug!(
            dialect = ctx.dialect.name(),
            kind = self.statement.kind().map_or("multi", |k| k.as_str()),
            statements = compiled.statement_count(),
            params = compiled.params().len(),
            "compiled statement"
        );
        Ok(compiled)
    }

    /// Whether [`Self::build`] was called.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Read-only state threaded through one compilation.
#[derive(Clone, Copy)]
pub(crate) struct Ctx<'c> {
    dialect: &'c dyn Dialect,
    options: &'c CompileOptions,
    router: &'c TableRouter,
}

/// Statement-level metadata reported by the emitting functions.
#[derive(Debug)]
pub(crate) struct PartMeta {
    kind: StatementKind,
    role: StatementRole,
    table: String,
    selection: Vec<String>,
    generated_key: Option<GeneratedKey>,
    key_slots: Vec<usize>,
}

/// A finished physical statement.
#[derive(Debug)]
pub(crate) struct Emitted {
    statement: SqlStatement,
    key_slots: Vec<usize>,
}

/// Writes the text and parameters of physical statements.
pub(crate) struct Emitter<'c> {
    ctx: Ctx<'c>,
    sink: SqlSink,
    binder: ParamBinder,
    scope: ScopeResolver,
    route: Option<(Table, Option<SqlValue>)>,
    version: bool,
}

impl<'c> Emitter<'c> {
    fn new(ctx: Ctx<'c>, cursor: Option<RowCursor>) -> Self {
        let style = ctx.dialect.placeholder_style();
        let binder = match cursor {
            Some(cursor) => ParamBinder::with_cursor(style, cursor),
            None => ParamBinder::new(style),
        };
        Self {
            ctx,
            sink: SqlSink::new(),
            binder,
            scope: ScopeResolver::new(),
            route: None,
            version: false,
        }
    }

    fn finish(self, meta: PartMeta) -> Emitted {
        let has_named_parameter = self.binder.has_named();
        let (sql, placeholders) = self.sink.into_parts();
        let (params, _) = self.binder.into_parts();
        Emitted {
            statement: SqlStatement {
                kind: meta.kind,
                role: meta.role,
                table: meta.table,
                sql,
                params,
                placeholders,
                selection: meta.selection,
                has_version_predicate: self.version,
                has_named_parameter,
                generated_key: meta.generated_key,
            },
            key_slots: meta.key_slots,
        }
    }

    /// The routing column of `table`, or of its parent.
    fn rule_column(&self, table: &Table) -> Option<String> {
        let router = self.ctx.router;
        router
            .rule(table)
            .or_else(|| table.parent().and_then(|p| router.rule(p)))
            .map(|rule| rule.column.clone())
    }

    /// Fixes the routing key of the statement on `table`.
    fn route(&mut self, table: &Table, key: Option<KeyExpr<'_>>) -> Result<()> {
        let value = match key {
            Some(KeyExpr::Value(value)) => Some(value.clone()),
            Some(KeyExpr::Named(name)) => Some(self.binder.current_row_value(name)?),
            None => None,
        };
        self.route = Some((table.clone(), value));
        Ok(())
    }

    fn route_predicates(&mut self, table: &Table, predicates: &[Predicate]) -> Result<()> {
        let key = self
            .rule_column(table)
            .and_then(|column| key_in_predicates(predicates, table, &column));
        self.route(table, key)
    }

    /// The physical name of `table` in the current statement.
    fn physical(&self, table: &Table) -> String {
        let router = self.ctx.router;
        match &self.route {
            Some((target, key))
                if target.same_as(table) || target.is_child_of(table) || table.is_child_of(target) =>
            {
                router.physical_name(table, key.as_ref())
            }
            _ => router.primary_name(table),
        }
    }

    /// Writes the physical name of `table`, followed by `alias` when it differs.
    fn write_table(&mut self, table: &Table, alias: &str) {
        let physical = self.physical(table);
        self.write_identifier(&physical);
        if alias != physical {
            if self.ctx.dialect.supports_table_alias_as() {
                self.sink.keyword("AS");
            }
            self.write_identifier(alias);
        }
    }

    fn write_identifier(&mut self, name: &str) {
        let dialect = self.ctx.dialect;
        self.sink.word_with(|out| dialect.write_identifier(name, out));
    }

    fn write_column(&mut self, alias: &str, column: &str) {
        scope::write_column(&mut self.sink, self.ctx.dialect, alias, column);
    }

    fn write_literal(&mut self, value: &SqlValue) {
        if matches!(value, SqlValue::Float(f) if !f.is_finite()) {
            self.bind(value.clone());
            return;
        }
        let dialect = self.ctx.dialect;
        self.sink.word_with(|out| dialect.render_literal(value, out));
    }

    fn bind(&mut self, value: SqlValue) {
        self.binder.append_param(&mut self.sink, value);
    }

    fn enter(&mut self, clause: Clause) -> Result<()> {
        self.scope.enter(clause, &mut self.sink)
    }
}

/// Collects the physical statements of one compilation.
///
/// In separate mode every statement gets a fresh emitter; in shared mode all
/// statements are written into one text, each in its own batch-item frame.
pub(crate) struct Output<'c> {
    ctx: Ctx<'c>,
    shared: bool,
    cursor: Option<RowCursor>,
    emitter: Emitter<'c>,
    start: (usize, usize),
    emitted: Vec<Emitted>,
    items: Vec<MultiItem>,
}

impl<'c> Output<'c> {
    pub(crate) fn separate(ctx: Ctx<'c>, cursor: Option<RowCursor>) -> Self {
        Self::new(ctx, cursor, false)
    }

    pub(crate) fn shared(ctx: Ctx<'c>, cursor: Option<RowCursor>) -> Self {
        Self::new(ctx, cursor, true)
    }

    fn new(ctx: Ctx<'c>, cursor: Option<RowCursor>, shared: bool) -> Self {
        Self {
            ctx,
            shared,
            emitter: Emitter::new(ctx, cursor.clone()),
            cursor,
            start: (0, 0),
            emitted: Vec::new(),
            items: Vec::new(),
        }
    }

    fn begin(&mut self) -> &mut Emitter<'c> {
        let emitter = &mut self.emitter;
        if self.shared {
            if !self.items.is_empty() {
                emitter.sink.push(self.ctx.dialect.statement_separator());
                emitter.sink.push(" ");
            }
            emitter.route = None;
            emitter.version = false;
            emitter.scope.push(FrameKind::BatchItem);
        }
        self.start = (emitter.sink.len(), emitter.binder.len());
        emitter
    }

    fn end(&mut self, meta: PartMeta) -> Result<()> {
        if !self.shared {
            let fresh = Emitter::new(self.ctx, self.cursor.clone());
            let emitter = mem::replace(&mut self.emitter, fresh);
            self.emitted.push(emitter.finish(meta));
            return Ok(());
        }

        self.emitter.scope.pop()?;
        let driver_key = meta
            .generated_key
            .as_ref()
            .is_some_and(|k| k.strategy == KeyStrategy::Driver);
        if !meta.key_slots.is_empty() || driver_key {
            return Err(CompileError::unsupported(
                self.ctx.dialect.name(),
                "generated keys inside a multi-statement text",
            ));
        }
        self.items.push(MultiItem {
            kind: meta.kind,
            role: meta.role,
            table: meta.table,
            span: self.start.0..self.emitter.sink.len(),
            params: self.start.1..self.emitter.binder.len(),
            selection: meta.selection,
            has_version_predicate: self.emitter.version,
            row: self.emitter.binder.cursor().map(RowCursor::index),
        });
        Ok(())
    }

    /// Number of physical statements the plan of `statement` produces.
    pub(crate) fn planned(ctx: Ctx<'_>, statement: &Statement) -> Result<usize> {
        match statement {
            Statement::Insert(insert) => Ok(plan_insert(insert, ctx.options)?.len()),
            Statement::Update(update) => Ok(plan_update(update, ctx.options)?.len()),
            Statement::Query(_) | Statement::Delete(_) => Ok(1),
            Statement::Batch(_) | Statement::Multi(_) => Err(nested()),
        }
    }

    /// Emits every physical statement of `statement`.
    pub(crate) fn statement(&mut self, statement: &Statement) -> Result<()> {
        let options = self.ctx.options;
        match statement {
            Statement::Query(query) => {
                let meta = self.begin().top_query(query)?;
                self.end(meta)
            }
            Statement::Insert(insert) => {
                for part in plan_insert(insert, options)? {
                    let meta = self.begin().insert(insert, &part)?;
                    self.end(meta)?;
                }
                Ok(())
            }
            Statement::Update(update) => {
                for part in plan_update(update, options)? {
                    let meta = self.begin().update(update, &part)?;
                    self.end(meta)?;
                }
                Ok(())
            }
            Statement::Delete(delete) => {
                let meta = self.begin().delete(delete)?;
                self.end(meta)
            }
            Statement::Batch(_) | Statement::Multi(_) => Err(nested()),
        }
    }

    pub(crate) fn advance_row(&mut self) -> Result<()> {
        self.emitter.binder.advance_row()
    }

    pub(crate) fn item_count(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn into_emitted(self) -> Vec<Emitted> {
        self.emitted
    }

    pub(crate) fn into_compiled(self) -> Result<CompiledStatement> {
        let count = self.emitted.len();
        let mut emitted = self.emitted.into_iter();
        match (emitted.next(), emitted.next(), emitted.next()) {
            (Some(single), None, None) => {
                let statement = single.statement;
                if statement.generated_key.is_some() {
                    Ok(CompiledStatement::GeneratedKey(statement))
                } else {
                    Ok(CompiledStatement::Simple(statement))
                }
            }
            (Some(parent), Some(child), None) => Ok(CompiledStatement::Paired(PairedStatement {
                parent: parent.statement,
                child: child.statement,
                parent_first: true,
                child_key_slots: child.key_slots,
            })),
            _ => Err(CompileError::BatchSizeMismatch {
                expected: 2,
                emitted: count,
            }),
        }
    }

    pub(crate) fn into_multi(self, rows: Option<usize>) -> MultiStatement {
        let has_named_parameter = self.emitter.binder.has_named();
        let (sql, placeholders) = self.emitter.sink.into_parts();
        let (params, _) = self.emitter.binder.into_parts();
        MultiStatement {
            sql,
            params,
            placeholders,
            items: self.items,
            rows,
            has_named_parameter,
        }
    }
}

fn nested() -> CompileError {
    CompileError::InvalidStatement(String::from(
        "batch and multi-statement bundles cannot be nested",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{lit, param, DeleteStmt, SelectStmt, Selection, UpdateStmt};
    use crate::dialect::{DialectKind, GenericDialect};
    use crate::meta::ManagedColumn;

    fn users() -> Table {
        Table::builder("users")
            .primary_key("id")
            .column("name")
            .managed(ManagedColumn::Visible, "visible")
            .build()
    }

    #[test]
    fn test_non_finite_float_literal_is_bound() {
        let compiler = SqlCompiler::new(Arc::new(GenericDialect::new()));
        let t = Table::builder("tag").primary_key("id").build();
        let statement: Statement = SelectStmt::from_table(&t, "t")
            .select(Selection::expr(lit(1.5)))
            .select(Selection::expr(lit(f64::NAN)))
            .into();
        let compiled = compiler.compile(&statement).unwrap();
        assert_eq!(compiled.sql(), "SELECT 1.5, ? FROM tag AS t");
        assert!(matches!(compiled.params(), [SqlValue::Float(f)] if f.is_nan()));
    }

    #[test]
    fn test_compiler_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqlCompiler>();
        assert_send_sync::<Table>();
        assert_send_sync::<Statement>();
    }

    #[test]
    fn test_build_twice_fails() {
        let compiler = SqlCompiler::new(Arc::new(GenericDialect::new()));
        let statement: Statement = SelectStmt::from_table(&users(), "u").into();
        let mut assembler = compiler.assembler(&statement);
        assert!(assembler.build().is_ok());
        assert!(assembler.is_finished());
        assert!(matches!(assembler.build(), Err(CompileError::AlreadyBuilt)));
    }

    #[test]
    fn test_failed_build_still_finishes() {
        let compiler = SqlCompiler::new(Arc::new(GenericDialect::new()));
        let t = users();
        let statement: Statement = UpdateStmt::new(&t, None).into();
        let mut assembler = compiler.assembler(&statement);
        assert!(matches!(
            assembler.build(),
            Err(CompileError::InvalidStatement(_))
        ));
        assert!(matches!(assembler.build(), Err(CompileError::AlreadyBuilt)));
    }

    #[test]
    fn test_visibility_filter_on_delete() {
        let compiler = SqlCompiler::new(DialectKind::Sqlite.build());
        let t = users();
        let statement: Statement = DeleteStmt::new(&t, None)
            .filter(t.field("id").eq(param(3)))
            .into();
        let compiled = compiler.compile(&statement).unwrap();
        assert_eq!(
            compiled.sql(),
            "DELETE FROM users WHERE users.id = ? AND users.visible = 1"
        );
        assert_eq!(compiled.params(), &[SqlValue::Int(3)]);
    }

    #[test]
    fn test_selection_labels() {
        let compiler = SqlCompiler::new(Arc::new(GenericDialect::new()));
        let t = users();
        let statement: Statement = SelectStmt::from_table(&t, "u")
            .select(Selection::expr(t.field("id")))
            .select(Selection::labeled(t.field("name"), "user_name"))
            .into();
        let compiled = compiler.compile(&statement).unwrap();
        assert_eq!(
            compiled.sql(),
            "SELECT u.id, u.name AS user_name FROM users AS u WHERE u.visible = TRUE"
        );
        assert_eq!(compiled.selection(), ["id", "user_name"]);
    }
}

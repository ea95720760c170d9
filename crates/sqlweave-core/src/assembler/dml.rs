//! INSERT, UPDATE and DELETE emission.

use super::select::natural_label;
use super::{Emitter, PartMeta};
use crate::ast::{
    Assignment, ConflictAction, DeleteStmt, Expr, InsertSource, InsertStmt, OnConflict, Order,
    StatementKind, TableSource, UpdateStmt,
};
use crate::clause::Clause;
use crate::compiled::{GeneratedKey, KeyStrategy, StatementRole};
use crate::dialect::{MultiTableUpdate, UpsertStyle};
use crate::error::{CompileError, Result};
use crate::inheritance::{plain, split_read, Conjunct, Filter, InsertPart, InsertValue, UpdatePart};
use crate::meta::Table;
use crate::scope::{FrameKind, Location};
use crate::value::SqlValue;

impl Emitter<'_> {
    /// The routing key of an INSERT, read from its first row.
    fn insert_key(&self, stmt: &InsertStmt, column: &str) -> Result<Option<SqlValue>> {
        let Some(index) = stmt.columns.iter().position(|c| c.name() == column) else {
            return Ok(None);
        };
        match &stmt.source {
            InsertSource::Values(rows) => match rows.first().and_then(|r| r.get(index)) {
                Some(Expr::Param(value) | Expr::Literal(value)) => Ok(Some(value.clone())),
                Some(Expr::Named(name)) => self.binder.current_row_value(name).map(Some),
                _ => Ok(None),
            },
            InsertSource::Rows(rows) => Ok(rows.first().and_then(|r| r.value(column))),
            InsertSource::Query(_) => Ok(None),
        }
    }

    /// Writes `column = value`, the column bound through `alias`.
    fn assignment(&mut self, assignment: &Assignment, alias: &str, qualify: bool) -> Result<()> {
        let column = match self.scope.locate(Some(alias), &assignment.column)? {
            Location::Direct { column, .. } => column,
            Location::ViaParent { .. } => {
                return Err(CompileError::unknown_column(
                    Some(alias),
                    assignment.column.qualified_name(),
                ))
            }
        };
        self.set_target(alias, &column, qualify);
        self.sink.keyword("=");
        self.expr(&assignment.value)
    }

    fn set_target(&mut self, alias: &str, column: &str, qualify: bool) {
        if qualify {
            self.write_column(alias, column);
        } else {
            self.write_identifier(column);
        }
    }

    fn assignments(&mut self, list: &[&Assignment], alias: &str, qualify: bool) -> Result<()> {
        for (i, assignment) in list.iter().enumerate() {
            if i > 0 {
                self.sink.comma();
            }
            self.assignment(assignment, alias, qualify)?;
        }
        Ok(())
    }

    fn returning(&mut self, exprs: &[Expr]) -> Result<Vec<String>> {
        if exprs.is_empty() {
            return Ok(Vec::new());
        }
        let dialect = self.ctx.dialect;
        if !dialect.supports_returning() {
            return Err(CompileError::unsupported(dialect.name(), "RETURNING"));
        }
        self.enter(Clause::Returning)?;
        self.expr_list(exprs)?;
        Ok(exprs
            .iter()
            .enumerate()
            .map(|(i, e)| natural_label(e, i))
            .collect())
    }

    fn write_limit(&mut self, order_by: &[Order], limit: Option<u64>, joined: bool) -> Result<()> {
        if order_by.is_empty() && limit.is_none() {
            return Ok(());
        }
        let dialect = self.ctx.dialect;
        if !dialect.supports_update_limit() || joined {
            return Err(CompileError::unsupported(
                dialect.name(),
                "ORDER BY or LIMIT on UPDATE and DELETE",
            ));
        }
        self.order_by(order_by)?;
        self.limit_offset(limit, None)
    }

    /// Emits one physical INSERT.
    pub(super) fn insert(&mut self, stmt: &InsertStmt, part: &InsertPart<'_>) -> Result<PartMeta> {
        let dialect = self.ctx.dialect;
        if part.columns.is_empty() {
            return Err(CompileError::InvalidStatement(format!(
                "INSERT into '{}' lists no columns",
                part.table.name()
            )));
        }
        let key = match self.rule_column(&stmt.table) {
            Some(column) => self.insert_key(stmt, &column)?,
            None => None,
        };
        self.route = Some((stmt.table.clone(), key));

        self.scope.push(FrameKind::Write);
        let physical = self.physical(&part.table);
        self.scope.register_table(&physical, &part.table)?;

        self.enter(Clause::InsertInto)?;
        self.write_identifier(&physical);
        self.sink.open_paren();
        for (i, column) in part.columns.iter().enumerate() {
            if i > 0 {
                self.sink.comma();
            }
            match column.field {
                Some(field) => self.scope.resolve_field_only(field, &mut self.sink, dialect)?,
                None => self.write_identifier(&column.name),
            }
        }
        self.sink.close_paren();

        let mut key_slots = Vec::new();
        match &stmt.source {
            InsertSource::Values(rows) => {
                if rows.is_empty() {
                    return Err(CompileError::InvalidStatement(format!(
                        "INSERT into '{}' has no rows",
                        part.table.name()
                    )));
                }
                self.enter(Clause::Values)?;
                for (r, row) in rows.iter().enumerate() {
                    if row.len() != stmt.columns.len() {
                        return Err(CompileError::InvalidStatement(format!(
                            "INSERT row {r} has {} values for {} columns",
                            row.len(),
                            stmt.columns.len()
                        )));
                    }
                    if r > 0 {
                        self.sink.comma();
                    }
                    self.sink.open_paren();
                    for (i, column) in part.columns.iter().enumerate() {
                        if i > 0 {
                            self.sink.comma();
                        }
                        match &column.value {
                            InsertValue::Column(index) => self.expr(&row[*index])?,
                            InsertValue::Managed(value) => self.bind(value.clone()),
                            InsertValue::KeySlot => {
                                key_slots.push(self.binder.len());
                                self.bind(SqlValue::Null);
                            }
                        }
                    }
                    self.sink.close_paren();
                }
            }
            InsertSource::Rows(rows) => {
                if rows.is_empty() {
                    return Err(CompileError::InvalidStatement(format!(
                        "INSERT into '{}' has no rows",
                        part.table.name()
                    )));
                }
                self.enter(Clause::Values)?;
                for (r, row) in rows.iter().enumerate() {
                    if r > 0 {
                        self.sink.comma();
                    }
                    self.sink.open_paren();
                    for (i, column) in part.columns.iter().enumerate() {
                        if i > 0 {
                            self.sink.comma();
                        }
                        let value = match &column.value {
                            InsertValue::Column(index) => {
                                let name = stmt.columns[*index].name();
                                row.value(name).ok_or_else(|| CompileError::MissingRowValue {
                                    row: r,
                                    name: String::from(name),
                                })?
                            }
                            InsertValue::Managed(value) => value.clone(),
                            InsertValue::KeySlot => {
                                key_slots.push(self.binder.len());
                                SqlValue::Null
                            }
                        };
                        self.bind(value);
                    }
                    self.sink.close_paren();
                }
            }
            InsertSource::Query(query) => {
                // The source query cannot see the insert target.
                self.scope.push(FrameKind::Write);
                self.scope.push(FrameKind::Query);
                self.query(query)?;
                self.scope.pop()?;
                self.scope.pop()?;
            }
        }

        if let Some(conflict) = part.on_conflict {
            self.upsert(conflict, &physical, &part.table, &stmt.source)?;
        }

        let mut selection = self.returning(part.returning)?;
        let mut generated_key = None;
        if part.generated_key {
            let column = String::from(part.table.primary_key());
            let strategy = if dialect.supports_returning() {
                if part.returning.is_empty() {
                    self.enter(Clause::Returning)?;
                } else {
                    self.sink.comma();
                }
                self.write_identifier(&column);
                selection.push(column.clone());
                KeyStrategy::Returning
            } else {
                KeyStrategy::Driver
            };
            generated_key = Some(GeneratedKey { column, strategy });
        }
        self.scope.pop()?;

        Ok(PartMeta {
            kind: StatementKind::Insert,
            role: part.role,
            table: physical,
            selection,
            generated_key,
            key_slots,
        })
    }

    fn upsert(
        &mut self,
        conflict: &OnConflict,
        alias: &str,
        table: &Table,
        source: &InsertSource,
    ) -> Result<()> {
        let dialect = self.ctx.dialect;
        if let ConflictAction::DoUpdate(list) = &conflict.action {
            if list.is_empty() {
                return Err(CompileError::InvalidStatement(String::from(
                    "upsert update without assignments",
                )));
            }
        }
        match dialect.upsert_style() {
            UpsertStyle::OnConflict => {
                self.enter(Clause::Conflict)?;
                if !conflict.target.is_empty() {
                    self.sink.open_paren();
                    for (i, field) in conflict.target.iter().enumerate() {
                        if i > 0 {
                            self.sink.comma();
                        }
                        self.scope.resolve_field_only(field, &mut self.sink, dialect)?;
                    }
                    self.sink.close_paren();
                }
                match &conflict.action {
                    ConflictAction::DoNothing => self.sink.keyword("DO NOTHING"),
                    ConflictAction::DoUpdate(list) => {
                        if conflict.target.is_empty() {
                            return Err(CompileError::InvalidStatement(String::from(
                                "ON CONFLICT DO UPDATE needs conflict target columns",
                            )));
                        }
                        self.sink.keyword("DO UPDATE");
                        self.enter(Clause::Set)?;
                        let list: Vec<&Assignment> = list.iter().collect();
                        self.assignments(&list, alias, false)?;
                    }
                }
                Ok(())
            }
            UpsertStyle::OnDuplicateKey => {
                if matches!(source, InsertSource::Query(_)) {
                    return Err(CompileError::unsupported(
                        dialect.name(),
                        "ON DUPLICATE KEY UPDATE after INSERT .. SELECT",
                    ));
                }
                self.enter(Clause::DuplicateKeyUpdate)?;
                match &conflict.action {
                    ConflictAction::DoNothing => {
                        let key = table.primary_key();
                        self.write_identifier(key);
                        self.sink.keyword("=");
                        self.write_identifier(key);
                    }
                    ConflictAction::DoUpdate(list) => {
                        let list: Vec<&Assignment> = list.iter().collect();
                        self.assignments(&list, alias, false)?;
                    }
                }
                Ok(())
            }
            UpsertStyle::Unsupported => Err(CompileError::unsupported(dialect.name(), "upsert")),
        }
    }

    /// Emits one physical UPDATE.
    pub(super) fn update(&mut self, stmt: &UpdateStmt, part: &UpdatePart<'_>) -> Result<PartMeta> {
        let dialect = self.ctx.dialect;
        let alias = stmt.alias();
        self.route_predicates(&stmt.table, &stmt.where_)?;

        let form = if stmt.joins.is_empty() {
            None
        } else {
            match dialect.multi_table_update() {
                MultiTableUpdate::Unsupported => {
                    return Err(CompileError::unsupported(dialect.name(), "multi-table UPDATE"))
                }
                form => Some(form),
            }
        };

        self.scope.push(FrameKind::Write);
        let physical = self.physical(&part.table);
        self.scope.register_table(alias, &part.table)?;
        let mut targets = vec![(String::from(alias), part.table.clone())];
        for join in &stmt.joins {
            self.register_source(&join.source)?;
            if let TableSource::Table { table, .. } = &join.source {
                if !join.kind.is_outer() {
                    targets.push((String::from(join.source.alias()), table.clone()));
                }
            }
        }
        let filter = match &part.filter {
            Filter::Read {
                predicates,
                visibility,
            } => split_read(&self.scope, predicates, &targets, *visibility)?,
            Filter::Split(conjuncts) => conjuncts.clone(),
        };

        self.enter(Clause::Update)?;
        self.write_table(&part.table, alias);
        if form == Some(MultiTableUpdate::Join) {
            for join in &stmt.joins {
                self.enter(Clause::Join(join.kind))?;
                self.source(&join.source)?;
                if !join.on.is_empty() {
                    self.enter(Clause::On)?;
                    self.conjuncts(&plain(&join.on))?;
                }
            }
        }

        let qualify = dialect.qualify_set_target();
        self.enter(Clause::Set)?;
        self.assignments(&part.assignments, alias, qualify)?;
        let mut first = part.assignments.is_empty();
        if let Some(column) = &part.bump_version {
            if !first {
                self.sink.comma();
            }
            first = false;
            self.set_target(alias, column, qualify);
            self.sink.keyword("=");
            self.write_column(alias, column);
            self.sink.keyword("+ 1");
        }
        if let Some(column) = &part.touch_update_time {
            if !first {
                self.sink.comma();
            }
            self.set_target(alias, column, qualify);
            self.sink.keyword("=");
            self.bind(SqlValue::now());
        }

        let mut conjuncts: Vec<Conjunct<'_>> = Vec::new();
        if form == Some(MultiTableUpdate::From) {
            let mut joins = stmt.joins.iter();
            if let Some(head) = joins.next() {
                if head.kind.is_outer() {
                    return Err(CompileError::unsupported(
                        dialect.name(),
                        "an outer join as first source of UPDATE .. FROM",
                    ));
                }
                self.enter(Clause::From)?;
                self.source(&head.source)?;
                conjuncts.extend(plain(&head.on));
            }
            for join in joins {
                self.enter(Clause::Join(join.kind))?;
                self.source(&join.source)?;
                if !join.on.is_empty() {
                    self.enter(Clause::On)?;
                    self.conjuncts(&plain(&join.on))?;
                }
            }
        }
        conjuncts.extend(filter);
        if !conjuncts.is_empty() {
            self.enter(Clause::Where)?;
            self.conjuncts(&conjuncts)?;
        }
        self.write_limit(&stmt.order_by, stmt.limit, !stmt.joins.is_empty())?;
        let selection = self.returning(&stmt.returning)?;
        self.scope.pop()?;

        Ok(PartMeta {
            kind: StatementKind::Update,
            role: part.role,
            table: physical,
            selection,
            generated_key: None,
            key_slots: Vec::new(),
        })
    }

    /// Emits a DELETE.
    pub(super) fn delete(&mut self, stmt: &DeleteStmt) -> Result<PartMeta> {
        let alias = stmt.alias();
        let visibility = stmt.visibility.unwrap_or(self.ctx.options.visibility);
        self.route_predicates(&stmt.table, &stmt.where_)?;

        self.scope.push(FrameKind::Write);
        let physical = self.physical(&stmt.table);
        self.scope.register_table(alias, &stmt.table)?;
        let targets = [(String::from(alias), stmt.table.clone())];
        let filter = split_read(&self.scope, &stmt.where_, &targets, visibility)?;

        self.enter(Clause::DeleteFrom)?;
        self.write_table(&stmt.table, alias);
        if !filter.is_empty() {
            self.enter(Clause::Where)?;
            self.conjuncts(&filter)?;
        }
        self.write_limit(&stmt.order_by, stmt.limit, false)?;
        let selection = self.returning(&stmt.returning)?;
        self.scope.pop()?;

        let role = if stmt.table.is_child() {
            StatementRole::Child
        } else {
            StatementRole::Single
        };
        Ok(PartMeta {
            kind: StatementKind::Delete,
            role,
            table: physical,
            selection,
            generated_key: None,
            key_slots: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::assembler::SqlCompiler;
    use crate::ast::{lit, param, Assignment, ConflictAction, InsertStmt, Statement, UpdateStmt};
    use crate::compiled::{CompiledStatement, KeyStrategy};
    use crate::dialect::{DialectKind, GenericDialect};
    use crate::error::CompileError;
    use crate::meta::{ManagedColumn, Table};

    fn counters() -> Table {
        Table::builder("counter")
            .generated_key("id")
            .column("name")
            .column("hits")
            .managed(ManagedColumn::Version, "version")
            .build()
    }

    #[test]
    fn test_insert_fills_version() {
        let t = counters();
        let compiler = SqlCompiler::new(Arc::new(GenericDialect::new()));
        let statement: Statement = InsertStmt::values(
            &t,
            vec![t.field("name"), t.field("hits")],
            vec![vec![param("a"), param(0)]],
        )
        .into();
        let compiled = compiler.compile(&statement).unwrap();
        assert_eq!(
            compiled.sql(),
            "INSERT INTO counter (name, hits, version) VALUES (?, ?, ?)"
        );
        assert_eq!(compiled.params().len(), 3);
    }

    #[test]
    fn test_generated_key_strategy_follows_dialect() {
        let t = counters();
        let insert: Statement = InsertStmt::values(&t, vec![t.field("name")], vec![vec![param("a")]])
            .generated_key()
            .into();

        let compiled = SqlCompiler::new(DialectKind::Postgres.build())
            .compile(&insert)
            .unwrap();
        let CompiledStatement::GeneratedKey(statement) = &compiled else {
            panic!("expected a generated-key statement, got {compiled:?}");
        };
        assert!(statement.sql().ends_with("RETURNING id"));
        assert_eq!(
            statement.generated_key().map(|k| k.strategy),
            Some(KeyStrategy::Returning)
        );

        let compiled = SqlCompiler::new(DialectKind::Mysql.build())
            .compile(&insert)
            .unwrap();
        let CompiledStatement::GeneratedKey(statement) = &compiled else {
            panic!("expected a generated-key statement, got {compiled:?}");
        };
        assert!(!statement.sql().contains("RETURNING"));
        assert_eq!(
            statement.generated_key().map(|k| k.strategy),
            Some(KeyStrategy::Driver)
        );
    }

    #[test]
    fn test_upsert_spellings() {
        let t = counters();
        let insert: Statement = InsertStmt::values(&t, vec![t.field("name")], vec![vec![param("a")]])
            .on_conflict(
                vec![t.field("name")],
                ConflictAction::DoUpdate(vec![Assignment::new(t.field("hits"), t.field("hits") + lit(1))]),
            )
            .into();

        let pg = SqlCompiler::new(DialectKind::Postgres.build())
            .compile(&insert)
            .unwrap();
        assert!(pg
            .sql()
            .ends_with("ON CONFLICT (name) DO UPDATE SET hits = counter.hits + 1"));

        let my = SqlCompiler::new(DialectKind::Mysql.build())
            .compile(&insert)
            .unwrap();
        assert!(my
            .sql()
            .ends_with("ON DUPLICATE KEY UPDATE hits = counter.hits + 1"));

        let err = SqlCompiler::new(Arc::new(GenericDialect::new()))
            .compile(&insert)
            .unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedDialectFeature { .. }));
    }

    #[test]
    fn test_version_predicate_bumps_version() {
        let t = counters();
        let compiler = SqlCompiler::new(Arc::new(GenericDialect::new()));
        let statement: Statement = UpdateStmt::new(&t, Some("c"))
            .set(t.field("hits"), param(5))
            .filter(t.field("id").eq(param(1)))
            .filter(t.field("version").eq(param(3)))
            .into();
        let compiled = compiler.compile(&statement).unwrap();
        assert_eq!(
            compiled.sql(),
            "UPDATE counter AS c SET hits = ?, version = c.version + 1 WHERE c.id = ? AND c.version = ?"
        );
        assert!(compiled.has_version_predicate());
    }

    #[test]
    fn test_update_limit_needs_dialect_support() {
        let t = counters();
        let statement: Statement = UpdateStmt::new(&t, None)
            .set(t.field("hits"), param(0))
            .limit(10)
            .into();
        let my = SqlCompiler::new(DialectKind::Mysql.build())
            .compile(&statement)
            .unwrap();
        assert_eq!(my.sql(), "UPDATE counter SET counter.hits = ? LIMIT 10");
        let err = SqlCompiler::new(DialectKind::Postgres.build())
            .compile(&statement)
            .unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedDialectFeature { .. }));
    }

    #[test]
    fn test_insert_row_width_is_checked() {
        let t = counters();
        let statement: Statement = InsertStmt::values(
            &t,
            vec![t.field("name"), t.field("hits")],
            vec![vec![param("a")]],
        )
        .into();
        let err = SqlCompiler::new(Arc::new(GenericDialect::new()))
            .compile(&statement)
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidStatement(_)));
    }
}

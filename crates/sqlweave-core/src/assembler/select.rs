//! Query emission: SELECT, set operations and VALUES.

use super::{Emitter, PartMeta};
use crate::ast::{
    CompoundQuery, Expr, JoinKind, LockMode, Order, Query, SelectStmt, Selection, StatementKind,
    TableSource, ValuesStmt,
};
use crate::clause::Clause;
use crate::compiled::StatementRole;
use crate::dialect::Dialect;
use crate::error::{CompileError, Result};
use crate::inheritance::{columns, plain, split_read};
use crate::meta::Table;
use crate::scope::{Binding, FrameKind};

/// The label a selection gets when none is given.
pub(super) fn natural_label(expr: &Expr, index: usize) -> String {
    match expr {
        Expr::Field(field) | Expr::Qualified { field, .. } => String::from(field.name()),
        Expr::DerivedColumn { column, .. } => column.clone(),
        Expr::Label(name) => name.clone(),
        _ => format!("expr{}", index + 1),
    }
}

/// Output labels of `query`, computed without emitting it.
pub(super) fn labels(query: &Query, dialect: &dyn Dialect) -> Vec<String> {
    match query {
        Query::Select(select) => select_labels(select, dialect),
        Query::Compound(compound) => labels(&compound.left, dialect),
        Query::Values(values) => {
            let width = values.rows.first().map_or(0, Vec::len);
            (0..width).map(|i| dialect.values_column_label(i)).collect()
        }
    }
}

fn sources(select: &SelectStmt) -> impl Iterator<Item = &TableSource> {
    std::iter::once(&select.from).chain(select.joins.iter().map(|j| &j.source))
}

fn source_labels(source: &TableSource, dialect: &dyn Dialect) -> Vec<String> {
    match source {
        TableSource::Table { table, .. } => columns(table),
        TableSource::Derived { query, .. } => labels(query, dialect),
    }
}

fn select_labels(select: &SelectStmt, dialect: &dyn Dialect) -> Vec<String> {
    if select.selections.is_empty() {
        return sources(select)
            .flat_map(|s| source_labels(s, dialect))
            .collect();
    }
    select
        .selections
        .iter()
        .enumerate()
        .flat_map(|(i, selection)| match selection {
            Selection::Expr { expr, alias } => {
                vec![alias.clone().unwrap_or_else(|| natural_label(expr, i))]
            }
            Selection::AllOf(alias) => sources(select)
                .find(|s| s.alias() == alias)
                .map(|s| source_labels(s, dialect))
                .unwrap_or_default(),
        })
        .collect()
}

impl Emitter<'_> {
    /// Emits a top-level query.
    pub(super) fn top_query(&mut self, query: &Query) -> Result<PartMeta> {
        let target = match query {
            Query::Select(SelectStmt {
                from: TableSource::Table { table, .. },
                where_,
                ..
            }) => {
                self.route_predicates(table, where_)?;
                Some(table.clone())
            }
            _ => None,
        };

        self.scope.push(FrameKind::Query);
        let selection = self.query(query)?;
        self.scope.pop()?;

        let kind = match query {
            Query::Values(_) => StatementKind::Values,
            _ => StatementKind::Select,
        };
        Ok(PartMeta {
            kind,
            role: StatementRole::Single,
            table: target.map(|t| self.physical(&t)).unwrap_or_default(),
            selection,
            generated_key: None,
            key_slots: Vec::new(),
        })
    }

    /// Emits a query into the current frame and returns its output labels.
    pub(super) fn query(&mut self, query: &Query) -> Result<Vec<String>> {
        match query {
            Query::Select(select) => self.select(select),
            Query::Compound(compound) => self.compound(compound),
            Query::Values(values) => self.values(values),
        }
    }

    pub(super) fn register_source(&mut self, source: &TableSource) -> Result<()> {
        match source {
            TableSource::Table { table, .. } => self.scope.register_table(source.alias(), table),
            TableSource::Derived { query, alias } => self
                .scope
                .register_derived(alias, labels(query, self.ctx.dialect)),
        }
    }

    pub(super) fn source(&mut self, source: &TableSource) -> Result<()> {
        match source {
            TableSource::Table { table, .. } => {
                self.write_table(table, source.alias());
            }
            TableSource::Derived { query, alias } => {
                self.subquery(query)?;
                if self.ctx.dialect.supports_table_alias_as() {
                    self.sink.keyword("AS");
                }
                self.write_identifier(alias);
            }
        }
        Ok(())
    }

    fn select(&mut self, select: &SelectStmt) -> Result<Vec<String>> {
        let visibility = select.visibility.unwrap_or(self.ctx.options.visibility);
        for source in sources(select) {
            self.register_source(source)?;
        }

        let mut targets: Vec<(String, Table)> = Vec::new();
        if let TableSource::Table { table, .. } = &select.from {
            targets.push((String::from(select.from.alias()), table.clone()));
        }
        for join in select.joins.iter().filter(|j| !j.kind.is_outer()) {
            if let TableSource::Table { table, .. } = &join.source {
                targets.push((String::from(join.source.alias()), table.clone()));
            }
        }
        let filter = split_read(&self.scope, &select.where_, &targets, visibility)?;

        self.enter(Clause::Select)?;
        if select.distinct {
            self.sink.keyword("DISTINCT");
        }
        let labels = self.selections(select)?;

        self.enter(Clause::From)?;
        self.source(&select.from)?;
        for join in &select.joins {
            self.enter(Clause::Join(join.kind))?;
            self.source(&join.source)?;
            if join.kind == JoinKind::Cross {
                if !join.on.is_empty() {
                    return Err(CompileError::InvalidStatement(format!(
                        "CROSS JOIN of '{}' cannot have an ON condition",
                        join.source.alias()
                    )));
                }
                continue;
            }
            if join.on.is_empty() {
                return Err(CompileError::InvalidStatement(format!(
                    "JOIN of '{}' has no ON condition",
                    join.source.alias()
                )));
            }
            let on = match &join.source {
                TableSource::Table { table, .. } if join.kind.is_outer() => {
                    let target = [(String::from(join.source.alias()), table.clone())];
                    split_read(&self.scope, &join.on, &target, visibility)?
                }
                _ => plain(&join.on),
            };
            self.enter(Clause::On)?;
            self.conjuncts(&on)?;
        }

        if !filter.is_empty() {
            self.enter(Clause::Where)?;
            self.conjuncts(&filter)?;
        }
        if !select.group_by.is_empty() {
            self.enter(Clause::GroupBy)?;
            self.expr_list(&select.group_by)?;
        }
        if !select.having.is_empty() {
            self.enter(Clause::Having)?;
            self.conjuncts(&plain(&select.having))?;
        }
        self.order_by(&select.order_by)?;
        self.limit_offset(select.limit, select.offset)?;
        if let Some(mode) = select.lock {
            self.lock(mode)?;
        }
        Ok(labels)
    }

    fn selections(&mut self, select: &SelectStmt) -> Result<Vec<String>> {
        if select.selections.is_empty() {
            let mut labels = Vec::new();
            for (i, source) in sources(select).enumerate() {
                if i > 0 {
                    self.sink.comma();
                }
                labels.extend(self.all_of(source.alias())?);
            }
            return Ok(labels);
        }

        let mut labels = Vec::new();
        for (i, selection) in select.selections.iter().enumerate() {
            if i > 0 {
                self.sink.comma();
            }
            match selection {
                Selection::Expr { expr, alias } => {
                    let label = alias.clone().unwrap_or_else(|| natural_label(expr, i));
                    let explicit = alias.is_some() || self.reaches_parent(expr)?;
                    self.expr(expr)?;
                    if explicit {
                        self.sink.keyword("AS");
                        self.write_identifier(&label);
                    }
                    labels.push(label);
                }
                Selection::AllOf(alias) => labels.extend(self.all_of(alias)?),
            }
        }
        Ok(labels)
    }

    /// Expands `alias.*` into its columns.
    fn all_of(&mut self, alias: &str) -> Result<Vec<String>> {
        match self.scope.binding(alias).cloned() {
            Some(Binding::Table { table, .. }) => {
                let own: Vec<String> = table.fields().iter().map(|f| f.name.clone()).collect();
                for (i, column) in own.iter().enumerate() {
                    if i > 0 {
                        self.sink.comma();
                    }
                    self.write_column(alias, column);
                }
                let labels = columns(&table);
                for column in &labels[own.len()..] {
                    self.sink.comma();
                    self.parent_lookup(alias, &table, column)?;
                    self.sink.keyword("AS");
                    self.write_identifier(column);
                }
                Ok(labels)
            }
            Some(Binding::Derived { columns }) => {
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        self.sink.comma();
                    }
                    self.write_column(alias, column);
                }
                Ok(columns)
            }
            None => Err(CompileError::unknown_column(Some(alias), "*")),
        }
    }

    pub(super) fn order_by(&mut self, items: &[Order]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.enter(Clause::OrderBy)?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sink.comma();
            }
            self.expr(&item.expr)?;
            if item.desc {
                self.sink.keyword("DESC");
            }
        }
        Ok(())
    }

    pub(super) fn limit_offset(&mut self, limit: Option<u64>, offset: Option<u64>) -> Result<()> {
        match (limit, offset) {
            (Some(limit), _) => {
                self.enter(Clause::Limit)?;
                self.sink.keyword(&limit.to_string());
            }
            (None, Some(_)) => {
                if let Some(unbounded) = self.ctx.dialect.unbounded_limit() {
                    self.enter(Clause::Limit)?;
                    self.sink.keyword(unbounded);
                }
            }
            (None, None) => {}
        }
        if let Some(offset) = offset {
            self.enter(Clause::Offset)?;
            self.sink.keyword(&offset.to_string());
        }
        Ok(())
    }

    fn lock(&mut self, mode: LockMode) -> Result<()> {
        let dialect = self.ctx.dialect;
        let clause = match mode {
            LockMode::Update => Clause::ForUpdate,
            LockMode::Share => Clause::ForShare,
        };
        if !dialect.supports_lock(mode) {
            return Err(CompileError::unsupported(dialect.name(), clause.keyword()));
        }
        self.enter(clause)
    }

    fn compound(&mut self, compound: &CompoundQuery) -> Result<Vec<String>> {
        let labels = self.operand(&compound.left, false)?;
        self.enter(Clause::SetOperation(compound.op))?;
        self.operand(&compound.right, true)?;
        self.order_by(&compound.order_by)?;
        self.limit_offset(compound.limit, compound.offset)?;
        Ok(labels)
    }

    /// Emits one operand of a set operation in its own frame.
    fn operand(&mut self, query: &Query, right: bool) -> Result<Vec<String>> {
        let dialect = self.ctx.dialect;
        let parenthesized = dialect.supports_parenthesized_set_operand();
        if !parenthesized {
            if query.has_trailer() {
                return Err(CompileError::unsupported(
                    dialect.name(),
                    "ORDER BY, LIMIT or locks on a set-operation operand",
                ));
            }
            if right && matches!(query, Query::Compound(_)) {
                return Err(CompileError::unsupported(
                    dialect.name(),
                    "a nested set operation as right operand",
                ));
            }
        }

        if parenthesized {
            self.enter(Clause::LeftParen)?;
        } else {
            self.scope.transition(Clause::LeftParen)?;
        }
        self.scope.push_operand()?;
        let labels = self.query(query)?;
        self.scope.pop_operand()?;
        if parenthesized {
            self.enter(Clause::RightParen)?;
        } else {
            self.scope.transition(Clause::RightParen)?;
        }
        Ok(labels)
    }

    fn values(&mut self, values: &ValuesStmt) -> Result<Vec<String>> {
        let dialect = self.ctx.dialect;
        let width = values.rows.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(CompileError::InvalidStatement(String::from(
                "VALUES without rows",
            )));
        }
        if let Some(index) = values.rows.iter().position(|r| r.len() != width) {
            return Err(CompileError::InvalidStatement(format!(
                "VALUES row {index} has {} values, expected {width}",
                values.rows[index].len()
            )));
        }

        self.enter(Clause::Values)?;
        for (i, row) in values.rows.iter().enumerate() {
            if i > 0 {
                self.sink.comma();
            }
            if dialect.values_row_constructor() {
                self.sink.keyword("ROW");
                self.sink.push("(");
            } else {
                self.sink.open_paren();
            }
            self.expr_list(row)?;
            self.sink.close_paren();
        }
        self.order_by(&values.order_by)?;
        self.limit_offset(values.limit, None)?;
        Ok((0..width).map(|i| dialect.values_column_label(i)).collect())
    }
}

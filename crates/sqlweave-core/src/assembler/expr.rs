//! Expression emission.

use super::Emitter;
use crate::ast::{BinaryOp, Expr, Query, UnaryOp};
use crate::clause::Clause;
use crate::dialect::UpsertStyle;
use crate::error::{CompileError, Result};
use crate::inheritance::{ChildCheck, Conjunct, ParentCheck};
use crate::meta::{FieldRef, Table};
use crate::scope::{FrameKind, Location};
use crate::value::SqlValue;

/// Binding strength of predicates (`IS NULL`, `IN`, `BETWEEN`).
const PREDICATE: u8 = 3;

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary { op, .. } => op.operand_precedence(),
        Expr::IsNull { .. } | Expr::InList { .. } | Expr::InQuery { .. } | Expr::Between { .. } => {
            PREDICATE
        }
        _ => u8::MAX,
    }
}

/// Whether the text of `expr` starts with `-`.
fn leading_minus(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(SqlValue::Int(n)) => *n < 0,
        Expr::Literal(SqlValue::Float(f)) => f.is_sign_negative(),
        Expr::Unary {
            op: UnaryOp::Neg, ..
        } => true,
        _ => false,
    }
}

impl Emitter<'_> {
    pub(super) fn expr(&mut self, expr: &Expr) -> Result<()> {
        self.expr_at(expr, 0)
    }

    /// Writes `expr`, parenthesized when it binds looser than `min`.
    pub(super) fn expr_at(&mut self, expr: &Expr, min: u8) -> Result<()> {
        let wrap = precedence(expr) < min;
        if wrap {
            self.sink.open_paren();
        }
        self.expr_inner(expr)?;
        if wrap {
            self.sink.close_paren();
        }
        Ok(())
    }

    fn expr_inner(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Field(field) => self.field(None, field),
            Expr::Qualified { alias, field } => self.field(Some(alias.as_str()), field),
            Expr::DerivedColumn { alias, column } => {
                match self.scope.locate_derived(alias, column)? {
                    Location::Direct { alias, column } => self.write_column(&alias, &column),
                    Location::ViaParent { .. } => {
                        return Err(CompileError::unknown_column(
                            Some(alias.as_str()),
                            column.as_str(),
                        ))
                    }
                }
                Ok(())
            }
            Expr::Param(value) => {
                self.bind(value.clone());
                Ok(())
            }
            Expr::Named(name) => self.binder.append_named(&mut self.sink, name),
            Expr::Literal(value) => {
                self.write_literal(value);
                Ok(())
            }
            Expr::Binary { left, op, right } => {
                let p = op.precedence();
                self.expr_at(left, p)?;
                self.sink.keyword(op.as_str());
                self.expr_at(right, p + 1)
            }
            Expr::Unary { op, operand } => {
                self.sink.keyword(op.as_str());
                if *op == UnaryOp::Not {
                    return self.expr_at(operand, op.operand_precedence());
                }
                self.sink.glue();
                if leading_minus(operand) {
                    self.sink.open_paren();
                    self.expr(operand)?;
                    self.sink.close_paren();
                    Ok(())
                } else {
                    self.expr_at(operand, op.operand_precedence())
                }
            }
            Expr::IsNull { expr, negated } => {
                self.expr_at(expr, PREDICATE + 1)?;
                self.sink
                    .keyword(if *negated { "IS NOT NULL" } else { "IS NULL" });
                Ok(())
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                if list.is_empty() {
                    return Err(CompileError::InvalidStatement(String::from(
                        "IN list without values",
                    )));
                }
                self.expr_at(expr, PREDICATE + 1)?;
                self.sink.keyword(if *negated { "NOT IN" } else { "IN" });
                self.sink.open_paren();
                self.expr_list(list)?;
                self.sink.close_paren();
                Ok(())
            }
            Expr::InQuery {
                expr,
                query,
                negated,
            } => {
                self.expr_at(expr, PREDICATE + 1)?;
                self.sink.keyword(if *negated { "NOT IN" } else { "IN" });
                self.subquery(query).map(drop)
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                self.expr_at(expr, PREDICATE + 1)?;
                self.sink
                    .keyword(if *negated { "NOT BETWEEN" } else { "BETWEEN" });
                self.expr_at(low, PREDICATE + 1)?;
                self.sink.keyword("AND");
                self.expr_at(high, PREDICATE + 1)
            }
            Expr::Exists { query, negated } => {
                self.sink
                    .keyword(if *negated { "NOT EXISTS" } else { "EXISTS" });
                self.subquery(query).map(drop)
            }
            Expr::Subquery(query) => self.subquery(query).map(drop),
            Expr::Function { name, args } => {
                self.sink.keyword(name);
                self.sink.push("(");
                self.expr_list(args)?;
                self.sink.close_paren();
                Ok(())
            }
            Expr::Row(items) => {
                self.sink.open_paren();
                self.expr_list(items)?;
                self.sink.close_paren();
                Ok(())
            }
            Expr::Excluded(field) => self.excluded(field),
            Expr::Star => {
                self.sink.keyword("*");
                Ok(())
            }
            Expr::Label(name) => {
                self.write_identifier(name);
                Ok(())
            }
            Expr::Nested(inner) => {
                self.sink.open_paren();
                self.expr(inner)?;
                self.sink.close_paren();
                Ok(())
            }
        }
    }

    pub(super) fn expr_list(&mut self, items: &[Expr]) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sink.comma();
            }
            self.expr(item)?;
        }
        Ok(())
    }

    /// Writes a column reference, or the parent lookup it needs.
    pub(super) fn field(&mut self, alias: Option<&str>, field: &FieldRef) -> Result<()> {
        let location = self
            .scope
            .resolve_field(alias, field, &mut self.sink, self.ctx.dialect)?;
        if let Location::ViaParent {
            child_alias,
            child,
            column,
        } = location
        {
            self.parent_lookup(&child_alias, &child, &column)?;
        }
        Ok(())
    }

    /// Whether `expr` is a column reached through a child alias.
    pub(super) fn reaches_parent(&self, expr: &Expr) -> Result<bool> {
        let location = match expr {
            Expr::Field(field) => self.scope.locate(None, field)?,
            Expr::Qualified { alias, field } => self.scope.locate(Some(alias.as_str()), field)?,
            _ => return Ok(false),
        };
        Ok(matches!(location, Location::ViaParent { .. }))
    }

    /// `(SELECT p.column FROM parent AS p WHERE p.pk = child.pk)`
    pub(super) fn parent_lookup(&mut self, child_alias: &str, child: &Table, column: &str) -> Result<()> {
        let Some(parent) = child.parent().cloned() else {
            return Err(CompileError::unknown_column(Some(child_alias), column));
        };
        let alias = self.ctx.options.parent_alias(child_alias);
        let key = parent.primary_key();

        self.sink.open_paren();
        self.scope.push(FrameKind::Query);
        self.enter(Clause::Select)?;
        self.write_column(&alias, column);
        self.enter(Clause::From)?;
        self.scope.register_table(&alias, &parent)?;
        self.write_table(&parent, &alias);
        self.enter(Clause::Where)?;
        self.write_column(&alias, key);
        self.sink.keyword("=");
        self.write_column(child_alias, child.primary_key());
        self.scope.pop()?;
        self.sink.close_paren();
        Ok(())
    }

    /// Writes a parenthesized query in its own scope frame.
    pub(super) fn subquery(&mut self, query: &Query) -> Result<Vec<String>> {
        self.sink.open_paren();
        self.scope.push(FrameKind::Query);
        let labels = self.query(query)?;
        self.scope.pop()?;
        self.sink.close_paren();
        Ok(labels)
    }

    fn excluded(&mut self, field: &FieldRef) -> Result<()> {
        let dialect = self.ctx.dialect;
        match dialect.upsert_style() {
            UpsertStyle::OnConflict => {
                self.sink.keyword("EXCLUDED.");
                self.sink.glue();
                self.scope.resolve_field_only(field, &mut self.sink, dialect)
            }
            UpsertStyle::OnDuplicateKey => {
                self.sink.keyword("VALUES");
                self.sink.push("(");
                self.scope.resolve_field_only(field, &mut self.sink, dialect)?;
                self.sink.close_paren();
                Ok(())
            }
            UpsertStyle::Unsupported => Err(CompileError::unsupported(
                dialect.name(),
                "references to the incoming upsert row",
            )),
        }
    }

    /// Writes conjuncts joined by `AND`.
    pub(super) fn conjuncts(&mut self, list: &[Conjunct<'_>]) -> Result<()> {
        let min = if list.len() > 1 {
            BinaryOp::And.precedence() + 1
        } else {
            0
        };
        for (i, conjunct) in list.iter().enumerate() {
            if i > 0 {
                self.sink.keyword("AND");
            }
            match conjunct {
                Conjunct::Term(term) => {
                    self.version |= term.version;
                    self.expr_at(term.expr, min)?;
                }
                Conjunct::Visible {
                    alias,
                    column,
                    flag,
                } => self.visible_filter(alias, column, *flag),
                Conjunct::Parent(check) => self.parent_check(check)?,
                Conjunct::Child(check) => self.child_check(check)?,
            }
        }
        Ok(())
    }

    fn visible_filter(&mut self, alias: &str, column: &str, flag: bool) {
        self.write_column(alias, column);
        self.sink.keyword("=");
        self.sink.keyword(self.ctx.dialect.bool_literal(flag));
    }

    /// `EXISTS (SELECT p.pk FROM parent AS p WHERE p.pk = c.pk AND ...)`
    fn parent_check(&mut self, check: &ParentCheck<'_>) -> Result<()> {
        let alias = self.ctx.options.parent_alias(&check.child_alias);
        let key = check.parent.primary_key();

        self.sink.keyword("EXISTS");
        self.sink.open_paren();
        self.scope.push(FrameKind::Query);
        self.enter(Clause::Select)?;
        self.write_column(&alias, key);
        self.enter(Clause::From)?;
        self.scope.register_table(&alias, &check.parent)?;
        self.scope
            .redirect(&check.child_alias, &check.parent, &alias)?;
        self.write_table(&check.parent, &alias);
        self.enter(Clause::Where)?;
        self.write_column(&alias, key);
        self.sink.keyword("=");
        self.write_column(&check.child_alias, check.child.primary_key());
        if let Some((column, flag)) = &check.visible {
            self.sink.keyword("AND");
            self.visible_filter(&alias, column, *flag);
        }
        for term in &check.predicates {
            self.sink.keyword("AND");
            self.version |= term.version;
            self.expr_at(term.expr, BinaryOp::And.precedence() + 1)?;
        }
        self.scope.pop()?;
        self.sink.close_paren();
        Ok(())
    }

    /// `EXISTS (SELECT c.pk FROM child AS c WHERE c.pk = p.pk AND ...)`
    fn child_check(&mut self, check: &ChildCheck<'_>) -> Result<()> {
        let alias = self.ctx.options.child_alias(&check.parent_alias);
        let key = check.child.primary_key();

        self.sink.keyword("EXISTS");
        self.sink.open_paren();
        self.scope.push(FrameKind::Query);
        self.enter(Clause::Select)?;
        self.write_column(&alias, key);
        self.enter(Clause::From)?;
        self.scope.register_table_only(&alias, &check.child)?;
        self.scope
            .redirect(&check.parent_alias, &check.child, &alias)?;
        self.write_table(&check.child, &alias);
        self.enter(Clause::Where)?;
        self.write_column(&alias, key);
        self.sink.keyword("=");
        self.write_column(&check.parent_alias, check.parent.primary_key());
        for term in &check.predicates {
            self.sink.keyword("AND");
            self.version |= term.version;
            self.expr_at(term.expr, BinaryOp::And.precedence() + 1)?;
        }
        self.scope.pop()?;
        self.sink.close_paren();
        Ok(())
    }
}

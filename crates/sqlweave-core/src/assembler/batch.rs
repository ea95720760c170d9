//! Batch and multi-statement compilation.
//!
//! A template batch compiles its statement once per row and checks that
//! every row produces the same SQL; the parameters of all rows are kept
//! side by side. A multi-statement batch writes one statement per row into
//! a single text instead.

use std::sync::Arc;

use tracing::{debug, trace};

use super::{nested, Ctx, Output};
use crate::ast::{BatchMode, BatchStmt, Statement};
use crate::binder::RowCursor;
use crate::compiled::{BatchPart, BatchStatement, CompiledStatement};
use crate::error::{CompileError, Result};
use crate::row::Row;

pub(super) fn compile_batch(ctx: Ctx<'_>, batch: &BatchStmt) -> Result<CompiledStatement> {
    if batch.rows.is_empty() {
        return Err(CompileError::InvalidStatement(String::from(
            "batch without parameter rows",
        )));
    }
    if matches!(*batch.statement, Statement::Batch(_) | Statement::Multi(_)) {
        return Err(nested());
    }
    let rows: Arc<[Row]> = batch.rows.clone().into();
    match batch.mode {
        BatchMode::Template => template(ctx, &batch.statement, &rows),
        BatchMode::MultiStatement => multi_rows(ctx, &batch.statement, &rows),
    }
}

fn template(ctx: Ctx<'_>, statement: &Statement, rows: &Arc<[Row]>) -> Result<CompiledStatement> {
    let mut cursor = RowCursor::new(Arc::clone(rows));
    let mut parts: Vec<BatchPart> = Vec::new();
    for index in 0..rows.len() {
        if index > 0 {
            cursor.advance()?;
        }
        let mut out = Output::separate(ctx, Some(cursor.clone()));
        out.statement(statement)?;
        let emitted = out.into_emitted();
        trace!(row = index, statements = emitted.len(), "batch row");

        if index == 0 {
            parts = emitted
                .into_iter()
                .map(|e| BatchPart {
                    params_per_row: e.statement.params.len(),
                    rows: rows.len(),
                    key_slots: e.key_slots,
                    statement: e.statement,
                })
                .collect();
            continue;
        }
        if emitted.len() != parts.len() {
            return Err(CompileError::BatchSizeMismatch {
                expected: parts.len(),
                emitted: emitted.len(),
            });
        }
        for (part, row) in parts.iter_mut().zip(emitted) {
            let row = row.statement;
            if row.sql != part.statement.sql {
                return Err(CompileError::InvalidStatement(format!(
                    "batch row {index} compiles to different SQL than row 0"
                )));
            }
            part.statement.params.extend(row.params);
            part.statement.has_version_predicate |= row.has_version_predicate;
            part.statement.has_named_parameter |= row.has_named_parameter;
        }
    }
    debug!(rows = rows.len(), parts = parts.len(), "compiled template batch");
    Ok(CompiledStatement::Batch(BatchStatement {
        rows: rows.len(),
        parts,
    }))
}

fn multi_rows(ctx: Ctx<'_>, statement: &Statement, rows: &Arc<[Row]>) -> Result<CompiledStatement> {
    let dialect = ctx.dialect;
    if !dialect.supports_multi_statement() {
        return Err(CompileError::unsupported(
            dialect.name(),
            "multi-statement batches",
        ));
    }
    let per_row = Output::planned(ctx, statement)?;
    let mut out = Output::shared(ctx, Some(RowCursor::new(Arc::clone(rows))));
    for index in 0..rows.len() {
        if index > 0 {
            out.advance_row()?;
        }
        out.statement(statement)?;
    }
    let expected = per_row * rows.len();
    if out.item_count() != expected {
        return Err(CompileError::BatchSizeMismatch {
            expected,
            emitted: out.item_count(),
        });
    }
    Ok(CompiledStatement::Multi(out.into_multi(Some(rows.len()))))
}

pub(super) fn compile_multi(ctx: Ctx<'_>, statements: &[Statement]) -> Result<CompiledStatement> {
    let dialect = ctx.dialect;
    if statements.is_empty() {
        return Err(CompileError::InvalidStatement(String::from(
            "multi-statement bundle without statements",
        )));
    }
    if !dialect.supports_multi_statement() {
        return Err(CompileError::unsupported(
            dialect.name(),
            "multiple statements in one text",
        ));
    }
    let mut out = Output::shared(ctx, None);
    let mut expected = 0;
    for statement in statements {
        expected += Output::planned(ctx, statement)?;
        out.statement(statement)?;
    }
    if out.item_count() != expected {
        return Err(CompileError::BatchSizeMismatch {
            expected,
            emitted: out.item_count(),
        });
    }
    Ok(CompiledStatement::Multi(out.into_multi(None)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::assembler::SqlCompiler;
    use crate::ast::{named, param, DeleteStmt, InsertStmt};
    use crate::dialect::{DialectKind, GenericDialect};
    use crate::meta::Table;
    use crate::row::row;
    use crate::value::SqlValue;

    fn tags() -> Table {
        Table::builder("tag").primary_key("id").column("label").build()
    }

    fn tag_row(id: i64, label: &str) -> Row {
        row(HashMap::from([
            (String::from("id"), SqlValue::Int(id)),
            (String::from("label"), SqlValue::Text(String::from(label))),
        ]))
    }

    #[test]
    fn test_template_batch_keeps_rows_side_by_side() {
        let t = tags();
        let statement = Statement::from(InsertStmt::values(
            &t,
            vec![t.field("id"), t.field("label")],
            vec![vec![named("id"), named("label")]],
        ))
        .batch(vec![tag_row(1, "a"), tag_row(2, "b")], BatchMode::Template);
        let compiled = SqlCompiler::new(Arc::new(GenericDialect::new()))
            .compile(&statement)
            .unwrap();
        let CompiledStatement::Batch(batch) = &compiled else {
            panic!("expected a batch, got {compiled:?}");
        };
        assert_eq!(batch.rows(), 2);
        let part = &batch.parts()[0];
        assert_eq!(part.statement().sql(), "INSERT INTO tag (id, label) VALUES (?, ?)");
        assert_eq!(part.params_per_row(), 2);
        assert_eq!(
            part.row_params(1),
            Some(&[SqlValue::Int(2), SqlValue::Text(String::from("b"))][..])
        );
        assert!(compiled.has_named_parameter());
    }

    #[test]
    fn test_multi_statement_batch() {
        let t = tags();
        let statement = Statement::from(DeleteStmt::new(&t, None).filter(t.field("id").eq(named("id"))))
            .batch(vec![tag_row(1, "a"), tag_row(2, "b")], BatchMode::MultiStatement);
        let compiled = SqlCompiler::new(DialectKind::Mysql.build())
            .compile(&statement)
            .unwrap();
        assert_eq!(
            compiled.sql(),
            "DELETE FROM tag WHERE tag.id = ?; DELETE FROM tag WHERE tag.id = ?"
        );
        assert_eq!(compiled.row_count(), Some(2));
        assert_eq!(compiled.params(), &[SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn test_multi_statement_needs_dialect_support() {
        let t = tags();
        let statement = Statement::Multi(vec![
            DeleteStmt::new(&t, None).filter(t.field("id").eq(param(1))).into(),
        ]);
        let err = SqlCompiler::new(DialectKind::Postgres.build())
            .compile(&statement)
            .unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedDialectFeature { .. }));
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let t = tags();
        let statement = Statement::from(DeleteStmt::new(&t, None)).batch(vec![], BatchMode::Template);
        let err = SqlCompiler::new(Arc::new(GenericDialect::new()))
            .compile(&statement)
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidStatement(_)));
    }
}

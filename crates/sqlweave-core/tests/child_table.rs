//! Tests for tables split into a parent and a child.
//!
//! `order` extends `order_base`; both share the `id` key. Reads reach parent
//! columns through correlated subqueries, writes are planned as a parent
//! statement followed by a child statement.

mod common;

use common::*;
use sqlweave_core::ast::{lit, param, DeleteStmt, InsertStmt, SelectStmt, Selection, UpdateStmt};
use sqlweave_core::compiled::{KeyStrategy, StatementRole};
use sqlweave_core::dialect::DialectKind;
use sqlweave_core::{CompileError, CompiledStatement, SqlCompiler, SqlValue};

fn paid_order() -> UpdateStmt {
    let s = shop();
    UpdateStmt::new(&s.order, Some("o"))
        .set(s.order.field("status"), param("PAID"))
        .filter(s.order.field("id").eq(param(7)))
}

fn text(value: &str) -> SqlValue {
    SqlValue::Text(String::from(value))
}

// =============================================================================
// Updates
// =============================================================================

#[test]
fn test_child_only_update_targets_child() {
    let compiled = compile(DialectKind::Generic, paid_order());
    assert!(matches!(compiled, CompiledStatement::Simple(_)));
    assert_eq!(
        compiled.sql(),
        "UPDATE \"order\" AS o SET status = ? WHERE o.id = ?"
    );
    assert_eq!(compiled.params(), &[text("PAID"), SqlValue::Int(7)]);
    assert!(!compiled.need_query_parent());
    assert!(compiled.need_query_child());
}

#[test]
fn test_version_bump_adds_parent_statement() {
    let s = shop();
    let update = paid_order().set(s.order.field("version"), s.order.field("version") + lit(1));

    let compiled = compile(DialectKind::Generic, update);
    assert!(compiled.need_query_parent());
    assert!(compiled.need_query_child());
    let CompiledStatement::Paired(paired) = &compiled else {
        panic!("expected paired statements, got {compiled:?}");
    };
    assert!(paired.parent_first());
    assert_eq!(paired.parent().role(), StatementRole::Parent);
    assert_eq!(paired.parent().table(), "order_base");
    assert_eq!(
        paired.parent().sql(),
        "UPDATE order_base AS o SET version = o.version + 1 WHERE o.id = ?"
    );
    assert_eq!(paired.parent().params(), &[SqlValue::Int(7)]);
    assert_eq!(
        paired.child().sql(),
        "UPDATE \"order\" AS o SET status = ? WHERE o.id = ?"
    );
    assert_eq!(paired.child().params(), &[text("PAID"), SqlValue::Int(7)]);
    assert_eq!(compiled.statement_count(), 2);
}

#[test]
fn test_default_options_touch_update_time() {
    let s = shop();
    let update = paid_order().set(s.order.field("version"), s.order.field("version") + lit(1));
    let compiled = SqlCompiler::new(DialectKind::Generic.build())
        .compile(&update.into())
        .unwrap();
    assert_eq!(
        compiled.sql(),
        "UPDATE order_base AS o SET version = o.version + 1, update_time = ? WHERE o.id = ?"
    );
    assert_eq!(compiled.params().len(), 2);
    assert_eq!(compiled.params()[1], SqlValue::Int(7));
}

#[test]
fn test_version_predicate_checks_and_bumps_parent() {
    let s = shop();
    let update = paid_order().filter(s.order.field("version").eq(param(3)));

    let compiled = compile(DialectKind::Generic, update);
    assert!(compiled.has_version_predicate());
    let CompiledStatement::Paired(paired) = &compiled else {
        panic!("expected paired statements, got {compiled:?}");
    };
    assert_eq!(
        paired.parent().sql(),
        "UPDATE order_base AS o SET version = o.version + 1 WHERE o.id = ? AND o.version = ?"
    );
    assert_eq!(paired.parent().params(), &[SqlValue::Int(7), SqlValue::Int(3)]);
    assert!(paired.parent().has_version_predicate());
    assert!(!paired.child().has_version_predicate());
    assert_eq!(
        paired.child().sql(),
        "UPDATE \"order\" AS o SET status = ? WHERE o.id = ?"
    );
}

#[test]
fn test_parent_predicate_without_parent_work_uses_exists() {
    let s = shop();
    let update = paid_order().filter(s.order.field("amount").gt(param(100)));

    let compiled = compile(DialectKind::Generic, update);
    assert!(matches!(compiled, CompiledStatement::Simple(_)));
    assert_eq!(
        compiled.sql(),
        "UPDATE \"order\" AS o SET status = ? WHERE o.id = ? AND EXISTS \
         (SELECT p_o.id FROM order_base AS p_o WHERE p_o.id = o.id AND p_o.amount > ?)"
    );
    assert_eq!(
        compiled.params(),
        &[text("PAID"), SqlValue::Int(7), SqlValue::Int(100)]
    );
}

#[test]
fn test_split_update_needs_key_predicate() {
    let s = shop();
    let update = UpdateStmt::new(&s.order, Some("o"))
        .set(s.order.field("status"), param("PAID"))
        .set(s.order.field("amount"), param(5))
        .filter(s.order.field("status").eq(param("NEW")));
    let err = compile_err(DialectKind::Generic, update);
    assert!(matches!(err, CompileError::InvalidStatement(_)));
}

#[test]
fn test_split_update_without_assignments() {
    let s = shop();
    let update = UpdateStmt::new(&s.order, Some("o")).filter(s.order.field("id").eq(param(1)));
    let err = compile_err(DialectKind::Generic, update);
    assert!(matches!(err, CompileError::InvalidStatement(_)));
}

// =============================================================================
// Reads
// =============================================================================

#[test]
fn test_parent_filter_in_read() {
    let s = shop();
    let query = SelectStmt::from_table(&s.order, "o")
        .select(Selection::expr(s.order.field("status")))
        .filter(s.order.field("amount").gt(param(100)));
    let compiled = compile(DialectKind::Generic, query);
    assert_eq!(
        compiled.sql(),
        "SELECT o.status FROM \"order\" AS o WHERE EXISTS \
         (SELECT p_o.id FROM order_base AS p_o WHERE p_o.id = o.id AND p_o.amount > ?)"
    );
    assert!(!compiled.need_query_parent());
    assert!(!compiled.need_query_child());
}

#[test]
fn test_parent_column_in_selection() {
    let s = shop();
    let query = SelectStmt::from_table(&s.order, "o")
        .select(Selection::expr(s.order.field("amount")));
    let compiled = compile(DialectKind::Generic, query);
    assert_eq!(
        compiled.sql(),
        "SELECT (SELECT p_o.amount FROM order_base AS p_o WHERE p_o.id = o.id) AS amount \
         FROM \"order\" AS o"
    );
    assert_eq!(compiled.selection(), ["amount"]);
}

// =============================================================================
// Inserts and deletes
// =============================================================================

#[test]
fn test_insert_with_generated_key_fills_child_slot() {
    let s = shop();
    let insert = InsertStmt::values(
        &s.order,
        vec![s.order.field("status"), s.order.field("amount")],
        vec![vec![param("NEW"), param(10)]],
    );

    let compiled = compile(DialectKind::Postgres, insert);
    let CompiledStatement::Paired(paired) = &compiled else {
        panic!("expected paired statements, got {compiled:?}");
    };
    assert_eq!(
        paired.parent().sql(),
        "INSERT INTO order_base (amount) VALUES ($1) RETURNING id"
    );
    let key = paired.parent().generated_key().unwrap();
    assert_eq!(key.column, "id");
    assert_eq!(key.strategy, KeyStrategy::Returning);

    assert_eq!(
        paired.child().sql(),
        "INSERT INTO \"order\" (id, status) VALUES ($1, $2)"
    );
    assert_eq!(paired.child().params(), &[SqlValue::Null, text("NEW")]);
    assert_eq!(paired.child_key_slots(), &[0]);
}

#[test]
fn test_insert_with_explicit_key_copies_it() {
    let s = shop();
    let insert = InsertStmt::values(
        &s.order,
        vec![s.order.field("id"), s.order.field("status"), s.order.field("amount")],
        vec![vec![param(5), param("NEW"), param(10)]],
    );

    let compiled = compile(DialectKind::Mysql, insert);
    let CompiledStatement::Paired(paired) = &compiled else {
        panic!("expected paired statements, got {compiled:?}");
    };
    assert_eq!(
        paired.parent().sql(),
        "INSERT INTO order_base (id, amount) VALUES (?, ?)"
    );
    assert!(paired.parent().generated_key().is_none());
    assert_eq!(
        paired.child().sql(),
        "INSERT INTO `order` (id, status) VALUES (?, ?)"
    );
    assert!(paired.child_key_slots().is_empty());
}

#[test]
fn test_generated_key_insert_takes_one_row() {
    let s = shop();
    let insert = InsertStmt::values(
        &s.order,
        vec![s.order.field("status")],
        vec![vec![param("A")], vec![param("B")]],
    );
    let err = compile_err(DialectKind::Generic, insert);
    assert!(matches!(err, CompileError::InvalidStatement(_)));
}

#[test]
fn test_insert_select_into_child_is_rejected() {
    let s = shop();
    let insert = InsertStmt::select(
        &s.order,
        vec![s.order.field("status")],
        SelectStmt::from_table(&s.customer, "c").select(Selection::expr(s.customer.field("name"))),
    );
    let err = compile_err(DialectKind::Generic, insert);
    assert!(matches!(err, CompileError::InvalidStatement(_)));
}

#[test]
fn test_delete_checks_parent_through_exists() {
    let s = shop();
    let delete = DeleteStmt::new(&s.order, Some("o")).filter(s.order.field("amount").gt(param(5)));

    let compiled = compile(DialectKind::Generic, delete);
    assert_eq!(
        compiled.sql(),
        "DELETE FROM \"order\" AS o WHERE EXISTS \
         (SELECT p_o.id FROM order_base AS p_o WHERE p_o.id = o.id AND p_o.amount > ?)"
    );
    assert!(compiled.need_query_child());
    assert!(!compiled.need_query_parent());
}

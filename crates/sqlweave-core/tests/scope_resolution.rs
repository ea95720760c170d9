//! Tests for alias resolution across joins and nested subqueries.

mod common;

use common::*;
use sqlweave_core::ast::{
    exists, lit, param, qualified, Join, JoinKind, SelectStmt, Selection, Statement, TableSource,
    UpdateStmt,
};
use sqlweave_core::dialect::DialectKind;
use sqlweave_core::{CompileError, Table};

fn payments() -> Table {
    Table::builder("payment")
        .primary_key("id")
        .column("customer_id")
        .column("total")
        .build()
}

fn self_join(select: Selection) -> SelectStmt {
    let c = shop().customer;
    SelectStmt::from_table(&c, "a")
        .select(select)
        .join(Join::new(
            JoinKind::Left,
            TableSource::table(&c, Some("b")),
            vec![qualified("a", c.field("email"))
                .eq(qualified("b", c.field("email")))
                .into()],
        ))
}

// =============================================================================
// Single scope
// =============================================================================

#[test]
fn test_self_join_with_qualified_references() {
    let c = shop().customer;
    let query = self_join(Selection::expr(qualified("b", c.field("name"))));
    assert_eq!(
        sql(DialectKind::Generic, query),
        "SELECT b.name FROM customer AS a LEFT JOIN customer AS b ON a.email = b.email"
    );
}

#[test]
fn test_self_join_needs_qualification() {
    let c = shop().customer;
    let err = compile_err(DialectKind::Generic, self_join(Selection::expr(c.field("name"))));
    assert!(matches!(
        err,
        CompileError::AmbiguousTable { ref table, .. } if table == "customer"
    ));
}

#[test]
fn test_duplicate_alias() {
    let s = shop();
    let query = SelectStmt::from_table(&s.customer, "c")
        .select(Selection::expr(s.customer.field("name")))
        .join(Join::new(
            JoinKind::Inner,
            TableSource::table(&s.order, Some("c")),
            vec![s.order.field("customer_id").eq(s.customer.field("id")).into()],
        ));
    let err = compile_err(DialectKind::Generic, query);
    assert!(matches!(err, CompileError::DuplicateAlias { ref alias } if alias == "c"));
}

#[test]
fn test_table_not_in_scope() {
    let s = shop();
    let p = payments();
    let query = SelectStmt::from_table(&s.customer, "c")
        .select(Selection::expr(s.customer.field("name")))
        .filter(p.field("total").gt(param(1)));
    let err = compile_err(DialectKind::Generic, query);
    assert!(matches!(err, CompileError::UnknownColumn { alias: None, .. }));
}

#[test]
fn test_unknown_alias() {
    let s = shop();
    let query = SelectStmt::from_table(&s.customer, "c")
        .select(Selection::expr(qualified("x", s.customer.field("name"))));
    let err = compile_err(DialectKind::Generic, query);
    assert!(matches!(
        err,
        CompileError::UnknownColumn { alias: Some(ref a), .. } if a == "x"
    ));
}

// =============================================================================
// Nested scopes
// =============================================================================

#[test]
fn test_correlation_through_two_levels() {
    let s = shop();
    let p = payments();
    let paid = SelectStmt::from_table(&p, "p")
        .select(Selection::expr(lit(1)))
        .filter(p.field("customer_id").eq(s.customer.field("id")));
    let ordered = SelectStmt::from_table(&s.order, "o")
        .select(Selection::expr(lit(1)))
        .filter(s.order.field("customer_id").eq(s.customer.field("id")))
        .filter(exists(paid));
    let query = SelectStmt::from_table(&s.customer, "c")
        .select(Selection::expr(s.customer.field("name")))
        .filter(exists(ordered));

    assert_eq!(
        sql(DialectKind::Generic, query),
        "SELECT c.name FROM customer AS c WHERE EXISTS \
         (SELECT 1 FROM \"order\" AS o WHERE o.customer_id = c.id AND EXISTS \
         (SELECT 1 FROM payment AS p WHERE p.customer_id = c.id))"
    );
}

#[test]
fn test_inner_alias_shadows_outer() {
    let s = shop();
    let inner = SelectStmt::from_table(&s.customer, "c")
        .select(Selection::expr(lit(1)))
        .filter(s.customer.field("email").is_null());
    let query = SelectStmt::from_table(&s.customer, "c")
        .select(Selection::expr(s.customer.field("name")))
        .filter(exists(inner));
    assert_eq!(
        sql(DialectKind::Generic, query),
        "SELECT c.name FROM customer AS c WHERE EXISTS \
         (SELECT 1 FROM customer AS c WHERE c.email IS NULL)"
    );
}

#[test]
fn test_subquery_in_update_sees_target() {
    let s = shop();
    let update = UpdateStmt::new(&s.customer, Some("c"))
        .set(s.customer.field("name"), param("buyer"))
        .filter(exists(
            SelectStmt::from_table(&s.order, "o")
                .select(Selection::expr(lit(1)))
                .filter(s.order.field("customer_id").eq(s.customer.field("id"))),
        ));
    assert_eq!(
        sql(DialectKind::Generic, update),
        "UPDATE customer AS c SET name = ? WHERE EXISTS \
         (SELECT 1 FROM \"order\" AS o WHERE o.customer_id = c.id)"
    );
}

#[test]
fn test_bundle_items_do_not_see_each_other() {
    let s = shop();
    let p = payments();
    let statement = Statement::Multi(vec![
        UpdateStmt::new(&s.customer, Some("c"))
            .set(s.customer.field("name"), param("x"))
            .into(),
        UpdateStmt::new(&p, Some("p"))
            .set(p.field("total"), param(0))
            .filter(s.customer.field("name").eq(param("x")))
            .into(),
    ]);
    let err = compile_err(DialectKind::Mysql, statement);
    assert!(matches!(err, CompileError::UnknownColumn { .. }));
}

// =============================================================================
// Assembler
// =============================================================================

#[test]
fn test_assembler_builds_once() {
    let s = shop();
    let statement: Statement = SelectStmt::from_table(&s.customer, "c")
        .select(Selection::expr(s.customer.field("name")))
        .into();
    let compiler = compiler(DialectKind::Generic);
    let mut assembler = compiler.assembler(&statement);
    assert!(!assembler.is_finished());
    assert!(assembler.build().is_ok());
    assert!(assembler.is_finished());
    assert!(matches!(assembler.build(), Err(CompileError::AlreadyBuilt)));
}

//! Integration tests for query compilation.
//!
//! Covers SELECT with joins, grouping and trailers, correlated subqueries,
//! derived tables, set operations and standalone VALUES.

mod common;

use common::*;
use sqlweave_core::ast::{
    derived, exists, func, label, lit, param, CompoundQuery, Expr, Join, JoinKind, LockMode,
    Order, Query, SelectStmt, Selection, SetOp, TableSource, ValuesStmt, Visibility,
};
use sqlweave_core::clause::Clause;
use sqlweave_core::dialect::DialectKind;
use sqlweave_core::{CompileError, SqlValue, Table};

fn names() -> SelectStmt {
    let s = shop();
    SelectStmt::from_table(&s.customer, "c").select(Selection::expr(s.customer.field("name")))
}

fn emails_missing() -> SelectStmt {
    let s = shop();
    SelectStmt::from_table(&s.customer, "c")
        .select(Selection::expr(s.customer.field("email")))
        .filter(s.customer.field("email").is_null())
}

// =============================================================================
// SELECT
// =============================================================================

#[test]
fn test_join_group_having_order_limit() {
    let s = shop();
    let query = SelectStmt::from_table(&s.customer, "c")
        .select(Selection::expr(s.customer.field("name")))
        .select(Selection::labeled(func("COUNT", vec![Expr::Star]), "orders"))
        .join(Join::new(
            JoinKind::Inner,
            TableSource::table(&s.order, Some("o")),
            vec![s.order.field("customer_id").eq(s.customer.field("id")).into()],
        ))
        .filter(s.order.field("status").eq(param("PAID")))
        .group_by(s.customer.field("name"))
        .having(func("COUNT", vec![Expr::Star]).gt(param(2)))
        .order_by(Order::desc(label("orders")))
        .limit(10);

    let compiled = compile(DialectKind::Postgres, query);
    assert_eq!(
        compiled.sql(),
        "SELECT c.name, COUNT(*) AS orders FROM customer AS c \
         INNER JOIN \"order\" AS o ON o.customer_id = c.id \
         WHERE o.status = $1 GROUP BY c.name HAVING COUNT(*) > $2 \
         ORDER BY orders DESC LIMIT 10"
    );
    assert_eq!(
        compiled.params(),
        &[SqlValue::Text(String::from("PAID")), SqlValue::Int(2)]
    );
    assert_eq!(compiled.selection(), ["name", "orders"]);
}

#[test]
fn test_distinct_and_offset_without_limit() {
    let query = names().distinct().order_by(Order::asc(shop().customer.field("name"))).offset(20);
    assert_eq!(
        sql(DialectKind::Postgres, query.clone()),
        "SELECT DISTINCT c.name FROM customer AS c ORDER BY c.name OFFSET 20"
    );
    assert_eq!(
        sql(DialectKind::Mysql, query.clone()),
        "SELECT DISTINCT c.name FROM customer AS c ORDER BY c.name \
         LIMIT 18446744073709551615 OFFSET 20"
    );
    assert_eq!(
        sql(DialectKind::Sqlite, query),
        "SELECT DISTINCT c.name FROM customer AS c ORDER BY c.name LIMIT -1 OFFSET 20"
    );
}

#[test]
fn test_empty_selection_expands_every_source() {
    let s = shop();
    let compiled = compile(DialectKind::Generic, SelectStmt::from_table(&s.customer, "c"));
    assert_eq!(compiled.sql(), "SELECT c.id, c.name, c.email FROM customer AS c");
    assert_eq!(compiled.selection(), ["id", "name", "email"]);
}

#[test]
fn test_cross_join_without_on() {
    let s = shop();
    let query = names().join(Join::new(
        JoinKind::Cross,
        TableSource::table(&s.customer, Some("other")),
        vec![],
    ));
    assert_eq!(
        sql(DialectKind::Generic, query),
        "SELECT c.name FROM customer AS c CROSS JOIN customer AS other"
    );
}

#[test]
fn test_inner_join_requires_on() {
    let s = shop();
    let query = names().join(Join::new(
        JoinKind::Inner,
        TableSource::table(&s.order, Some("o")),
        vec![],
    ));
    let err = compile_err(DialectKind::Generic, query);
    assert!(matches!(err, CompileError::InvalidStatement(_)));
}

#[test]
fn test_having_without_group_by_is_rejected() {
    let s = shop();
    let query = names().having(s.customer.field("name").eq(param("x")));
    let err = compile_err(DialectKind::Generic, query);
    assert!(matches!(
        err,
        CompileError::StatementStructure {
            from: Clause::From,
            to: Clause::Having
        }
    ));
    assert_eq!(
        err.to_string(),
        "illegal clause transition: HAVING cannot follow FROM"
    );
}

#[test]
fn test_row_locks() {
    let query = names().lock(LockMode::Update);
    assert_eq!(
        sql(DialectKind::Postgres, query.clone()),
        "SELECT c.name FROM customer AS c FOR UPDATE"
    );
    let err = compile_err(DialectKind::Sqlite, query);
    assert!(matches!(
        err,
        CompileError::UnsupportedDialectFeature { dialect: "sqlite", .. }
    ));
}

// =============================================================================
// Visibility
// =============================================================================

#[test]
fn test_visible_rows_by_default() {
    let a = accounts();
    let query = SelectStmt::from_table(&a, "a").select(Selection::expr(a.field("login")));
    assert_eq!(
        sql(DialectKind::Generic, query.clone()),
        "SELECT a.login FROM account AS a WHERE a.visible = TRUE"
    );
    assert_eq!(
        sql(DialectKind::Generic, query.clone().visibility(Visibility::OnlyInvisible)),
        "SELECT a.login FROM account AS a WHERE a.visible = FALSE"
    );
    assert_eq!(
        sql(DialectKind::Generic, query.visibility(Visibility::Both)),
        "SELECT a.login FROM account AS a"
    );
}

// =============================================================================
// Subqueries
// =============================================================================

#[test]
fn test_correlated_exists() {
    let s = shop();
    let query = names().filter(exists(
        SelectStmt::from_table(&s.order, "o")
            .select(Selection::expr(lit(1)))
            .filter(s.order.field("customer_id").eq(s.customer.field("id"))),
    ));
    assert_eq!(
        sql(DialectKind::Generic, query),
        "SELECT c.name FROM customer AS c WHERE EXISTS \
         (SELECT 1 FROM \"order\" AS o WHERE o.customer_id = c.id)"
    );
}

#[test]
fn test_in_subquery() {
    let s = shop();
    let query = names().filter(Expr::from(s.customer.field("id")).in_query(
        SelectStmt::from_table(&s.order, "o")
            .select(Selection::expr(s.order.field("customer_id")))
            .filter(s.order.field("status").eq(param("NEW"))),
    ));
    assert_eq!(
        sql(DialectKind::Postgres, query),
        "SELECT c.name FROM customer AS c WHERE c.id IN \
         (SELECT o.customer_id FROM \"order\" AS o WHERE o.status = $1)"
    );
}

#[test]
fn test_derived_table_columns() {
    let s = shop();
    let counts = SelectStmt::from_table(&s.order, "o")
        .select(Selection::expr(s.order.field("customer_id")))
        .select(Selection::labeled(func("COUNT", vec![Expr::Star]), "n"))
        .group_by(s.order.field("customer_id"));
    let query = SelectStmt::new(TableSource::derived(counts, "t"))
        .select(Selection::expr(derived("t", "n")))
        .filter(derived("t", "n").gt(param(3)));

    let compiled = compile(DialectKind::Generic, query);
    assert_eq!(
        compiled.sql(),
        "SELECT t.n FROM (SELECT o.customer_id, COUNT(*) AS n FROM \"order\" AS o \
         GROUP BY o.customer_id) AS t WHERE t.n > ?"
    );
    assert_eq!(compiled.selection(), ["n"]);
}

#[test]
fn test_derived_table_unknown_column() {
    let query = SelectStmt::new(TableSource::derived(names(), "t"))
        .select(Selection::expr(derived("t", "email")));
    let err = compile_err(DialectKind::Generic, query);
    assert!(matches!(
        err,
        CompileError::UnknownColumn { alias: Some(ref a), ref column } if a == "t" && column == "email"
    ));
}

// =============================================================================
// Set operations
// =============================================================================

#[test]
fn test_union_parenthesizes_operands() {
    let query = Query::compound(names(), SetOp::Union, emails_missing());
    let compiled = compile(DialectKind::Postgres, query);
    assert_eq!(
        compiled.sql(),
        "(SELECT c.name FROM customer AS c) UNION \
         (SELECT c.email FROM customer AS c WHERE c.email IS NULL)"
    );
    assert_eq!(compiled.selection(), ["name"]);
}

#[test]
fn test_sqlite_operands_are_bare() {
    let query = Query::compound(names(), SetOp::UnionAll, emails_missing());
    assert_eq!(
        sql(DialectKind::Sqlite, query),
        "SELECT c.name FROM customer AS c UNION ALL \
         SELECT c.email FROM customer AS c WHERE c.email IS NULL"
    );
}

#[test]
fn test_compound_trailer() {
    let query = Query::Compound(CompoundQuery {
        left: Box::new(names().into()),
        op: SetOp::Except,
        right: Box::new(emails_missing().into()),
        order_by: vec![Order::asc(label("name"))],
        limit: Some(5),
        offset: None,
    });
    assert_eq!(
        sql(DialectKind::Sqlite, query),
        "SELECT c.name FROM customer AS c EXCEPT \
         SELECT c.email FROM customer AS c WHERE c.email IS NULL ORDER BY name LIMIT 5"
    );
}

#[test]
fn test_operand_trailer_needs_parentheses() {
    let query = Query::compound(names().limit(1), SetOp::Union, emails_missing());
    assert_eq!(
        sql(DialectKind::Generic, query.clone()),
        "(SELECT c.name FROM customer AS c LIMIT 1) UNION \
         (SELECT c.email FROM customer AS c WHERE c.email IS NULL)"
    );
    let err = compile_err(DialectKind::Sqlite, query);
    assert!(matches!(err, CompileError::UnsupportedDialectFeature { .. }));
}

#[test]
fn test_nested_set_operation_on_the_left() {
    let inner = Query::compound(names(), SetOp::Union, emails_missing());
    let query = Query::compound(inner, SetOp::Intersect, names());
    assert_eq!(
        sql(DialectKind::Generic, query),
        "((SELECT c.name FROM customer AS c) UNION \
         (SELECT c.email FROM customer AS c WHERE c.email IS NULL)) INTERSECT \
         (SELECT c.name FROM customer AS c)"
    );
}

// =============================================================================
// VALUES
// =============================================================================

#[test]
fn test_values_rows_follow_dialect() {
    let values = ValuesStmt::new(vec![vec![param(1), lit("a")], vec![param(2), lit("b")]]);

    let compiled = compile(DialectKind::Generic, values.clone());
    assert_eq!(compiled.sql(), "VALUES (?, 'a'), (?, 'b')");
    assert_eq!(compiled.selection(), ["column1", "column2"]);

    let compiled = compile(DialectKind::Mysql, values);
    assert_eq!(compiled.sql(), "VALUES ROW(?, 'a'), ROW(?, 'b')");
    assert_eq!(compiled.selection(), ["column_0", "column_1"]);
}

#[test]
fn test_ragged_values_are_rejected() {
    let values = ValuesStmt::new(vec![vec![param(1), param(2)], vec![param(3)]]);
    let err = compile_err(DialectKind::Generic, values);
    assert!(matches!(err, CompileError::InvalidStatement(_)));
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn test_float_literals_stay_floats() {
    let t = Table::builder("tag").primary_key("id").build();
    let query = SelectStmt::from_table(&t, "t")
        .select(Selection::expr(lit(3.0) * lit(2.0)))
        .select(Selection::expr(lit(f64::INFINITY)));
    let compiled = compile(DialectKind::Postgres, query);
    assert_eq!(compiled.sql(), "SELECT 3.0 * 2.0, $1 FROM tag AS t");
    assert_eq!(compiled.params(), [SqlValue::Float(f64::INFINITY)]);
    assert_eq!(
        compiled.printable(compiler(DialectKind::Postgres).dialect()),
        "SELECT 3.0 * 2.0, 'Infinity' FROM tag AS t"
    );
}

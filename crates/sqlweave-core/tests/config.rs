//! Tests for compilers built from JSON configuration.

mod common;

use common::*;
use sqlweave_core::ast::{param, SelectStmt, Selection, Visibility};
use sqlweave_core::config::CompilerConfig;
use sqlweave_core::dialect::DialectKind;
use sqlweave_core::{CompileError, SqlCompiler, Statement};

fn from_json(json: &str) -> SqlCompiler {
    SqlCompiler::from_config(&CompilerConfig::from_json(json).unwrap())
}

#[test]
fn test_empty_config_uses_defaults() {
    let compiler = from_json("{}");
    assert_eq!(compiler.dialect().name(), "generic");
    assert_eq!(compiler.options().visibility, Visibility::OnlyVisible);
    assert!(compiler.options().auto_update_time);
    assert!(compiler.options().fill_managed_on_insert);
    assert!(compiler.router().primary_suffix().is_empty());
}

#[test]
fn test_dialect_and_visibility_apply() {
    let compiler = from_json(r#"{"dialect": "sqlite", "visibility": "only_invisible"}"#);
    let a = accounts();
    let query = SelectStmt::from_table(&a, "a").select(Selection::expr(a.field("login")));
    let compiled = compiler.compile(&query.into()).unwrap();
    assert_eq!(
        compiled.sql(),
        "SELECT a.login FROM account AS a WHERE a.visible = 0"
    );
}

#[test]
fn test_alias_prefix_applies_to_parent_lookups() {
    let compiler = from_json(r#"{"dialect": "postgres", "parent_alias_prefix": "base_"}"#);
    let s = shop();
    let query = SelectStmt::from_table(&s.order, "o")
        .select(Selection::expr(s.order.field("status")))
        .filter(s.order.field("amount").gt(param(100)));
    let compiled = compiler.compile(&query.into()).unwrap();
    assert_eq!(
        compiled.sql(),
        "SELECT o.status FROM \"order\" AS o WHERE EXISTS \
         (SELECT base_o.id FROM order_base AS base_o WHERE base_o.id = o.id AND base_o.amount > $1)"
    );
}

#[test]
fn test_unknown_dialect_is_a_config_error() {
    let err = CompilerConfig::from_json(r#"{"dialect": "oracle"}"#).unwrap_err();
    assert!(matches!(err, CompileError::Config(_)));
}

#[test]
fn test_malformed_routing_is_a_config_error() {
    let err = CompilerConfig::from_json(r#"{"routing": {"tables": {"ticket": {"column": 3}}}}"#)
        .unwrap_err();
    assert!(matches!(err, CompileError::Config(_)));
}

#[test]
fn test_config_matches_explicit_construction() {
    let config = CompilerConfig::from_json(r#"{"dialect": "mysql", "auto_update_time": false}"#).unwrap();
    assert_eq!(config.dialect, DialectKind::Mysql);
    let explicit = SqlCompiler::new(DialectKind::Mysql.build()).with_options(config.options());

    let s = shop();
    let query = SelectStmt::from_table(&s.customer, "c")
        .select(Selection::expr(s.customer.field("name")))
        .filter(s.customer.field("id").eq(param(1)));
    let statement: Statement = query.into();
    assert_eq!(
        SqlCompiler::from_config(&config).compile(&statement).unwrap(),
        explicit.compile(&statement).unwrap()
    );
}

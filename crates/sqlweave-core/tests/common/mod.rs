#![allow(dead_code)]

use std::collections::HashMap;

use sqlweave_core::dialect::DialectKind;
use sqlweave_core::meta::ManagedColumn;
use sqlweave_core::{
    row, CompileError, CompileOptions, CompiledStatement, Row, SqlCompiler, SqlValue, Statement,
    Table,
};

/// The split order tables plus a plain customer table.
///
/// `order_base` holds the shared and managed columns, `order` the extension
/// columns; both share the generated `id` key.
pub struct Shop {
    pub base: Table,
    pub order: Table,
    pub customer: Table,
}

pub fn shop() -> Shop {
    let base = Table::builder("order_base")
        .generated_key("id")
        .column("amount")
        .managed(ManagedColumn::Version, "version")
        .managed(ManagedColumn::UpdateTime, "update_time")
        .build();
    let order = Table::builder("order")
        .child_of(&base)
        .column("status")
        .column("customer_id")
        .build();
    let customer = Table::builder("customer")
        .primary_key("id")
        .column("name")
        .nullable("email")
        .build();
    Shop {
        base,
        order,
        customer,
    }
}

/// A single table with a soft-delete flag.
pub fn accounts() -> Table {
    Table::builder("account")
        .primary_key("id")
        .column("login")
        .managed(ManagedColumn::Visible, "visible")
        .build()
}

/// Options whose output holds no clock value.
pub fn frozen() -> CompileOptions {
    CompileOptions {
        auto_update_time: false,
        fill_managed_on_insert: false,
        ..CompileOptions::default()
    }
}

pub fn compiler(kind: DialectKind) -> SqlCompiler {
    SqlCompiler::new(kind.build()).with_options(frozen())
}

pub fn compile(kind: DialectKind, statement: impl Into<Statement>) -> CompiledStatement {
    let statement = statement.into();
    compiler(kind)
        .compile(&statement)
        .unwrap_or_else(|e| panic!("Failed to compile: {statement:?}\nError: {e}"))
}

pub fn compile_err(kind: DialectKind, statement: impl Into<Statement>) -> CompileError {
    let statement = statement.into();
    compiler(kind)
        .compile(&statement)
        .expect_err(&format!("Expected compile error for: {statement:?}"))
}

pub fn sql(kind: DialectKind, statement: impl Into<Statement>) -> String {
    String::from(compile(kind, statement).sql())
}

pub fn map_row(values: &[(&str, SqlValue)]) -> Row {
    row(values
        .iter()
        .map(|(name, value)| (String::from(*name), value.clone()))
        .collect::<HashMap<_, _>>())
}

/// Counts `?` and `$n` placeholders outside string literals.
pub fn placeholder_count(sql: &str) -> usize {
    let mut count = 0;
    let mut quoted = false;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => quoted = !quoted,
            '?' if !quoted => count += 1,
            '$' if !quoted && chars.peek().is_some_and(char::is_ascii_digit) => count += 1,
            _ => {}
        }
    }
    count
}

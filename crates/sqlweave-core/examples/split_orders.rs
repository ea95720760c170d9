//! Split Orders - Compiling Writes on an Inherited Table
//!
//! This example walks through an order table split into a shared base table
//! and an extension table:
//! - Reads filtering on base columns
//! - Updates that touch one or both halves
//! - Batched inserts fed from derived rows
//!
//! Run with: cargo run --example split_orders

use sqlweave_core::ast::{
    lit, named, param, BatchMode, InsertStmt, SelectStmt, Selection, Statement, UpdateStmt,
};
use sqlweave_core::dialect::DialectKind;
use sqlweave_core::meta::ManagedColumn;
use sqlweave_core::{row, CompileError, CompiledStatement, SqlCompiler, Table};
use sqlweave_derive::Row;

// =============================================================================
// SCHEMA
// =============================================================================

fn tables() -> (Table, Table) {
    let base = Table::builder("order_base")
        .generated_key("id")
        .column("amount")
        .managed(ManagedColumn::Version, "version")
        .managed(ManagedColumn::UpdateTime, "update_time")
        .managed(ManagedColumn::Visible, "visible")
        .build();
    let order = Table::builder("order")
        .child_of(&base)
        .column("status")
        .build();
    (base, order)
}

#[derive(Debug, Row)]
struct NewOrder {
    status: String,
    amount: i64,
}

// =============================================================================
// OUTPUT
// =============================================================================

fn show(title: &str, compiler: &SqlCompiler, compiled: &CompiledStatement) {
    println!("-- {title} [{}]", compiler.dialect().name());
    println!("   {}", compiled.printable(compiler.dialect()));
    println!(
        "   statements: {}, parent: {}, child: {}",
        compiled.statement_count(),
        compiled.need_query_parent(),
        compiled.need_query_child()
    );
}

fn main() -> Result<(), CompileError> {
    let (_, order) = tables();

    let open_orders: Statement = SelectStmt::from_table(&order, "o")
        .select(Selection::expr(order.field("status")))
        .select(Selection::expr(order.field("amount")))
        .filter(order.field("amount").gt(param(100)))
        .into();

    let pay: Statement = UpdateStmt::new(&order, Some("o"))
        .set(order.field("status"), param("PAID"))
        .filter(order.field("id").eq(param(7)))
        .into();

    let pay_and_bump: Statement = UpdateStmt::new(&order, Some("o"))
        .set(order.field("status"), param("PAID"))
        .set(order.field("version"), order.field("version") + lit(1))
        .filter(order.field("id").eq(param(7)))
        .into();

    let intake = Statement::from(InsertStmt::values(
        &order,
        vec![order.field("status"), order.field("amount")],
        vec![vec![named("status"), named("amount")]],
    ))
    .batch(
        vec![
            row(NewOrder {
                status: String::from("NEW"),
                amount: 120,
            }),
            row(NewOrder {
                status: String::from("NEW"),
                amount: 80,
            }),
        ],
        BatchMode::Template,
    );

    for kind in [DialectKind::Postgres, DialectKind::Mysql, DialectKind::Sqlite] {
        let compiler = SqlCompiler::new(kind.build());
        show("open orders", &compiler, &compiler.compile(&open_orders)?);
        show("pay", &compiler, &compiler.compile(&pay)?);
        show("pay and bump", &compiler, &compiler.compile(&pay_and_bump)?);

        let compiled = compiler.compile(&intake)?;
        show("intake", &compiler, &compiled);
        if let CompiledStatement::Batch(batch) = &compiled {
            for part in batch.parts() {
                println!(
                    "   {} -> {} params per row, key slots {:?}",
                    part.statement().table(),
                    part.params_per_row(),
                    part.key_slots()
                );
            }
        }
        println!();
    }
    Ok(())
}

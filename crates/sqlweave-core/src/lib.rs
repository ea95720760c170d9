//! # sqlweave-core
//!
//! A dialect-aware SQL statement compiler.
//!
//! Statements are built as trees over logical [`Table`]s and compiled into
//! SQL text plus an ordered parameter list for one target database. The
//! compiler takes care of:
//! - Clause ordering, checked by a per-scope state machine
//! - Alias resolution across nested subqueries and correlated references
//! - Tables split vertically into a parent and a child sharing a primary key
//! - Tables routed horizontally into numbered physical tables
//! - Batches, either as one template over many rows or as one multi-statement text
//!
//! ## Compiling a statement
//!
//! ```rust
//! use sqlweave_core::ast::{param, Selection, SelectStmt};
//! use sqlweave_core::dialect::DialectKind;
//! use sqlweave_core::{SqlCompiler, Table};
//!
//! let users = Table::builder("users").primary_key("id").column("name").build();
//! let compiler = SqlCompiler::new(DialectKind::Mysql.build());
//! let compiled = compiler
//!     .compile(
//!         &SelectStmt::from_table(&users, "u")
//!             .select(Selection::expr(users.field("name")))
//!             .filter(users.field("id").eq(param(7)))
//!             .into(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(compiled.sql(), "SELECT u.name FROM users AS u WHERE u.id = ?");
//! ```
//!
//! ## Split tables
//!
//! A child table reaches its parent's columns transparently. Reads check
//! parent columns through a correlated `EXISTS`; writes produce a parent and
//! a child statement:
//!
//! ```rust
//! use sqlweave_core::ast::{param, UpdateStmt};
//! use sqlweave_core::dialect::DialectKind;
//! use sqlweave_core::meta::ManagedColumn;
//! use sqlweave_core::{CompiledStatement, SqlCompiler, Table};
//!
//! let base = Table::builder("order_base")
//!     .generated_key("id")
//!     .column("amount")
//!     .managed(ManagedColumn::Version, "version")
//!     .build();
//! let order = Table::builder("orders").child_of(&base).column("status").build();
//!
//! let update = UpdateStmt::new(&order, Some("o"))
//!     .set(order.field("amount"), param(10))
//!     .set(order.field("status"), param("paid"))
//!     .filter(order.field("id").eq(param(1)));
//! let compiled = SqlCompiler::new(DialectKind::Postgres.build())
//!     .compile(&update.into())
//!     .unwrap();
//!
//! assert!(matches!(compiled, CompiledStatement::Paired(_)));
//! assert!(compiled.need_query_parent());
//! assert!(compiled.need_query_child());
//! ```

pub mod assembler;
pub mod ast;
pub mod binder;
pub mod clause;
pub mod compiled;
pub mod config;
pub mod dialect;
pub mod error;
mod inheritance;
pub mod meta;
pub mod router;
pub mod row;
pub mod scope;
pub mod sink;
pub mod value;

pub use assembler::{SqlCompiler, StatementAssembler};
pub use ast::{Expr, Statement};
pub use compiled::{CompiledStatement, SqlStatement};
pub use config::{CompileOptions, CompilerConfig};
pub use error::{CompileError, Result};
pub use meta::{FieldRef, Table};
pub use row::{row, Row, RowAccessor};
pub use value::{SqlValue, ToSqlValue};

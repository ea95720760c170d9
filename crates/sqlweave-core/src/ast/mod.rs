//! Abstract Syntax Tree (AST) types for SQL statements.
//!
//! Column references carry their table metadata ([`FieldRef`](crate::meta::FieldRef)),
//! so the compiler can resolve them against the aliases in scope.

mod expr;
mod statement;

pub use expr::{
    derived, exists, func, label, lit, named, neg, nested, not, not_exists, param, qualified,
    subquery, BinaryOp, Expr, UnaryOp,
};
pub use statement::{
    Assignment, BatchMode, BatchStmt, CompoundQuery, ConflictAction, DeleteStmt, InsertSource,
    InsertStmt, Join, JoinKind, LockMode, OnConflict, Order, Predicate, Query, Selection,
    SelectStmt, SetOp, Statement, StatementKind, TableSource, UpdateStmt, ValuesStmt, Visibility,
};

//! Horizontal routing.
//!
//! A routed table is stored in `partitions` physical tables named
//! `<table>_<index>`. The index is derived from the statement's routing key,
//! taken from an equality predicate on the routing column or from the first
//! inserted row. Statements without a usable key use the primary suffix.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{trace, warn};

use crate::ast::{BinaryOp, Expr, Predicate};
use crate::meta::Table;
use crate::value::SqlValue;

/// Routing rule of one logical table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteRule {
    /// The column holding the routing key.
    pub column: String,
    /// Number of physical tables.
    pub partitions: u32,
}

/// Routing configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Suffix used when no key can be derived.
    pub primary_suffix: String,
    /// Rules keyed by logical table name.
    pub tables: HashMap<String, RouteRule>,
}

/// Computes physical table names.
#[derive(Debug, Clone, Default)]
pub struct TableRouter {
    config: RoutingConfig,
}

impl TableRouter {
    /// Creates a router from its configuration.
    #[must_use]
    pub const fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// The rule of `table`, if it is routed.
    #[must_use]
    pub fn rule(&self, table: &Table) -> Option<&RouteRule> {
        self.config.tables.get(table.name())
    }

    /// The suffix used when no key is available.
    #[must_use]
    pub fn primary_suffix(&self) -> &str {
        &self.config.primary_suffix
    }

    /// Returns the suffix of `table` for the routing `key`.
    ///
    /// Unrouted tables get no suffix; routed tables without a usable key get
    /// the primary suffix.
    #[must_use]
    pub fn suffix(&self, table: &Table, key: Option<&SqlValue>) -> String {
        let Some(rule) = self.rule(table) else {
            return String::new();
        };
        let partitions = u64::from(rule.partitions.max(1));
        let index = match key {
            Some(SqlValue::Int(n)) => Some(i64_index(*n, partitions)),
            Some(SqlValue::Text(s)) => Some(fnv1a(s.as_bytes()) % partitions),
            Some(SqlValue::Null) | None => None,
            Some(other) => {
                warn!(
                    table = table.name(),
                    key_type = other.type_name(),
                    "route key cannot be hashed, using primary suffix"
                );
                None
            }
        };
        let suffix = index.map_or_else(
            || self.config.primary_suffix.clone(),
            |i| format!("_{i}"),
        );
        trace!(table = table.name(), suffix = %suffix, "route");
        suffix
    }

    /// Returns the physical name of `table` for the routing `key`.
    #[must_use]
    pub fn physical_name(&self, table: &Table, key: Option<&SqlValue>) -> String {
        format!("{}{}", table.name(), self.suffix(table, key))
    }

    /// Returns the physical name of `table` outside any routing key.
    #[must_use]
    pub fn primary_name(&self, table: &Table) -> String {
        if self.rule(table).is_some() {
            format!("{}{}", table.name(), self.config.primary_suffix)
        } else {
            String::from(table.name())
        }
    }
}

fn i64_index(value: i64, partitions: u64) -> u64 {
    let partitions = i128::from(partitions);
    let index = i128::from(value).rem_euclid(partitions);
    u64::try_from(index).unwrap_or_default()
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// A key source read while searching predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyExpr<'a> {
    /// A bound or literal value.
    Value(&'a SqlValue),
    /// A named parameter, read from the current batch row.
    Named(&'a str),
}

/// Finds `column = value` among the top-level conjuncts of `predicates`,
/// where the column belongs to `table` or to its parent/child family.
#[must_use]
pub fn key_in_predicates<'a>(
    predicates: &'a [Predicate],
    table: &Table,
    column: &str,
) -> Option<KeyExpr<'a>> {
    predicates
        .iter()
        .flat_map(|p| p.expr.conjuncts())
        .find_map(|expr| key_in_equality(expr, table, column))
}

fn key_in_equality<'a>(expr: &'a Expr, table: &Table, column: &str) -> Option<KeyExpr<'a>> {
    let Expr::Binary {
        left,
        op: BinaryOp::Eq,
        right,
    } = expr
    else {
        return None;
    };
    let is_key = |e: &Expr| match e {
        Expr::Field(field) | Expr::Qualified { field, .. } => {
            let handle = field.table();
            field.name() == column
                && (handle.same_as(table) || handle.is_child_of(table) || table.is_child_of(handle))
        }
        _ => false,
    };
    let value = |e: &'a Expr| match e {
        Expr::Param(v) | Expr::Literal(v) => Some(KeyExpr::Value(v)),
        Expr::Named(n) => Some(KeyExpr::Named(n)),
        _ => None,
    };
    if is_key(&**left) {
        value(&**right)
    } else if is_key(&**right) {
        value(&**left)
    } else {
        None
    }
}

//! Expression AST types.

use std::ops;

use super::statement::Query;
use crate::meta::FieldRef;
use crate::value::{SqlValue, ToSqlValue};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,

    // String
    Concat,
    Like,

    // Bitwise
    BitAnd,
    BitOr,
    LeftShift,
    RightShift,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
            Self::Like => "LIKE",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
        }
    }

    /// Returns the precedence of the operator (higher = binds tighter).
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => 3,
            Self::Like => 4,
            Self::BitOr => 5,
            Self::BitAnd => 6,
            Self::LeftShift | Self::RightShift => 7,
            Self::Add | Self::Sub | Self::Concat => 8,
            Self::Mul | Self::Div | Self::Mod => 9,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Logical NOT
    Not,
    /// Bitwise NOT (~)
    BitNot,
}

impl UnaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "NOT",
            Self::BitNot => "~",
        }
    }

    /// Binding strength of the operand position.
    #[must_use]
    pub const fn operand_precedence(&self) -> u8 {
        match self {
            Self::Not => 3,
            Self::Neg | Self::BitNot => 10,
        }
    }
}

/// An SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column bound to whichever alias registers its owning table.
    Field(FieldRef),

    /// A column qualified with an explicit alias.
    Qualified {
        /// The alias the column is read through.
        alias: String,
        /// The column.
        field: FieldRef,
    },

    /// A column of a derived table (subquery in FROM).
    DerivedColumn {
        /// The derived table alias.
        alias: String,
        /// The output label of the subquery.
        column: String,
    },

    /// A positional bind parameter.
    Param(SqlValue),

    /// A named parameter read from the current batch row.
    Named(String),

    /// An inline literal.
    Literal(SqlValue),

    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// A unary expression.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },

    /// IS NULL expression.
    IsNull {
        /// The expression to check.
        expr: Box<Expr>,
        /// Whether this is IS NOT NULL.
        negated: bool,
    },

    /// IN (list) expression.
    InList {
        /// The expression to check.
        expr: Box<Expr>,
        /// The candidate values.
        list: Vec<Expr>,
        /// Whether this is NOT IN.
        negated: bool,
    },

    /// IN (subquery) expression.
    InQuery {
        /// The expression to check.
        expr: Box<Expr>,
        /// The subquery.
        query: Box<Query>,
        /// Whether this is NOT IN.
        negated: bool,
    },

    /// BETWEEN expression.
    Between {
        /// The expression to check.
        expr: Box<Expr>,
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
        /// Whether this is NOT BETWEEN.
        negated: bool,
    },

    /// EXISTS (subquery).
    Exists {
        /// The subquery.
        query: Box<Query>,
        /// Whether this is NOT EXISTS.
        negated: bool,
    },

    /// A scalar subquery.
    Subquery(Box<Query>),

    /// A function call.
    Function {
        /// The function name, written as given.
        name: String,
        /// The arguments.
        args: Vec<Expr>,
    },

    /// A row value `(a, b, ...)`.
    Row(Vec<Expr>),

    /// The incoming value of a column in an upsert update clause.
    Excluded(FieldRef),

    /// Wildcard (*).
    Star,

    /// A reference to an output label (ORDER BY of compound queries).
    Label(String),

    /// Parenthesized expression.
    Nested(Box<Expr>),
}

/// Creates a positional bind parameter.
pub fn param(value: impl ToSqlValue) -> Expr {
    Expr::Param(value.to_sql_value())
}

/// Creates a named parameter, bound per batch row.
pub fn named(name: &str) -> Expr {
    Expr::Named(String::from(name))
}

/// Creates an inline literal.
pub fn lit(value: impl ToSqlValue) -> Expr {
    Expr::Literal(value.to_sql_value())
}

/// Creates a column reference qualified with `alias`.
#[must_use]
pub fn qualified(alias: &str, field: FieldRef) -> Expr {
    Expr::Qualified {
        alias: String::from(alias),
        field,
    }
}

/// Creates a reference to a derived table column.
#[must_use]
pub fn derived(alias: &str, column: &str) -> Expr {
    Expr::DerivedColumn {
        alias: String::from(alias),
        column: String::from(column),
    }
}

/// Creates a function call.
#[must_use]
pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: String::from(name),
        args,
    }
}

/// Creates an output label reference.
#[must_use]
pub fn label(name: &str) -> Expr {
    Expr::Label(String::from(name))
}

/// Creates `EXISTS (query)`.
#[must_use]
pub fn exists(query: impl Into<Query>) -> Expr {
    Expr::Exists {
        query: Box::new(query.into()),
        negated: false,
    }
}

/// Creates `NOT EXISTS (query)`.
#[must_use]
pub fn not_exists(query: impl Into<Query>) -> Expr {
    Expr::Exists {
        query: Box::new(query.into()),
        negated: true,
    }
}

/// Creates a scalar subquery.
#[must_use]
pub fn subquery(query: impl Into<Query>) -> Expr {
    Expr::Subquery(Box::new(query.into()))
}

/// Creates `NOT expr`.
#[must_use]
pub fn not(expr: impl Into<Expr>) -> Expr {
    Expr::Unary {
        op: UnaryOp::Not,
        operand: Box::new(expr.into()),
    }
}

/// Creates `-expr`.
#[must_use]
pub fn neg(expr: impl Into<Expr>) -> Expr {
    Expr::Unary {
        op: UnaryOp::Neg,
        operand: Box::new(expr.into()),
    }
}

/// Creates a parenthesized expression.
#[must_use]
pub fn nested(expr: impl Into<Expr>) -> Expr {
    Expr::Nested(Box::new(expr.into()))
}

impl From<FieldRef> for Expr {
    fn from(field: FieldRef) -> Self {
        Self::Field(field)
    }
}

impl From<SqlValue> for Expr {
    fn from(value: SqlValue) -> Self {
        Self::Param(value)
    }
}

impl Expr {
    /// Creates a binary expression.
    #[must_use]
    pub fn binary(self, op: BinaryOp, right: impl Into<Self>) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, right: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    /// Creates an inequality expression.
    #[must_use]
    pub fn not_eq(self, right: impl Into<Self>) -> Self {
        self.binary(BinaryOp::NotEq, right)
    }

    /// Creates a less-than expression.
    #[must_use]
    pub fn lt(self, right: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Lt, right)
    }

    /// Creates a less-than-or-equal expression.
    #[must_use]
    pub fn lt_eq(self, right: impl Into<Self>) -> Self {
        self.binary(BinaryOp::LtEq, right)
    }

    /// Creates a greater-than expression.
    #[must_use]
    pub fn gt(self, right: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Gt, right)
    }

    /// Creates a greater-than-or-equal expression.
    #[must_use]
    pub fn gt_eq(self, right: impl Into<Self>) -> Self {
        self.binary(BinaryOp::GtEq, right)
    }

    /// Creates a LIKE expression.
    #[must_use]
    pub fn like(self, pattern: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Like, pattern)
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, right: impl Into<Self>) -> Self {
        self.binary(BinaryOp::And, right)
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, right: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Or, right)
    }

    /// Creates an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// Creates an IS NOT NULL expression.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// Creates a BETWEEN expression.
    #[must_use]
    pub fn between(self, low: impl Into<Self>, high: impl Into<Self>) -> Self {
        Self::Between {
            expr: Box::new(self),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: false,
        }
    }

    /// Creates a NOT BETWEEN expression.
    #[must_use]
    pub fn not_between(self, low: impl Into<Self>, high: impl Into<Self>) -> Self {
        Self::Between {
            expr: Box::new(self),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: true,
        }
    }

    /// Creates an IN expression.
    #[must_use]
    pub fn in_list(self, list: Vec<Self>) -> Self {
        Self::InList {
            expr: Box::new(self),
            list,
            negated: false,
        }
    }

    /// Creates a NOT IN expression.
    #[must_use]
    pub fn not_in_list(self, list: Vec<Self>) -> Self {
        Self::InList {
            expr: Box::new(self),
            list,
            negated: true,
        }
    }

    /// Creates an IN (subquery) expression.
    #[must_use]
    pub fn in_query(self, query: impl Into<Query>) -> Self {
        Self::InQuery {
            expr: Box::new(self),
            query: Box::new(query.into()),
            negated: false,
        }
    }

    /// Creates a NOT IN (subquery) expression.
    #[must_use]
    pub fn not_in_query(self, query: impl Into<Query>) -> Self {
        Self::InQuery {
            expr: Box::new(self),
            query: Box::new(query.into()),
            negated: true,
        }
    }

    /// Collects the column references of this expression, outside subqueries.
    ///
    /// Each entry carries the explicit alias when the reference is qualified.
    #[must_use]
    pub fn column_refs(&self) -> Vec<(Option<&str>, &FieldRef)> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<(Option<&'a str>, &'a FieldRef)>) {
        match self {
            Self::Field(field) => out.push((None, field)),
            Self::Qualified { alias, field } => out.push((Some(alias.as_str()), field)),
            Self::Binary { left, right, .. } => {
                left.collect_refs(out);
                right.collect_refs(out);
            }
            Self::Unary { operand: expr, .. }
            | Self::IsNull { expr, .. }
            | Self::InQuery { expr, .. }
            | Self::Nested(expr) => expr.collect_refs(out),
            Self::InList { expr, list, .. } => {
                expr.collect_refs(out);
                for item in list {
                    item.collect_refs(out);
                }
            }
            Self::Between {
                expr, low, high, ..
            } => {
                expr.collect_refs(out);
                low.collect_refs(out);
                high.collect_refs(out);
            }
            Self::Function { args: items, .. } | Self::Row(items) => {
                for item in items {
                    item.collect_refs(out);
                }
            }
            Self::DerivedColumn { .. }
            | Self::Param(_)
            | Self::Named(_)
            | Self::Literal(_)
            | Self::Exists { .. }
            | Self::Subquery(_)
            | Self::Excluded(_)
            | Self::Star
            | Self::Label(_) => {}
        }
    }

    /// Returns true when this is an equality on an optimistic-lock version column.
    #[must_use]
    pub fn is_version_check(&self) -> bool {
        match self {
            Self::Binary {
                left,
                op: BinaryOp::Eq,
                right,
            } => left.is_version_column() || right.is_version_column(),
            _ => false,
        }
    }

    fn is_version_column(&self) -> bool {
        match self {
            Self::Field(field) | Self::Qualified { field, .. } => field.is_version(),
            _ => false,
        }
    }

    /// Splits top-level AND chains into their conjuncts.
    #[must_use]
    pub fn conjuncts(&self) -> Vec<&Self> {
        match self {
            Self::Binary {
                left,
                op: BinaryOp::And,
                right,
            } => {
                let mut parts = left.conjuncts();
                parts.extend(right.conjuncts());
                parts
            }
            other => vec![other],
        }
    }
}

impl<R: Into<Self>> ops::Add<R> for Expr {
    type Output = Self;

    fn add(self, rhs: R) -> Self {
        self.binary(BinaryOp::Add, rhs)
    }
}

impl<R: Into<Self>> ops::Sub<R> for Expr {
    type Output = Self;

    fn sub(self, rhs: R) -> Self {
        self.binary(BinaryOp::Sub, rhs)
    }
}

impl<R: Into<Self>> ops::Mul<R> for Expr {
    type Output = Self;

    fn mul(self, rhs: R) -> Self {
        self.binary(BinaryOp::Mul, rhs)
    }
}

impl<R: Into<Expr>> ops::Add<R> for FieldRef {
    type Output = Expr;

    fn add(self, rhs: R) -> Expr {
        Expr::from(self) + rhs
    }
}

impl<R: Into<Expr>> ops::Sub<R> for FieldRef {
    type Output = Expr;

    fn sub(self, rhs: R) -> Expr {
        Expr::from(self) - rhs
    }
}

// Comparison shorthands so callers can write `order.field("id").eq(param(1))`.
impl FieldRef {
    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, right: impl Into<Expr>) -> Expr {
        Expr::from(self).eq(right)
    }

    /// Creates an inequality expression.
    #[must_use]
    pub fn not_eq(self, right: impl Into<Expr>) -> Expr {
        Expr::from(self).not_eq(right)
    }

    /// Creates a less-than expression.
    #[must_use]
    pub fn lt(self, right: impl Into<Expr>) -> Expr {
        Expr::from(self).lt(right)
    }

    /// Creates a greater-than expression.
    #[must_use]
    pub fn gt(self, right: impl Into<Expr>) -> Expr {
        Expr::from(self).gt(right)
    }

    /// Creates a LIKE expression.
    #[must_use]
    pub fn like(self, pattern: impl Into<Expr>) -> Expr {
        Expr::from(self).like(pattern)
    }

    /// Creates an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Expr {
        Expr::from(self).is_null()
    }

    /// Creates an IN expression.
    #[must_use]
    pub fn in_list(self, list: Vec<Expr>) -> Expr {
        Expr::from(self).in_list(list)
    }
}

//! Vertical split planning.
//!
//! A child table stores its extension columns while its parent stores the
//! shared and managed ones; both share the primary key. Reads reach parent
//! columns through a correlated `EXISTS` check on the parent. Writes are
//! split into a parent statement and a child statement, and the second one
//! is only planned when it has something to do.
//!
//! Planning is pure: it classifies predicates and assignments and returns
//! the physical parts the assembler emits.

use crate::ast::{Assignment, Expr, InsertSource, InsertStmt, OnConflict, Predicate, UpdateStmt, Visibility};
use crate::compiled::StatementRole;
use crate::config::CompileOptions;
use crate::error::{CompileError, Result};
use crate::meta::{FieldRef, ManagedColumn, Table};
use crate::scope::{Location, ScopeResolver};
use crate::value::SqlValue;

/// One conjunct of a predicate list.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Term<'s> {
    pub expr: &'s Expr,
    /// Whether the conjunct came from an optimistic-lock version predicate.
    pub version: bool,
}

/// Flattens predicates into their top-level conjuncts.
pub(crate) fn terms(predicates: &[Predicate]) -> Vec<Term<'_>> {
    predicates
        .iter()
        .flat_map(|p| {
            let parts = p.expr.conjuncts();
            let single = parts.len() == 1;
            parts.into_iter().map(move |expr| Term {
                expr,
                version: p.version && (single || expr.is_version_check()),
            })
        })
        .collect()
}

/// `EXISTS` over the parent row of a child alias.
#[derive(Debug, Clone)]
pub(crate) struct ParentCheck<'s> {
    pub child_alias: String,
    pub child: Table,
    pub parent: Table,
    pub predicates: Vec<Term<'s>>,
    /// Visibility column of the parent and the flag to filter on.
    pub visible: Option<(String, bool)>,
}

/// `EXISTS` over the child row of a parent alias.
#[derive(Debug, Clone)]
pub(crate) struct ChildCheck<'s> {
    pub parent_alias: String,
    pub parent: Table,
    pub child: Table,
    pub predicates: Vec<Term<'s>>,
}

/// An item of a WHERE/ON conjunction, joined with `AND`.
#[derive(Debug, Clone)]
pub(crate) enum Conjunct<'s> {
    Term(Term<'s>),
    Visible {
        alias: String,
        column: String,
        flag: bool,
    },
    Parent(ParentCheck<'s>),
    Child(ChildCheck<'s>),
}

/// Conjuncts emitted as written.
pub(crate) fn plain(predicates: &[Predicate]) -> Vec<Conjunct<'_>> {
    terms(predicates).into_iter().map(Conjunct::Term).collect()
}

/// Splits a read conjunction over the aliases in `targets`.
///
/// Conjuncts that reach parent columns through exactly one child target move
/// into that target's parent check; everything else stays local. Targets
/// owning a visibility column get a filter, child targets whose parent owns
/// it get a parent check even without predicates.
pub(crate) fn split_read<'s>(
    scope: &ScopeResolver,
    predicates: &'s [Predicate],
    targets: &[(String, Table)],
    visibility: Visibility,
) -> Result<Vec<Conjunct<'s>>> {
    let mut conjuncts = Vec::new();
    let mut checks: Vec<Vec<Term<'s>>> = vec![Vec::new(); targets.len()];
    for term in terms(predicates) {
        match parent_target(scope, term.expr, targets)? {
            Some(index) => checks[index].push(term),
            None => conjuncts.push(Conjunct::Term(term)),
        }
    }

    let flag = visibility.flag();
    for ((alias, table), predicates) in targets.iter().zip(checks) {
        if let (Some(flag), Some(column)) = (flag, table.managed(ManagedColumn::Visible)) {
            conjuncts.push(Conjunct::Visible {
                alias: alias.clone(),
                column: column.name.clone(),
                flag,
            });
        }
        let Some(parent) = table.parent() else {
            continue;
        };
        let visible = visible_column(parent, flag);
        if predicates.is_empty() && visible.is_none() {
            continue;
        }
        conjuncts.push(Conjunct::Parent(ParentCheck {
            child_alias: alias.clone(),
            child: table.clone(),
            parent: parent.clone(),
            predicates,
            visible,
        }));
    }
    Ok(conjuncts)
}

fn visible_column(table: &Table, flag: Option<bool>) -> Option<(String, bool)> {
    let flag = flag?;
    table
        .managed(ManagedColumn::Visible)
        .map(|c| (c.name.clone(), flag))
}

/// The target whose parent a conjunct reaches, when there is exactly one.
fn parent_target(
    scope: &ScopeResolver,
    expr: &Expr,
    targets: &[(String, Table)],
) -> Result<Option<usize>> {
    let mut found = None;
    for (alias, field) in expr.column_refs() {
        if let Location::ViaParent { child_alias, .. } = scope.locate(alias, field)? {
            let Some(index) = targets.iter().position(|(a, _)| *a == child_alias) else {
                return Ok(None);
            };
            if found.is_some_and(|f| f != index) {
                return Ok(None);
            }
            found = Some(index);
        }
    }
    Ok(found)
}

/// Every column reachable through a table: its own, then the parent's.
pub(crate) fn columns(table: &Table) -> Vec<String> {
    let mut names: Vec<String> = table.fields().iter().map(|f| f.name.clone()).collect();
    if let Some(parent) = table.parent() {
        names.extend(
            parent
                .fields()
                .iter()
                .filter(|f| f.name != table.primary_key())
                .map(|f| f.name.clone()),
        );
    }
    names
}

/// How the WHERE clause of an update part is produced.
#[derive(Debug)]
pub(crate) enum Filter<'s> {
    /// Split at emission time against the registered aliases.
    Read {
        predicates: &'s [Predicate],
        visibility: Visibility,
    },
    /// Planned conjuncts.
    Split(Vec<Conjunct<'s>>),
}

/// One physical UPDATE.
#[derive(Debug)]
pub(crate) struct UpdatePart<'s> {
    pub role: StatementRole,
    pub table: Table,
    pub assignments: Vec<&'s Assignment>,
    /// Version column to increment.
    pub bump_version: Option<String>,
    /// Update-time column to set to now.
    pub touch_update_time: Option<String>,
    pub filter: Filter<'s>,
}

impl UpdatePart<'_> {
    fn has_assignments(&self) -> bool {
        !self.assignments.is_empty()
            || self.bump_version.is_some()
            || self.touch_update_time.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Key,
    Child,
    Parent,
    Mixed,
}

fn classify(expr: &Expr, child: &Table, parent: &Table) -> Result<Side> {
    let (mut on_child, mut on_parent, mut on_key) = (false, false, false);
    for (_, field) in expr.column_refs() {
        let family = field.table().same_as(child) || field.table().same_as(parent);
        if family && field.name() == child.primary_key() {
            on_key = true;
        } else if field.owner()?.same_as(parent) {
            on_parent = true;
        } else {
            on_child = true;
        }
    }
    Ok(match (on_child, on_parent) {
        (true, true) => Side::Mixed,
        (false, true) => Side::Parent,
        (false, false) if on_key => Side::Key,
        _ => Side::Child,
    })
}

fn managed_updates(
    table: &Table,
    assigned: &[&Assignment],
    version_predicate: bool,
    options: &CompileOptions,
) -> (Option<String>, Option<String>) {
    let unassigned = |kind: ManagedColumn| {
        table
            .managed(kind)
            .filter(|c| !assigned.iter().any(|a| a.column.name() == c.name))
            .map(|c| c.name.clone())
    };
    let bump = if version_predicate {
        unassigned(ManagedColumn::Version)
    } else {
        None
    };
    let touch = if options.auto_update_time {
        unassigned(ManagedColumn::UpdateTime)
    } else {
        None
    };
    (bump, touch)
}

fn no_assignments(table: &Table) -> CompileError {
    CompileError::InvalidStatement(format!("UPDATE of '{}' has no assignments", table.name()))
}

/// Plans the physical statements of an UPDATE, parent first.
///
/// For a child table, the parent statement is planned when a parent column is
/// assigned or filtered on and the parent has something to set; otherwise
/// parent predicates are checked through `EXISTS` from the child statement.
/// The child statement is planned when a child column is assigned.
pub(crate) fn plan_update<'s>(
    stmt: &'s UpdateStmt,
    options: &CompileOptions,
) -> Result<Vec<UpdatePart<'s>>> {
    let table = &stmt.table;
    let visibility = stmt.visibility.unwrap_or(options.visibility);
    let version = stmt.where_.iter().any(|p| p.version);

    let Some(parent) = table.parent() else {
        let assignments: Vec<&Assignment> = stmt.assignments.iter().collect();
        let (bump_version, touch_update_time) =
            managed_updates(table, &assignments, version, options);
        let part = UpdatePart {
            role: StatementRole::Single,
            table: table.clone(),
            assignments,
            bump_version,
            touch_update_time,
            filter: Filter::Read {
                predicates: &stmt.where_,
                visibility,
            },
        };
        if !part.has_assignments() {
            return Err(no_assignments(table));
        }
        return Ok(vec![part]);
    };

    let mut child_sets = Vec::new();
    let mut parent_sets = Vec::new();
    for assignment in &stmt.assignments {
        if assignment.column.owner()?.same_as(parent) {
            parent_sets.push(assignment);
        } else {
            child_sets.push(assignment);
        }
    }

    let mut key = Vec::new();
    let mut child_terms = Vec::new();
    let mut parent_terms = Vec::new();
    let mut mixed = Vec::new();
    for term in terms(&stmt.where_) {
        match classify(term.expr, table, parent)? {
            Side::Key => key.push(term),
            Side::Child => child_terms.push(term),
            Side::Parent => parent_terms.push(term),
            Side::Mixed => mixed.push(term),
        }
    }

    let touches_parent = !parent_sets.is_empty() || !parent_terms.is_empty() || !mixed.is_empty();
    let (bump, touch) = managed_updates(parent, &parent_sets, version, options);
    let parent_needed =
        touches_parent && (!parent_sets.is_empty() || bump.is_some() || touch.is_some());
    let child_needed = !child_sets.is_empty();
    if !parent_needed && !child_needed {
        return Err(no_assignments(table));
    }
    if parent_needed {
        if child_needed && key.is_empty() {
            return Err(CompileError::InvalidStatement(format!(
                "UPDATE of split table '{}' needs a primary-key predicate",
                table.name()
            )));
        }
        if !stmt.joins.is_empty() {
            return Err(CompileError::InvalidStatement(format!(
                "multi-table UPDATE of split table '{}' cannot touch parent columns",
                table.name()
            )));
        }
        if !stmt.order_by.is_empty() || stmt.limit.is_some() || !stmt.returning.is_empty() {
            return Err(CompileError::InvalidStatement(format!(
                "UPDATE of split table '{}' touching parent columns cannot use ORDER BY, LIMIT or RETURNING",
                table.name()
            )));
        }
    }

    let alias = stmt.alias();
    let flag = visibility.flag();
    let mut parts = Vec::with_capacity(2);

    if parent_needed {
        let mut conjuncts: Vec<Conjunct<'s>> = key
            .iter()
            .chain(&parent_terms)
            .copied()
            .map(Conjunct::Term)
            .collect();
        let correlated: Vec<Term<'s>> = child_terms.iter().chain(&mixed).copied().collect();
        if !correlated.is_empty() {
            conjuncts.push(Conjunct::Child(ChildCheck {
                parent_alias: String::from(alias),
                parent: parent.clone(),
                child: table.clone(),
                predicates: correlated,
            }));
        }
        if let Some((column, flag)) = visible_column(parent, flag) {
            conjuncts.push(Conjunct::Visible {
                alias: String::from(alias),
                column,
                flag,
            });
        }
        parts.push(UpdatePart {
            role: StatementRole::Parent,
            table: parent.clone(),
            assignments: parent_sets,
            bump_version: bump,
            touch_update_time: touch,
            filter: Filter::Split(conjuncts),
        });
    }

    if child_needed {
        let (bump_version, touch_update_time) =
            managed_updates(table, &child_sets, version, options);
        let mut conjuncts: Vec<Conjunct<'s>> = key
            .iter()
            .chain(&child_terms)
            .copied()
            .map(Conjunct::Term)
            .collect();
        if let Some((column, flag)) = visible_column(table, flag) {
            conjuncts.push(Conjunct::Visible {
                alias: String::from(alias),
                column,
                flag,
            });
        }
        if !parent_needed {
            let predicates: Vec<Term<'s>> = parent_terms.iter().chain(&mixed).copied().collect();
            let visible = visible_column(parent, flag);
            if !predicates.is_empty() || visible.is_some() {
                conjuncts.push(Conjunct::Parent(ParentCheck {
                    child_alias: String::from(alias),
                    child: table.clone(),
                    parent: parent.clone(),
                    predicates,
                    visible,
                }));
            }
        }
        parts.push(UpdatePart {
            role: StatementRole::Child,
            table: table.clone(),
            assignments: child_sets,
            bump_version,
            touch_update_time,
            filter: Filter::Split(conjuncts),
        });
    }
    Ok(parts)
}

/// Where the value of an inserted column comes from.
#[derive(Debug, Clone)]
pub(crate) enum InsertValue {
    /// The listed column at this index.
    Column(usize),
    /// A managed default.
    Managed(SqlValue),
    /// The parent's generated key, filled by the execution layer.
    KeySlot,
}

/// A column of one physical INSERT.
#[derive(Debug, Clone)]
pub(crate) struct InsertColumn<'s> {
    pub field: Option<&'s FieldRef>,
    pub name: String,
    pub value: InsertValue,
}

/// One physical INSERT.
#[derive(Debug)]
pub(crate) struct InsertPart<'s> {
    pub role: StatementRole,
    pub table: Table,
    pub columns: Vec<InsertColumn<'s>>,
    pub generated_key: bool,
    pub returning: &'s [Expr],
    pub on_conflict: Option<&'s OnConflict>,
}

fn managed_fill<'s>(table: &Table, stmt: &InsertStmt, now: &SqlValue) -> Vec<InsertColumn<'s>> {
    [
        ManagedColumn::Version,
        ManagedColumn::Visible,
        ManagedColumn::CreateTime,
        ManagedColumn::UpdateTime,
    ]
    .into_iter()
    .filter_map(|kind| {
        let column = table.managed(kind)?;
        if stmt.columns.iter().any(|f| f.name() == column.name) {
            return None;
        }
        let value = match kind {
            ManagedColumn::Version => SqlValue::Int(0),
            ManagedColumn::Visible => SqlValue::Bool(true),
            ManagedColumn::CreateTime | ManagedColumn::UpdateTime => now.clone(),
        };
        Some(InsertColumn {
            field: None,
            name: column.name.clone(),
            value: InsertValue::Managed(value),
        })
    })
    .collect()
}

fn listed(stmt: &InsertStmt) -> impl Iterator<Item = InsertColumn<'_>> {
    stmt.columns
        .iter()
        .enumerate()
        .map(|(index, field)| InsertColumn {
            field: Some(field),
            name: String::from(field.name()),
            value: InsertValue::Column(index),
        })
}

const fn row_count(source: &InsertSource) -> usize {
    match source {
        InsertSource::Values(rows) => rows.len(),
        InsertSource::Rows(rows) => rows.len(),
        InsertSource::Query(_) => 0,
    }
}

/// Plans the physical statements of an INSERT, parent first.
pub(crate) fn plan_insert<'s>(
    stmt: &'s InsertStmt,
    options: &CompileOptions,
) -> Result<Vec<InsertPart<'s>>> {
    let table = &stmt.table;
    let fill = options.fill_managed_on_insert && !matches!(stmt.source, InsertSource::Query(_));
    let now = SqlValue::now();

    let Some(parent) = table.parent() else {
        let mut columns: Vec<InsertColumn<'s>> = listed(stmt).collect();
        if fill {
            columns.extend(managed_fill(table, stmt, &now));
        }
        return Ok(vec![InsertPart {
            role: StatementRole::Single,
            table: table.clone(),
            columns,
            generated_key: stmt.return_generated_key,
            returning: &stmt.returning,
            on_conflict: stmt.on_conflict.as_ref(),
        }]);
    };

    if matches!(stmt.source, InsertSource::Query(_)) {
        return Err(CompileError::InvalidStatement(format!(
            "INSERT .. SELECT into split table '{}'",
            table.name()
        )));
    }
    if stmt.on_conflict.is_some() || !stmt.returning.is_empty() {
        return Err(CompileError::InvalidStatement(format!(
            "upsert and RETURNING are not available for split table '{}'",
            table.name()
        )));
    }

    let key = table.primary_key();
    let key_index = stmt.columns.iter().position(|c| c.name() == key);
    let mut parent_columns = Vec::new();
    let mut child_columns = Vec::new();
    if key_index.is_none() {
        if !parent.generated_key() {
            return Err(CompileError::InvalidStatement(format!(
                "INSERT into split table '{}' needs a value for '{key}'",
                table.name()
            )));
        }
        if row_count(&stmt.source) > 1 {
            return Err(CompileError::InvalidStatement(format!(
                "INSERT into split table '{}' with a generated key takes one row per statement, use a batch",
                table.name()
            )));
        }
        child_columns.push(InsertColumn {
            field: None,
            name: String::from(key),
            value: InsertValue::KeySlot,
        });
    }
    for column in listed(stmt) {
        let InsertValue::Column(index) = column.value else {
            continue;
        };
        if Some(index) == key_index {
            parent_columns.push(column.clone());
            child_columns.push(column);
        } else if stmt.columns[index].owner()?.same_as(parent) {
            parent_columns.push(column);
        } else {
            child_columns.push(column);
        }
    }
    if fill {
        parent_columns.extend(managed_fill(parent, stmt, &now));
    }

    Ok(vec![
        InsertPart {
            role: StatementRole::Parent,
            table: parent.clone(),
            columns: parent_columns,
            generated_key: key_index.is_none(),
            returning: &[],
            on_conflict: None,
        },
        InsertPart {
            role: StatementRole::Child,
            table: table.clone(),
            columns: child_columns,
            generated_key: false,
            returning: &[],
            on_conflict: None,
        },
    ])
}

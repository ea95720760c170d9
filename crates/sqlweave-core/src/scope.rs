//! Alias and column resolution.
//!
//! The [`ScopeResolver`] is a stack of frames, one per query, subquery or
//! batch-item nesting level. A frame is only ever created by pushing onto the
//! stack, so the outer-scope chain is acyclic by construction and always ends
//! at the root frame.
//!
//! Each frame owns its alias namespace, the reverse table-to-alias map used
//! for unqualified references, and its own [`ClauseSequencer`]. References
//! that cannot be bound in a frame are delegated outward, which makes them
//! correlated references; only query frames may delegate.

use std::collections::HashMap;

use tracing::trace;

use crate::clause::{Clause, ClauseSequencer};
use crate::dialect::Dialect;
use crate::error::{CompileError, Result};
use crate::meta::{FieldRef, Table};
use crate::sink::SqlSink;

/// What a frame was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// A query or subquery; may reference outer frames.
    Query,
    /// The target frame of an INSERT/UPDATE/DELETE.
    Write,
    /// One statement of a multi-statement bundle.
    BatchItem,
}

impl FrameKind {
    const fn allows_correlation(self) -> bool {
        matches!(self, Self::Query)
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Write => "write",
            Self::BatchItem => "batch item",
        }
    }
}

/// What an alias stands for.
#[derive(Debug, Clone)]
pub enum Binding {
    /// A logical table.
    Table {
        /// The table.
        table: Table,
        /// Whether parent-owned columns may be reached through the alias.
        inherit: bool,
    },
    /// A derived table with its output labels.
    Derived {
        /// Output labels of the subquery.
        columns: Vec<String>,
    },
}

#[derive(Debug, Clone)]
enum Slot {
    Unique(String),
    Ambiguous,
}

/// Reroutes `from_alias` references to columns of `table` to `to_alias`.
#[derive(Debug, Clone)]
struct Redirect {
    from_alias: String,
    table: Table,
    to_alias: String,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    sequencer: ClauseSequencer,
    aliases: HashMap<String, Binding>,
    tables: HashMap<String, Slot>,
    redirects: Vec<Redirect>,
}

impl Frame {
    fn new(kind: FrameKind, sequencer: ClauseSequencer) -> Self {
        Self {
            kind,
            sequencer,
            aliases: HashMap::new(),
            tables: HashMap::new(),
            redirects: Vec::new(),
        }
    }

    fn find_unqualified(&self, owner: &Table, column: &str) -> Result<Option<Location>> {
        match self.tables.get(owner.name()) {
            Some(Slot::Unique(alias)) => return Ok(Some(Location::direct(alias, column))),
            Some(Slot::Ambiguous) => {
                return Err(CompileError::AmbiguousTable {
                    table: String::from(owner.name()),
                    column: String::from(column),
                })
            }
            None => {}
        }

        // A parent column reached through a registered child, or a primary
        // key shared between a registered table and `owner`.
        let is_key = column == owner.primary_key();
        let mut hits = self.aliases.iter().filter_map(|(alias, binding)| match binding {
            Binding::Table { table, inherit }
                if table.is_child_of(owner) && (*inherit || is_key) =>
            {
                Some((alias, table))
            }
            Binding::Table { table, .. } if is_key && owner.is_child_of(table) => {
                Some((alias, table))
            }
            _ => None,
        });
        let Some((alias, table)) = hits.next() else {
            return Ok(None);
        };
        if hits.next().is_some() {
            return Err(CompileError::AmbiguousTable {
                table: String::from(owner.name()),
                column: String::from(column),
            });
        }
        if is_key {
            Ok(Some(Location::direct(alias, column)))
        } else {
            Ok(Some(Location::ViaParent {
                child_alias: alias.clone(),
                child: table.clone(),
                column: String::from(column),
            }))
        }
    }

    fn find_qualified(
        &self,
        alias: &str,
        owner: &Table,
        field: &FieldRef,
    ) -> Result<Option<Location>> {
        let column = field.name();
        if let Some(redirect) = self
            .redirects
            .iter()
            .find(|r| r.from_alias == alias && r.table.same_as(owner))
        {
            return Ok(Some(Location::direct(&redirect.to_alias, column)));
        }
        match self.aliases.get(alias) {
            None => Ok(None),
            Some(Binding::Table { table, .. }) => {
                if table.same_as(owner) {
                    return Ok(Some(Location::direct(alias, column)));
                }
                let shared_key = column == owner.primary_key()
                    && (table.is_child_of(owner) || owner.is_child_of(table));
                if shared_key {
                    Ok(Some(Location::direct(alias, column)))
                } else if table.is_child_of(owner) {
                    Ok(Some(Location::ViaParent {
                        child_alias: String::from(alias),
                        child: table.clone(),
                        column: String::from(column),
                    }))
                } else {
                    Err(CompileError::unknown_column(
                        Some(alias),
                        field.qualified_name(),
                    ))
                }
            }
            Some(Binding::Derived { columns }) => {
                if columns.iter().any(|c| c == column) {
                    Ok(Some(Location::direct(alias, column)))
                } else {
                    Err(CompileError::unknown_column(Some(alias), column))
                }
            }
        }
    }

    fn find_derived(&self, alias: &str, column: &str) -> Result<Option<Location>> {
        match self.aliases.get(alias) {
            None => Ok(None),
            Some(Binding::Derived { columns }) if columns.iter().any(|c| c == column) => {
                Ok(Some(Location::direct(alias, column)))
            }
            Some(Binding::Table { table, .. }) if table.has_field(column) => {
                Ok(Some(Location::direct(alias, column)))
            }
            Some(_) => Err(CompileError::unknown_column(Some(alias), column)),
        }
    }
}

/// Where a column reference was bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// `alias.column` in the current or an outer frame.
    Direct {
        /// The alias to qualify with.
        alias: String,
        /// The column name.
        column: String,
    },
    /// A parent-owned column reached through a child table alias.
    ViaParent {
        /// The alias of the child table.
        child_alias: String,
        /// The child table.
        child: Table,
        /// The parent column name.
        column: String,
    },
}

impl Location {
    fn direct(alias: &str, column: &str) -> Self {
        Self::Direct {
            alias: String::from(alias),
            column: String::from(column),
        }
    }
}

/// Writes `alias.column`, quoting each part only when necessary.
pub fn write_column(sink: &mut SqlSink, dialect: &dyn Dialect, alias: &str, column: &str) {
    sink.word_with(|out| {
        dialect.write_identifier(alias, out);
        out.push('.');
        dialect.write_identifier(column, out);
    });
}

/// A stack of statement scopes.
#[derive(Debug, Default)]
pub struct ScopeResolver {
    frames: Vec<Frame>,
}

impl ScopeResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Number of open frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Opens a frame with a fresh clause sequence.
    pub fn push(&mut self, kind: FrameKind) {
        trace!(depth = self.frames.len() + 1, kind = kind.name(), "push scope");
        self.frames.push(Frame::new(kind, ClauseSequencer::new()));
    }

    /// Opens a query frame that continues the clause sequence of the current
    /// frame, for the operand of a set operation.
    pub fn push_operand(&mut self) -> Result<()> {
        let state = self.top()?.sequencer.state();
        trace!(depth = self.frames.len() + 1, "push operand scope");
        self.frames
            .push(Frame::new(FrameKind::Query, ClauseSequencer::resume(state)));
        Ok(())
    }

    /// Closes the current frame, returning the last clause it opened.
    pub fn pop(&mut self) -> Result<Clause> {
        let frame = self.frames.pop().ok_or_else(no_scope)?;
        trace!(depth = self.frames.len(), kind = frame.kind.name(), "pop scope");
        Ok(frame.sequencer.state())
    }

    /// Closes an operand frame and carries its clause state outward.
    pub fn pop_operand(&mut self) -> Result<()> {
        let state = self.pop()?;
        self.top_mut()?.sequencer = ClauseSequencer::resume(state);
        Ok(())
    }

    fn top(&self) -> Result<&Frame> {
        self.frames.last().ok_or_else(no_scope)
    }

    fn top_mut(&mut self) -> Result<&mut Frame> {
        self.frames.last_mut().ok_or_else(no_scope)
    }

    /// The clause most recently opened in the current frame.
    pub fn clause(&self) -> Result<Clause> {
        Ok(self.top()?.sequencer.state())
    }

    /// Opens `clause` in the current frame and writes its keyword.
    pub fn enter(&mut self, clause: Clause, sink: &mut SqlSink) -> Result<()> {
        self.top_mut()?.sequencer.enter(clause, sink)
    }

    /// Moves the current frame to `clause` without writing anything.
    pub fn transition(&mut self, clause: Clause) -> Result<()> {
        self.top_mut()?.sequencer.transition(clause)
    }

    /// Binds `alias` to `table` in the current frame.
    ///
    /// Fails with [`CompileError::DuplicateAlias`] when the alias is already
    /// bound in this frame; binding it again in a nested frame shadows it.
    pub fn register_table(&mut self, alias: &str, table: &Table) -> Result<()> {
        self.register(
            alias,
            Binding::Table {
                table: table.clone(),
                inherit: true,
            },
        )
    }

    /// Binds `alias` to `table` without exposing the parent's columns.
    pub fn register_table_only(&mut self, alias: &str, table: &Table) -> Result<()> {
        self.register(
            alias,
            Binding::Table {
                table: table.clone(),
                inherit: false,
            },
        )
    }

    /// Binds `alias` to a derived table producing `columns`.
    pub fn register_derived(&mut self, alias: &str, columns: Vec<String>) -> Result<()> {
        self.register(alias, Binding::Derived { columns })
    }

    fn register(&mut self, alias: &str, binding: Binding) -> Result<()> {
        let frame = self.top_mut()?;
        if frame.aliases.contains_key(alias) {
            return Err(CompileError::DuplicateAlias {
                alias: String::from(alias),
            });
        }
        if let Binding::Table { table, .. } = &binding {
            frame
                .tables
                .entry(String::from(table.name()))
                .and_modify(|slot| *slot = Slot::Ambiguous)
                .or_insert_with(|| Slot::Unique(String::from(alias)));
        }
        frame.aliases.insert(String::from(alias), binding);
        Ok(())
    }

    /// Reroutes references `from_alias.column` to `to_alias` for columns owned
    /// by `table`, within the current frame.
    pub fn redirect(&mut self, from_alias: &str, table: &Table, to_alias: &str) -> Result<()> {
        self.top_mut()?.redirects.push(Redirect {
            from_alias: String::from(from_alias),
            table: table.clone(),
            to_alias: String::from(to_alias),
        });
        Ok(())
    }

    /// The binding of `alias` in the current frame.
    #[must_use]
    pub fn binding(&self, alias: &str) -> Option<&Binding> {
        self.frames.last().and_then(|f| f.aliases.get(alias))
    }

    /// Binds a column reference to an alias in scope.
    ///
    /// With an alias, the alias must be registered to the table owning the
    /// column (or to a child of it). Without one, the owning table must be
    /// registered exactly once. Unbound references are delegated outward.
    pub fn locate(&self, alias: Option<&str>, field: &FieldRef) -> Result<Location> {
        let owner = field.owner().map_err(|err| match (err, alias) {
            (CompileError::UnknownColumn { column, .. }, Some(a)) => {
                CompileError::unknown_column(Some(a), column)
            }
            (err, _) => err,
        })?;
        let column = field.name();
        self.search(
            column,
            || CompileError::unknown_column(alias, format!("{}.{column}", owner.name())),
            |frame| match alias {
                None => frame.find_unqualified(&owner, column),
                Some(a) => frame.find_qualified(a, &owner, field),
            },
        )
    }

    /// Binds a column of a derived table.
    pub fn locate_derived(&self, alias: &str, column: &str) -> Result<Location> {
        self.search(
            column,
            || CompileError::unknown_column(Some(alias), column),
            |frame| frame.find_derived(alias, column),
        )
    }

    fn search(
        &self,
        column: &str,
        unknown: impl Fn() -> CompileError,
        find: impl Fn(&Frame) -> Result<Option<Location>>,
    ) -> Result<Location> {
        for (index, frame) in self.frames.iter().enumerate().rev() {
            if let Some(location) = find(frame)? {
                return Ok(location);
            }
            if !frame.kind.allows_correlation() {
                let reachable = self.frames[..index]
                    .iter()
                    .any(|outer| matches!(find(outer), Ok(Some(_))));
                if reachable {
                    return Err(CompileError::CorrelationForbidden {
                        column: String::from(column),
                        scope: frame.kind.name(),
                    });
                }
                return Err(unknown());
            }
        }
        Err(unknown())
    }

    /// Resolves a column reference and writes ` alias.column`.
    ///
    /// A parent column reached through a child alias is not written; the
    /// returned [`Location::ViaParent`] tells the caller to emit the
    /// cross-table lookup instead.
    pub fn resolve_field(
        &self,
        alias: Option<&str>,
        field: &FieldRef,
        sink: &mut SqlSink,
        dialect: &dyn Dialect,
    ) -> Result<Location> {
        let location = self.locate(alias, field)?;
        if let Location::Direct { alias, column } = &location {
            write_column(sink, dialect, alias, column);
        }
        Ok(location)
    }

    /// Resolves a column reference and writes only the column name, for
    /// clauses that reject qualified names.
    pub fn resolve_field_only(
        &self,
        field: &FieldRef,
        sink: &mut SqlSink,
        dialect: &dyn Dialect,
    ) -> Result<()> {
        match self.locate(None, field)? {
            Location::Direct { column, .. } => {
                sink.word_with(|out| dialect.write_identifier(&column, out));
                Ok(())
            }
            Location::ViaParent { child_alias, .. } => Err(CompileError::unknown_column(
                Some(&child_alias),
                field.qualified_name(),
            )),
        }
    }
}

fn no_scope() -> CompileError {
    CompileError::InvalidStatement(String::from("no open scope"))
}

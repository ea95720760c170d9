//! Table metadata.
//!
//! Metadata is built once and shared read-only through [`Table`] handles
//! (cheap `Arc` clones). A table is either *single* or a *child* of exactly
//! one parent table: the parent stores the shared and managed columns, the
//! child stores extension columns, and both share the primary key column.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{CompileError, Result};

/// Columns whose lifecycle is controlled by the compiler instead of callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedColumn {
    /// Optimistic-lock version counter.
    Version,
    /// Creation timestamp.
    CreateTime,
    /// Last-update timestamp.
    UpdateTime,
    /// Soft-delete visibility flag.
    Visible,
}

/// Metadata of a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Column name.
    pub name: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Whether the database generates the value (identity / autoincrement).
    pub generated: bool,
    /// Managed role, if any.
    pub managed: Option<ManagedColumn>,
}

/// Whether a table is vertically split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// A table without a parent.
    Single,
    /// A child table whose rows have a 1:1 parent row.
    Child,
}

/// Metadata of a logical table.
#[derive(Debug)]
pub struct TableMeta {
    name: String,
    primary_key: String,
    fields: Vec<FieldMeta>,
    parent: Option<Table>,
}

impl TableMeta {
    /// The logical table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The primary key column name.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Columns owned by this table, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// The parent table of a child table.
    #[must_use]
    pub const fn parent(&self) -> Option<&Table> {
        self.parent.as_ref()
    }

    /// Returns the table kind.
    #[must_use]
    pub const fn kind(&self) -> TableKind {
        if self.parent.is_some() {
            TableKind::Child
        } else {
            TableKind::Single
        }
    }

    /// Returns true for child tables.
    #[must_use]
    pub const fn is_child(&self) -> bool {
        self.parent.is_some()
    }

    /// Looks up a column owned by this table.
    #[must_use]
    pub fn field_meta(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true when this table owns the column.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field_meta(name).is_some()
    }

    /// The column playing a managed role.
    #[must_use]
    pub fn managed(&self, kind: ManagedColumn) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.managed == Some(kind))
    }

    /// Returns true when the primary key is database-generated.
    #[must_use]
    pub fn generated_key(&self) -> bool {
        self.field_meta(&self.primary_key).is_some_and(|f| f.generated)
    }
}

/// A shared handle to table metadata.
#[derive(Clone)]
pub struct Table(Arc<TableMeta>);

impl Table {
    /// Starts building a table.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder::new(name)
    }

    /// Creates a reference to a column of this table or of its parent.
    ///
    /// The column is not checked here; compiling a statement that uses an
    /// unknown column fails with [`CompileError::UnknownColumn`].
    #[must_use]
    pub fn field(&self, name: &str) -> FieldRef {
        FieldRef {
            table: self.clone(),
            name: String::from(name),
        }
    }

    /// Returns true when both handles denote the same logical table.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }

    /// Returns true when `other` is this table's parent.
    #[must_use]
    pub fn is_child_of(&self, other: &Self) -> bool {
        self.0.parent.as_ref().is_some_and(|p| p.same_as(other))
    }
}

impl Deref for Table {
    type Target = TableMeta;

    fn deref(&self) -> &TableMeta {
        &self.0
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Table").field(&self.0.name).finish()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

/// A column reference through a table handle.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    table: Table,
    name: String,
}

impl FieldRef {
    /// The table handle the reference was created from.
    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }

    /// The column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table that physically stores the column.
    ///
    /// A reference made through a child handle may land on the parent; a
    /// column found in neither is an [`CompileError::UnknownColumn`].
    pub fn owner(&self) -> Result<Table> {
        if self.table.has_field(&self.name) {
            return Ok(self.table.clone());
        }
        match self.table.parent() {
            Some(parent) if parent.has_field(&self.name) => Ok(parent.clone()),
            _ => Err(CompileError::unknown_column(
                None,
                format!("{}.{}", self.table.name(), self.name),
            )),
        }
    }

    /// Metadata of the column in its owning table.
    pub fn meta(&self) -> Result<FieldMeta> {
        let owner = self.owner()?;
        owner
            .field_meta(&self.name)
            .cloned()
            .ok_or_else(|| CompileError::unknown_column(None, self.qualified_name()))
    }

    /// Returns true when the column is the optimistic-lock version.
    #[must_use]
    pub fn is_version(&self) -> bool {
        self.meta()
            .is_ok_and(|m| m.managed == Some(ManagedColumn::Version))
    }

    /// `table.column`, for diagnostics.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table.name(), self.name)
    }
}

/// Builder for [`Table`].
#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    primary_key: Option<String>,
    fields: Vec<FieldMeta>,
    parent: Option<Table>,
}

impl TableBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            fields: Vec::new(),
            parent: None,
        }
    }

    fn push(mut self, name: &str, nullable: bool, generated: bool, managed: Option<ManagedColumn>) -> Self {
        self.fields.push(FieldMeta {
            name: String::from(name),
            nullable,
            generated,
            managed,
        });
        self
    }

    /// Declares the primary key column (caller-supplied values).
    #[must_use]
    pub fn primary_key(mut self, name: &str) -> Self {
        self.primary_key = Some(String::from(name));
        self.push(name, false, false, None)
    }

    /// Declares a database-generated primary key column.
    #[must_use]
    pub fn generated_key(mut self, name: &str) -> Self {
        self.primary_key = Some(String::from(name));
        self.push(name, false, true, None)
    }

    /// Declares a NOT NULL column.
    #[must_use]
    pub fn column(self, name: &str) -> Self {
        self.push(name, false, false, None)
    }

    /// Declares a nullable column.
    #[must_use]
    pub fn nullable(self, name: &str) -> Self {
        self.push(name, true, false, None)
    }

    /// Declares a managed column.
    #[must_use]
    pub fn managed(self, kind: ManagedColumn, name: &str) -> Self {
        self.push(name, false, false, Some(kind))
    }

    /// Makes this table the child of `parent`.
    ///
    /// The child shares the parent's primary key column; it is added
    /// automatically when not declared explicitly.
    #[must_use]
    pub fn child_of(mut self, parent: &Table) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Finishes the table.
    #[must_use]
    pub fn build(mut self) -> Table {
        let primary_key = match (&self.primary_key, &self.parent) {
            (Some(pk), _) => pk.clone(),
            (None, Some(parent)) => String::from(parent.primary_key()),
            (None, None) => String::from("id"),
        };
        if !self.fields.iter().any(|f| f.name == primary_key) {
            self.fields.insert(
                0,
                FieldMeta {
                    name: primary_key.clone(),
                    nullable: false,
                    generated: false,
                    managed: None,
                },
            );
        }
        Table(Arc::new(TableMeta {
            name: self.name,
            primary_key,
            fields: self.fields,
            parent: self.parent,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_tables() -> (Table, Table) {
        let base = Table::builder("order_base")
            .generated_key("id")
            .column("create_time")
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

    #[test]
    fn test_child_shares_parent_key() {
        let (base, order) = order_tables();
        assert_eq!(order.primary_key(), "id");
        assert!(order.has_field("id"));
        assert_eq!(order.kind(), TableKind::Child);
        assert_eq!(base.kind(), TableKind::Single);
        assert!(order.is_child_of(&base));
        assert!(base.generated_key());
        assert!(!order.generated_key());
    }

    #[test]
    fn test_owner_resolution() {
        let (base, order) = order_tables();
        assert_eq!(order.field("status").owner().unwrap(), order);
        assert_eq!(order.field("version").owner().unwrap(), base);
        assert_eq!(order.field("id").owner().unwrap(), order);
        assert!(matches!(
            order.field("colour").owner(),
            Err(CompileError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_version_detection() {
        let (base, order) = order_tables();
        assert!(order.field("version").is_version());
        assert!(base.field("version").is_version());
        assert!(!order.field("status").is_version());
        assert_eq!(
            base.managed(ManagedColumn::Visible).map(|f| f.name.as_str()),
            Some("visible")
        );
    }
}

//! Compiler configuration.
//!
//! Loaded from JSON once per target database; the resulting
//! [`SqlCompiler`](crate::SqlCompiler) is immutable.

use serde::Deserialize;

use crate::ast::Visibility;
use crate::dialect::DialectKind;
use crate::error::Result;
use crate::router::RoutingConfig;

/// Configuration of a [`SqlCompiler`](crate::SqlCompiler).
///
/// ```
/// use sqlweave_core::config::CompilerConfig;
/// use sqlweave_core::dialect::DialectKind;
///
/// let config = CompilerConfig::from_json(r#"{"dialect": "postgres"}"#).unwrap();
/// assert_eq!(config.dialect, DialectKind::Postgres);
/// assert!(config.auto_update_time);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Target dialect.
    pub dialect: DialectKind,
    /// Default soft-delete filter.
    pub visibility: Visibility,
    /// Set the update-time column on UPDATE unless assigned explicitly.
    pub auto_update_time: bool,
    /// Fill missing managed columns on INSERT.
    pub fill_managed_on_insert: bool,
    /// Prefix of synthesized parent-table aliases.
    pub parent_alias_prefix: String,
    /// Prefix of synthesized child-table aliases.
    pub child_alias_prefix: String,
    /// Horizontal routing rules.
    pub routing: RoutingConfig,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        let options = CompileOptions::default();
        Self {
            dialect: DialectKind::default(),
            visibility: options.visibility,
            auto_update_time: options.auto_update_time,
            fill_managed_on_insert: options.fill_managed_on_insert,
            parent_alias_prefix: options.parent_alias_prefix,
            child_alias_prefix: options.child_alias_prefix,
            routing: RoutingConfig::default(),
        }
    }
}

impl CompilerConfig {
    /// Parses a JSON configuration; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The statement-level options of this configuration.
    #[must_use]
    pub fn options(&self) -> CompileOptions {
        CompileOptions {
            visibility: self.visibility,
            auto_update_time: self.auto_update_time,
            fill_managed_on_insert: self.fill_managed_on_insert,
            parent_alias_prefix: self.parent_alias_prefix.clone(),
            child_alias_prefix: self.child_alias_prefix.clone(),
        }
    }
}

/// Options consulted while compiling a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Default soft-delete filter.
    pub visibility: Visibility,
    /// Set the update-time column on UPDATE unless assigned explicitly.
    pub auto_update_time: bool,
    /// Fill missing managed columns on INSERT.
    pub fill_managed_on_insert: bool,
    /// Prefix of synthesized parent-table aliases.
    pub parent_alias_prefix: String,
    /// Prefix of synthesized child-table aliases.
    pub child_alias_prefix: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            visibility: Visibility::OnlyVisible,
            auto_update_time: true,
            fill_managed_on_insert: true,
            parent_alias_prefix: String::from("p_"),
            child_alias_prefix: String::from("c_"),
        }
    }
}

impl CompileOptions {
    /// Alias of the parent row looked up for `child_alias`.
    #[must_use]
    pub fn parent_alias(&self, child_alias: &str) -> String {
        format!("{}{child_alias}", self.parent_alias_prefix)
    }

    /// Alias of the child row looked up for `parent_alias`.
    #[must_use]
    pub fn child_alias(&self, parent_alias: &str) -> String {
        format!("{}{parent_alias}", self.child_alias_prefix)
    }
}

//! Schema conventions: primary keys, references, aliases and required columns.
//!
//! Every lookup falls back to a naming convention when no explicit hint is
//! stored, so a schema that follows the conventions needs no configuration:
//!
//! | Lookup | Default |
//! |--------|---------|
//! | primary key of `t` | `id` |
//! | reference key for relation `r` on `t` | `r_id` |
//! | back-reference key for relation `r` from `t` | `t_id` |
//! | alias `a` | `a` |
//! | sequence of `t` | `<rewritten t>_<primary>_seq` |

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Suffix marking a plural (one-to-many) relation name, as in `postList`.
pub const LIST_SUFFIX: &str = "List";

/// Split a relation name into its singular form and whether it was plural.
///
/// ```
/// use lessql::conventions::split_relation;
///
/// assert_eq!(split_relation("categorizationList"), ("categorization", true));
/// assert_eq!(split_relation("author"), ("author", false));
/// ```
pub fn split_relation(name: &str) -> (&str, bool) {
    match name.strip_suffix(LIST_SUFFIX) {
        Some(singular) => (singular, true),
        None => (name, false),
    }
}

/// Primary key of a table: one column or an ordered list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    Compound(Vec<String>),
}

impl PrimaryKey {
    /// The key columns in declaration order.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            PrimaryKey::Single(column) => vec![column.as_str()],
            PrimaryKey::Compound(columns) => columns.iter().map(String::as_str).collect(),
        }
    }

    /// The column of a single-column key.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            PrimaryKey::Single(column) => Some(column),
            PrimaryKey::Compound(_) => None,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, PrimaryKey::Compound(_))
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Single(column) => f.write_str(column),
            PrimaryKey::Compound(columns) => write!(f, "({})", columns.join(", ")),
        }
    }
}

impl From<&str> for PrimaryKey {
    fn from(column: &str) -> Self {
        PrimaryKey::Single(column.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(column: String) -> Self {
        PrimaryKey::Single(column)
    }
}

impl From<Vec<String>> for PrimaryKey {
    fn from(columns: Vec<String>) -> Self {
        PrimaryKey::Compound(columns)
    }
}

impl<const N: usize> From<[&str; N]> for PrimaryKey {
    fn from(columns: [&str; N]) -> Self {
        PrimaryKey::Compound(columns.iter().map(|c| (*c).to_string()).collect())
    }
}

/// Table-name rewrite hook, applied right before SQL is emitted.
pub type RewriteFn = Rc<dyn Fn(&str) -> String>;

/// Schema hints in a form that can be loaded from a configuration file.
///
/// ```
/// use lessql::conventions::{Conventions, PrimaryKey, SchemaHints};
///
/// let hints: SchemaHints = serde_json::from_str(r#"{
///     "aliases": { "author": "user", "editor": "user" },
///     "primary": { "categorization": ["category_id", "post_id"] },
///     "back_references": { "user": { "edit_post": "editor_id" } }
/// }"#).unwrap();
///
/// let conventions = Conventions::from_hints(hints);
/// assert_eq!(conventions.alias("editor"), "user");
/// assert!(conventions.is_required("categorization", "post_id"));
/// assert_eq!(conventions.primary("post"), PrimaryKey::from("id"));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaHints {
    /// alias → table
    pub aliases: IndexMap<String, String>,
    /// table → primary key
    pub primary: IndexMap<String, PrimaryKey>,
    /// table → relation name → reference key
    pub references: IndexMap<String, IndexMap<String, String>>,
    /// table → relation name → back-reference key
    pub back_references: IndexMap<String, IndexMap<String, String>>,
    /// table → required columns
    pub required: IndexMap<String, Vec<String>>,
    /// table → sequence name
    pub sequences: IndexMap<String, String>,
}

/// Registry of schema hints with convention-based defaults.
///
/// Owned by a [`Database`](crate::Database); there is no process-wide state.
#[derive(Clone, Default)]
pub struct Conventions {
    aliases: HashMap<String, String>,
    primary: HashMap<String, PrimaryKey>,
    references: HashMap<String, HashMap<String, String>>,
    back_references: HashMap<String, HashMap<String, String>>,
    required: HashMap<String, IndexSet<String>>,
    sequences: HashMap<String, String>,
    rewrite: Option<RewriteFn>,
}

impl Conventions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from deserialized hints.
    pub fn from_hints(hints: SchemaHints) -> Self {
        let mut conventions = Self::new();
        for (alias, table) in hints.aliases {
            conventions.set_alias(alias, table);
        }
        for (table, key) in hints.primary {
            conventions.set_primary(table, key);
        }
        for (table, names) in hints.references {
            for (name, key) in names {
                conventions.set_reference(&table, name, key);
            }
        }
        for (table, names) in hints.back_references {
            for (name, key) in names {
                conventions.set_back_reference(&table, name, key);
            }
        }
        for (table, columns) in hints.required {
            for column in columns {
                conventions.set_required(&table, column);
            }
        }
        for (table, sequence) in hints.sequences {
            conventions.set_sequence(table, sequence);
        }
        conventions
    }

    pub fn primary(&self, table: &str) -> PrimaryKey {
        self.primary
            .get(table)
            .cloned()
            .unwrap_or_else(|| PrimaryKey::from("id"))
    }

    /// Set the primary key of a table. Compound key columns become required,
    /// as they are never generated by the database.
    pub fn set_primary(&mut self, table: impl Into<String>, key: impl Into<PrimaryKey>) -> &mut Self {
        let table = table.into();
        let key = key.into();
        if let PrimaryKey::Compound(columns) = &key {
            for column in columns {
                self.set_required(&table, column.clone());
            }
        }
        self.primary.insert(table, key);
        self
    }

    /// Column on `table` referencing the row named by relation `name`.
    pub fn reference(&self, table: &str, name: &str) -> String {
        self.references
            .get(table)
            .and_then(|names| names.get(name))
            .cloned()
            .unwrap_or_else(|| format!("{name}_id"))
    }

    pub fn set_reference(
        &mut self,
        table: &str,
        name: impl Into<String>,
        key: impl Into<String>,
    ) -> &mut Self {
        self.references
            .entry(table.to_string())
            .or_default()
            .insert(name.into(), key.into());
        self
    }

    /// Column on the rows of relation `name` pointing back at `table`.
    pub fn back_reference(&self, table: &str, name: &str) -> String {
        self.back_references
            .get(table)
            .and_then(|names| names.get(name))
            .cloned()
            .unwrap_or_else(|| format!("{table}_id"))
    }

    pub fn set_back_reference(
        &mut self,
        table: &str,
        name: impl Into<String>,
        key: impl Into<String>,
    ) -> &mut Self {
        self.back_references
            .entry(table.to_string())
            .or_default()
            .insert(name.into(), key.into());
        self
    }

    /// Resolve an alias to its table; unknown names resolve to themselves.
    pub fn alias(&self, alias: &str) -> String {
        self.aliases
            .get(alias)
            .cloned()
            .unwrap_or_else(|| alias.to_string())
    }

    pub fn set_alias(&mut self, alias: impl Into<String>, table: impl Into<String>) -> &mut Self {
        self.aliases.insert(alias.into(), table.into());
        self
    }

    pub fn is_required(&self, table: &str, column: &str) -> bool {
        self.required
            .get(table)
            .is_some_and(|columns| columns.contains(column))
    }

    /// Required columns of a table, in the order they were declared.
    pub fn required(&self, table: &str) -> Vec<String> {
        self.required
            .get(table)
            .map(|columns| columns.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn set_required(&mut self, table: &str, column: impl Into<String>) -> &mut Self {
        self.required
            .entry(table.to_string())
            .or_default()
            .insert(column.into());
        self
    }

    /// Sequence consulted for the last inserted id; `None` for compound keys.
    pub fn sequence(&self, table: &str) -> Option<String> {
        if let Some(sequence) = self.sequences.get(table) {
            return Some(sequence.clone());
        }
        let primary = self.primary(table);
        let column = primary.as_single()?;
        Some(format!("{}_{}_seq", self.rewrite_table(table), column))
    }

    pub fn set_sequence(&mut self, table: impl Into<String>, sequence: impl Into<String>) -> &mut Self {
        self.sequences.insert(table.into(), sequence.into());
        self
    }

    /// Apply the rewrite hook to a table name.
    pub fn rewrite_table(&self, table: &str) -> String {
        match &self.rewrite {
            Some(rewrite) => rewrite(table),
            None => table.to_string(),
        }
    }

    pub fn set_rewrite(&mut self, rewrite: impl Fn(&str) -> String + 'static) -> &mut Self {
        self.rewrite = Some(Rc::new(rewrite));
        self
    }

    pub fn clear_rewrite(&mut self) -> &mut Self {
        self.rewrite = None;
        self
    }

    pub(crate) fn rewrite_fn(&self) -> Option<RewriteFn> {
        self.rewrite.clone()
    }
}

impl fmt::Debug for Conventions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conventions")
            .field("aliases", &self.aliases)
            .field("primary", &self.primary)
            .field("references", &self.references)
            .field("back_references", &self.back_references)
            .field("required", &self.required)
            .field("sequences", &self.sequences)
            .field("rewrite", &self.rewrite.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

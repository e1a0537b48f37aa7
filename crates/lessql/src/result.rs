//! Lazy results: immutable query shapes resolved on first access.
//!
//! A root result selects from a table. A related result is derived from a
//! parent (a result or a row) and a relation name; when it resolves it
//! fetches the rows for *every* row its parent's root query loaded, in one
//! statement, and filters them down to the rows belonging to its own
//! parent. The fetched rows are cached at the root under the query's
//! definition, so sibling traversals share one fetch:
//!
//! ```text
//! posts                      SELECT * FROM `post`
//!   post.related("author")   SELECT * FROM `user` WHERE `id` IN ( '2', '1' )
//!   (every other post)       (cache hit)
//! ```
//!
//! Builder methods never modify a result; they return a new one.

#![allow(clippy::result_large_err)] // Error type is defined in lessql-core

use crate::conventions::split_relation;
use crate::database::Database;
use crate::row::{Row, RowId, WeakRow};
use indexmap::IndexSet;
use lessql_core::{Error, LogicErrorKind, Param, Result, Value, Values};
use lessql_query::{Data, Direction, InsertMethod, Limit, OrderBy, QueryCache, Select};
use regex::Regex;
use serde::ser::{Error as _, Serialize, SerializeSeq, Serializer};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::OnceLock;

/// Rows fetched by one query, shared between the cache and results.
pub(crate) type RowSet = Rc<Vec<Row>>;

/// Cache of fetched row sets, owned by a root result or an unbound row.
pub(crate) type RowCache = QueryCache<RowSet>;

/// Whether a relation yields one row per parent row or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Many-to-one: the parent holds the reference key (`post.author`).
    Singular,
    /// One-to-many, named with a `List` suffix: the related rows hold the
    /// back-reference key (`user.postList`).
    Plural,
}

/// The source a related result is derived from.
#[derive(Debug, Clone)]
pub enum Parent {
    Result(LazyResult),
    Row(Row),
}

impl Parent {
    fn database(&self) -> Database {
        match self {
            Parent::Result(result) => result.database().clone(),
            Parent::Row(row) => row.database(),
        }
    }

    fn table(&self) -> String {
        match self {
            Parent::Result(result) => result.table().to_string(),
            Parent::Row(row) => row.table(),
        }
    }

    fn local_keys(&self, key: &str) -> Result<Vec<Value>> {
        match self {
            Parent::Result(result) => result.local_keys(key),
            Parent::Row(row) => Ok(row.local_keys(key)),
        }
    }

    fn global_keys(&self, key: &str) -> Result<Vec<Value>> {
        match self {
            Parent::Result(result) => result.global_keys(key),
            Parent::Row(row) => row.global_keys(key),
        }
    }

    fn cache_root(&self) -> CacheRoot {
        match self {
            Parent::Result(result) => result.cache_root(),
            Parent::Row(row) => row.cache_root(),
        }
    }
}

impl From<LazyResult> for Parent {
    fn from(result: LazyResult) -> Self {
        Parent::Result(result)
    }
}

impl From<&LazyResult> for Parent {
    fn from(result: &LazyResult) -> Self {
        Parent::Result(result.clone())
    }
}

impl From<Row> for Parent {
    fn from(row: Row) -> Self {
        Parent::Row(row)
    }
}

impl From<&Row> for Parent {
    fn from(row: &Row) -> Self {
        Parent::Row(row.clone())
    }
}

/// Owner of the row cache a result tree shares.
pub(crate) enum CacheRoot {
    Result(LazyResult),
    Row(Row),
}

impl CacheRoot {
    fn get(&self, definition: &str) -> Option<RowSet> {
        match self {
            CacheRoot::Result(result) => result.inner.cache.borrow().get(definition),
            CacheRoot::Row(row) => row.cached(definition),
        }
    }

    fn insert(&self, definition: String, rows: RowSet) {
        match self {
            CacheRoot::Result(result) => result.inner.cache.borrow_mut().insert(definition, rows),
            CacheRoot::Row(row) => row.store_cached(definition, rows),
        }
    }

    fn downgrade(&self) -> WeakCacheRoot {
        match self {
            CacheRoot::Result(result) => WeakCacheRoot::Result(result.downgrade()),
            CacheRoot::Row(row) => WeakCacheRoot::Row(row.downgrade()),
        }
    }
}

enum WeakCacheRoot {
    Result(Weak<ResultInner>),
    Row(WeakRow),
}

impl WeakCacheRoot {
    fn upgrade(&self) -> Option<CacheRoot> {
        match self {
            WeakCacheRoot::Result(inner) => LazyResult::upgrade(inner).map(CacheRoot::Result),
            WeakCacheRoot::Row(row) => row.upgrade().map(CacheRoot::Row),
        }
    }
}

/// Where a set of fetched rows came from, shared by every row in the set.
///
/// The set itself is owned by the root cache, so both links stay valid for
/// as long as the cache owner lives, no matter which result fetched the set
/// or which results later reused it.
pub(crate) struct Origin {
    rows: Weak<Vec<Row>>,
    root: WeakCacheRoot,
}

impl Origin {
    /// Every row of the fetch this row belongs to.
    pub(crate) fn rows(&self) -> Option<RowSet> {
        self.rows.upgrade()
    }

    pub(crate) fn root(&self) -> Option<CacheRoot> {
        self.root.upgrade()
    }
}

#[derive(Debug, Clone)]
struct Scope {
    parent: Parent,
    kind: RelationKind,
    /// Column on this result's rows matched against the parent.
    key: String,
    /// Column on the parent's rows.
    parent_key: String,
}

struct Resolved {
    global: RowSet,
    local: RowSet,
}

impl Resolved {
    fn rows(&self, which: Rows) -> RowSet {
        match which {
            Rows::Global => Rc::clone(&self.global),
            Rows::Local => Rc::clone(&self.local),
        }
    }
}

#[derive(Clone, Copy)]
enum Rows {
    /// Everything the effective query fetched.
    Global,
    /// The rows belonging to this result's parent.
    Local,
}

pub(crate) struct ResultInner {
    db: Database,
    select: Select,
    scope: Option<Scope>,
    resolved: RefCell<Option<Resolved>>,
    cursor: Cell<usize>,
    cache: RefCell<RowCache>,
}

/// A lazily resolved query over one table.
///
/// Cloning a `LazyResult` shares its resolved rows and cursor; builder
/// methods return a fresh, unresolved result.
///
/// Fetched rows remember the row set they were fetched in, which lives in
/// the root result's cache: keep the root result alive while traversing
/// relations of its rows, or the rows fall back to resolving relations on
/// their own.
#[derive(Clone)]
pub struct LazyResult {
    inner: Rc<ResultInner>,
}

fn column_shortcut() -> Option<&'static Regex> {
    static SHORTCUT: OnceLock<Option<Regex>> = OnceLock::new();
    SHORTCUT
        .get_or_init(|| match Regex::new(r#"(?i)^[a-z0-9_.`"]+$"#) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(error = %e, "Invalid column shortcut pattern");
                None
            }
        })
        .as_ref()
}

impl LazyResult {
    pub(crate) fn for_table(db: Database, table: String) -> Self {
        Self::from_parts(db, Select::new(table), None)
    }

    fn from_parts(db: Database, select: Select, scope: Option<Scope>) -> Self {
        Self {
            inner: Rc::new(ResultInner {
                db,
                select,
                scope,
                resolved: RefCell::new(None),
                cursor: Cell::new(0),
                cache: RefCell::new(RowCache::new()),
            }),
        }
    }

    /// Derive a related result from a parent result or row.
    ///
    /// A name ending in `List` is a plural relation: the related rows hold
    /// the back-reference key pointing at the parent's primary key.
    /// Otherwise the relation is singular: the parent holds the reference
    /// key pointing at the related table's primary key. Aliases resolve the
    /// table (`author` → `user`).
    pub fn related(parent: impl Into<Parent>, name: &str) -> Self {
        let parent = parent.into();
        let db = parent.database();
        let parent_table = parent.table();
        let (singular, plural) = split_relation(name);

        let (table, kind, key, parent_key) = {
            let conventions = db.conventions();
            let table = conventions.alias(singular);
            if plural {
                let key = conventions.back_reference(&parent_table, singular);
                let parent_key = join_column(&conventions.primary(&parent_table), &parent_table);
                (table, RelationKind::Plural, key, parent_key)
            } else {
                let key = join_column(&conventions.primary(&table), &table);
                let parent_key = conventions.reference(&parent_table, singular);
                (table, RelationKind::Singular, key, parent_key)
            }
        };

        tracing::trace!(
            parent = %parent_table,
            relation = name,
            table = %table,
            key = %key,
            parent_key = %parent_key,
            "Derived related result"
        );

        let scope = Scope {
            parent,
            kind,
            key,
            parent_key,
        };
        Self::from_parts(db, Select::new(table), Some(scope))
    }

    /// A result related to this one, e.g. `posts.related_to("author")`.
    pub fn related_to(&self, name: &str) -> Self {
        Self::related(self, name)
    }

    /// Override the join column: the parent's column for a singular
    /// relation, the related rows' column for a plural one.
    pub fn via(&self, key: &str) -> Result<Self> {
        let Some(scope) = &self.inner.scope else {
            return Err(Error::logic(
                LogicErrorKind::ScopeViolation,
                format!("Cannot set reference key on root result of \"{}\"", self.table()),
            ));
        };
        let mut scope = scope.clone();
        match scope.kind {
            RelationKind::Singular => scope.parent_key = key.to_string(),
            RelationKind::Plural => scope.key = key.to_string(),
        }
        Ok(Self::from_parts(
            self.inner.db.clone(),
            self.inner.select.clone(),
            Some(scope),
        ))
    }

    fn derive(&self, select: Select) -> Self {
        Self::from_parts(self.inner.db.clone(), select, self.inner.scope.clone())
    }

    // ---- builders ----

    /// Add select expressions; `SELECT *` until the first call.
    pub fn select<I, S>(&self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derive(self.inner.select.clone().columns(exprs))
    }

    /// Add a condition.
    ///
    /// A bare column name (letters, digits, `_`, `.` and quotes) is
    /// shorthand for [`where_is`](Self::where_is) with the parameter values;
    /// anything else is a raw SQL fragment with positional or named
    /// parameters.
    ///
    /// ```
    /// # use lessql::Database;
    /// # use lessql_sqlite::SqliteConnection;
    /// # let db = Database::new(SqliteConnection::open_memory().unwrap());
    /// let by_column = db.table("post").where_("author_id", [1, 2]);
    /// let raw = db.table("post").where_("id > ?", [10]);
    /// ```
    pub fn where_<P, I>(&self, condition: &str, params: I) -> Self
    where
        P: Into<Param>,
        I: IntoIterator<Item = P>,
    {
        let params: Vec<Param> = params.into_iter().map(Into::into).collect();
        if column_shortcut().is_some_and(|re| re.is_match(condition)) {
            let mut values: Vec<Value> = params.iter().map(|p| p.value().clone()).collect();
            let values = if values.len() == 1 {
                Values::One(values.remove(0))
            } else {
                Values::List(values)
            };
            return self.where_is(condition, values);
        }
        self.where_sql(condition, params)
    }

    /// Add a raw SQL condition with bound parameters.
    pub fn where_sql<P, I>(&self, condition: &str, params: I) -> Self
    where
        P: Into<Param>,
        I: IntoIterator<Item = P>,
    {
        let select = self
            .inner
            .select
            .clone()
            .filter(condition)
            .bind(params.into_iter().map(Into::into));
        self.derive(select)
    }

    /// `column` equals `value`, or is in the list; NULL becomes `IS NULL`.
    pub fn where_is(&self, column: &str, values: impl Into<Values>) -> Self {
        let condition = self.inner.db.is(column, values);
        self.derive(self.inner.select.clone().filter(condition))
    }

    /// One [`where_is`](Self::where_is) per pair.
    pub fn where_all<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Values>,
    {
        let mut select = self.inner.select.clone();
        for (column, values) in pairs {
            select = select.filter(self.inner.db.is(column.as_ref(), values));
        }
        self.derive(select)
    }

    /// `column` is not `value` and not in the list.
    pub fn where_not(&self, column: &str, values: impl Into<Values>) -> Self {
        let condition = self.inner.db.is_not(column, values);
        self.derive(self.inner.select.clone().filter(condition))
    }

    pub fn where_not_all<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Values>,
    {
        let mut select = self.inner.select.clone();
        for (column, values) in pairs {
            select = select.filter(self.inner.db.is_not(column.as_ref(), values));
        }
        self.derive(select)
    }

    pub fn order_by(&self, column: &str, direction: Direction) -> Self {
        self.derive(
            self.inner
                .select
                .clone()
                .order_by(OrderBy::new(column, direction)),
        )
    }

    /// Limit the rows fetched. Related results cannot be limited, since one
    /// fetch serves every parent row.
    pub fn limit(&self, count: u64, offset: Option<u64>) -> Result<Self> {
        self.with_limit(Limit::new(count, offset))
    }

    /// Page `page` (1-based) of `size` rows.
    pub fn paged(&self, size: u64, page: u64) -> Result<Self> {
        self.with_limit(Limit::page(size, page))
    }

    fn with_limit(&self, limit: Limit) -> Result<Self> {
        if self.inner.scope.is_some() {
            return Err(Error::logic(
                LogicErrorKind::ScopeViolation,
                format!("Cannot limit related result of \"{}\"", self.table()),
            ));
        }
        Ok(self.derive(self.inner.select.clone().limit(limit)))
    }

    // ---- accessors ----

    pub fn database(&self) -> &Database {
        &self.inner.db
    }

    pub fn table(&self) -> &str {
        self.inner.select.table()
    }

    /// The query shape, without any parent restriction.
    pub fn query(&self) -> &Select {
        &self.inner.select
    }

    pub fn is_related(&self) -> bool {
        self.inner.scope.is_some()
    }

    pub fn relation_kind(&self) -> Option<RelationKind> {
        self.inner.scope.as_ref().map(|s| s.kind)
    }

    /// Column on this result's rows used to join the parent.
    pub fn local_key(&self) -> Option<&str> {
        self.inner.scope.as_ref().map(|s| s.key.as_str())
    }

    /// Column on the parent's rows used to join this result.
    pub fn parent_key(&self) -> Option<&str> {
        self.inner.scope.as_ref().map(|s| s.parent_key.as_str())
    }

    pub fn parent(&self) -> Option<&Parent> {
        self.inner.scope.as_ref().map(|s| &s.parent)
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.borrow().is_some()
    }

    pub(crate) fn downgrade(&self) -> Weak<ResultInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<ResultInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn cache_root(&self) -> CacheRoot {
        match &self.inner.scope {
            Some(scope) => scope.parent.cache_root(),
            None => CacheRoot::Result(self.clone()),
        }
    }

    /// The effective query: this shape plus, for a related result, the
    /// restriction to keys the parent's root query loaded.
    fn effective_select(&self) -> Result<Select> {
        let select = self.inner.select.clone();
        match &self.inner.scope {
            None => Ok(select),
            Some(scope) => {
                let keys = scope.parent.global_keys(&scope.parent_key)?;
                Ok(select.filter(self.inner.db.is(&scope.key, Values::List(keys))))
            }
        }
    }

    /// Canonical definition of the effective query; results with equal
    /// definitions share one fetch within a root.
    pub fn definition(&self) -> Result<String> {
        Ok(self.effective_select()?.definition())
    }

    // ---- resolution ----

    /// Resolve this result. Idempotent: later calls do nothing.
    pub fn execute(&self) -> Result<()> {
        self.rows(Rows::Local).map(|_| ())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(table = %self.table()))]
    fn resolve(&self) -> Result<Resolved> {
        let select = self.effective_select()?;
        let definition = select.definition();
        let root = self.cache_root();

        let global = if let Some(rows) = root.get(&definition) {
            tracing::trace!(rows = rows.len(), "Result cache hit");
            rows
        } else {
            let records = self.inner.db.select(&select)?;
            tracing::debug!(rows = records.len(), "Result cache miss, fetched rows");
            let weak_root = root.downgrade();
            let rows: RowSet = Rc::new_cyclic(|set| {
                let origin = Rc::new(Origin {
                    rows: set.clone(),
                    root: weak_root,
                });
                records
                    .into_iter()
                    .map(|record| Row::fetched(self, Rc::clone(&origin), record))
                    .collect()
            });
            root.insert(definition, Rc::clone(&rows));
            rows
        };

        let local = match &self.inner.scope {
            None => Rc::clone(&global),
            Some(scope) => {
                let keys = scope.parent.local_keys(&scope.parent_key)?;
                let rows = global
                    .iter()
                    .filter(|row| {
                        let value = row.get(&scope.key);
                        keys.iter().any(|key| key.key_eq(&value))
                    })
                    .cloned()
                    .collect();
                Rc::new(rows)
            }
        };

        Ok(Resolved { global, local })
    }

    fn rows(&self, which: Rows) -> Result<RowSet> {
        if let Some(resolved) = self.inner.resolved.borrow().as_ref() {
            return Ok(resolved.rows(which));
        }
        let resolved = self.resolve()?;
        let rows = resolved.rows(which);
        *self.inner.resolved.borrow_mut() = Some(resolved);
        Ok(rows)
    }

    fn local_rows(&self) -> Result<RowSet> {
        self.rows(Rows::Local)
    }

    fn global_rows(&self) -> Result<RowSet> {
        self.rows(Rows::Global)
    }

    /// Distinct non-null values of `key` across this result's own rows.
    pub fn local_keys(&self, key: &str) -> Result<Vec<Value>> {
        collect_keys(&self.local_rows()?, key, self.table())
    }

    /// Distinct non-null values of `key` across every row this result's
    /// query fetched, ignoring the parent scope.
    pub fn global_keys(&self, key: &str) -> Result<Vec<Value>> {
        collect_keys(&self.global_rows()?, key, self.table())
    }

    /// The next row, or `None` when exhausted. Each clone of a result
    /// shares one cursor.
    pub fn fetch(&self) -> Result<Option<Row>> {
        let rows = self.local_rows()?;
        let index = self.inner.cursor.get();
        let row = rows.get(index).cloned();
        if row.is_some() {
            self.inner.cursor.set(index + 1);
        }
        Ok(row)
    }

    /// All rows of this result. Does not move the cursor.
    pub fn fetch_all(&self) -> Result<Vec<Row>> {
        Ok(self.local_rows()?.as_ref().clone())
    }

    pub fn row_count(&self) -> Result<usize> {
        Ok(self.local_rows()?.len())
    }

    /// Iterate over all rows of this result.
    pub fn iter(&self) -> Result<std::vec::IntoIter<Row>> {
        Ok(self.fetch_all()?.into_iter())
    }

    /// Create an unsaved row for this result's table, bound to this result.
    pub fn create_row(&self, data: &serde_json::Value) -> Result<Row> {
        self.inner.db.create_row_in(self.table(), data, self)
    }

    // ---- manipulation ----

    /// Insert rows into this result's table. The result's conditions do not
    /// apply.
    pub fn insert(&self, rows: &[Data], method: InsertMethod) -> Result<u64> {
        self.inner.db.insert(self.table(), rows, method)
    }

    /// Update the rows of this result.
    ///
    /// A related or limited result first resolves and then updates its rows
    /// by primary key.
    pub fn update(&self, data: &Data) -> Result<u64> {
        if self.needs_primary_result() {
            return self.primary_result()?.update(data);
        }
        let select = &self.inner.select;
        self.inner
            .db
            .update(self.table(), data, select.conditions(), select.params())
    }

    /// Delete the rows of this result; scoped like [`update`](Self::update).
    pub fn delete(&self) -> Result<u64> {
        if self.needs_primary_result() {
            return self.primary_result()?.delete();
        }
        let select = &self.inner.select;
        self.inner
            .db
            .delete(self.table(), select.conditions(), select.params())
    }

    fn needs_primary_result(&self) -> bool {
        self.inner.scope.is_some() || self.inner.select.limit_clause().is_some()
    }

    /// A root result selecting exactly this result's rows by primary key.
    pub fn primary_result(&self) -> Result<Self> {
        let db = &self.inner.db;
        let result = Self::for_table(db.clone(), self.table().to_string());
        let primary = db.conventions().primary(self.table());

        if let Some(column) = primary.as_single() {
            let keys = self.local_keys(column)?;
            return Ok(result.where_is(column, Values::List(keys)));
        }

        let columns = primary.columns();
        let mut alternatives = Vec::new();
        for row in self.local_rows()?.iter() {
            let terms: Vec<_> = columns
                .iter()
                .map(|column| db.is(column, row.get(column)))
                .collect();
            alternatives.push(format!("( {} )", terms.join(" AND ")));
        }
        let condition = if alternatives.is_empty() {
            "0=1".to_string()
        } else {
            alternatives.join(" OR ")
        };
        Ok(result.where_sql(&condition, Vec::<Param>::new()))
    }

    // ---- aggregates ----

    /// `COUNT(expr)`, e.g. `count("*")`.
    pub fn count(&self, expr: &str) -> Result<i64> {
        let value = self.aggregate(&format!("COUNT({expr})"))?;
        Ok(value.as_i64().unwrap_or(0))
    }

    pub fn min(&self, expr: &str) -> Result<Value> {
        self.aggregate(&format!("MIN({expr})"))
    }

    pub fn max(&self, expr: &str) -> Result<Value> {
        self.aggregate(&format!("MAX({expr})"))
    }

    pub fn sum(&self, expr: &str) -> Result<Value> {
        self.aggregate(&format!("SUM({expr})"))
    }

    /// Run `SELECT function` with this result's conditions, ordering and
    /// limit; returns the first column of the first row.
    pub fn aggregate(&self, function: &str) -> Result<Value> {
        if self.inner.scope.is_some() {
            return Err(Error::logic(
                LogicErrorKind::ScopeViolation,
                format!("Cannot aggregate related result of \"{}\"", self.table()),
            ));
        }
        let select = self
            .inner
            .select
            .clone()
            .only_columns(vec![function.to_string()]);
        let records = self.inner.db.select(&select)?;
        Ok(records
            .first()
            .and_then(|record| record.get(0))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// Join column for a primary key. Compound keys cannot join a relation;
/// their first column is used.
fn join_column(primary: &crate::PrimaryKey, table: &str) -> String {
    let columns = primary.columns();
    if columns.len() > 1 {
        tracing::warn!(
            table = table,
            key = %primary,
            "Relation joined on a compound primary key, using its first column"
        );
    }
    columns.first().map_or_else(|| "id".to_string(), |c| (*c).to_string())
}

pub(crate) fn collect_keys(rows: &[Row], key: &str, table: &str) -> Result<Vec<Value>> {
    let mut seen = IndexSet::new();
    let mut keys = Vec::new();
    for row in rows {
        if !row.has(key) {
            return Err(Error::logic(
                LogicErrorKind::MissingKeyColumn,
                format!("\"{key}\" does not exist in \"{table}\" result"),
            ));
        }
        let value = row.get(key);
        if let Some(text) = value.key_text() {
            if seen.insert(text) {
                keys.push(value);
            }
        }
    }
    Ok(keys)
}

/// Key columns and values of a persisted row, for id-scoped statements.
pub(crate) fn id_pairs(id: &RowId, primary: &crate::PrimaryKey) -> Vec<(String, Value)> {
    match id {
        RowId::Single(value) => primary
            .columns()
            .first()
            .map(|column| vec![((*column).to_string(), value.clone())])
            .unwrap_or_default(),
        RowId::Compound(values) => values
            .iter()
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect(),
    }
}

impl Serialize for LazyResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let rows = self.local_rows().map_err(S::Error::custom)?;
        let mut seq = serializer.serialize_seq(Some(rows.len()))?;
        for row in rows.iter() {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

impl fmt::Debug for LazyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("LazyResult");
        debug.field("table", &self.table());
        debug.field("conditions", &self.inner.select.conditions());
        if let Some(scope) = &self.inner.scope {
            debug
                .field("kind", &scope.kind)
                .field("key", &scope.key)
                .field("parent_key", &scope.parent_key);
        }
        debug.field("resolved", &self.is_resolved()).finish()
    }
}

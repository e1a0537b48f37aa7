//! The database handle: executor, conventions and SQL formatting.

#![allow(clippy::result_large_err)] // Error type is defined in lessql-core

use crate::conventions::{Conventions, split_relation};
use crate::result::LazyResult;
use crate::row::Row;
use lessql_core::{Executor, Param, Record, Result, Value, Values};
use lessql_query::{
    Data, DeleteBuilder, Delimiter, InsertBuilder, InsertMethod, Select, SqlFormat, UpdateBuilder,
};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Callback invoked with every statement before it runs.
pub type QueryObserver = Rc<dyn Fn(&str, &[Param])>;

struct DatabaseInner {
    executor: Box<dyn Executor>,
    conventions: RefCell<Conventions>,
    delimiter: Cell<Delimiter>,
    observer: RefCell<Option<QueryObserver>>,
}

/// Entry point: wraps an [`Executor`] and owns the schema conventions.
///
/// `Database` is a cheap handle; clones share the executor and the
/// configuration. Results and rows keep a handle to the database they
/// came from.
///
/// # Example
///
/// ```
/// use lessql::Database;
/// use lessql_sqlite::SqliteConnection;
///
/// let conn = SqliteConnection::open_memory().unwrap();
/// conn.execute_raw("CREATE TABLE user (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
/// conn.execute_raw("INSERT INTO user (id, name) VALUES (1, 'Writer')").unwrap();
///
/// let db = Database::new(conn);
/// let writer = db.find("user", 1).unwrap().unwrap();
/// assert_eq!(writer.get("name").as_str(), Some("Writer"));
/// assert!(db.find("user", 42).unwrap().is_none());
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Rc<DatabaseInner>,
}

impl Database {
    pub fn new(executor: impl Executor + 'static) -> Self {
        Self::with_conventions(executor, Conventions::new())
    }

    pub fn with_conventions(executor: impl Executor + 'static, conventions: Conventions) -> Self {
        Self {
            inner: Rc::new(DatabaseInner {
                executor: Box::new(executor),
                conventions: RefCell::new(conventions),
                delimiter: Cell::new(Delimiter::default()),
                observer: RefCell::new(None),
            }),
        }
    }

    /// The underlying executor, for statements this layer does not build.
    pub fn executor(&self) -> &dyn Executor {
        self.inner.executor.as_ref()
    }

    /// Whether two handles share the same database.
    pub fn ptr_eq(&self, other: &Database) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ---- tables and rows ----

    /// A root result over a table or alias. A trailing `List` is ignored.
    pub fn table(&self, name: &str) -> LazyResult {
        let (name, _) = split_relation(name);
        let table = self.conventions().alias(name);
        LazyResult::for_table(self.clone(), table)
    }

    /// Fetch a row by primary key value, or `None` if it does not exist.
    ///
    /// For compound keys use [`find_by`](Self::find_by).
    pub fn find(&self, name: &str, id: impl Into<Value>) -> Result<Option<Row>> {
        let result = self.table(name);
        let primary = self.conventions().primary(result.table());
        let columns = primary.columns();
        let column = columns.first().copied().unwrap_or("id");
        result.where_is(column, id.into()).fetch()
    }

    /// Fetch the first row matching all `column = value` pairs.
    pub fn find_by<K, V>(&self, name: &str, pairs: impl IntoIterator<Item = (K, V)>) -> Result<Option<Row>>
    where
        K: AsRef<str>,
        V: Into<Values>,
    {
        self.table(name).where_all(pairs).fetch()
    }

    /// Create an unbound row from JSON data. Nested objects and arrays become
    /// rows and row lists.
    pub fn create_row(&self, name: &str, data: &serde_json::Value) -> Result<Row> {
        let row = Row::new(self.clone(), name, None);
        row.set_data(data)?;
        Ok(row)
    }

    /// Create a row bound to `result`; relations of the row are cached at
    /// that result's root.
    pub fn create_row_in(&self, name: &str, data: &serde_json::Value, result: &LazyResult) -> Result<Row> {
        let row = Row::new(self.clone(), name, Some(result));
        row.set_data(data)?;
        Ok(row)
    }

    // ---- configuration ----

    pub fn conventions(&self) -> Ref<'_, Conventions> {
        self.inner.conventions.borrow()
    }

    pub fn conventions_mut(&self) -> RefMut<'_, Conventions> {
        self.inner.conventions.borrow_mut()
    }

    pub fn set_conventions(&self, conventions: Conventions) {
        *self.inner.conventions.borrow_mut() = conventions;
    }

    /// Set the table-name rewrite hook, e.g. to add a prefix.
    pub fn set_rewrite(&self, rewrite: impl Fn(&str) -> String + 'static) {
        self.conventions_mut().set_rewrite(rewrite);
    }

    /// Physical name of a table after the rewrite hook.
    pub fn rewrite_table(&self, table: &str) -> String {
        let rewrite = self.conventions().rewrite_fn();
        match rewrite {
            Some(rewrite) => rewrite(table),
            None => table.to_string(),
        }
    }

    pub fn delimiter(&self) -> Delimiter {
        self.inner.delimiter.get()
    }

    pub fn set_delimiter(&self, delimiter: Delimiter) {
        self.inner.delimiter.set(delimiter);
    }

    /// Observe every statement before it is executed.
    pub fn set_query_observer(&self, observer: impl Fn(&str, &[Param]) + 'static) {
        *self.inner.observer.borrow_mut() = Some(Rc::new(observer));
    }

    pub fn clear_query_observer(&self) {
        *self.inner.observer.borrow_mut() = None;
    }

    // ---- formatting ----

    pub fn format(&self) -> SqlFormat<'_> {
        SqlFormat::new(self.executor(), self.delimiter())
    }

    /// `column` equals, or is in, `values`.
    pub fn is(&self, column: &str, values: impl Into<Values>) -> String {
        self.format().is(column, values)
    }

    pub fn is_not(&self, column: &str, values: impl Into<Values>) -> String {
        self.format().is_not(column, values)
    }

    pub fn quote(&self, value: &Value) -> String {
        self.format().quote(value)
    }

    pub fn quote_identifier(&self, name: &str) -> String {
        self.format().quote_identifier(name)
    }

    /// A value emitted into SQL verbatim, such as `CURRENT_TIMESTAMP`.
    pub fn literal(&self, sql: impl Into<String>) -> Value {
        Value::literal(sql)
    }

    // ---- statements ----

    /// Run a SELECT for a query shape.
    pub fn select(&self, select: &Select) -> Result<Vec<Record>> {
        let table = self.rewrite_table(select.table());
        let sql = select.to_sql(&self.format(), &table);
        self.query(&sql, select.params())
    }

    /// Insert rows into a table. Returns the number of affected rows.
    pub fn insert(&self, table: &str, rows: &[Data], method: InsertMethod) -> Result<u64> {
        let table = self.rewrite_table(table);
        let statements = InsertBuilder::new(&table, rows).method(method).build(&self.format());
        let mut affected = 0;
        for statement in statements {
            affected += self.execute(&statement.sql, &statement.params)?;
        }
        Ok(affected)
    }

    /// Update a table. Empty data issues nothing.
    pub fn update(&self, table: &str, data: &Data, conditions: &[String], params: &[Param]) -> Result<u64> {
        let table = self.rewrite_table(table);
        let statement = UpdateBuilder::new(&table, data)
            .filter(conditions, params)
            .build(&self.format());
        match statement {
            Some(statement) => self.execute(&statement.sql, &statement.params),
            None => Ok(0),
        }
    }

    pub fn delete(&self, table: &str, conditions: &[String], params: &[Param]) -> Result<u64> {
        let table = self.rewrite_table(table);
        let statement = DeleteBuilder::new(&table)
            .filter(conditions, params)
            .build(&self.format());
        self.execute(&statement.sql, &statement.params)
    }

    /// Run a statement returning rows, notifying the query observer.
    pub fn query(&self, sql: &str, params: &[Param]) -> Result<Vec<Record>> {
        self.notify(sql, params);
        tracing::debug!(sql = %sql, params = params.len(), "Executing query");
        let records = self.inner.executor.query(sql, params)?;
        tracing::trace!(rows = records.len(), "Query returned");
        Ok(records)
    }

    /// Run a statement returning an affected-row count, notifying the query
    /// observer.
    pub fn execute(&self, sql: &str, params: &[Param]) -> Result<u64> {
        self.notify(sql, params);
        tracing::debug!(sql = %sql, params = params.len(), "Executing statement");
        self.inner.executor.execute(sql, params)
    }

    fn notify(&self, sql: &str, params: &[Param]) {
        // Cloned out so an observer may reconfigure the database.
        let observer = self.inner.observer.borrow().clone();
        if let Some(observer) = observer {
            observer(sql, params);
        }
    }

    /// Id generated by the last insert, read through `sequence` on backends
    /// that use sequences.
    pub fn last_insert_id(&self, sequence: Option<&str>) -> Result<Option<Value>> {
        self.inner.executor.last_insert_id(sequence)
    }

    // ---- transactions ----

    pub fn begin(&self) -> Result<()> {
        tracing::debug!("Beginning transaction");
        self.inner.executor.begin()
    }

    pub fn commit(&self) -> Result<()> {
        tracing::debug!("Committing transaction");
        self.inner.executor.commit()
    }

    pub fn rollback(&self) -> Result<()> {
        tracing::debug!("Rolling back transaction");
        self.inner.executor.rollback()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("conventions", &*self.inner.conventions.borrow())
            .field("delimiter", &self.inner.delimiter.get())
            .field("observer", &self.inner.observer.borrow().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;

    #[test]
    fn test_table_strips_list_and_resolves_alias() {
        let db = Recorder::database();
        db.conventions_mut().set_alias("author", "user");
        assert_eq!(db.table("postList").table(), "post");
        assert_eq!(db.table("author").table(), "user");
    }

    #[test]
    fn test_predicates_follow_delimiter() {
        let db = Recorder::database();
        assert_eq!(
            db.is("test", vec![Value::Int(1), Value::Null]),
            "`test` IN ( '1' ) OR `test` IS NULL"
        );
        db.set_delimiter(Delimiter::DoubleQuote);
        assert_eq!(db.is_not("test", Value::Null), "\"test\" IS NOT NULL");
        assert_eq!(db.quote_identifier("a.b"), "\"a\".\"b\"");
        assert_eq!(db.quote(&db.literal("NOW()")), "NOW()");
    }

    #[test]
    fn test_rewrite_applies_to_statements() {
        let (db, log) = Recorder::database_with_log();
        db.set_rewrite(|table| format!("app_{table}"));
        db.delete("post", &[], &[]).unwrap();
        db.table("post").fetch_all().unwrap();
        assert_eq!(
            log.statements(),
            vec!["DELETE FROM `app_post`", "SELECT * FROM `app_post`"]
        );
    }

    #[test]
    fn test_empty_update_issues_nothing() {
        let (db, log) = Recorder::database_with_log();
        assert_eq!(db.update("dummy", &Data::new(), &[], &[]).unwrap(), 0);
        assert!(log.statements().is_empty());
    }
}

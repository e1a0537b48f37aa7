//! LessQL - a lightweight relational data layer.
//!
//! LessQL traverses related tables without writing joins and without
//! running into N+1 queries. Relations are derived from naming
//! conventions: `post.author` follows `post.author_id` to `user.id` (with
//! an `author → user` alias), `user.postList` follows `post.user_id` back
//! to `user.id`. Every relation is fetched with one query per level for
//! all parent rows at once, and the result is cached.
//!
//! - [`Database`] wraps an [`Executor`] and owns the [`Conventions`].
//! - [`LazyResult`] is a lazily executed query over a table, either a root
//!   result or a result related to a parent result or row.
//! - [`Row`] holds column values plus nested rows, tracks modifications and
//!   saves whole graphs of new and changed rows in dependency order.
//!
//! # Example
//!
//! ```
//! use lessql::{Database, Direction};
//! use lessql_sqlite::SqliteConnection;
//!
//! let conn = SqliteConnection::open_memory().unwrap();
//! conn.execute_raw(
//!     "CREATE TABLE user (id INTEGER PRIMARY KEY, name TEXT);
//!      CREATE TABLE post (id INTEGER PRIMARY KEY, title TEXT, author_id INTEGER);
//!      INSERT INTO user VALUES (1, 'Writer');
//!      INSERT INTO post VALUES (11, 'First', 1), (12, 'Second', 1);",
//! )
//! .unwrap();
//!
//! let db = Database::new(conn);
//! db.conventions_mut().set_alias("author", "user");
//!
//! // Two queries in total, however many posts there are.
//! let posts = db.table("post").order_by("id", Direction::Asc);
//! for post in posts.iter().unwrap() {
//!     let author = post.related("author").fetch().unwrap().unwrap();
//!     assert_eq!(author.get("name").as_str(), Some("Writer"));
//! }
//! ```
//!
//! # Saving graphs
//!
//! ```
//! use lessql::Database;
//! use lessql_sqlite::SqliteConnection;
//! use serde_json::json;
//!
//! let conn = SqliteConnection::open_memory().unwrap();
//! conn.execute_raw(
//!     "CREATE TABLE user (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT);
//!      CREATE TABLE post (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT, author_id INTEGER NOT NULL);",
//! )
//! .unwrap();
//!
//! let db = Database::new(conn);
//! db.conventions_mut()
//!     .set_alias("author", "user")
//!     .set_required("post", "author_id");
//!
//! let post = db
//!     .create_row("post", &json!({ "title": "Hello", "author": { "name": "Writer" } }))
//!     .unwrap();
//! post.save().unwrap();
//! assert!(post.exists());
//! assert_eq!(post.get("author_id"), post.row("author").unwrap().get("id"));
//! ```

pub mod conventions;
pub mod database;
pub mod result;
pub mod row;

pub use conventions::{Conventions, LIST_SUFFIX, PrimaryKey, RewriteFn, SchemaHints, split_relation};
pub use database::{Database, QueryObserver};
pub use result::{LazyResult, Parent, RelationKind};
pub use row::{Property, Row, RowId};

pub use lessql_core::{
    Error, Executor, LogicError, LogicErrorKind, Param, Record, Result, TypeError, Value, Values,
};
pub use lessql_query::{Data, Delimiter, Direction, InsertMethod, Select};

#[cfg(test)]
pub(crate) mod testing {
    use crate::Database;
    use lessql_core::{Executor, Param, Record, Result, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Executor that returns no rows and affects nothing.
    pub struct Recorder;

    impl Recorder {
        pub fn database() -> Database {
            Database::new(Recorder)
        }

        /// A database whose statements are recorded in the returned log.
        pub fn database_with_log() -> (Database, Log) {
            let db = Self::database();
            let log = Log::default();
            let entries = Rc::clone(&log.entries);
            db.set_query_observer(move |sql, params| {
                entries.borrow_mut().push((sql.to_string(), params.to_vec()));
            });
            (db, log)
        }
    }

    impl Executor for Recorder {
        fn query(&self, _sql: &str, _params: &[Param]) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }

        fn execute(&self, _sql: &str, _params: &[Param]) -> Result<u64> {
            Ok(0)
        }

        fn last_insert_id(&self, _sequence: Option<&str>) -> Result<Option<Value>> {
            Ok(None)
        }

        fn begin(&self) -> Result<()> {
            Ok(())
        }

        fn commit(&self) -> Result<()> {
            Ok(())
        }

        fn rollback(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    pub struct Log {
        entries: Rc<RefCell<Vec<(String, Vec<Param>)>>>,
    }

    impl Log {
        pub fn statements(&self) -> Vec<String> {
            self.entries.borrow().iter().map(|(sql, _)| sql.clone()).collect()
        }

        pub fn params(&self) -> Vec<Vec<Param>> {
            self.entries
                .borrow()
                .iter()
                .map(|(_, params)| params.clone())
                .collect()
        }
    }
}

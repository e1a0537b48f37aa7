//! Shared SQLite fixture: a blog schema with users, posts and categories.

#![allow(dead_code)]

use lessql::{Database, Param};
use lessql_sqlite::SqliteConnection;
use std::cell::RefCell;
use std::rc::Rc;

const SCHEMA: &str = "
    CREATE TABLE user (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(30) NOT NULL,
        post_id INTEGER DEFAULT NULL
    );
    CREATE TABLE post (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id INTEGER DEFAULT NULL,
        editor_id INTEGER DEFAULT NULL,
        is_published INTEGER DEFAULT 0,
        date_published VARCHAR(30) DEFAULT NULL,
        title VARCHAR(30) NOT NULL
    );
    CREATE TABLE category (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title VARCHAR(30) NOT NULL
    );
    CREATE TABLE categorization (
        category_id INTEGER NOT NULL,
        post_id INTEGER NOT NULL
    );
    CREATE TABLE dummy (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        test INTEGER
    );
";

const DATA: &str = "
    INSERT INTO user (id, name) VALUES (1, 'Writer');
    INSERT INTO user (id, name) VALUES (2, 'Editor');
    INSERT INTO user (id, name) VALUES (3, 'Chief Editor');

    INSERT INTO post (id, title, date_published, author_id, editor_id)
        VALUES (11, 'Championship won', '2014-09-18', 1, NULL);
    INSERT INTO post (id, title, date_published, author_id, editor_id)
        VALUES (12, 'Foo released', '2014-09-15', 1, 2);
    INSERT INTO post (id, title, date_published, author_id, editor_id)
        VALUES (13, 'Bar released', '2014-09-21', 2, 3);

    INSERT INTO category (id, title) VALUES (21, 'Tech');
    INSERT INTO category (id, title) VALUES (22, 'Sports');
    INSERT INTO category (id, title) VALUES (23, 'Basketball');

    INSERT INTO categorization (category_id, post_id) VALUES (22, 11);
    INSERT INTO categorization (category_id, post_id) VALUES (23, 11);
    INSERT INTO categorization (category_id, post_id) VALUES (21, 12);
    INSERT INTO categorization (category_id, post_id) VALUES (21, 13);
";

/// Statements seen by the query observer.
#[derive(Default, Clone)]
pub struct QueryLog {
    entries: Rc<RefCell<Vec<(String, Vec<Param>)>>>,
}

impl QueryLog {
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

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// A fresh in-memory blog database plus a log of every statement run
/// through it after setup.
pub fn blog() -> (Database, QueryLog) {
    let conn = SqliteConnection::open_memory().expect("open sqlite memory db");
    conn.execute_raw(SCHEMA).expect("create schema");
    conn.execute_raw(DATA).expect("insert fixture data");

    let db = Database::new(conn);
    db.conventions_mut()
        .set_alias("author", "user")
        .set_alias("editor", "user")
        .set_primary("categorization", ["category_id", "post_id"])
        .set_alias("edit_post", "post")
        .set_back_reference("user", "edit_post", "editor_id");

    let log = QueryLog::default();
    let entries = Rc::clone(&log.entries);
    db.set_query_observer(move |sql, params| {
        entries.borrow_mut().push((sql.to_string(), params.to_vec()));
    });
    (db, log)
}

/// Insert the dummy rows used by the update and delete tests, then clear
/// the log.
pub fn fill_dummy(db: &Database, log: &QueryLog) {
    let dummy = db.table("dummy");
    for (id, test) in [(1, 44), (2, 42), (3, 45), (4, 47), (5, 48), (6, 43), (7, 41), (8, 46)] {
        let row: lessql::Data = [
            ("id".to_string(), lessql::Value::from(id)),
            ("test".to_string(), lessql::Value::from(test)),
        ]
        .into_iter()
        .collect();
        dummy
            .insert(&[row], lessql::InsertMethod::Default)
            .expect("insert dummy row");
    }
    log.clear();
}

/// Build a `Data` map from column/value pairs.
pub fn data<const N: usize>(pairs: [(&str, lessql::Value); N]) -> lessql::Data {
    pairs
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}

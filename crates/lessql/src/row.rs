//! Rows: mutable property maps with dirty tracking and graph save.
//!
//! A row holds scalar values and, under relation names, nested rows
//! (`author`) or lists of rows (`categorizationList`). Saving a row saves
//! the whole graph: rows are inserted as soon as their required columns are
//! known, and keys flow along the graph as rows receive ids.

#![allow(clippy::result_large_err)] // Error type is defined in lessql-core

use crate::conventions::{PrimaryKey, split_relation};
use crate::database::Database;
use crate::result::{
    CacheRoot, LazyResult, Origin, ResultInner, RowCache, RowSet, collect_keys, id_pairs,
};
use indexmap::IndexMap;
use lessql_core::{Error, LogicErrorKind, Record, Result, TypeError, Value};
use lessql_query::{Data, InsertMethod};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A property value: a scalar, a nested row, or a list of rows.
#[derive(Debug, Clone)]
pub enum Property {
    Value(Value),
    Row(Row),
    List(Vec<Row>),
}

impl Property {
    /// Values compare by equality, rows and lists by handle identity.
    fn same(&self, other: &Property) -> bool {
        match (self, other) {
            (Property::Value(a), Property::Value(b)) => a == b,
            (Property::Row(a), Property::Row(b)) => a.ptr_eq(b),
            (Property::List(a), Property::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ptr_eq(y))
            }
            _ => false,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Property::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Property::Value(value)
    }
}

impl From<Row> for Property {
    fn from(row: Row) -> Self {
        Property::Row(row)
    }
}

impl From<Vec<Row>> for Property {
    fn from(rows: Vec<Row>) -> Self {
        Property::List(rows)
    }
}

/// Primary key value(s) of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowId {
    Single(Value),
    Compound(IndexMap<String, Value>),
}

struct RowData {
    db: Database,
    table: String,
    properties: IndexMap<String, Property>,
    modified: IndexMap<String, Property>,
    original_id: Option<RowId>,
    result: Weak<ResultInner>,
    origin: Option<Rc<Origin>>,
    cache: RowCache,
}

/// A row of a table, shared by handle.
///
/// Clones share state; [`ptr_eq`](Row::ptr_eq) tells whether two handles
/// are the same row.
#[derive(Clone)]
pub struct Row(Rc<RefCell<RowData>>);

/// A non-owning [`Row`] handle.
pub(crate) struct WeakRow(Weak<RefCell<RowData>>);

impl WeakRow {
    pub(crate) fn upgrade(&self) -> Option<Row> {
        self.0.upgrade().map(Row)
    }
}

impl Row {
    /// An empty row of the table `name` resolves to.
    pub(crate) fn new(db: Database, name: &str, result: Option<&LazyResult>) -> Self {
        let table = db.conventions().alias(name);
        Row(Rc::new(RefCell::new(RowData {
            db,
            table,
            properties: IndexMap::new(),
            modified: IndexMap::new(),
            original_id: None,
            result: result.map_or_else(Weak::new, LazyResult::downgrade),
            origin: None,
            cache: RowCache::new(),
        })))
    }

    /// A clean row built from a fetched record, bound to `result` and to the
    /// row set it was fetched in.
    pub(crate) fn fetched(result: &LazyResult, origin: Rc<Origin>, record: Record) -> Self {
        let row = Row::new(result.database().clone(), result.table(), Some(result));
        {
            let mut data = row.0.borrow_mut();
            data.origin = Some(origin);
            for (column, value) in record.into_pairs() {
                data.properties.insert(column, Property::Value(value));
            }
        }
        // Without the key in the projection the row has no identity.
        let id = row.id();
        row.0.borrow_mut().original_id = id;
        row
    }

    pub fn ptr_eq(&self, other: &Row) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> WeakRow {
        WeakRow(Rc::downgrade(&self.0))
    }

    pub fn database(&self) -> Database {
        self.0.borrow().db.clone()
    }

    pub fn table(&self) -> String {
        self.0.borrow().table.clone()
    }

    /// The result that fetched or created this row, while it is alive.
    pub fn result(&self) -> Option<LazyResult> {
        LazyResult::upgrade(&self.0.borrow().result)
    }

    // ---- properties ----

    /// Scalar value of a property; NULL when absent, null or a relation.
    pub fn get(&self, column: &str) -> Value {
        self.0
            .borrow()
            .properties
            .get(column)
            .and_then(Property::as_value)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn property(&self, column: &str) -> Option<Property> {
        self.0.borrow().properties.get(column).cloned()
    }

    /// Nested row under a singular relation name.
    pub fn row(&self, column: &str) -> Option<Row> {
        match self.0.borrow().properties.get(column) {
            Some(Property::Row(row)) => Some(row.clone()),
            _ => None,
        }
    }

    /// Nested rows under a plural relation name.
    pub fn list(&self, column: &str) -> Option<Vec<Row>> {
        match self.0.borrow().properties.get(column) {
            Some(Property::List(rows)) => Some(rows.clone()),
            _ => None,
        }
    }

    /// Whether the property is present, even if null.
    pub fn has(&self, column: &str) -> bool {
        self.0.borrow().properties.contains_key(column)
    }

    /// Property names in insertion order.
    pub fn columns(&self) -> Vec<String> {
        self.0.borrow().properties.keys().cloned().collect()
    }

    pub fn set(&self, column: &str, value: impl Into<Value>) {
        self.set_property(column, Property::Value(value.into()));
    }

    pub fn set_row(&self, column: &str, row: Row) {
        self.set_property(column, Property::Row(row));
    }

    pub fn set_list(&self, column: &str, rows: Vec<Row>) {
        self.set_property(column, Property::List(rows));
    }

    /// Set a property and mark it modified. Setting the current value again
    /// changes nothing.
    pub fn set_property(&self, column: &str, property: Property) {
        let mut data = self.0.borrow_mut();
        if data
            .properties
            .get(column)
            .is_some_and(|current| current.same(&property))
        {
            return;
        }
        data.properties.insert(column.to_string(), property.clone());
        data.modified.insert(column.to_string(), property);
    }

    /// Set a property from JSON. Objects under a singular name become a row
    /// of the table the name resolves to; arrays (or objects) under a `List`
    /// name become a list of rows of the singular name's table.
    pub fn set_json(&self, column: &str, value: &serde_json::Value) -> Result<()> {
        let property = match value {
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                self.convert_nested(column, value)?
            }
            scalar => Property::Value(Value::from_json(scalar)?),
        };
        self.set_property(column, property);
        Ok(())
    }

    fn convert_nested(&self, column: &str, value: &serde_json::Value) -> Result<Property> {
        let db = self.database();
        let (name, plural) = split_relation(column);
        if plural {
            let items: Vec<&serde_json::Value> = match value {
                serde_json::Value::Array(items) => items.iter().collect(),
                serde_json::Value::Object(map) => map.values().collect(),
                _ => Vec::new(),
            };
            let mut rows = Vec::with_capacity(items.len());
            for item in items {
                rows.push(db.create_row(name, item)?);
            }
            Ok(Property::List(rows))
        } else if value.is_object() {
            Ok(Property::Row(db.create_row(name, value)?))
        } else {
            Err(Error::Type(TypeError {
                expected: "object for a singular relation",
                actual: "array".to_string(),
                column: Some(column.to_string()),
            }))
        }
    }

    /// Merge JSON object data into this row. `null` merges nothing.
    pub fn set_data(&self, data: &serde_json::Value) -> Result<&Self> {
        match data {
            serde_json::Value::Null => {}
            serde_json::Value::Object(map) => {
                for (column, value) in map {
                    self.set_json(column, value)?;
                }
            }
            other => {
                return Err(Error::Type(TypeError {
                    expected: "JSON object of row data",
                    actual: json_kind(other).to_string(),
                    column: None,
                }));
            }
        }
        Ok(self)
    }

    /// Remove a property; it is left out of later statements entirely.
    pub fn unset(&self, column: &str) {
        let mut data = self.0.borrow_mut();
        data.properties.shift_remove(column);
        data.modified.shift_remove(column);
    }

    // ---- identity and state ----

    /// Primary key value(s), or `None` while any key column is null or absent.
    pub fn id(&self) -> Option<RowId> {
        let primary = self.primary();
        match primary {
            PrimaryKey::Single(column) => {
                let value = self.get(&column);
                (!value.is_null()).then_some(RowId::Single(value))
            }
            PrimaryKey::Compound(columns) => {
                let mut values = IndexMap::new();
                for column in columns {
                    let value = self.get(&column);
                    if value.is_null() {
                        return None;
                    }
                    values.insert(column, value);
                }
                Some(RowId::Compound(values))
            }
        }
    }

    /// The id captured when the row was last marked clean.
    pub fn original_id(&self) -> Option<RowId> {
        self.0.borrow().original_id.clone()
    }

    fn primary(&self) -> PrimaryKey {
        let data = self.0.borrow();
        data.db.conventions().primary(&data.table)
    }

    /// Scalar properties; nested rows and lists are left out.
    pub fn data(&self) -> Data {
        scalars(&self.0.borrow().properties)
    }

    /// Scalar properties modified since the row was last clean.
    pub fn modified(&self) -> Data {
        scalars(&self.0.borrow().modified)
    }

    /// Whether the row has been persisted.
    pub fn exists(&self) -> bool {
        self.0.borrow().original_id.is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.0.borrow().modified.is_empty()
    }

    /// Mark the row as in sync with the database.
    pub fn set_clean(&self) -> Result<&Self> {
        let Some(id) = self.id() else {
            return Err(Error::logic(
                LogicErrorKind::CleanWithoutId,
                format!("Cannot set row of \"{}\" clean without id", self.table()),
            ));
        };
        let mut data = self.0.borrow_mut();
        data.original_id = Some(id);
        data.modified.clear();
        Ok(self)
    }

    /// Mark every property as modified.
    pub fn set_dirty(&self) -> &Self {
        let mut data = self.0.borrow_mut();
        data.modified = data.properties.clone();
        self
    }

    /// Required columns that are absent or null.
    pub fn missing(&self) -> Vec<String> {
        let required = {
            let data = self.0.borrow();
            data.db.conventions().required(&data.table)
        };
        required
            .into_iter()
            .filter(|column| self.get(column).is_null())
            .collect()
    }

    // ---- references ----

    /// Set the reference key of every nested row to that row's id
    /// (`post.author` → `post.author_id`).
    pub fn update_references(&self) {
        let (db, table, nested) = {
            let data = self.0.borrow();
            let nested: Vec<(String, Row)> = data
                .properties
                .iter()
                .filter_map(|(column, property)| match property {
                    Property::Row(row) => Some((column.clone(), row.clone())),
                    _ => None,
                })
                .collect();
            (data.db.clone(), data.table.clone(), nested)
        };

        for (column, row) in nested {
            let key = db.conventions().reference(&table, split_relation(&column).0);
            match row.id() {
                Some(RowId::Single(id)) => self.set_key(&key, id),
                None => self.set_key(&key, Value::Null),
                Some(RowId::Compound(_)) => {
                    tracing::warn!(
                        table = %table,
                        relation = %column,
                        "Cannot reference a row with a compound key"
                    );
                }
            }
        }
    }

    /// Set the back-reference key of every row in a nested list to this
    /// row's id. Does nothing without a single-column id.
    pub fn update_back_references(&self) {
        let Some(RowId::Single(id)) = self.id() else {
            return;
        };
        let (db, table, lists) = {
            let data = self.0.borrow();
            let lists: Vec<(String, Vec<Row>)> = data
                .properties
                .iter()
                .filter_map(|(column, property)| match property {
                    Property::List(rows) => Some((column.clone(), rows.clone())),
                    _ => None,
                })
                .collect();
            (data.db.clone(), data.table.clone(), lists)
        };

        for (column, rows) in lists {
            let key = db.conventions().back_reference(&table, split_relation(&column).0);
            for row in rows {
                row.set_key(&key, id.clone());
            }
        }
    }

    /// Set a key column unless it already holds the same key.
    fn set_key(&self, column: &str, value: Value) {
        let unchanged = match self.0.borrow().properties.get(column) {
            Some(Property::Value(current)) => *current == value || current.key_eq(&value),
            _ => false,
        };
        if !unchanged {
            self.set(column, value);
        }
    }

    // ---- persistence ----

    /// Save this row and every row nested in it.
    pub fn save(&self) -> Result<&Self> {
        self.save_with(true)
    }

    /// Save this row; with `recursive` the whole nested graph.
    pub fn save_with(&self, recursive: bool) -> Result<&Self> {
        if recursive {
            self.save_graph()?;
        } else {
            self.save_row()?;
        }
        Ok(self)
    }

    /// INSERT or UPDATE this row alone.
    #[tracing::instrument(level = "trace", skip(self), fields(table = %self.table()))]
    fn save_row(&self) -> Result<()> {
        self.update_references();
        if self.is_clean() {
            return Ok(());
        }

        let db = self.database();
        let table = self.table();
        let primary = self.primary();

        if let Some(original) = self.original_id() {
            db.table(&table)
                .where_all(id_pairs(&original, &primary))
                .update(&self.modified())?;
        } else {
            db.insert(&table, &[self.data()], InsertMethod::Default)?;
            if let PrimaryKey::Single(column) = &primary {
                if self.get(column).is_null() {
                    let sequence = db.conventions().sequence(&table);
                    if let Some(id) = db.last_insert_id(sequence.as_deref())? {
                        self.set(column, id);
                    }
                }
            }
        }
        self.set_clean()?;
        Ok(())
    }

    /// Save every row of the graph, in dependency order.
    ///
    /// Each pass saves every dirty row whose required columns are known,
    /// stamps ids onto rows that reference them, and repeats until all rows
    /// are clean. A pass without progress means the graph cannot be saved.
    #[tracing::instrument(level = "debug", skip(self), fields(table = %self.table()))]
    fn save_graph(&self) -> Result<()> {
        let mut rows = Vec::new();
        self.collect_rows(&mut rows);
        let max_passes = rows.len() + 1;

        for pass in 1..=max_passes {
            let mut progress = false;
            for row in &rows {
                row.update_references();
                if !row.is_clean() && row.missing().is_empty() {
                    row.save_row()?;
                    progress = true;
                }
                row.update_back_references();
            }

            // Rows saved later in the pass may complete references of rows
            // saved earlier.
            for row in &rows {
                row.update_references();
            }

            if rows.iter().all(Row::is_clean) {
                tracing::debug!(rows = rows.len(), passes = pass, "Saved row graph");
                return Ok(());
            }
            if !progress {
                break;
            }
        }

        let blocked: Vec<String> = rows
            .iter()
            .filter(|row| !row.is_clean())
            .map(|row| format!("{} missing {:?}", row.table(), row.missing()))
            .collect();
        Err(Error::logic(
            LogicErrorKind::UnresolvableGraph,
            format!(
                "Cannot save row graph of \"{}\": {}; add required values or allow NULL",
                self.table(),
                blocked.join(", ")
            ),
        ))
    }

    /// This row and every nested row, depth first. Each row appears once,
    /// even in cyclic graphs.
    fn collect_rows(&self, rows: &mut Vec<Row>) {
        if rows.iter().any(|row| row.ptr_eq(self)) {
            return;
        }
        rows.push(self.clone());
        let nested: Vec<Property> = self.0.borrow().properties.values().cloned().collect();
        for property in nested {
            match property {
                Property::Row(row) => row.collect_rows(rows),
                Property::List(list) => {
                    for row in list {
                        row.collect_rows(rows);
                    }
                }
                Property::Value(_) => {}
            }
        }
    }

    /// Merge JSON data, then save.
    pub fn update(&self, data: &serde_json::Value, recursive: bool) -> Result<&Self> {
        self.set_data(data)?;
        self.save_with(recursive)
    }

    /// Delete this row from the database. Afterwards the row no longer
    /// exists and is fully dirty, so saving it inserts it again.
    pub fn delete(&self) -> Result<&Self> {
        let Some(original) = self.original_id() else {
            return Ok(self);
        };
        let db = self.database();
        let table = self.table();
        let primary = self.primary();
        db.table(&table)
            .where_all(id_pairs(&original, &primary))
            .delete()?;
        self.0.borrow_mut().original_id = None;
        Ok(self.set_dirty())
    }

    // ---- relations ----

    /// Rows related to this one, e.g. `post.related("author")` or
    /// `user.related("postList")`.
    pub fn related(&self, name: &str) -> LazyResult {
        LazyResult::related(self, name)
    }

    /// This row's value of `key`, if not null.
    pub fn local_keys(&self, key: &str) -> Vec<Value> {
        let value = self.get(key);
        if value.is_null() { Vec::new() } else { vec![value] }
    }

    /// Keys of every row fetched with this one, or this row's own key when
    /// unbound.
    pub fn global_keys(&self, key: &str) -> Result<Vec<Value>> {
        if let Some(rows) = self.origin().and_then(|origin| origin.rows()) {
            return collect_keys(&rows, key, &self.table());
        }
        match self.result() {
            Some(result) => result.global_keys(key),
            None => Ok(self.local_keys(key)),
        }
    }

    pub(crate) fn cache_root(&self) -> CacheRoot {
        if let Some(root) = self.origin().and_then(|origin| origin.root()) {
            return root;
        }
        match self.result() {
            Some(result) => result.cache_root(),
            None => CacheRoot::Row(self.clone()),
        }
    }

    fn origin(&self) -> Option<Rc<Origin>> {
        self.0.borrow().origin.clone()
    }

    pub(crate) fn cached(&self, definition: &str) -> Option<RowSet> {
        self.0.borrow().cache.get(definition)
    }

    pub(crate) fn store_cached(&self, definition: String, rows: RowSet) {
        self.0.borrow_mut().cache.insert(definition, rows);
    }
}

fn scalars(properties: &IndexMap<String, Property>) -> Data {
    properties
        .iter()
        .filter_map(|(column, property)| {
            property
                .as_value()
                .map(|value| (column.clone(), value.clone()))
        })
        .collect()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let data = self.0.borrow();
        let mut map = serializer.serialize_map(Some(data.properties.len()))?;
        for (column, property) in &data.properties {
            map.serialize_entry(column, property)?;
        }
        map.end()
    }
}

impl Serialize for Property {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Property::Value(value) => value.serialize(serializer),
            Property::Row(row) => row.serialize(serializer),
            Property::List(rows) => {
                let mut seq = serializer.serialize_seq(Some(rows.len()))?;
                for row in rows {
                    seq.serialize_element(row)?;
                }
                seq.end()
            }
        }
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        let relations: Vec<&str> = data
            .properties
            .iter()
            .filter(|(_, p)| p.as_value().is_none())
            .map(|(column, _)| column.as_str())
            .collect();
        f.debug_struct("Row")
            .field("table", &data.table)
            .field("data", &scalars(&data.properties))
            .field("relations", &relations)
            .field("exists", &data.original_id.is_some())
            .field("clean", &data.modified.is_empty())
            .finish()
    }
}

//! SELECT query shapes.

use crate::clause::{Limit, OrderBy};
use crate::format::SqlFormat;
use lessql_core::Param;
use serde::Serialize;

/// The immutable shape of a SELECT: table, projection, conditions with their
/// bound parameters, ordering and limit.
///
/// Builder methods consume and return the query, so a query that has been
/// shared stays as it was.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    conditions: Vec<String>,
    params: Vec<Param>,
    order_by: Vec<OrderBy>,
    limit: Option<Limit>,
}

impl Select {
    /// Create a new SELECT * for a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            conditions: Vec::new(),
            params: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Append projection expressions.
    pub fn columns<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(exprs.into_iter().map(Into::into));
        self
    }

    /// Replace the projection (used for aggregates).
    pub fn only_columns(mut self, exprs: Vec<String>) -> Self {
        self.columns = exprs;
        self
    }

    /// Append a raw WHERE fragment; fragments are joined with AND.
    pub fn filter(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Append bound parameters for the raw fragments.
    pub fn bind<I: IntoIterator<Item = Param>>(mut self, params: I) -> Self {
        self.params.extend(params);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn limit_clause(&self) -> Option<Limit> {
        self.limit
    }

    /// Canonical, order-sensitive serialization of this query.
    ///
    /// Two specs with equal definitions issue the same statement and may
    /// share fetched rows.
    pub fn definition(&self) -> String {
        // A struct of strings, numbers and scalar values always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Generate the SQL text. `table` is the physical (rewritten) name.
    pub fn to_sql(&self, fmt: &SqlFormat<'_>, table: &str) -> String {
        let mut sql = String::from("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&fmt.quote_identifier(table));
        sql.push_str(&where_suffix(&self.conditions));

        if !self.order_by.is_empty() {
            let terms: Vec<_> = self
                .order_by
                .iter()
                .map(|o| o.to_sql(fmt.delimiter()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(limit) = &self.limit {
            sql.push(' ');
            sql.push_str(&limit.to_sql());
        }

        sql
    }
}

/// ` WHERE a AND b`, or nothing for no conditions.
pub(crate) fn where_suffix(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Delimiter;
    use crate::testing::NullExecutor;
    use lessql_core::Value;

    #[test]
    fn test_select_star() {
        let exec = NullExecutor;
        let fmt = SqlFormat::new(&exec, Delimiter::Backtick);
        assert_eq!(Select::new("user").to_sql(&fmt, "user"), "SELECT * FROM `user`");
    }

    #[test]
    fn test_full_select() {
        let exec = NullExecutor;
        let fmt = SqlFormat::new(&exec, Delimiter::Backtick);
        let select = Select::new("dummy")
            .columns(["test", "id"])
            .filter("test = ?")
            .bind([Param::Positional(Value::Int(31))])
            .filter(fmt.is("id", vec![1, 2]))
            .order_by(OrderBy::desc("id"))
            .order_by(OrderBy::asc("test"))
            .limit(Limit::new(3, Some(10)));
        assert_eq!(
            select.to_sql(&fmt, "dummy"),
            "SELECT test, id FROM `dummy` WHERE test = ? AND `id` IN ( '1', '2' ) \
             ORDER BY `id` DESC, `test` ASC LIMIT 3 OFFSET 10"
        );
        assert_eq!(select.params().len(), 1);
    }

    #[test]
    fn test_definition_is_order_sensitive() {
        let a = Select::new("post").filter("a").filter("b");
        let b = Select::new("post").filter("b").filter("a");
        assert_ne!(a.definition(), b.definition());
        assert_eq!(a.definition(), a.clone().definition());
    }

    #[test]
    fn test_definition_includes_params() {
        let a = Select::new("post").filter("id = ?").bind([Param::from(1)]);
        let b = Select::new("post").filter("id = ?").bind([Param::from(2)]);
        assert_ne!(a.definition(), b.definition());
    }

    #[test]
    fn test_rewritten_table() {
        let exec = NullExecutor;
        let fmt = SqlFormat::new(&exec, Delimiter::Backtick);
        assert_eq!(
            Select::new("post").to_sql(&fmt, "prefix_post"),
            "SELECT * FROM `prefix_post`"
        );
    }
}

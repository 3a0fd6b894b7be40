//! ABOUTME: Lazy SELECT builder scoped to one table
//! ABOUTME: Collects projection and predicate, then runs on any executor

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite};
use tracing::debug;

use tb_core::{Error, Result};

use crate::identifier::check_identifier;
use crate::value::{to_columns, SqlValue};

/// Sort direction for [`SelectQuery::order_by`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// A lazily built `SELECT` over one table
///
/// Returned by `TableRepository::find`. Nothing touches the database until a
/// terminal method runs the statement on an executor, so callers may refine
/// the projection and predicate first.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: String,
    columns: Vec<String>,
    criteria: Vec<(String, SqlValue)>,
    order: Vec<(String, Order)>,
    limit: Option<i64>,
}

impl SelectQuery {
    pub(crate) fn new(table: &str) -> Self {
        Self {
            table: table.to_owned(),
            columns: Vec::new(),
            criteria: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Restrict the projection to the given columns
    ///
    /// The default projection is all columns. The output row type of the
    /// terminal call must be mappable from the chosen columns.
    pub fn columns(mut self, columns: &[&str]) -> Result<Self> {
        for name in columns {
            check_identifier("column", name)?;
        }
        self.columns = columns.iter().map(|c| (*c).to_owned()).collect();
        Ok(self)
    }

    /// Add equality criteria from a partial record
    ///
    /// Every present field must match; absent fields are unconstrained. An
    /// explicit `null` matches rows where the column is SQL `NULL`.
    pub fn filter<C>(mut self, criteria: &C) -> Result<Self>
    where
        C: Serialize + ?Sized,
    {
        self.criteria.extend(to_columns("criteria", criteria)?);
        Ok(self)
    }

    /// Require `column` to equal `value`
    pub fn filter_eq(mut self, column: &str, value: impl Into<SqlValue>) -> Result<Self> {
        check_identifier("column", column)?;
        self.criteria.push((column.to_owned(), value.into()));
        Ok(self)
    }

    /// Require the `id` column to equal `id`
    pub fn by_id(mut self, id: impl Into<SqlValue>) -> Self {
        self.criteria.push(("id".to_owned(), id.into()));
        self
    }

    /// Sort the result by `column`
    pub fn order_by(mut self, column: &str, order: Order) -> Result<Self> {
        check_identifier("column", column)?;
        self.order.push((column.to_owned(), order));
        Ok(self)
    }

    /// Cap the number of returned rows
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn build(&self) -> QueryBuilder<'static, Sqlite> {
        let mut builder = QueryBuilder::new("SELECT ");
        if self.columns.is_empty() {
            builder.push("*");
        } else {
            builder.push(self.columns.join(", "));
        }
        builder.push(" FROM ");
        builder.push(&self.table);
        push_criteria(&mut builder, &self.criteria);
        for (i, (column, order)) in self.order.iter().enumerate() {
            builder.push(if i == 0 { " ORDER BY " } else { ", " });
            builder.push(column);
            builder.push(match order {
                Order::Asc => " ASC",
                Order::Desc => " DESC",
            });
        }
        if let Some(limit) = self.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }
        builder
    }

    /// Run the statement and return every matching row
    pub async fn fetch_all<'e, O, E>(self, executor: E) -> Result<Vec<O>>
    where
        O: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        E: Executor<'e, Database = Sqlite>,
    {
        let mut builder = self.build();
        debug!(sql = builder.sql(), "Executing select");
        builder
            .build_query_as::<O>()
            .fetch_all(executor)
            .await
            .map_err(|e| Error::Database(format!("Failed to select from {}: {}", self.table, e)))
    }

    /// Run the statement and return the first matching row, if any
    pub async fn fetch_optional<'e, O, E>(self, executor: E) -> Result<Option<O>>
    where
        O: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        E: Executor<'e, Database = Sqlite>,
    {
        let mut builder = self.build();
        debug!(sql = builder.sql(), "Executing select");
        builder
            .build_query_as::<O>()
            .fetch_optional(executor)
            .await
            .map_err(|e| Error::Database(format!("Failed to select from {}: {}", self.table, e)))
    }

    /// Count the rows matching the current predicate
    pub async fn count<'e, E>(self, executor: E) -> Result<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM ");
        builder.push(&self.table);
        push_criteria(&mut builder, &self.criteria);
        let row: (i64,) = builder
            .build_query_as()
            .fetch_one(executor)
            .await
            .map_err(|e| Error::Database(format!("Failed to count rows in {}: {}", self.table, e)))?;
        Ok(row.0)
    }
}

/// Append a `WHERE` clause of AND-ed equality terms
///
/// `Null` values compare with `IS NULL`; equality against SQL `NULL` never
/// matches, which would make a present criteria field unsatisfiable.
pub(crate) fn push_criteria(
    builder: &mut QueryBuilder<'static, Sqlite>,
    criteria: &[(String, SqlValue)],
) {
    for (i, (column, value)) in criteria.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(column);
        if matches!(value, SqlValue::Null) {
            builder.push(" IS NULL");
        } else {
            builder.push(" = ");
            value.clone().push_bind(builder);
        }
    }
}
